#![allow(dead_code)]

pub mod database;
pub mod test_app;

pub use database::{TEST_PASSWORD, TestDb};
pub use test_app::{RecordingMailer, TestApp, patient_form_with_photo};
