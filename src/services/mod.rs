pub mod cookies;
pub mod jwt;
pub mod notifications;
pub mod records;
pub mod scheduling;
pub mod uploads;
pub mod users;
