pub mod records;
pub mod scheduling;
pub mod users;
