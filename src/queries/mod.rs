pub mod appointments;
pub mod availabilities;
pub mod records;
pub mod users;

/// Whether `err` is a unique violation raised by `constraint`.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
