use modlike_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(String),
    #[error("event is full")]
    CapacityExceeded,
    #[error("already enrolled")]
    AlreadyEnrolled,
    #[error("organizer cannot enroll in their own event")]
    SelfEnrollment,
    #[error("cannot {action} an event in status {from}")]
    InvalidTransition {
        from: String,
        action: &'static str,
    },
    #[error("database error")]
    Database(#[from] DbError),
    #[error("internal error: {0}")]
    Internal(String),
}
