use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
pub enum ThreadsServerError {
    #[error("Thread {0} not found")]
    ThreadNotFound(String),
    #[error("User {0} not found")]
    UserNotFound(String),
    #[error("Thread text must be at least {0} characters")]
    TextTooShort(usize),
    #[error("`{0}` is not a valid object id")]
    InvalidObjectId(String),
    #[error("Username {0} is already used by another account")]
    UsernameTaken(String),
    #[error("Missing X-User-Id header")]
    MissingIdentity,
    #[error("User {0} is not the author of thread {1}")]
    NotThreadAuthor(String, String),
    #[error("Mongo error: {0}")]
    MongoError(String),
    /// An operation failed; `action` reads like "Failed to delete thread"
    #[error("{action}: {cause}")]
    Failed {
        action: String,
        cause: Box<ThreadsServerError>,
    },
}

impl ThreadsServerError {
    pub fn failed(action: impl Into<String>, cause: ThreadsServerError) -> Self {
        ThreadsServerError::Failed {
            action: action.into(),
            cause: Box::new(cause),
        }
    }

    /// The innermost error beneath any `Failed` wrappers
    pub fn root_cause(&self) -> &ThreadsServerError {
        let mut current = self;
        while let ThreadsServerError::Failed { cause, .. } = current {
            current = cause;
        }
        current
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root_cause(),
            ThreadsServerError::ThreadNotFound(_) | ThreadsServerError::UserNotFound(_)
        )
    }
}
