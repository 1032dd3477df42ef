use thiserror::Error;

use crate::Operation;

pub type GroupsResult<T> = std::result::Result<T, GroupsError>;

/// Errors raised while turning a group operation into a request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GroupsError {
    /// The payload does not have a shape the operation accepts. Nothing is sent.
    #[error("Invalid value passed to #{operation}: {reason}")]
    InvalidPayloadShape { operation: Operation, reason: String },
}

impl GroupsError {
    pub(crate) fn invalid(operation: Operation, reason: impl Into<String>) -> Self {
        Self::InvalidPayloadShape {
            operation,
            reason: reason.into(),
        }
    }

    /// The operation the rejected payload was passed to.
    pub fn operation(&self) -> Operation {
        match self {
            Self::InvalidPayloadShape { operation, .. } => *operation,
        }
    }
}
