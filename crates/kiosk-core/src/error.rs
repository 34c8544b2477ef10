use thiserror::Error;

use crate::validation::CardRejection;

#[derive(Error, Debug)]
pub enum Error {
    // State machine errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Action '{action}' not allowed in state {state}")]
    ActionNotAllowed { action: String, state: String },

    // Input errors
    #[error("Coin of {cents} cents is not an accepted denomination")]
    InvalidDenomination { cents: u32 },

    #[error("Card rejected: {0}")]
    CardRejected(CardRejection),

    #[error("Code not authorized: {0:?}")]
    CodeNotAuthorized(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an action-not-allowed error for the given state.
    pub fn action_not_allowed(action: impl Into<String>, state: impl ToString) -> Self {
        Self::ActionNotAllowed {
            action: action.into(),
            state: state.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
