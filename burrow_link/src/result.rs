use serde::{Deserialize, Serialize};

use crate::data::Data;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_ERROR: u16 = 500;
pub const STATUS_UNAVAILABLE: u16 = 503;

/// The outcome of one remote call. Every request produces exactly one of
/// these; a caller always discriminates success from failure before it can
/// reach the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CallResult {
    Success { status: u16, payload: Option<Data> },
    Failure { status: u16, message: String },
}

impl CallResult {
    /// An accepted call, status 200.
    pub fn ok(payload: Option<Data>) -> Self {
        CallResult::Success {
            status: STATUS_OK,
            payload,
        }
    }

    pub fn failure<M: Into<String>>(status: u16, message: M) -> Self {
        CallResult::Failure {
            status,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallResult::Success { .. })
    }

    pub fn status(&self) -> u16 {
        match self {
            CallResult::Success { status, .. } => *status,
            CallResult::Failure { status, .. } => *status,
        }
    }

    pub fn payload(&self) -> Option<&Data> {
        match self {
            CallResult::Success { payload, .. } => payload.as_ref(),
            CallResult::Failure { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            CallResult::Success { .. } => None,
            CallResult::Failure { message, .. } => Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminates_before_payload() {
        let ok = CallResult::ok(Some(Data::from(1)));
        assert!(ok.is_success());
        assert_eq!(ok.status(), STATUS_OK);
        assert_eq!(ok.payload(), Some(&Data::from(1)));
        assert_eq!(ok.message(), None);

        let failed = CallResult::failure(STATUS_NOT_FOUND, "no matching record");
        assert!(!failed.is_success());
        assert_eq!(failed.payload(), None);
        assert_eq!(failed.message(), Some("no matching record"));
    }
}
