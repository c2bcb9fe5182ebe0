//! @ai:module:intent Outcome of one submission and its JSON wire shape
//! @ai:module:layer domain
//! @ai:module:public_api Verdict, SubmissionRequest, SubmissionResponse
//! @ai:module:stateless true

use crate::error::Error;
use serde::{Deserialize, Serialize};

pub const CORRECT_MESSAGE: &str = "Correct solution!";
pub const MISMATCH_MESSAGE: &str = "Solution does not match reference implementation";
pub const INVALID_REQUEST_MESSAGE: &str = "Invalid request";

/// @ai:intent Structured outcome of one evaluation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Correct {
        attempts_left: u32,
    },
    Incorrect {
        attempts_left: u32,
        message: String,
    },
    /// `hint` is only present on the submission that caused the lockout.
    Blocked {
        time_left: u64,
        hint: Option<String>,
    },
}

impl Verdict {
    pub fn status(&self) -> ResponseStatus {
        match self {
            Verdict::Correct { .. } => ResponseStatus::Correct,
            Verdict::Incorrect { .. } => ResponseStatus::Incorrect,
            Verdict::Blocked { .. } => ResponseStatus::Blocked,
        }
    }
}

/// @ai:intent Body of a submission request
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionRequest {
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Correct,
    Incorrect,
    Blocked,
    Error,
}

/// @ai:intent JSON response for a submission; absent fields are omitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_left: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_left: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl SubmissionResponse {
    /// @ai:intent An error response carrying only a message
    /// @ai:effects pure
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            attempts_left: None,
            message: Some(message.into()),
            time_left: None,
            hint: None,
        }
    }
}

impl From<Verdict> for SubmissionResponse {
    fn from(verdict: Verdict) -> Self {
        let status = verdict.status();
        match verdict {
            Verdict::Correct { attempts_left } => Self {
                status,
                attempts_left: Some(attempts_left),
                message: Some(CORRECT_MESSAGE.to_string()),
                time_left: None,
                hint: None,
            },
            Verdict::Incorrect {
                attempts_left,
                message,
            } => Self {
                status,
                attempts_left: Some(attempts_left),
                message: Some(message),
                time_left: None,
                hint: None,
            },
            Verdict::Blocked { time_left, hint } => Self {
                status,
                attempts_left: None,
                message: None,
                time_left: Some(time_left),
                hint,
            },
        }
    }
}

impl From<&Error> for SubmissionResponse {
    fn from(error: &Error) -> Self {
        Self::error(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_correct_shape() {
        let response = SubmissionResponse::from(Verdict::Correct { attempts_left: 3 });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "correct", "attempts_left": 3, "message": "Correct solution!"})
        );
    }

    #[test]
    fn test_blocked_without_hint_omits_it() {
        let response = SubmissionResponse::from(Verdict::Blocked {
            time_left: 7,
            hint: None,
        });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "blocked", "time_left": 7})
        );
    }

    #[test]
    fn test_blocked_with_hint() {
        let response = SubmissionResponse::from(Verdict::Blocked {
            time_left: 10,
            hint: Some("use a loop".to_string()),
        });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "blocked", "time_left": 10, "hint": "use a loop"})
        );
    }

    #[test]
    fn test_error_shape() {
        let response = SubmissionResponse::from(&Error::InvalidInput(
            "Code must be at least 5 characters long".to_string(),
        ));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "error", "message": "Code must be at least 5 characters long"})
        );
    }
}
