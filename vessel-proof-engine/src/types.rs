use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};

use prople_vessel_proof::command::types::ErrorCode;

pub const UNKNOWN_ERROR: u32 = 1001;
pub const INVALID_CONNECTION_HANDLE: u32 = 1003;
pub const NOT_READY: u32 = 1005;
pub const INVALID_JSON: u32 = 1016;
pub const INVALID_PROOF_HANDLE: u32 = 1017;
pub const INVALID_PROOF: u32 = 1023;

pub const SERIALIZE_VERSION: &str = "1.0";
pub const PRESENTATION_REQUEST_TYPE: &str = "present-proof/1.0/request-presentation";

pub fn error_code(code: u32) -> ErrorCode {
    ErrorCode::from(code)
}

/// `request_thread_id` reads the `@id` of a presentation request. A holder
/// answers on that thread
pub fn request_thread_id(request: &str) -> Result<String, ErrorCode> {
    let value: Value = serde_json::from_str(request).map_err(|_| error_code(INVALID_JSON))?;

    value
        .get("@id")
        .and_then(Value::as_str)
        .map(|thread_id| thread_id.to_string())
        .ok_or(error_code(INVALID_JSON))
}

/// `ProblemReport` is sent by a holder that declines to answer a proof request
///
/// The `code` is the numeric problem description and `comment` a free text
/// explanation for humans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ProblemReport {
    code: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl ProblemReport {
    pub fn new(code: u32) -> Self {
        Self {
            code,
            comment: None,
        }
    }

    pub fn set_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    pub fn get_code(&self) -> u32 {
        self.code
    }

    pub fn get_comment(&self) -> Option<&String> {
        self.comment.as_ref()
    }
}

/// `HolderMessage` is anything a holder may push back over a connection
#[derive(Debug, Clone, PartialEq)]
pub enum HolderMessage {
    Presentation(String),
    ProblemReport(ProblemReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_thread_id() {
        let thread_id = request_thread_id(r#"{"@id":"abc","name":"name"}"#);
        assert_eq!(thread_id, Ok("abc".to_string()));
    }

    #[test]
    fn test_request_thread_id_missing() {
        assert_eq!(
            request_thread_id(r#"{"name":"name"}"#),
            Err(error_code(INVALID_JSON))
        );
        assert_eq!(request_thread_id("nope"), Err(error_code(INVALID_JSON)));
    }
}
