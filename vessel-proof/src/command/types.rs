use derive_more::{Display, From, Into};

use rst_common::with_errors::thiserror::{self, Error};

/// `SUCCESS_CODE` is the only engine error code that means the command succeeded
pub const SUCCESS_CODE: u32 = 0;

/// `CommandHandle` identifies one outstanding command between its submission
/// and the engine's reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Into, Display)]
pub struct CommandHandle(u32);

impl CommandHandle {
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// `ErrorCode` is the raw numeric status reported by the engine. Non-zero
/// values are engine-defined and must be kept as they are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Into, Display)]
pub struct ErrorCode(u32);

impl ErrorCode {
    pub fn success() -> Self {
        Self(SUCCESS_CODE)
    }

    pub fn is_success(&self) -> bool {
        self.0 == SUCCESS_CODE
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    #[error("engine rejected command: {0}")]
    Submission(ErrorCode),

    #[error("engine error: {0}")]
    Engine(ErrorCode),

    #[error("command canceled: {0}")]
    Canceled(CommandHandle),

    #[error("command timed out: {0}")]
    Timeout(CommandHandle),

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// `ReplyPayload` mirrors the shapes of the values an engine may hand back
/// with a successful reply
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyPayload {
    Empty,
    Integer(u32),
    Text(String),
    IntegerText(u32, String),
}

/// `Reply` is a single notification emitted by the engine for a previously
/// submitted command
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    command_handle: CommandHandle,
    error_code: ErrorCode,
    payload: ReplyPayload,
}

impl Reply {
    pub fn new(command_handle: CommandHandle, error_code: ErrorCode, payload: ReplyPayload) -> Self {
        Self {
            command_handle,
            error_code,
            payload,
        }
    }

    pub fn success(command_handle: CommandHandle, payload: ReplyPayload) -> Self {
        Self::new(command_handle, ErrorCode::success(), payload)
    }

    pub fn failure(command_handle: CommandHandle, error_code: ErrorCode) -> Self {
        Self::new(command_handle, error_code, ReplyPayload::Empty)
    }

    pub fn get_command_handle(&self) -> CommandHandle {
        self.command_handle
    }

    pub fn get_error_code(&self) -> ErrorCode {
        self.error_code
    }

    pub fn get_payload(&self) -> &ReplyPayload {
        &self.payload
    }

    pub fn into_parts(self) -> (CommandHandle, ErrorCode, ReplyPayload) {
        (self.command_handle, self.error_code, self.payload)
    }
}

/// `Resolution` reports what happened to a reply handed to the notifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// the pending command was found and its caller received the outcome
    Resolved,

    /// the pending command was found but its caller stopped waiting
    Abandoned,

    /// no pending command matched the reply
    Dropped,
}

/// `FromReply` converts a successful reply payload into the value a caller awaits
///
/// The associated error must be buildable from [`CommandError`] so engine
/// failures, cancellations and timeouts can flow through the same channel
pub trait FromReply: Sized {
    type Error: From<CommandError>;

    fn from_reply(command_handle: CommandHandle, payload: ReplyPayload)
        -> Result<Self, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_success() {
        assert!(ErrorCode::success().is_success());
        assert!(!ErrorCode::from(1017).is_success());
        assert_eq!(ErrorCode::from(1017).value(), 1017);
    }

    #[test]
    fn test_reply_failure_has_empty_payload() {
        let reply = Reply::failure(CommandHandle::from(7), ErrorCode::from(1005));
        assert_eq!(reply.get_payload(), &ReplyPayload::Empty);

        let (handle, code, _) = reply.into_parts();
        assert_eq!(handle.value(), 7);
        assert_eq!(code, ErrorCode::from(1005));
    }

    #[test]
    fn test_command_error_keeps_code() {
        let err = CommandError::Engine(ErrorCode::from(1023));
        assert!(err.to_string().contains("1023"));
    }
}
