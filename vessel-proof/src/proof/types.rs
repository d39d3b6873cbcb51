use derive_more::{Display, From, Into};

use rst_common::with_errors::thiserror::{self, Error};

use crate::command::types::{CommandError, CommandHandle, ErrorCode, FromReply, ReplyPayload};
use crate::command::{Correlator, PendingResult};

pub const OP_PROOF_CREATE: &str = "proof.create";
pub const OP_PROOF_SEND_REQUEST: &str = "proof.send_request";
pub const OP_PROOF_GET_PROOF: &str = "proof.get_proof";
pub const OP_PROOF_UPDATE_STATE: &str = "proof.update_state";
pub const OP_PROOF_GET_STATE: &str = "proof.get_state";
pub const OP_PROOF_SERIALIZE: &str = "proof.serialize";
pub const OP_PROOF_DESERIALIZE: &str = "proof.deserialize";

pub const STATE_INITIALIZED: u32 = 1;
pub const STATE_REQUEST_SENT: u32 = 2;
pub const STATE_PROOF_RECEIVED: u32 = 3;
pub const STATE_ACCEPTED: u32 = 4;
pub const STATE_REJECTED: u32 = 9;

pub const VERIFICATION_UNDEFINED: u32 = 0;
pub const VERIFICATION_VALIDATED: u32 = 1;
pub const VERIFICATION_INVALID: u32 = 2;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProofError {
    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("submission error: {0}")]
    SubmissionError(ErrorCode),

    #[error("engine error: {0}")]
    EngineError(ErrorCode),

    #[error("unknown proof state: {0}")]
    UnknownState(u32),

    #[error("unknown verification state: {0}")]
    UnknownVerificationState(u32),

    #[error("command error: {0}")]
    CommandError(CommandError),
}

impl From<CommandError> for ProofError {
    fn from(value: CommandError) -> Self {
        match value {
            CommandError::Submission(code) => ProofError::SubmissionError(code),
            CommandError::Engine(code) => ProofError::EngineError(code),
            other => ProofError::CommandError(other),
        }
    }
}

/// `ProofHandle` references a proof exchange object owned by the engine
///
/// It is a capability token, not a pointer. Zero is never a valid handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Into, Display)]
pub struct ProofHandle(u32);

impl ProofHandle {
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// `ConnectionHandle` references an established channel owned by the connection component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Into, Display)]
pub struct ConnectionHandle(u32);

impl ConnectionHandle {
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// `SerializedProof` is the engine's encoded form of a proof object. Its content is opaque here
#[derive(Debug, Clone, PartialEq, Eq, From, Into, Display)]
pub struct SerializedProof(String);

impl SerializedProof {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `ProofState` is the lifecycle state of a proof exchange object
///
/// The numeric codes are defined by the engine and used on the wire as they are
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofState {
    Initialized,
    RequestSent,
    ProofReceived,
    Accepted,
    Rejected,
}

impl ProofState {
    pub fn code(&self) -> u32 {
        match self {
            ProofState::Initialized => STATE_INITIALIZED,
            ProofState::RequestSent => STATE_REQUEST_SENT,
            ProofState::ProofReceived => STATE_PROOF_RECEIVED,
            ProofState::Accepted => STATE_ACCEPTED,
            ProofState::Rejected => STATE_REJECTED,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProofState::Accepted | ProofState::Rejected)
    }
}

impl TryFrom<u32> for ProofState {
    type Error = ProofError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            STATE_INITIALIZED => Ok(ProofState::Initialized),
            STATE_REQUEST_SENT => Ok(ProofState::RequestSent),
            STATE_PROOF_RECEIVED => Ok(ProofState::ProofReceived),
            STATE_ACCEPTED => Ok(ProofState::Accepted),
            STATE_REJECTED => Ok(ProofState::Rejected),
            _ => Err(ProofError::UnknownState(value)),
        }
    }
}

/// `VerificationState` is the verdict the engine reached about a received presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    Undefined,
    Validated,
    Invalid,
}

impl VerificationState {
    pub fn code(&self) -> u32 {
        match self {
            VerificationState::Undefined => VERIFICATION_UNDEFINED,
            VerificationState::Validated => VERIFICATION_VALIDATED,
            VerificationState::Invalid => VERIFICATION_INVALID,
        }
    }
}

impl TryFrom<u32> for VerificationState {
    type Error = ProofError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            VERIFICATION_UNDEFINED => Ok(VerificationState::Undefined),
            VERIFICATION_VALIDATED => Ok(VerificationState::Validated),
            VERIFICATION_INVALID => Ok(VerificationState::Invalid),
            _ => Err(ProofError::UnknownVerificationState(value)),
        }
    }
}

/// `GetProofResult` carries the holder's response fetched by `get_proof`
#[derive(Debug, Clone, PartialEq)]
pub struct GetProofResult {
    proof_state: VerificationState,
    response_data: String,
}

impl GetProofResult {
    pub fn new(proof_state: VerificationState, response_data: String) -> Self {
        Self {
            proof_state,
            response_data,
        }
    }

    pub fn get_proof_state(&self) -> VerificationState {
        self.proof_state
    }

    pub fn get_response_data(&self) -> &str {
        &self.response_data
    }
}

/// `Acknowledgement` confirms the engine finished a command that has no value of its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    command_handle: CommandHandle,
}

impl Acknowledgement {
    pub fn get_command_handle(&self) -> CommandHandle {
        self.command_handle
    }
}

fn unexpected(op: &str, payload: ReplyPayload) -> ProofError {
    ProofError::from(CommandError::UnexpectedReply(format!(
        "{op}: {:?}",
        payload
    )))
}

impl FromReply for ProofHandle {
    type Error = ProofError;

    fn from_reply(_: CommandHandle, payload: ReplyPayload) -> Result<Self, Self::Error> {
        match payload {
            ReplyPayload::Integer(value) if value != 0 => Ok(ProofHandle(value)),
            other => Err(unexpected("proof handle", other)),
        }
    }
}

impl FromReply for ProofState {
    type Error = ProofError;

    fn from_reply(_: CommandHandle, payload: ReplyPayload) -> Result<Self, Self::Error> {
        match payload {
            ReplyPayload::Integer(code) => ProofState::try_from(code),
            other => Err(unexpected("proof state", other)),
        }
    }
}

impl FromReply for GetProofResult {
    type Error = ProofError;

    fn from_reply(_: CommandHandle, payload: ReplyPayload) -> Result<Self, Self::Error> {
        match payload {
            ReplyPayload::IntegerText(code, response_data) => {
                let proof_state = VerificationState::try_from(code)?;
                Ok(GetProofResult::new(proof_state, response_data))
            }
            other => Err(unexpected("get proof", other)),
        }
    }
}

impl FromReply for SerializedProof {
    type Error = ProofError;

    fn from_reply(_: CommandHandle, payload: ReplyPayload) -> Result<Self, Self::Error> {
        match payload {
            ReplyPayload::Text(value) => Ok(SerializedProof(value)),
            other => Err(unexpected("serialized proof", other)),
        }
    }
}

impl FromReply for Acknowledgement {
    type Error = ProofError;

    fn from_reply(command_handle: CommandHandle, payload: ReplyPayload) -> Result<Self, Self::Error> {
        match payload {
            ReplyPayload::Empty => Ok(Acknowledgement { command_handle }),
            other => Err(unexpected("acknowledgement", other)),
        }
    }
}

/// `Command` is the operation and arguments carried by a single engine request
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateProof {
        source_id: String,
        requested_attrs: String,
        requested_predicates: String,
        name: String,
    },
    SendRequest {
        proof_handle: ProofHandle,
        connection_handle: ConnectionHandle,
    },
    GetProof {
        proof_handle: ProofHandle,
        connection_handle: ConnectionHandle,
    },
    UpdateState {
        proof_handle: ProofHandle,
    },
    GetState {
        proof_handle: ProofHandle,
    },
    Serialize {
        proof_handle: ProofHandle,
    },
    Deserialize {
        serialized_proof: SerializedProof,
    },
}

impl Command {
    pub fn op_code(&self) -> &'static str {
        match self {
            Command::CreateProof { .. } => OP_PROOF_CREATE,
            Command::SendRequest { .. } => OP_PROOF_SEND_REQUEST,
            Command::GetProof { .. } => OP_PROOF_GET_PROOF,
            Command::UpdateState { .. } => OP_PROOF_UPDATE_STATE,
            Command::GetState { .. } => OP_PROOF_GET_STATE,
            Command::Serialize { .. } => OP_PROOF_SERIALIZE,
            Command::Deserialize { .. } => OP_PROOF_DESERIALIZE,
        }
    }

    pub fn proof_handle(&self) -> Option<ProofHandle> {
        match self {
            Command::SendRequest { proof_handle, .. }
            | Command::GetProof { proof_handle, .. }
            | Command::UpdateState { proof_handle }
            | Command::GetState { proof_handle }
            | Command::Serialize { proof_handle } => Some(*proof_handle),
            Command::CreateProof { .. } | Command::Deserialize { .. } => None,
        }
    }
}

/// `Request` is the message forwarded to the engine for an asynchronous operation
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    command_handle: CommandHandle,
    command: Command,
}

impl Request {
    pub fn new(command_handle: CommandHandle, command: Command) -> Self {
        Self {
            command_handle,
            command,
        }
    }

    pub fn get_command_handle(&self) -> CommandHandle {
        self.command_handle
    }

    pub fn get_command(&self) -> &Command {
        &self.command
    }

    pub fn into_parts(self) -> (CommandHandle, Command) {
        (self.command_handle, self.command)
    }
}

/// `EngineBuilder` is the boundary to the engine that owns proof objects
///
/// `dispatch` only hands the request over. An `Ok` means the engine accepted it and
/// will reply later through the [`Notifier`](crate::command::Notifier) it was built
/// with. An `Err` means it never will.
///
/// `proof_accepted` and `proof_release` complete synchronously and never reply.
pub trait EngineBuilder: Clone + Sync + Send {
    fn dispatch(&self, request: Request) -> Result<(), ErrorCode>;

    fn proof_accepted(
        &self,
        proof_handle: ProofHandle,
        response_data: String,
    ) -> Result<(), ErrorCode>;

    fn proof_release(&self, proof_handle: ProofHandle) -> Result<(), ErrorCode>;
}

/// `ProofAPI` is the entrypoint to the proof exchange
///
/// Asynchronous operations return as soon as the engine accepted the command. The
/// returned [`PendingResult`] resolves when the engine replies, so callers decide
/// where to suspend. Operations on the same proof handle are not serialized: wait
/// for one to resolve before issuing another that depends on it.
pub trait ProofAPI: Clone {
    fn create(
        &self,
        source_id: String,
        requested_attrs: String,
        requested_predicates: String,
        name: String,
    ) -> Result<PendingResult<ProofHandle>, ProofError>;

    fn send_request(
        &self,
        proof_handle: ProofHandle,
        connection_handle: ConnectionHandle,
    ) -> Result<PendingResult<Acknowledgement>, ProofError>;

    fn get_proof(
        &self,
        proof_handle: ProofHandle,
        connection_handle: ConnectionHandle,
    ) -> Result<PendingResult<GetProofResult>, ProofError>;

    fn accepted(&self, proof_handle: ProofHandle, response_data: String) -> Result<(), ProofError>;

    fn update_state(&self, proof_handle: ProofHandle)
        -> Result<PendingResult<ProofState>, ProofError>;

    fn get_state(&self, proof_handle: ProofHandle) -> Result<PendingResult<ProofState>, ProofError>;

    fn serialize(
        &self,
        proof_handle: ProofHandle,
    ) -> Result<PendingResult<SerializedProof>, ProofError>;

    fn deserialize(
        &self,
        serialized_proof: SerializedProof,
    ) -> Result<PendingResult<ProofHandle>, ProofError>;

    fn release(&self, proof_handle: ProofHandle) -> Result<(), ProofError>;
}

/// `UsecaseBuilder` is the main abstraction used by application level callers.
/// It MUST INHERIT the [`ProofAPI`]
pub trait UsecaseBuilder: ProofAPI {
    type EngineImplementer: EngineBuilder;

    fn engine(&self) -> Self::EngineImplementer;
    fn correlator(&self) -> Correlator;
}
