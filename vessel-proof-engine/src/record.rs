use rst_common::standard::chrono::serde::ts_seconds;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, json, Value};
use rst_common::standard::uuid::Uuid;

use prople_vessel_proof::command::types::ErrorCode;
use prople_vessel_proof::proof::types::{
    STATE_ACCEPTED, STATE_INITIALIZED, STATE_PROOF_RECEIVED, STATE_REJECTED, STATE_REQUEST_SENT,
    VERIFICATION_INVALID, VERIFICATION_UNDEFINED, VERIFICATION_VALIDATED,
};

use super::types::{
    error_code, HolderMessage, ProblemReport, INVALID_JSON, INVALID_PROOF, NOT_READY,
    PRESENTATION_REQUEST_TYPE, SERIALIZE_VERSION,
};

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct Envelope {
    version: String,
    data: ProofRecord,
}

/// `ProofRecord` is the engine side state of a single proof exchange
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(crate = "self::serde")]
pub struct ProofRecord {
    pub(crate) source_id: String,
    pub(crate) name: String,
    pub(crate) nonce: String,

    #[serde(rename = "requestedAttrs")]
    pub(crate) requested_attrs: Value,

    #[serde(rename = "requestedPredicates")]
    pub(crate) requested_predicates: Value,

    pub(crate) state: u32,

    #[serde(rename = "proofState")]
    pub(crate) proof_state: u32,

    #[serde(rename = "connectionHandle")]
    pub(crate) connection_handle: Option<u32>,

    pub(crate) presentation: Option<String>,

    #[serde(rename = "problemReport")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) problem_report: Option<ProblemReport>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "createdAt")]
    pub(crate) created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "updatedAt")]
    pub(crate) updated_at: DateTime<Utc>,
}

impl ProofRecord {
    pub fn new(
        source_id: String,
        requested_attrs: String,
        requested_predicates: String,
        name: String,
    ) -> Result<Self, ErrorCode> {
        let requested_attrs: Value =
            serde_json::from_str(&requested_attrs).map_err(|_| error_code(INVALID_JSON))?;

        let requested_predicates: Value =
            serde_json::from_str(&requested_predicates).map_err(|_| error_code(INVALID_JSON))?;

        Ok(Self {
            source_id,
            name,
            nonce: Uuid::new_v4().to_string(),
            requested_attrs,
            requested_predicates,
            state: STATE_INITIALIZED,
            proof_state: VERIFICATION_UNDEFINED,
            connection_handle: None,
            presentation: None,
            problem_report: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    pub fn get_state(&self) -> u32 {
        self.state
    }

    pub fn get_proof_state(&self) -> u32 {
        self.proof_state
    }

    pub fn get_connection_handle(&self) -> Option<u32> {
        self.connection_handle
    }

    /// `get_thread_id` is the `@id` of the presentation request, holder answers refer to it
    pub fn get_thread_id(&self) -> &str {
        &self.nonce
    }

    pub fn get_problem_report(&self) -> Option<&ProblemReport> {
        self.problem_report.as_ref()
    }

    /// `is_waiting` tells whether holder messages on the thread can still change the record
    pub fn is_waiting(&self) -> bool {
        self.state == STATE_REQUEST_SENT
    }

    /// `presentation_request` builds the message delivered to the holder
    pub fn presentation_request(&self) -> Value {
        json!({
            "@type": PRESENTATION_REQUEST_TYPE,
            "@id": self.nonce,
            "name": self.name,
            "thread_id": self.source_id,
            "requested_attributes": self.requested_attrs,
            "requested_predicates": self.requested_predicates,
        })
    }

    pub fn mark_sent(&mut self, connection_handle: u32) -> Result<(), ErrorCode> {
        if self.state != STATE_INITIALIZED {
            return Err(error_code(NOT_READY));
        }

        self.state = STATE_REQUEST_SENT;
        self.connection_handle = Some(connection_handle);
        self.touch();
        Ok(())
    }

    /// `receive` applies a holder message to a record still waiting for an answer.
    /// Callers must check [`ProofRecord::is_waiting`] first
    pub fn receive(&mut self, message: HolderMessage) {
        if !self.is_waiting() {
            return;
        }

        match message {
            HolderMessage::Presentation(presentation) => {
                self.presentation = Some(presentation);
                self.state = STATE_PROOF_RECEIVED;
            }
            HolderMessage::ProblemReport(report) => {
                self.problem_report = Some(report);
                self.state = STATE_REJECTED;
            }
        }

        self.touch();
    }

    /// `verify` checks the received presentation is well formed. It does not check any cryptography
    pub fn verify(&mut self) -> Result<(u32, String), ErrorCode> {
        let presentation = self.presentation.clone().ok_or(error_code(NOT_READY))?;

        let well_formed = serde_json::from_str::<Value>(&presentation)
            .map(|value| value.is_object())
            .unwrap_or(false);

        self.proof_state = if well_formed {
            VERIFICATION_VALIDATED
        } else {
            VERIFICATION_INVALID
        };

        self.touch();
        Ok((self.proof_state, presentation))
    }

    pub fn accept(&mut self, response_data: String) -> Result<(), ErrorCode> {
        if self.state != STATE_PROOF_RECEIVED {
            return Err(error_code(NOT_READY));
        }

        if self.proof_state == VERIFICATION_INVALID {
            return Err(error_code(INVALID_PROOF));
        }

        // the accepted data must be the presentation the holder sent
        if self.presentation.as_deref() != Some(response_data.as_str()) {
            return Err(error_code(INVALID_PROOF));
        }

        self.state = STATE_ACCEPTED;
        self.touch();
        Ok(())
    }

    pub fn to_serialized(&self) -> Result<String, ErrorCode> {
        serde_json::to_string(&json!({
            "version": SERIALIZE_VERSION,
            "data": self,
        }))
        .map_err(|_| error_code(INVALID_JSON))
    }

    pub fn from_serialized(value: &str) -> Result<Self, ErrorCode> {
        let envelope: Envelope =
            serde_json::from_str(value).map_err(|_| error_code(INVALID_JSON))?;

        if envelope.version != SERIALIZE_VERSION {
            return Err(error_code(INVALID_JSON));
        }

        Ok(envelope.data)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
