use rst_common::with_errors::thiserror::{self, Error};

use prople_vessel_proof::command::types::ErrorCode;
use prople_vessel_proof::proof::types::ProofError;

#[derive(Debug, Error, PartialEq)]
pub enum ProofdError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("engine error: {0}")]
    EngineError(ErrorCode),

    #[error("proof error: {0}")]
    ProofError(#[from] ProofError),

    #[error("exchange error: {0}")]
    ExchangeError(String),
}
