use std::time::Duration;

use rst_common::with_logging::log::{debug, info, warn};
use rst_common::with_tracing::tracing_subscriber::{
    self, layer::SubscriberExt, util::SubscriberInitExt,
};

use prople_vessel_proof::command::types::FromReply;
use prople_vessel_proof::command::{Correlator, PendingResult};
use prople_vessel_proof::proof::types::{
    ProofAPI, ProofError, ProofHandle, ProofState, VerificationState,
};
use prople_vessel_proof::proof::usecase::Usecase;
use prople_vessel_proof_engine::types::request_thread_id;
use prople_vessel_proof_engine::MemoryEngine;

use crate::common::helpers;
use crate::config::{Config, Exchange as ExchangeConfig, Parser};
use crate::errors::ProofdError;

/// `ExchangeReport` summarizes a finished exchange
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeReport {
    pub proof_handle: ProofHandle,
    pub restored_handle: ProofHandle,
    pub verification: VerificationState,
    pub final_state: ProofState,
    pub restored_state: ProofState,
}

pub struct Exchange {
    config: String,
}

impl Exchange {
    pub fn new(config: String) -> Self {
        Self { config }
    }

    /// `svc` loads and validates the configuration, installs the tracing
    /// subscriber and prepares a [`Runner`]. It must only be called once per process
    pub fn svc(&self) -> Result<Runner, ProofdError> {
        let config = Parser::new(self.config.to_owned())
            .parse()
            .map_err(|err| ProofdError::ConfigError(err.to_string()))?;

        helpers::validate(config.clone())
            .map_err(|err| ProofdError::ConfigError(err.to_string()))?;

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    config.app().log_filter(env!("CARGO_CRATE_NAME")).into()
                }),
            )
            .with(tracing_subscriber::fmt::layer().without_time())
            .init();

        debug!("[exchange:svc] config loaded: {}", config.app().get_name());
        Ok(Runner::new(&config))
    }
}

pub struct Runner {
    exchange: ExchangeConfig,
    correlator: Correlator,
    engine: MemoryEngine,
    usecase: Usecase<MemoryEngine>,
}

impl Runner {
    pub fn new(config: &Config) -> Self {
        let correlator = Correlator::new();
        let engine = MemoryEngine::new(correlator.notifier());
        Self::with_engine(config.exchange().clone(), correlator, engine)
    }

    pub fn with_engine(
        exchange: ExchangeConfig,
        correlator: Correlator,
        engine: MemoryEngine,
    ) -> Self {
        let usecase = Usecase::new(engine.clone(), correlator.clone());
        Self {
            exchange,
            correlator,
            engine,
            usecase,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.correlator.pending_count()
    }

    async fn wait<T>(&self, op: &str, pending: PendingResult<T>) -> Result<T, ProofdError>
    where
        T: FromReply<Error = ProofError>,
    {
        let timeout: Duration = self.exchange.get_timeout();
        let command_handle = pending.command_handle();

        pending.wait_timeout(timeout).await.map_err(|err| {
            warn!("[exchange:{op}] command {command_handle} failed: {err}");
            ProofdError::from(err)
        })
    }

    /// `run` walks a proof through its whole verifier side lifecycle
    ///
    /// The holder is simulated by queueing the configured presentation on the
    /// connection right after the request has been sent. The exchange stops at
    /// the first failing step.
    pub async fn run(&self) -> Result<ExchangeReport, ProofdError> {
        let uc = &self.usecase;
        let connection = self.engine.connect();
        let (requested_attrs, requested_predicates) = self.exchange.get_requested();

        let proof_handle = self
            .wait(
                "create",
                uc.create(
                    self.exchange.get_source_id(),
                    requested_attrs,
                    requested_predicates,
                    self.exchange.get_name(),
                )?,
            )
            .await?;
        info!("[exchange:create] proof created: {proof_handle}");

        self.wait("send_request", uc.send_request(proof_handle, connection)?)
            .await?;
        info!("[exchange:send_request] request sent over connection: {connection}");

        let request = self
            .engine
            .sent_requests(connection)
            .map_err(ProofdError::EngineError)?
            .pop()
            .ok_or(ProofdError::ExchangeError(
                "no presentation request on the connection".to_string(),
            ))?;
        let thread_id = request_thread_id(&request).map_err(ProofdError::EngineError)?;

        self.engine
            .present(connection, thread_id.to_owned(), self.exchange.get_presentation())
            .map_err(ProofdError::EngineError)?;
        debug!("[exchange:present] holder presentation queued on thread: {thread_id}");

        let state = self
            .wait("update_state", uc.update_state(proof_handle)?)
            .await?;
        if state != ProofState::ProofReceived {
            return Err(ProofdError::ExchangeError(format!(
                "unexpected state after update: {:?}",
                state
            )));
        }

        let result = self
            .wait("get_proof", uc.get_proof(proof_handle, connection)?)
            .await?;
        let verification = result.get_proof_state();
        info!("[exchange:get_proof] verification: {:?}", verification);

        if verification != VerificationState::Validated {
            return Err(ProofdError::ExchangeError(format!(
                "presentation not validated: {:?}",
                verification
            )));
        }

        uc.accepted(proof_handle, result.get_response_data().to_string())?;
        info!("[exchange:accepted] proof accepted: {proof_handle}");

        let serialized = self.wait("serialize", uc.serialize(proof_handle)?).await?;
        let restored_handle = self
            .wait("deserialize", uc.deserialize(serialized)?)
            .await?;
        debug!("[exchange:deserialize] proof restored as: {restored_handle}");

        let final_state = self.wait("get_state", uc.get_state(proof_handle)?).await?;
        let restored_state = self
            .wait("get_state", uc.get_state(restored_handle)?)
            .await?;

        if final_state != restored_state {
            return Err(ProofdError::ExchangeError(format!(
                "restored state mismatch: {:?} != {:?}",
                final_state, restored_state
            )));
        }

        uc.release(proof_handle)?;
        uc.release(restored_handle)?;
        debug!("[exchange:release] proofs released");

        Ok(ExchangeReport {
            proof_handle,
            restored_handle,
            verification,
            final_state,
            restored_state,
        })
    }
}
