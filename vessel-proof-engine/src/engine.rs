use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use rst_common::with_logging::log::{debug, warn};

use prople_vessel_proof::command::types::{ErrorCode, Reply, ReplyPayload};
use prople_vessel_proof::command::Notifier;
use prople_vessel_proof::proof::types::{
    Command, ConnectionHandle, EngineBuilder, ProofHandle, Request,
};

use super::record::ProofRecord;
use super::types::{
    error_code, HolderMessage, ProblemReport, INVALID_CONNECTION_HANDLE, INVALID_PROOF_HANDLE,
    UNKNOWN_ERROR,
};

#[derive(Default)]
struct Connection {
    outbox: Vec<String>,
    inbox: VecDeque<(String, HolderMessage)>,
}

impl Connection {
    fn take_message(&mut self, thread_id: &str) -> Option<HolderMessage> {
        let position = self
            .inbox
            .iter()
            .position(|(thread, _)| thread == thread_id)?;

        self.inbox.remove(position).map(|(_, message)| message)
    }
}

#[derive(Default)]
struct Registry {
    next_proof: u32,
    next_connection: u32,
    proofs: HashMap<ProofHandle, ProofRecord>,
    connections: HashMap<ConnectionHandle, Connection>,
}

impl Registry {
    fn insert_proof(&mut self, record: ProofRecord) -> ProofHandle {
        self.next_proof += 1;
        let handle = ProofHandle::from(self.next_proof);
        self.proofs.insert(handle, record);
        handle
    }

    fn proof_mut(&mut self, handle: ProofHandle) -> Result<&mut ProofRecord, ErrorCode> {
        self.proofs
            .get_mut(&handle)
            .ok_or(error_code(INVALID_PROOF_HANDLE))
    }

    fn connection_mut(&mut self, handle: ConnectionHandle) -> Result<&mut Connection, ErrorCode> {
        self.connections
            .get_mut(&handle)
            .ok_or(error_code(INVALID_CONNECTION_HANDLE))
    }

    // hands the holder answer on the proof's thread to a proof still waiting for it,
    // messages of other threads stay queued
    fn deliver(
        &mut self,
        proof_handle: ProofHandle,
        connection_handle: ConnectionHandle,
    ) -> Result<(), ErrorCode> {
        let record = self.proof_mut(proof_handle)?;
        if !record.is_waiting() {
            return Ok(());
        }

        let thread_id = record.get_thread_id().to_string();
        let message = self.connection_mut(connection_handle)?.take_message(&thread_id);

        if let Some(message) = message {
            self.proof_mut(proof_handle)?.receive(message);
        }

        Ok(())
    }

    fn execute(&mut self, command: Command) -> Result<ReplyPayload, ErrorCode> {
        match command {
            Command::CreateProof {
                source_id,
                requested_attrs,
                requested_predicates,
                name,
            } => {
                let record =
                    ProofRecord::new(source_id, requested_attrs, requested_predicates, name)?;
                let handle = self.insert_proof(record);
                Ok(ReplyPayload::Integer(handle.value()))
            }
            Command::SendRequest {
                proof_handle,
                connection_handle,
            } => {
                self.connection_mut(connection_handle)?;

                let record = self.proof_mut(proof_handle)?;
                record.mark_sent(connection_handle.value())?;
                let request = record.presentation_request().to_string();

                self.connection_mut(connection_handle)?.outbox.push(request);
                Ok(ReplyPayload::Empty)
            }
            Command::GetProof {
                proof_handle,
                connection_handle,
            } => {
                let bound = self.proof_mut(proof_handle)?.get_connection_handle();
                match bound {
                    Some(bound) if bound != connection_handle.value() => {
                        return Err(error_code(INVALID_CONNECTION_HANDLE));
                    }
                    Some(_) => self.deliver(proof_handle, connection_handle)?,
                    None => (),
                }

                let (proof_state, presentation) = self.proof_mut(proof_handle)?.verify()?;
                Ok(ReplyPayload::IntegerText(proof_state, presentation))
            }
            Command::UpdateState { proof_handle } => {
                let bound = self.proof_mut(proof_handle)?.get_connection_handle();
                if let Some(connection) = bound {
                    self.deliver(proof_handle, ConnectionHandle::from(connection))?;
                }

                let state = self.proof_mut(proof_handle)?.get_state();
                Ok(ReplyPayload::Integer(state))
            }
            Command::GetState { proof_handle } => {
                let state = self.proof_mut(proof_handle)?.get_state();
                Ok(ReplyPayload::Integer(state))
            }
            Command::Serialize { proof_handle } => {
                let serialized = self.proof_mut(proof_handle)?.to_serialized()?;
                Ok(ReplyPayload::Text(serialized))
            }
            Command::Deserialize { serialized_proof } => {
                let record = ProofRecord::from_serialized(serialized_proof.as_str())?;
                let handle = self.insert_proof(record);
                Ok(ReplyPayload::Integer(handle.value()))
            }
        }
    }
}

/// `MemoryEngine` keeps proof exchange objects in process memory
///
/// Requests are checked synchronously for unknown handles, then executed on a
/// dedicated thread per command and answered through the [`Notifier`]. Replies of
/// different commands are therefore not ordered. Connections are simulated too:
/// requests sent over one land in its outbox and holder answers are queued with
/// [`MemoryEngine::present`] or [`MemoryEngine::decline`], on the thread of the
/// request they answer. A proof only ever consumes answers on its own thread.
#[derive(Clone)]
pub struct MemoryEngine {
    registry: Arc<Mutex<Registry>>,
    notifier: Notifier,
    reply_delay: Option<Duration>,
}

impl MemoryEngine {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            notifier,
            reply_delay: None,
        }
    }

    pub fn with_reply_delay(notifier: Notifier, reply_delay: Duration) -> Self {
        let mut engine = Self::new(notifier);
        engine.reply_delay = Some(reply_delay);
        engine
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn connect(&self) -> ConnectionHandle {
        let mut registry = self.registry();
        registry.next_connection += 1;

        let handle = ConnectionHandle::from(registry.next_connection);
        registry.connections.insert(handle, Connection::default());

        debug!("[engine:connect] connection opened: {handle}");
        handle
    }

    fn queue(
        &self,
        connection: ConnectionHandle,
        thread_id: String,
        message: HolderMessage,
    ) -> Result<(), ErrorCode> {
        self.registry()
            .connection_mut(connection)?
            .inbox
            .push_back((thread_id, message));

        Ok(())
    }

    /// `present` queues the holder's presentation answering the request `thread_id`
    pub fn present(
        &self,
        connection: ConnectionHandle,
        thread_id: String,
        presentation: String,
    ) -> Result<(), ErrorCode> {
        self.queue(connection, thread_id, HolderMessage::Presentation(presentation))
    }

    /// `decline` queues a holder's refusal to answer the request `thread_id`
    pub fn decline(
        &self,
        connection: ConnectionHandle,
        thread_id: String,
        report: ProblemReport,
    ) -> Result<(), ErrorCode> {
        self.queue(connection, thread_id, HolderMessage::ProblemReport(report))
    }

    /// `queued_messages` counts the holder answers not consumed yet
    pub fn queued_messages(&self, connection: ConnectionHandle) -> Result<usize, ErrorCode> {
        let queued = self.registry().connection_mut(connection)?.inbox.len();
        Ok(queued)
    }

    /// `problem_report` is the reason given by a holder that declined the proof
    pub fn problem_report(&self, proof: ProofHandle) -> Result<Option<ProblemReport>, ErrorCode> {
        let report = self.registry().proof_mut(proof)?.get_problem_report().cloned();
        Ok(report)
    }

    /// `sent_requests` lists the presentation requests delivered over the connection
    pub fn sent_requests(&self, connection: ConnectionHandle) -> Result<Vec<String>, ErrorCode> {
        let outbox = self.registry().connection_mut(connection)?.outbox.clone();
        Ok(outbox)
    }

    pub fn proof_count(&self) -> usize {
        self.registry().proofs.len()
    }

    fn precheck(&self, command: &Command) -> Result<(), ErrorCode> {
        let mut registry = self.registry();

        if let Some(proof_handle) = command.proof_handle() {
            registry.proof_mut(proof_handle)?;
        }

        match command {
            Command::SendRequest {
                connection_handle, ..
            }
            | Command::GetProof {
                connection_handle, ..
            } => {
                registry.connection_mut(*connection_handle)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl EngineBuilder for MemoryEngine {
    fn dispatch(&self, request: Request) -> Result<(), ErrorCode> {
        let op_code = request.get_command().op_code();
        if let Err(code) = self.precheck(request.get_command()) {
            debug!("[engine:{op_code}] rejected: {code}");
            return Err(code);
        }

        let engine = self.clone();
        let spawned = thread::Builder::new()
            .name(format!("proof-engine-{}", request.get_command_handle()))
            .spawn(move || {
                if let Some(delay) = engine.reply_delay {
                    thread::sleep(delay);
                }

                let (command_handle, command) = request.into_parts();
                let outcome = engine.registry().execute(command);

                let reply = match outcome {
                    Ok(payload) => Reply::success(command_handle, payload),
                    Err(code) => {
                        debug!("[engine:{op_code}] command {command_handle} failed: {code}");
                        Reply::failure(command_handle, code)
                    }
                };

                engine.notifier.notify(reply);
            });

        spawned.map(|_| ()).map_err(|err| {
            warn!("[engine:{op_code}] unable to start worker: {err}");
            error_code(UNKNOWN_ERROR)
        })
    }

    fn proof_accepted(
        &self,
        proof_handle: ProofHandle,
        response_data: String,
    ) -> Result<(), ErrorCode> {
        self.registry()
            .proof_mut(proof_handle)?
            .accept(response_data)
    }

    fn proof_release(&self, proof_handle: ProofHandle) -> Result<(), ErrorCode> {
        match self.registry().proofs.remove(&proof_handle) {
            Some(_) => {
                debug!("[engine:release] proof released: {proof_handle}");
                Ok(())
            }
            None => Err(error_code(INVALID_PROOF_HANDLE)),
        }
    }
}
