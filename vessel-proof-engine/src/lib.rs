//! `prople-vessel-proof-engine` is an in-memory engine for the proof exchange binding
//!
//! It implements [`EngineBuilder`](prople_vessel_proof::proof::types::EngineBuilder) by
//! keeping proof records in a handle table and answering every asynchronous request from
//! a worker thread through the [`Notifier`](prople_vessel_proof::command::Notifier) it is
//! built with. It simulates the message flow and the lifecycle only: a presentation is
//! `Validated` when it is a well formed JSON object, no cryptography is involved.
//!
//! Connections are simulated as well, so a whole exchange can be played locally:
//!
//! ```rust,ignore
//! let correlator = Correlator::new();
//! let engine = MemoryEngine::new(correlator.notifier());
//! let connection = engine.connect();
//!
//! let uc = Usecase::new(engine.clone(), correlator);
//! let proof = uc.create(source_id, attrs, predicates, name)?.await?;
//! uc.send_request(proof, connection)?.await?;
//!
//! engine.present(connection, presentation)?;
//! let state = uc.update_state(proof)?.await?;
//! ```
mod engine;
pub use engine::MemoryEngine;

mod record;
pub use record::ProofRecord;

pub mod types;
