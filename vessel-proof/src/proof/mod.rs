//! `proof` manages a single proof exchange between a verifier and a holder
//!
//! The verifier creates a proof request, sends it over an established connection,
//! fetches the holder's response and finally accepts it. Each step except the
//! acceptance marking and the release is an asynchronous command resumed through
//! the [`Correlator`](crate::command::Correlator).
//!
//! ```text
//! Initialized ── send_request ──► RequestSent ── get_proof / update_state ──► ProofReceived
//!                                      │                                          │
//!                                      └──────────────► Rejected         accepted ▼
//!                                                                              Accepted
//! ```
//!
//! `serialize` and `deserialize` can be used from any state and never change it.
//! `release` is valid from every state and ends the handle's life.
pub mod types;
pub mod usecase;
