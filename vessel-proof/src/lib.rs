//! `prople-vessel-proof` binds the verifiable credential proof exchange of an external engine
//!
//! It has two parts:
//!
//! - `command`, a correlator that matches asynchronous engine replies with the callers
//!   waiting for them, exactly once per command
//! - `proof`, the proof exchange API and its lifecycle, built on top of `command`
//!
//! The engine itself stays behind [`proof::types::EngineBuilder`]. It receives one
//! request per asynchronous operation and answers through the
//! [`command::Notifier`] it was given.
pub mod command;
pub mod proof;
