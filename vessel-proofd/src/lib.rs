//! `prople-vessel-proofd` drives a complete verifier side proof exchange
//! against the in-memory engine, using a TOML file to describe the request
//! and the answer of the simulated holder.
pub mod common;
pub mod config;
pub mod errors;
pub mod svc;
