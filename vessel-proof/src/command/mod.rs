//! `command` correlates asynchronous engine replies with the callers that are waiting for them
//!
//! Each asynchronous operation follows the same round trip:
//!
//! ```text
//! caller ── submit ──► Correlator ── dispatch(handle, command) ──► engine
//!   ▲                      │                                          │
//!   │              PendingResult<T>                                   │
//!   │                      │                                          ▼
//!   └──── await ◄──────────┴──────────── Notifier::notify(reply) ◄── engine thread
//! ```
//!
//! - A fresh [`CommandHandle`](types::CommandHandle) is allocated and its completion is stored in
//!   the shared table before the command is forwarded, so a reply that arrives before `dispatch`
//!   returns is never lost.
//! - A forward that fails synchronously removes the entry again and surfaces as
//!   [`CommandError::Submission`](types::CommandError::Submission).
//! - A reply removes its entry from the table. That removal is the only way a completion gets
//!   consumed, which makes duplicated or unknown replies harmless: they are logged and dropped.
//!
//! There is no ordering between replies of different handles, and there is no built-in
//! deadline: a command the engine never answers stays in the table until it is canceled or the
//! caller opts into [`PendingResult::wait_timeout`].
mod correlator;
pub use correlator::{Correlator, Notifier, PendingResult};

pub mod types;
