#![warn(clippy::pedantic)]
// Noisy doc/signature lints — would require annotating most pub functions
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
// Style preference — keeping format!("{}", x) over format!("{x}") for readability with complex exprs
#![allow(clippy::uninlined_format_args)]

//! Engagement core for a group-chat LLM bot.
//!
//! Decides, per inbound message, whether the bot should reply and how much
//! conversational context the reply generator gets, while keeping that context
//! bounded over an unbounded message stream. Chat-platform delivery, LLM
//! completion, and durable storage are consumed as ports ([`ports`]); this
//! crate owns the decision and memory logic only.

pub mod activity;
pub mod config;
pub mod engine;
pub mod errors;
pub mod interest;
pub mod memory;
pub mod message;
pub mod ports;
pub mod triggers;

pub use errors::{BarnacleError, BarnacleResult};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
