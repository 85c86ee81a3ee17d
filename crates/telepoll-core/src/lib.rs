//! Core of the telepoll bot runtime.
//!
//! This crate is intentionally transport-agnostic. The Telegram Bot API lives behind
//! ports (traits) implemented in adapter crates; the core only polls an
//! [`UpdateSource`](messaging::port::UpdateSource), advances the acknowledgment cursor and
//! routes each update to a registered handler.

pub mod config;
pub mod context;
pub mod cursor;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod poller;
pub mod registry;

pub use context::Context;
pub use dispatcher::Dispatcher;
pub use errors::{Error, Result};
pub use poller::{LoopState, PollOutcome, Poller};
pub use registry::{Flow, Handler, HandlerRegistry, MessageHandler};
