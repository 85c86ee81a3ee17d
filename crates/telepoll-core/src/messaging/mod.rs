//! Wire model and ports shared by the core and the transport adapters.

pub mod port;
pub mod types;
