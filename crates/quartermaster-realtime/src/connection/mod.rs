//! Connection lifecycle: backoff, state machine and transport.

pub mod backoff;
pub mod connector;
pub mod state;
