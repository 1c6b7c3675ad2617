//! Request domain entities and the transition graph.

pub mod model;
pub mod status;
pub mod transition;

pub use model::{NewRequest, Request};
pub use status::{RequestPriority, RequestStatus, RequestType};
pub use transition::Transition;
