//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`, `Coach`, `DiscussionMode`)
//! - `gateway`: Trait for the remote session service

mod gateway;
mod model;

pub use gateway::SessionGateway;
pub use model::{Coach, CreateSessionRequest, DiscussionMode, Session};
