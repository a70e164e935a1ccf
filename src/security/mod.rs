//! Access control for commands.
//!
//! Two independent gates:
//! - **Authorization**: platform-role checks for moderation and welcome
//!   configuration, fetched fresh from the platform on every call.
//! - **Owner gate / blacklist**: purely local checks against the configured
//!   bot owners and the in-memory blacklist.

mod auth;
mod gate;

pub use auth::{Authorizer, Capability, Denial};
pub use gate::{Blacklist, OwnerGate};
