//! State management module.
//!
//! Contains the [`Warden`], the shared state every update task works on.

mod warden;

pub use warden::Warden;
