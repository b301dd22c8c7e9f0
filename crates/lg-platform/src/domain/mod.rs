//! Domain Models
//!
//! Core intake entities and the qualification rules that screen them.

pub mod application;
pub mod qualification;

pub use application::*;
pub use qualification::*;
