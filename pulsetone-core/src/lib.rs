//! Tone synthesis and haptic intensity simulation behind the "play a tone"
//! and "vibrate at a level" commands.
//!
//! Both components are synchronous and own at most one output resource on
//! their sink at a time. Starting a new tone or vibration always releases
//! the previous one first.

pub mod analysis;
pub mod config;
pub mod error;
pub mod haptic;
pub mod session;
pub mod synth;

pub use error::{Error, Result, SinkError};
