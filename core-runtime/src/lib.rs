//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the scripture audio engine:
//! - Logging and tracing infrastructure
//! - Engine configuration (bridges, audio API endpoint, player defaults)
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the engine crates depend on.
//! It establishes the logging conventions, the fail-fast configuration
//! builder, and the event broadcasting mechanism hosts use to observe
//! player instances.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
