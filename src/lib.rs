//! Apertium Native - locally installed Apertium pipelines
//!
//! Locates an Apertium installation, discovers the language pairs ("modes")
//! it ships, and runs the matching shell pipeline to translate text.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod installer;
pub mod language;
pub mod modes;
pub mod platform;
pub mod settings;
pub mod setup;

pub use engine::ApertiumNative;
pub use error::{ApertiumError, Result};
