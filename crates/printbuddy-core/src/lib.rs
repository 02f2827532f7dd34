//! # printbuddy-core
//!
//! Core PrintBuddy data model and orchestration engine.
//!
//! This crate provides:
//! - Configuration and telemetry types (system, clock, weather, sensor,
//!   display, printers)
//! - Backend contracts for printers, sensors, displays and weather
//! - The id-indexed backend registry
//! - The flat `key=value` settings store
//! - The orchestration engine driving one foreground iteration
//!
//! This crate is intentionally runtime-agnostic and contains no async code
//! and no sockets, so it can be driven from a bare foreground loop on a
//! microcontroller as well as from the Linux runner.

pub mod backend;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod model;
pub mod registry;
pub mod settings;
pub mod text;

pub use backend::*;
pub use engine::{Engine, PrinterSyncOutcome};
pub use error::{ErrorClass, SettingsError};
pub use model::*;
pub use registry::Registry;
pub use settings::{DirFs, MemoryFs, SettingsFs, SettingsStore};
pub use text::{FixedText, TextTooLong};
