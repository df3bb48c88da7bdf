//! Core types and configuration for werf.
//!
//! This crate defines the `werf.toml` schema ([`WerfConfig`]), the
//! repository-relative path helpers every matcher and walker agrees on
//! ([`path`]), walk tracing options ([`TraceOptions`]), and shared error types.

pub mod config;
pub mod error;
pub mod path;
pub mod trace;

pub use config::{GitMapping, ImageConfig, ProjectConfig, TraceConfig, WerfConfig};
pub use error::{Error, Result};
pub use trace::TraceOptions;
