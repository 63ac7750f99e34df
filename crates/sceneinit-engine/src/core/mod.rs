//! Core engine-facing contracts.
//!
//! This module defines the stable interface between a host runtime (platform
//! loop or test double) and the application it drives.

mod app;

pub use app::{App, AppControl};
