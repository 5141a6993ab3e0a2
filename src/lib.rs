// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Predictor: image upload & classification widget
//!
//! A headless rendition of an upload widget. A file is picked or dropped,
//! previewed, posted to a remote `/predict` endpoint, and the returned
//! predictions (or an error) are rendered into a result list.

pub mod client;
pub mod config;
pub mod error;
pub mod prediction;
pub mod reactor;
pub mod render;
pub mod watcher;
pub mod widget;

pub use config::AppConfig;
pub use error::{PredictorError, Result};
