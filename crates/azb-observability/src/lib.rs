// azblob-manager - Azure Blob Storage convenience layer
// Copyright (C) 2026 azblob-manager Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! azblob-manager Observability Module
//!
//! Installs a `tracing` subscriber for applications built on `azb-storage`.
//!
//! # Features
//!
//! - **Multiple Output Formats**: Pretty, JSON, and compact output formats
//! - **Environment-based Filtering**: `RUST_LOG` when no level is configured
//! - **Settings Bridge**: build the subscriber straight from `azb_config::ObservabilitySettings`
//!
//! # Example
//!
//! ```no_run
//! use azb_observability::{init_tracing, LogFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_tracing(LogFormat::Pretty, None)?;
//!     tracing::info!("Application started");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{
    build_subscriber, init_from_settings, init_tracing, init_tracing_with_config,
};

/// Tracing re-exports for convenience
pub use tracing::{debug, error, info, span, trace, warn, Level};
