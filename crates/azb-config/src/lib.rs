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

//! Configuration for azblob-manager
//!
//! Settings are an explicit value built by the entry point and handed to the storage
//! managers; nothing here reads global state after loading.
//!
//! # Features
//!
//! - Multi-format configuration files (TOML, YAML, JSON)
//! - Environment variable overrides with `AZB_` prefix
//! - Validation of container names and logging options
//! - `Debug` output that never prints the connection string
//!
//! # Example
//!
//! ```no_run
//! use azb_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = ConfigLoader::new();
//!     let settings = loader.load_with_overrides("azb.toml").await?;
//!
//!     println!("Managing containers: {:?}", settings.storage.containers);
//!     println!("Downloads go to: {}", settings.storage.download_dir.display());
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader};
pub use schema::*;
pub use validation::Validator;
