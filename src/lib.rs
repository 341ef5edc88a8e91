//! # Folio
//!
//! Portfolio content management: projects with ordered text blocks, images,
//! and links, usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! folio = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use folio::config::FolioConfig;
//! use folio::portfolio::{Portfolio, ViewOptions};
//! use folio::store::{SqliteStore, Store};
//! use folio::types::NewProject;
//!
//! let config = FolioConfig::load("./data")?;
//! let store = SqliteStore::new(config.db_path())?;
//! store.initialize()?;
//!
//! let portfolio = Portfolio::new(Arc::new(store), &config);
//! portfolio.add_project(NewProject {
//!     name: "Red Barn".into(),
//!     project_type: Some("painting".into()),
//!     visible: Some(true),
//! })?;
//! let grouped = portfolio.all_visible(ViewOptions::default())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod portfolio;
pub mod store;
pub mod types;
