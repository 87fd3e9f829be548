//! docshare - share PDF and Excel files behind short slug URLs
//!
//! This crate provides:
//! - A slug registry mapping `/<slug>` to file metadata in an embedded redb database
//! - Swappable byte storage (local filesystem, embedded in redb, GCS)
//! - An Excel materializer that renders workbooks as HTML tables
//! - A REST API and server-rendered pages with an admin login

pub mod api;
pub mod config;
pub mod object_store;
pub mod pages;
pub mod registry;
pub mod slug;
pub mod spreadsheet;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use config::Config;
use pages::Pages;
use registry::FileRegistry;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub registry: FileRegistry,
    pub pages: Pages,
    /// Value of the admin session cookie for this process.
    pub session_token: String,
}
