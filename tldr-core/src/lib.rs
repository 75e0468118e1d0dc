//! tldr core - page cache synchronization and resolution
//!
//! Keeps a local mirror of the tldr pages archive, resolves a command to the
//! best page for the current platform and language, refreshes the mirror
//! once when a page is missing, and reports when the mirror is stale.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod pages;
pub mod remote;

pub use client::{Client, LookupOptions};
pub use config::TldrConfig;
pub use error::{RefreshStage, Result, TldrError};
pub use pages::{Platform, RenderMode};
