//! Domain types and pure logic for the account batch workflow.
//!
//! Everything in this crate is free of I/O: wire records, progress
//! snapshots, upload validation, number formatting, the results table
//! model, the session phase machine, and the theme/notification types.
//! The HTTP client and the controller build on top of it.

pub mod error;
pub mod format;
pub mod notification;
pub mod progress;
pub mod records;
pub mod results;
pub mod session;
pub mod theme;
pub mod types;
pub mod upload;
