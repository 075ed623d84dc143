//! Terminal front end for the batch account controller.
//!
//! The binary wires an [`acctbatch_controller::UploadController`] to the
//! HTTP backend and renders its view as plain lines on stdout. Logs go to
//! stderr so they never interleave with tables.

pub mod cli;
pub mod config;
pub mod runner;
pub mod terminal;
