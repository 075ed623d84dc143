//! HTTP client for the batch account backend.
//!
//! [`BatchApi`] is the seam the controller talks through; [`HttpBatchApi`]
//! implements it over [`reqwest`]. Tests substitute their own
//! implementations of the trait.

pub mod api;
pub mod download;

pub use api::{BatchApi, BatchApiError, HttpBatchApi};
pub use download::DownloadedFile;
