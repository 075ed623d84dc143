//! Upload/progress controller for batch account jobs.
//!
//! [`UploadController`] owns one session at a time: it validates and
//! submits a spreadsheet, polls the job on a fixed period, renders the
//! results through a [`View`], and handles cancellation, reset, tab
//! switching and downloads. The backend is reached through
//! [`acctbatch_client::BatchApi`], so both collaborators can be swapped
//! out in tests.

pub mod controller;
pub mod notifier;
pub mod poller;
pub mod preferences;
pub mod session;
pub mod view;

pub use controller::{ControllerConfig, ControllerError, SubmitStage, UploadController};
pub use poller::{PollOutcome, PollStep};
pub use preferences::{PreferenceError, PreferenceStore};
pub use view::{CancelControl, Panel, StateView, View, ViewState};
