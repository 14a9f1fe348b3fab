//! Activity Monitor - interaction logging with suspicious activity detection
//!
//! The monitor ingests classified user interactions (clicks, key presses,
//! focus changes), keeps an append-only log and running counters, scores the
//! overall activity and raises auto-expiring warnings for rapid clicking or a
//! high score.
//!
//! Pipeline: raw interaction → classifier → logger → (counters, click window,
//! score, detector) → observers.
//!
//! ## Modules
//!
//! - **Core**: [`logger`], [`window`], [`scoring`], [`detector`]
//! - **Input**: [`schema`] classifies raw platform records
//! - **Output**: [`report`] text export and snapshots, [`view`] bounded display

pub mod clock;
pub mod config;
pub mod detector;
pub mod error;
pub mod logger;
pub mod report;
pub mod schema;
pub mod scoring;
pub mod types;
pub mod view;
pub mod window;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::MonitorConfig;
pub use detector::{ExpiryToken, SuspicionDetector, WarningKind, WarningSignal, WarningState};
pub use error::MonitorError;
pub use logger::{ActivityLogger, IngestOutcome, MonitorObserver};
pub use report::{format_report, MonitorSnapshot};
pub use schema::{ClassifyError, InteractionClassifier, RawInteraction};
pub use scoring::compute_score;
pub use types::{ActivityStats, Counters, EventKind, InteractionEvent, LogEntry};
pub use view::LogView;
pub use window::ClickWindow;

/// Library version
pub const MONITOR_VERSION: &str = env!("CARGO_PKG_VERSION");
