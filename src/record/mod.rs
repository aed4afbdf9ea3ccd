//! Study records
//!
//! Two kinds of entries are captured during a session:
//!
//! ```text
//! TrialResult  one per completed reading task  -> "results" log
//! Event        any number, free-form payload   -> "events" log
//! ```
//!
//! Both are immutable once recorded.
//!
//! ## Usage
//!
//! ```rust
//! use study_tracker::record::{TrialResult, UiVersion};
//!
//! let result = TrialResult::builder("p-017", UiVersion::A)
//!     .article("art-3", "science")
//!     .reading_time_sec(142.0)
//!     .max_scroll_depth(88.0)
//!     .build();
//!
//! assert_eq!(result.ui_version(), &UiVersion::A);
//! ```

mod event;
mod trial_result;

pub use event::Event;
pub use trial_result::{TrialResult, TrialResultBuilder, UiVersion};
