//! Height-aware multi-line text truncation.
//!
//! `text-ellipsis` cuts a plain or markup text at a separator boundary so that
//! the kept prefix, followed by an ellipsis and an optional "append"
//! affordance, fits the height of the element displaying it. Layout is never
//! computed here: callers inject an [`OverflowProbe`] (or a [`RenderTarget`]
//! driven by an [`EllipsisController`]) that renders a candidate and reports
//! whether it overflows.
//!
//! Re-truncation is coalesced by an [`UpdateScheduler`] with an immediate and
//! a debounced queue so bursts of text, visibility and viewport changes run
//! the measurement search once.
//!
//! ```
//! use text_ellipsis::{DisplayContent, EllipsisConfig, TextSource, TruncationEngine};
//!
//! let config = EllipsisConfig::default();
//! let source = TextSource::plain("The quick brown fox jumps over the lazy dog");
//! // Four words fit.
//! let mut probe = |content: &DisplayContent| {
//!     content.as_str().trim_end_matches('…').split(' ').count() > 4
//! };
//! let result = TruncationEngine::new().truncate(&source, &config, &mut probe);
//! assert_eq!(result.displayed_text(), "The quick brown fox…");
//! assert!(result.is_truncated);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod breakpoints;
pub mod cell_box;
pub mod config;
pub mod controller;
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod driver;
pub mod engine;
pub mod error;
pub mod markup;
pub mod scheduler;
pub mod source;
pub mod subscription;
pub mod target;
pub mod viewport;

pub use breakpoints::CandidateBreakpoints;
pub use cell_box::CellBox;
pub use config::{
    EllipsisConfig, EllipsisConfigFile, SchedulerConfig, SearchStrategy, Separator, SeparatorSpec,
    APPEND_CLASS, DEFAULT_ELLIPSIS,
};
pub use controller::{AppendClick, ControllerTask, EllipsisController, EllipsisState};
#[cfg(feature = "async")]
pub use driver::{drive, ControllerEvent};
pub use engine::{
    ContentKind, DisplayContent, OverflowProbe, TruncationEngine, TruncationResult,
    MIN_SLICE_CHARS,
};
pub use error::EllipsisError;
pub use markup::MarkupMap;
pub use scheduler::{CoalescingQueue, QueueId, UpdateScheduler};
pub use source::TextSource;
pub use subscription::Subscription;
pub use target::{BoxMetrics, InlineStyle, LayoutConstraint, RenderTarget};
pub use viewport::{ResizeFilter, ViewportSize};
