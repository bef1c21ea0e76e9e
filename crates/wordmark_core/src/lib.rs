//! The word marking engine.
//!
//! A mouse-up on the page is debounced by the [`HighlightService`], the live selection is then
//! snapped to word boundaries by the [`expander`], counted in the [`MarkStore`] and wrapped in
//! a marker element by the [`renderer`].
//!
//! [`MarkStore`]: mark_store::MarkStore

pub mod coordinator;
pub mod expander;
pub mod logging;
pub mod renderer;
mod service;
mod session;
mod theme;

pub use self::coordinator::{DebounceState, Debouncer, DEFAULT_DEBOUNCE_DELAY};
pub use self::expander::{expand, ExpandError, Expansion};
pub use self::renderer::{class_name, remove_markers, render, restore_marks, RenderError};
pub use self::service::{
    HighlightEvent, HighlightService, PageEvent, PipelineError, SharedDocument,
};
pub use self::session::{start, Session};
pub use self::theme::{Theme, ThemeSignal};
