//! View Module - rendered buffers, layout and windowing
//!
//! - `buffer`: the `ViewBuffer` seam and the in-memory `TextBuffer`
//! - `whitespace`: the layout pass that rebuilds markers and offsets
//! - `window`: the windowing engine (`ViewInitializer`)
//! - `events`: caret and modification events

pub mod buffer;
pub mod events;
pub mod whitespace;
pub mod window;

pub use buffer::{DualView, TextBuffer, ViewBuffer};
pub use events::{EventBus, SubscriberId, ViewEvent};
pub use whitespace::{set_white_space, Layout};
pub use window::{Direction, ViewInitializer};
