//! Map Module - linear projection of the tree onto the two views
//!
//! - `element`: mapped elements, their braille children and marker kinds
//! - `span`: derived view ranges
//! - `handle`: stable caret handles
//! - `section`: bounded partitions produced by the Initializer
//! - `list`: the live MapList and its queries

pub mod element;
pub mod handle;
pub mod list;
pub mod section;
pub mod span;

pub use element::{BrailleKind, BrailleMappedElement, ElementKind, Filler, MappedElement, WhiteSpaceKind};
pub use handle::StableElementHandle;
pub use list::MapList;
pub use section::Section;
pub use span::{ElementSpan, View, ViewRange};
