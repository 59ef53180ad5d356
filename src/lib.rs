//! dualview - Print and braille views over one mutable XML document
//!
//! Layers:
//! dom:       arena tree, loader, serializer, traversal axes
//! init:      node classification and partitioning into sections
//! map:       mapped elements, the live MapList, stable caret handles
//! view:      whitespace layout, windowing, view buffers, events
//! search:    parallel lookup of nodes in out-of-window sections
//! edit:      edit handlers (mutate, patch, reformat, re-anchor)
//! translate: the seam to the external braille engine
//! session:   the single writer tying the above together

pub mod config;
pub mod dom;
pub mod edit;
pub mod error;
pub mod init;
pub mod map;
pub mod search;
pub mod session;
pub mod translate;
pub mod view;
pub mod vocab;

pub use config::ViewConfig;
pub use dom::{Document, DocumentAccess, NodeId};
pub use edit::{EditOutcome, Position};
pub use error::{EditError, Error, MapListError, NodeContextError, Result, SearchError};
pub use init::Initializer;
pub use map::{ElementKind, MapList, MappedElement, Section, StableElementHandle, View, ViewRange, WhiteSpaceKind};
pub use search::{SearchHit, SectionMapSearcher};
pub use session::Session;
pub use translate::{EchoEngine, NullEngine, ReformatRequest, TranslationEngine};
pub use view::{Direction, DualView, TextBuffer, ViewBuffer, ViewEvent, ViewInitializer};
