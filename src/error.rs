//! Error types
//!
//! Structural invariant violations carry the offending node
//! ([`NodeContextError`]); caller-contract violations are
//! [`MapListError`]s; editing failures that should reach the UI as a generic
//! "edit failed" are [`EditError`]s; search task failures are surfaced as
//! [`SearchError::ChunksFailed`] rather than reported as "not found".

use thiserror::Error;

use crate::dom::{axes, DocumentAccess, NodeId};
use crate::map::WhiteSpaceKind;

/// Tree mutation misuse
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} is not an element")]
    NotElement(NodeId),

    #[error("node {0} is not a text node")]
    NotText(NodeId),

    #[error("node {0} is already attached; detach it first")]
    AlreadyAttached(NodeId),

    #[error("node {0} has no parent")]
    NoParent(NodeId),

    #[error("inserting node {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("split position {at} is past the end of node {node} ({len} chars)")]
    SplitOutOfRange { node: NodeId, at: usize, len: usize },

    #[error("the document node cannot be moved")]
    DocumentNode,
}

/// Loader failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),

    #[error("end tag </{found}> at byte {position} does not close <{expected}>")]
    MismatchedTag {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("end tag </{name}> at byte {position} has no matching start tag")]
    UnmatchedEnd { name: String, position: usize },

    #[error("malformed markup at byte {position}: {message}")]
    Malformed {
        position: usize,
        message: &'static str,
    },

    #[error("unclosed element <{0}>")]
    Unclosed(String),

    #[error("document has no root element")]
    NoRoot,
}

/// A structural invariant violation, carrying the node it was detected on
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} at node {node} ({path})")]
pub struct NodeContextError {
    pub message: String,
    pub node: NodeId,
    /// Readable ancestor path of `node`, for diagnostics
    pub path: String,
}

impl NodeContextError {
    pub fn new<D: DocumentAccess>(doc: &D, node: NodeId, message: impl Into<String>) -> Self {
        NodeContextError {
            message: message.into(),
            node,
            path: axes::describe_path(doc, node),
        }
    }
}

/// Caller-contract violations against the MapList
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapListError {
    #[error("node {0} has no mapped element in the live list")]
    NodeNotFound(NodeId),

    #[error("index {index} out of range for list of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cursor handle no longer resolves to a mapped element")]
    StaleHandle,

    #[error("offsets are stale; rebuild the window before offset queries")]
    StaleOffsets,

    #[error("element {index} is not under ancestor node {ancestor}")]
    NotUnderAncestor { index: usize, ancestor: NodeId },

    #[error("the list is empty")]
    Empty,
}

/// Editing failures, reported to the UI as a failed edit
#[derive(Debug, Error)]
pub enum EditError {
    #[error("whitespace edit failed at index {index} ({mode}): {reason}")]
    WhiteSpace {
        index: usize,
        mode: WhiteSpaceKind,
        reason: String,
    },

    #[error("element {index} is read-only")]
    ReadOnly { index: usize },

    #[error("element {index} ({kind}) cannot be edited this way")]
    NotEditable { index: usize, kind: &'static str },

    #[error("selection {start}..{end} contains no editable content")]
    EmptySelection { start: usize, end: usize },

    #[error("no following block to merge with element {index}")]
    NothingToMerge { index: usize },

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    MapList(#[from] MapListError),

    #[error(transparent)]
    NodeContext(#[from] NodeContextError),
}

/// A single section that could not be searched
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("section {section} could not be searched: {reason}")]
pub struct SectionFault {
    pub section: usize,
    pub reason: String,
}

/// Parallel search failures
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("could not build search pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{failed} of {total} search chunks failed and none found the node")]
    ChunksFailed { failed: usize, total: usize },
}

/// Failure reported by the external translation engine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("translation engine failed: {message}")]
pub struct TranslationError {
    pub message: String,
}

impl TranslationError {
    pub fn new(message: impl Into<String>) -> Self {
        TranslationError {
            message: message.into(),
        }
    }
}

/// Invalid configuration values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    NodeContext(#[from] NodeContextError),

    #[error(transparent)]
    MapList(#[from] MapListError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Crate-level result
pub type Result<T> = std::result::Result<T, Error>;
