//! Error type for the out-of-core collaborators (the OS chunk source and
//! standalone [`crate::heap::Heap`] construction).
//!
//! The core allocation/deallocation engine never returns a `Result`: its
//! public contract (SPEC_FULL.md §6) is "pointer or null", mirroring `malloc`.
//! `AllocError` exists for the one real fallible collaborator underneath it
//! (extending the heap) and for config validation in [`crate::config`].

use thiserror::Error;

/// Category of allocation failure, kept small and matching the three error
/// kinds the allocator actually distinguishes (see SPEC_FULL.md §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum AllocErrorKind {
    /// The OS refused to extend the heap (e.g. `mmap` returned `MAP_FAILED`).
    #[error("out of memory")]
    OutOfMemory,
    /// A size computation would overflow `usize`.
    #[error("size overflow")]
    SizeOverflow,
    /// A configuration value violates one of the invariants in [`crate::config`].
    #[error("invalid configuration")]
    InvalidConfig,
}

/// Error returned by the [`crate::os::ChunkSource`] collaborator and by
/// [`crate::config::HeapConfig`] validation.
#[derive(Debug, Clone, Copy, Error)]
#[error("{kind}{}", .message.map(|m| format!(": {m}")).unwrap_or_default())]
pub struct AllocError {
    kind: AllocErrorKind,
    message: Option<&'static str>,
}

impl AllocError {
    /// Builds an error of the given kind with no extra context.
    pub const fn new(kind: AllocErrorKind) -> Self {
        Self { kind, message: None }
    }

    /// Builds an error of the given kind with a static message.
    pub const fn with_message(kind: AllocErrorKind, message: &'static str) -> Self {
        Self { kind, message: Some(message) }
    }

    /// The category of failure.
    pub const fn kind(&self) -> AllocErrorKind {
        self.kind
    }
}

/// Convenience alias for the one fallible collaborator boundary in this crate.
pub type AllocResult<T> = Result<T, AllocError>;
