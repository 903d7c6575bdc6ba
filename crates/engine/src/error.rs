//! Error types raised by the save engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityFailure;

/// Errors that fail a whole save, load or store operation.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("save file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid save format: bad magic 0x{magic:08X}")]
    InvalidFormat { magic: u32 },

    #[error("save format version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("no live entities to save")]
    EmptySaveSet,

    #[error("frame `{identity}` is {len} bytes, limit is {limit}")]
    FrameTooLarge {
        identity: String,
        len: usize,
        limit: usize,
    },

    #[error("invalid save name `{0}`")]
    InvalidName(String),

    #[error("failed to commit {}", path.display())]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistenceError {
    /// Maps a short read to [`CorruptedData`](Self::CorruptedData) naming
    /// what was being read; other I/O errors pass through.
    pub(crate) fn truncated(error: std::io::Error, what: impl std::fmt::Display) -> Self {
        if error.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::CorruptedData(format!("truncated {what}"))
        } else {
            Self::Io(error)
        }
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Reasons an entity is rejected by the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("entity identity is empty")]
    EmptyIdentity,

    #[error("entity `{identity}` is already registered")]
    AlreadyRegistered { identity: String },

    #[error("identity `{identity}` already belongs to another entity")]
    IdentityTaken { identity: String },

    #[error("entity identity could not be read")]
    IdentityUnavailable(#[source] EntityFailure),
}
