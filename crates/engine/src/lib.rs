//! Save engine for a changing set of named in-memory entities.
//!
//! Entities implement [`Persistent`] and register with a [`SaveContext`].
//! A save writes one length-prefixed frame per entity, so a load can route
//! each frame to the entity with the same identity and skip the rest without
//! understanding them. Frames that find no live entity are kept in the
//! [`DeadDataCache`] and written back by the next save, letting data for an
//! absent entity survive until the entity comes back or is handed its data
//! through [`SaveContext::recover`].
//!
//! Modules are organized by responsibility:
//! - [`context`] owns the engine state; save, load and recover are its methods
//! - [`registry`] tracks live entities and their identities
//! - [`frame`] defines the file layout and the shared scratch arena
//! - [`dead_data`] holds unclaimed frames between loads and saves
//! - [`store`] names, commits, backs up and queries save files
pub mod config;
pub mod context;
pub mod dead_data;
pub mod entity;
pub mod frame;
pub mod registry;
pub mod report;
pub mod store;

mod error;
mod pipeline;

pub use config::{DEFAULT_MAX_FRAME_LEN, EngineConfig, default_save_dir};
pub use context::SaveContext;
pub use dead_data::{DeadDataCache, DeadFrame};
pub use entity::{EntityError, EntityFailure, EntityHandle, Persistent};
pub use error::{PersistenceError, RegistryError, Result};
pub use frame::{FORMAT_VERSION, FileHeader, FrameScanner, HEADER_LEN, MAGIC, ScannedFrame, ScratchBuffer};
pub use registry::{EntityRegistry, LivenessProbe};
pub use report::{LoadReport, SaveReport};
pub use store::{BackupPolicy, SaveStore};

pub use save_codec::{
    BincodeSurrogate, ByteReader, ByteWriter, CodecError, CodecRegistry, Surrogate, ValueKind,
};
