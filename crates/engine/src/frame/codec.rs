//! Turning one entity into a frame and one frame back into a payload.

use std::io::{Read, Write};

use save_codec::CodecRegistry;
use tracing::trace;

use super::{ScratchBuffer, read_frame_header, write_frame};
use crate::entity::{EntityFailure, EntityHandle, serialize_entity};
use crate::error::{PersistenceError, Result};

/// Outcome of encoding one entity.
#[derive(Debug)]
pub(crate) enum Encoded {
    /// The frame was appended; `bytes` is its size on disk.
    Written { bytes: u64 },
    /// The entity failed and nothing was appended.
    Skipped(EntityFailure),
}

/// Serializes `handle` into the scratch arena and appends it as a frame.
///
/// Entity failures are contained and reported as [`Encoded::Skipped`];
/// nothing reaches `out` unless the entity finished cleanly. Only I/O errors
/// on `out` are returned as `Err`.
pub(crate) fn encode_entity<W: Write>(
    scratch: &mut ScratchBuffer,
    codecs: &CodecRegistry,
    identity: &str,
    handle: &EntityHandle,
    out: &mut W,
    max_frame_len: usize,
) -> Result<Encoded> {
    if let Err(failure) = scratch.record(|sink| serialize_entity(handle, sink, codecs)) {
        scratch.reset();
        return Ok(Encoded::Skipped(failure));
    }

    if scratch.len() > max_frame_len {
        let failure = EntityFailure::Oversized {
            len: scratch.len(),
            limit: max_frame_len,
        };
        scratch.reset();
        return Ok(Encoded::Skipped(failure));
    }

    let bytes = write_frame(out, identity, scratch.payload())?;
    trace!(
        target: "save_engine::frame",
        identity,
        payload_len = scratch.len(),
        "Encoded frame"
    );

    Ok(Encoded::Written { bytes })
}

/// Reads the next frame, leaving exactly its payload in the scratch arena.
///
/// The stream always ends up positioned past the whole frame, regardless of
/// how much of the payload a consumer later reads.
pub(crate) fn read_frame<R: Read>(
    source: &mut R,
    scratch: &mut ScratchBuffer,
    max_frame_len: usize,
) -> Result<String> {
    let header = read_frame_header(source, max_frame_len)?;
    scratch
        .fill_from(source, header.payload_len)
        .map_err(|e| {
            PersistenceError::truncated(e, format!("payload of frame `{}`", header.identity))
        })?;

    trace!(
        target: "save_engine::frame",
        identity = %header.identity,
        payload_len = header.payload_len,
        "Read frame"
    );

    Ok(header.identity)
}
