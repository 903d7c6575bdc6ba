use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::context::SaveContext;
use crate::error::{PersistenceError, Result};
use crate::frame::{Encoded, FileHeader, HEADER_LEN, encode_entity, patch_frame_count, write_frame};
use crate::report::SaveReport;

impl SaveContext {
    /// Writes every live entity, then every unclaimed dead-data frame, to the
    /// save called `name`.
    ///
    /// The file is written beside the target and only replaces it once
    /// complete. An entity that fails to serialize is left out and listed in
    /// [`SaveReport::failed`]; the save itself still succeeds. Dead or
    /// unreadable entities are dropped from the registry first, and if none
    /// remain the save fails with [`PersistenceError::EmptySaveSet`] without
    /// touching the disk.
    pub fn save(&mut self, name: &str) -> Result<SaveReport> {
        let live = self.registry.validate();
        if live.is_empty() {
            warn!(target: "save_engine::save", name, "No live entities to save");
            return Err(PersistenceError::EmptySaveSet);
        }

        let mut file = self.store.begin_write(name)?;
        FileHeader::new(0).write_to(&mut file)?;

        let mut bytes = HEADER_LEN;
        let mut written = HashSet::with_capacity(live.len());
        let mut failed = Vec::new();

        for (identity, handle) in &live {
            let outcome = encode_entity(
                &mut self.scratch,
                &self.codecs,
                identity,
                handle,
                &mut file,
                self.config.max_frame_len,
            )?;
            match outcome {
                Encoded::Written { bytes: frame } => {
                    bytes += frame;
                    written.insert(identity.as_str());
                }
                Encoded::Skipped(failure) => {
                    error!(
                        target: "save_engine::save",
                        identity = %identity,
                        error = %failure,
                        "Entity failed to serialize, left out of save"
                    );
                    failed.push(identity.clone());
                }
            }
        }

        let mut passthrough = 0;
        for (identity, payload) in self.dead_data.iter() {
            if written.contains(identity) {
                debug!(
                    target: "save_engine::save",
                    identity,
                    "Cached frame superseded by live entity"
                );
                continue;
            }
            bytes += write_frame(&mut file, identity, payload)?;
            passthrough += 1;
        }

        let frames = written.len() + passthrough;
        let frame_count = i32::try_from(frames).map_err(|_| {
            PersistenceError::CorruptedData(format!("{frames} frames exceed the file format limit"))
        })?;
        patch_frame_count(&mut file, frame_count)?;

        let path = file.target().to_path_buf();
        self.store.commit(file)?;

        let report = SaveReport {
            path,
            written: written.len(),
            total: live.len(),
            passthrough,
            failed,
            bytes,
        };

        info!(
            target: "save_engine::save",
            path = %report.path.display(),
            written = report.written,
            total = report.total,
            passthrough = report.passthrough,
            failed = report.failed.len(),
            bytes = report.bytes,
            "Saved"
        );

        Ok(report)
    }
}
