use std::collections::{HashMap, HashSet};

use tracing::{debug, error, info, warn};

use crate::context::SaveContext;
use crate::entity::{EntityHandle, restore_entity};
use crate::error::Result;
use crate::frame::{FileHeader, read_frame};
use crate::report::LoadReport;

impl SaveContext {
    /// Restores live entities from the save called `name`.
    ///
    /// Each frame goes to the live entity with the same identity; frames with
    /// no live counterpart replace the previous contents of the dead-data
    /// cache. Once the frames are exhausted, every live entity that received
    /// nothing is restored with no source so it can fall back to defaults.
    ///
    /// A missing file or a bad header fails before anything changes. A frame
    /// that cannot be read ends the frame sweep; unclaimed entities are still
    /// defaulted and the read error is returned afterwards. Entities that fail
    /// to restore are listed in [`LoadReport::failed`] and do not fail the load.
    pub fn load(&mut self, name: &str) -> Result<LoadReport> {
        let (path, mut source) = self.store.open(name)?;
        let header = FileHeader::read_from(&mut source)?;
        let frame_count = header.validate().inspect_err(|e| {
            error!(
                target: "save_engine::load",
                path = %path.display(),
                error = %e,
                "Rejected save header"
            );
        })?;

        self.dead_data.clear();

        let live = self.registry.live_entries();
        let by_identity: HashMap<&str, &EntityHandle> = live
            .iter()
            .map(|(identity, handle)| (identity.as_str(), handle))
            .collect();

        let mut report = LoadReport {
            path,
            ..LoadReport::default()
        };
        let mut seen = HashSet::new();
        let mut claimed = HashSet::with_capacity(live.len());
        let mut sweep_error = None;

        for _ in 0..frame_count {
            let identity =
                match read_frame(&mut source, &mut self.scratch, self.config.max_frame_len) {
                    Ok(identity) => identity,
                    Err(e) => {
                        sweep_error = Some(e);
                        break;
                    }
                };
            report.frames += 1;

            if !seen.insert(identity.clone()) {
                warn!(
                    target: "save_engine::load",
                    identity = %identity,
                    "Duplicate frame ignored"
                );
                report.ignored += 1;
                continue;
            }

            let Some(handle) = by_identity.get(identity.as_str()) else {
                debug!(
                    target: "save_engine::load",
                    identity = %identity,
                    payload_len = self.scratch.len(),
                    "No live entity, caching frame"
                );
                self.dead_data.capture(&identity, self.scratch.payload());
                report.cached += 1;
                continue;
            };

            let mut reader = self.scratch.reader();
            if let Err(failure) = restore_entity(handle, Some(&mut reader), &self.codecs) {
                error!(
                    target: "save_engine::load",
                    identity = %identity,
                    error = %failure,
                    "Entity failed to restore"
                );
                report.failed.push(identity.clone());
            }
            report.dispatched += 1;
            claimed.insert(identity);
        }

        for (identity, handle) in &live {
            if claimed.contains(identity) {
                continue;
            }
            if let Err(failure) = restore_entity(handle, None, &self.codecs) {
                error!(
                    target: "save_engine::load",
                    identity = %identity,
                    error = %failure,
                    "Entity failed to restore defaults"
                );
                report.failed.push(identity.clone());
            }
            report.defaulted += 1;
        }

        if let Some(e) = sweep_error {
            error!(
                target: "save_engine::load",
                path = %report.path.display(),
                frames_read = report.frames,
                frames_declared = frame_count,
                error = %e,
                "Save file is damaged, frame sweep stopped early"
            );
            return Err(e);
        }

        info!(
            target: "save_engine::load",
            path = %report.path.display(),
            frames = report.frames,
            dispatched = report.dispatched,
            cached = report.cached,
            defaulted = report.defaulted,
            ignored = report.ignored,
            failed = report.failed.len(),
            "Loaded"
        );

        Ok(report)
    }
}
