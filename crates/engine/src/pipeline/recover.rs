use save_codec::ByteReader;
use tracing::{debug, error, info};

use crate::context::SaveContext;
use crate::entity::{EntityFailure, EntityHandle, read_identity, restore_entity};

impl SaveContext {
    /// Hands `entity` the dead data cached under its identity, if any.
    ///
    /// Returns `Ok(false)` without calling the entity when nothing is cached.
    /// Otherwise the cache entry is consumed, whether or not the restore
    /// succeeds, so a second call is a no-op until the next load.
    pub fn recover(&mut self, entity: &EntityHandle) -> Result<bool, EntityFailure> {
        let identity = read_identity(entity)?;
        let Some(payload) = self.dead_data.take(&identity) else {
            debug!(
                target: "save_engine::dead_data",
                identity = %identity,
                "Nothing cached to recover"
            );
            return Ok(false);
        };

        let mut reader = ByteReader::new(&payload);
        restore_entity(entity, Some(&mut reader), &self.codecs).inspect_err(|failure| {
            error!(
                target: "save_engine::dead_data",
                identity = %identity,
                error = %failure,
                "Entity failed to restore recovered data"
            );
        })?;

        info!(
            target: "save_engine::dead_data",
            identity = %identity,
            bytes = payload.len(),
            "Recovered dead data"
        );
        Ok(true)
    }
}
