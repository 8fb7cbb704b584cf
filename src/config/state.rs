// Application state module
// Holds configuration together with the objects built from it

use super::types::Config;
use crate::archive::{ArchiveStore, IdentifierPattern};

/// Application state shared by every connection
pub struct AppState {
    pub config: Config,
    pub store: ArchiveStore,
    pub identifier_pattern: IdentifierPattern,
}

impl AppState {
    /// Build state from configuration. Fails if the identifier pattern
    /// does not compile.
    pub fn new(config: &Config) -> Result<Self, regex::Error> {
        let storage = &config.storage;
        let identifier_pattern = IdentifierPattern::new(&storage.identifier_pattern)?;
        let store = ArchiveStore::new(
            &storage.root,
            &storage.work_dir,
            &storage.extension,
            storage.max_entry_size,
        );

        Ok(Self {
            config: config.clone(),
            store,
            identifier_pattern,
        })
    }
}
