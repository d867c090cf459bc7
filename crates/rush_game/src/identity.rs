//! Anonymous player id, created once and cached on disk.

use std::fs;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub anon_id: String,
}

impl PlayerIdentity {
    pub fn generate() -> Self {
        Self {
            anon_id: Uuid::new_v4().to_string(),
        }
    }

    /// Read the cached id at `path`, or create and persist a new one. A cache
    /// that can't be written still yields a usable id for this process.
    pub fn load_or_create(path: &Path) -> Self {
        if let Ok(raw) = fs::read_to_string(path) {
            let cached = raw.trim();
            if !cached.is_empty() {
                return Self {
                    anon_id: cached.to_string(),
                };
            }
        }

        let identity = Self::generate();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(err) = fs::create_dir_all(parent) {
                log::warn!("Failed to create {}: {err}", parent.display());
            }
        }
        match fs::write(path, &identity.anon_id) {
            Ok(()) => log::info!("Created player id {}", identity.anon_id),
            Err(err) => log::warn!(
                "Failed to persist player id to {}: {err}; using it for this session only",
                path.display()
            ),
        }
        identity
    }
}
