//! Overlay manifest
//!
//! Records which files a previous overlay copied into a directory, so the
//! next overlay can remove files that disappeared from the operator's tree.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Files copied by one overlay, relative to the destination directory
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifest {
    pub files: Vec<PathBuf>,
}

impl FileManifest {
    /// Load the manifest from `dir`; a missing or unreadable manifest is empty
    pub fn load(dir: &Path, name: &str) -> Self {
        let path = dir.join(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!("Ignoring unreadable manifest {}: {}", path.display(), e);
                return Self::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring corrupt manifest {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Remove every recorded file from `dir`, then the manifest itself
    pub fn clean(&self, dir: &Path, name: &str) -> io::Result<()> {
        for rel in &self.files {
            if !is_contained(rel) {
                warn!("Ignoring manifest entry outside destination: {}", rel.display());
                continue;
            }

            let path = dir.join(rel);
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed previously copied {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
            prune_empty_parents(dir, &path);
        }

        match fs::remove_file(dir.join(name)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Write the manifest into `dir`
    pub fn save(&self, dir: &Path, name: &str) -> io::Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(dir.join(name), content)
    }
}

fn is_contained(rel: &Path) -> bool {
    rel.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Remove now-empty directories between `file` and `root` (exclusive)
fn prune_empty_parents(root: &Path, file: &Path) {
    let mut current = file.parent();
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        // Fails (and stops) as soon as a directory still has content
        if fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}
