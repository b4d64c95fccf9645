//! Filesystem helpers shared by the file backend and the overlay merger

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Recursively copy the contents of `src` into `dest`.
///
/// Symbolic links are followed and their targets copied byte for byte, so the
/// destination never contains links into the source tree. Dangling links are
/// skipped. When `dest` lies inside `src` it is excluded from the walk.
///
/// `skip` receives the path relative to `src` and the entry; returning true
/// prunes the entry (and everything below it for directories).
///
/// Returns the relative paths of all copied files.
pub fn copy_tree<F>(src: &Path, dest: &Path, mut skip: F) -> io::Result<Vec<PathBuf>>
where
    F: FnMut(&Path, &DirEntry) -> bool,
{
    remove_if_link(dest)?;
    fs::create_dir_all(dest)?;

    let src = fs::canonicalize(src)?;
    let dest_canon = fs::canonicalize(dest)?;
    let nested_dest = dest_canon.starts_with(&src).then_some(dest_canon);

    let walker = WalkDir::new(&src)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if nested_dest
                .as_ref()
                .is_some_and(|d| entry.path().starts_with(d))
            {
                return false;
            }
            match entry.path().strip_prefix(&src) {
                Ok(rel) => !skip(rel, entry),
                Err(_) => true,
            }
        });

    let mut copied = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if is_dangling_link(&err) => {
                warn!(
                    "Skipping dangling symlink {}",
                    err.path().map(|p| p.display().to_string()).unwrap_or_default()
                );
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let rel = entry
            .path()
            .strip_prefix(&src)
            .map_err(io::Error::other)?
            .to_path_buf();
        let target = dest.join(&rel);
        remove_if_link(&target)?;

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied.push(rel);
        } else {
            debug!("Skipping special file {}", entry.path().display());
        }
    }

    Ok(copied)
}

/// Remove `path` if it is a symbolic link (without touching its target)
pub fn remove_if_link(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::remove_file(path),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Remove `path` entirely, whether it is a link, a file or a directory tree.
///
/// A missing path is not an error.
pub fn clear_path(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Whether any component of a relative path is hidden (starts with a dot)
pub fn is_hidden(rel: &Path) -> bool {
    rel.components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

fn is_dangling_link(err: &walkdir::Error) -> bool {
    let not_found = err
        .io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound);
    let is_link = err.path().is_some_and(|p| {
        fs::symlink_metadata(p).is_ok_and(|m| m.file_type().is_symlink())
    });
    not_found && is_link
}
