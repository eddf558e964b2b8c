//! Atomic persistence of a deck and its notes transcript.
//!
//! Both files are written to temporaries in the target directory and renamed
//! into place. An existing deck is moved aside first and put back if the
//! transcript cannot be written, so a failed run leaves the previous output
//! as it was.

use deck_core::{Error, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use sysinfo::Disks;
use tempfile::{NamedTempFile, TempPath};

/// Where the companion transcript for `output` goes:
/// `<dir>/<stem><suffix>.txt`.
pub fn transcript_path(output: &Path, suffix: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "presentation".to_string());
    output.with_file_name(format!("{}{}.txt", stem, suffix))
}

fn io_error(e: io::Error, path: &Path) -> Error {
    if e.kind() == io::ErrorKind::PermissionDenied {
        Error::PermissionDenied(path.to_path_buf())
    } else {
        Error::IoError(e)
    }
}

/// The directory `output` will be written into, created if missing.
pub fn prepare_directory(output: &Path) -> Result<PathBuf> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| io_error(e, &dir))?;
    Ok(dir)
}

/// Bytes available to unprivileged writers on the disk holding `dir`, when
/// that disk can be found.
pub fn available_space(dir: &Path) -> Option<u64> {
    let dir = match dir.canonicalize() {
        Ok(dir) => dir,
        Err(e) => {
            log::debug!("Cannot resolve {}: {}", dir.display(), e);
            return None;
        }
    };
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|disk| dir.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().components().count())
        .map(|disk| disk.available_space())
}

/// Fail when `dir` has less than `required` bytes free.
pub fn check_free_space(dir: &Path, required: u64) -> Result<()> {
    match available_space(dir) {
        Some(available) if available < required => {
            Err(Error::InsufficientSpace { available, required })
        }
        Some(available) => {
            log::debug!("{} bytes free in {}", available, dir.display());
            Ok(())
        }
        None => {
            log::debug!("Free space unknown for {}, skipping check", dir.display());
            Ok(())
        }
    }
}

fn staged(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir).map_err(|e| io_error(e, dir))?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    Ok(file)
}

/// Fail early when something other than a file sits at `path`.
fn ensure_file_target(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Err(Error::IoError(io::Error::other(format!(
            "{} is a directory",
            path.display()
        ))));
    }
    Ok(())
}

/// Move an existing file at `path` to a temporary in `dir`. The temporary is
/// deleted when dropped.
fn set_aside(dir: &Path, path: &Path) -> Result<Option<TempPath>> {
    if !path.exists() {
        return Ok(None);
    }
    let backup = NamedTempFile::new_in(dir)
        .map_err(|e| io_error(e, dir))?
        .into_temp_path();
    fs::rename(path, &backup).map_err(|e| io_error(e, path))?;
    Ok(Some(backup))
}

/// Undo a partial write at `path`: restore the set-aside file, or remove the
/// new one when there was nothing before.
fn put_back(backup: Option<TempPath>, path: &Path) {
    match backup {
        Some(backup) => {
            if let Err(e) = backup.persist(path) {
                log::error!("Failed to restore {}: {}", path.display(), e.error);
            }
        }
        None => match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::error!("Failed to remove {}: {}", path.display(), e),
        },
    }
}

/// Write `deck` to `deck_path` and `transcript` to `transcript_path`,
/// both or neither.
pub fn persist_outputs(
    deck_path: &Path,
    deck: &[u8],
    transcript_path: &Path,
    transcript: &str,
    min_free_space: u64,
) -> Result<()> {
    let dir = prepare_directory(deck_path)?;
    check_free_space(&dir, min_free_space)?;
    ensure_file_target(deck_path)?;
    ensure_file_target(transcript_path)?;

    let deck_tmp = staged(&dir, deck)?;
    let notes_tmp = staged(&dir, transcript.as_bytes())?;
    let previous = set_aside(&dir, deck_path)?;

    if let Err(e) = deck_tmp.persist(deck_path) {
        put_back(previous, deck_path);
        return Err(io_error(e.error, deck_path));
    }

    if let Err(e) = notes_tmp.persist(transcript_path) {
        log::warn!(
            "Transcript could not be written, rolling back {}",
            deck_path.display()
        );
        put_back(previous, deck_path);
        return Err(io_error(e.error, transcript_path));
    }

    log::debug!(
        "Persisted {} and {}",
        deck_path.display(),
        transcript_path.display()
    );
    Ok(())
}
