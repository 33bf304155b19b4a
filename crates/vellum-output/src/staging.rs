use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

const STAGING_NAME_ATTEMPTS: u32 = 16;

/// Creates a randomly named staging file next to the destination, creating
/// the destination's directory tree first. A name collision retries with a
/// fresh name; any other creation failure is fatal for the resolution.
pub(crate) fn allocate_staging_file(destination: &Path) -> Result<(PathBuf, File)> {
    allocate_staging_file_with_namer(destination, random_staging_name)
}

pub(crate) fn allocate_staging_file_with_namer(
    destination: &Path,
    mut namer: impl FnMut(&str) -> String,
) -> Result<(PathBuf, File)> {
    let directory = destination.parent().ok_or_else(|| {
        anyhow!(
            "output destination has no parent directory: {}",
            destination.display()
        )
    })?;
    let final_name = destination
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            anyhow!(
                "output destination has no file name: {}",
                destination.display()
            )
        })?;

    fs::create_dir_all(directory)
        .with_context(|| format!("failed to create {}", directory.display()))?;

    for _ in 0..STAGING_NAME_ATTEMPTS {
        let staging = directory.join(namer(final_name));
        match OpenOptions::new().write(true).create_new(true).open(&staging) {
            Ok(file) => return Ok((staging, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to create staging file: {}", staging.display())
                });
            }
        }
    }

    Err(anyhow!(
        "failed to allocate a unique staging file in {} after {} attempts",
        directory.display(),
        STAGING_NAME_ATTEMPTS
    ))
}

fn random_staging_name(final_name: &str) -> String {
    format!(".{final_name}.{:016x}.tmp", rand::random::<u64>())
}
