use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::mem;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use vellum_core::{
    normalize_path, resolve_output_location, Diagnostic, DiagnosticSink, ResolvedLocation,
    WriterConfig,
};

use crate::staging::allocate_staging_file;
use crate::types::{CommitAction, ProducedOutput, UndoAction};

/// Owns every result-document writer of one processing run. Writes are
/// staged through temporary files and become visible only when `complete`
/// runs; dropping the transaction without completing it restores the
/// filesystem to its pre-run state for every staged write.
pub struct OutputTransaction<'a> {
    base_output: PathBuf,
    primary: Option<PathBuf>,
    commit_log: Vec<CommitAction>,
    undo_log: Vec<UndoAction>,
    produced: Vec<ProducedOutput>,
    sink: &'a dyn DiagnosticSink,
    completed: bool,
}

impl<'a> OutputTransaction<'a> {
    /// `primary` is the designated destination of the run's main output, if
    /// the run has one. `base_output` is the resolved location of the
    /// default output identifier; relative identifiers resolve against its
    /// parent directory.
    pub fn new(
        primary: Option<PathBuf>,
        base_output: impl Into<PathBuf>,
        sink: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            base_output: normalize_path(&base_output.into()),
            primary: primary.map(|path| normalize_path(&path)),
            commit_log: Vec::new(),
            undo_log: Vec::new(),
            produced: Vec::new(),
            sink,
            completed: false,
        }
    }

    /// Stages a write for the given output identifier and hands back the
    /// staging writer, or `None` when the identifier names an unsupported
    /// destination (reported to the sink) or the discarded primary output.
    ///
    /// Resolving two identifiers to the same destination is not deduplicated
    /// here; the later commit action wins. Callers are expected to request
    /// each destination once.
    pub fn resolve(
        &mut self,
        identifier: &str,
        config: &WriterConfig,
    ) -> Result<Option<OutputWriter>> {
        let resolved = match resolve_output_location(&self.base_output, identifier)? {
            ResolvedLocation::File(path) => path,
            ResolvedLocation::Unsupported { scheme } => {
                self.sink.report(
                    Diagnostic::error(format!(
                        "only file destinations are supported, not '{scheme}'"
                    ))
                    .with_source(identifier),
                );
                return Ok(None);
            }
        };

        let destination = if let Some(primary) = &self.primary {
            if resolved == *primary || resolved == self.base_output {
                primary.clone()
            } else {
                resolved
            }
        } else if resolved == self.base_output {
            self.sink.report(
                Diagnostic::warning("no primary destination was designated; discarding output")
                    .with_source(identifier),
            );
            return Ok(None);
        } else {
            resolved
        };

        let destination_existed = destination.exists();
        let (staging, file) = allocate_staging_file(&destination)?;

        if destination_existed {
            let backup = backup_path(&destination);
            self.undo_log.push(UndoAction::DeleteStagingAndRestoreBackup {
                staging: staging.clone(),
                destination: destination.clone(),
                backup: backup.clone(),
            });
            self.commit_log.push(CommitAction::ReplaceWithBackup {
                staging,
                destination: destination.clone(),
                backup,
            });
        } else {
            self.undo_log.push(UndoAction::DeleteStagingFile {
                staging: staging.clone(),
            });
            self.commit_log.push(CommitAction::MoveIntoPlace {
                staging,
                destination: destination.clone(),
            });
        }

        self.produced.push(ProducedOutput {
            path: destination.clone(),
            media_type: config.media_type.clone(),
            encoding: config.encoding,
        });

        Ok(Some(OutputWriter {
            writer: BufWriter::new(file),
            destination,
            config: config.clone(),
        }))
    }

    /// Makes every staged write visible at its destination, in staging
    /// order, and returns the produced-output descriptors.
    ///
    /// Finalization is not atomic across outputs: when a commit fails
    /// partway through the list, outputs committed before the failure stay
    /// committed, the failed and remaining staged writes are undone
    /// best-effort, and the error surfaces to the caller.
    pub fn complete(mut self) -> Result<Vec<ProducedOutput>> {
        self.completed = true;
        let commit_log = mem::take(&mut self.commit_log);
        let undo_log = mem::take(&mut self.undo_log);

        for (index, action) in commit_log.iter().enumerate() {
            if let Err(err) = run_commit_action(action) {
                for undo in &undo_log[index..] {
                    if let Err(undo_err) = run_undo_action(undo) {
                        self.sink.report(Diagnostic::error(format!(
                            "cleanup after failed commit: {undo_err:#}"
                        )));
                    }
                }
                return Err(err);
            }
        }

        Ok(mem::take(&mut self.produced))
    }
}

impl Drop for OutputTransaction<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        for action in mem::take(&mut self.undo_log) {
            if let Err(err) = run_undo_action(&action) {
                self.sink.report(Diagnostic::error(format!(
                    "failed undoing staged output: {err:#}"
                )));
            }
        }
    }
}

/// Writer over one staging file. The content lands at `destination` only
/// when the owning transaction completes. Drop (or flush) the writer before
/// completing the transaction; a commit assumes the file is closed.
pub struct OutputWriter {
    writer: BufWriter<File>,
    destination: PathBuf,
    config: WriterConfig,
}

impl OutputWriter {
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

fn backup_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

pub(crate) fn run_commit_action(action: &CommitAction) -> Result<()> {
    match action {
        CommitAction::MoveIntoPlace {
            staging,
            destination,
        } => {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::rename(staging, destination).with_context(|| {
                format!(
                    "failed to move staged output into place: {}",
                    destination.display()
                )
            })
        }
        CommitAction::ReplaceWithBackup {
            staging,
            destination,
            backup,
        } => {
            fs::rename(destination, backup).with_context(|| {
                format!(
                    "failed to back up existing output: {}",
                    destination.display()
                )
            })?;

            if let Err(err) = fs::rename(staging, destination) {
                let replace_err = anyhow::Error::from(err).context(format!(
                    "failed to replace output: {}",
                    destination.display()
                ));
                if let Err(restore_err) = fs::rename(backup, destination) {
                    return Err(combine_replace_restore_errors(
                        destination,
                        backup,
                        replace_err,
                        restore_err,
                    ));
                }
                return Err(replace_err);
            }

            let _ = remove_file_if_exists(backup);
            Ok(())
        }
    }
}

pub(crate) fn run_undo_action(action: &UndoAction) -> Result<()> {
    match action {
        UndoAction::DeleteStagingFile { staging } => remove_file_if_exists(staging)
            .with_context(|| format!("failed to delete staging file: {}", staging.display())),
        UndoAction::DeleteStagingAndRestoreBackup {
            staging,
            destination,
            backup,
        } => {
            remove_file_if_exists(staging)
                .with_context(|| format!("failed to delete staging file: {}", staging.display()))?;

            // A backup only exists when a commit attempt failed mid-replace;
            // restoring it puts the original content back.
            if backup.exists() {
                fs::rename(backup, destination).with_context(|| {
                    format!(
                        "failed to restore backup {} to {}",
                        backup.display(),
                        destination.display()
                    )
                })?;
            }
            Ok(())
        }
    }
}

fn combine_replace_restore_errors(
    destination: &Path,
    backup: &Path,
    replace_err: anyhow::Error,
    restore_err: io::Error,
) -> anyhow::Error {
    anyhow!(
        "failed replacing output {}: {:#}; failed restoring backup {}: {}",
        destination.display(),
        replace_err,
        backup.display(),
        restore_err
    )
}

fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
