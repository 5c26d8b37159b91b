// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Workflow link repair driver.
//!
//! Walk the source tree, push every workflow link through the
//! inspect-repair-patch pipeline one at a time, and finish with the whitelist
//! sweep that deletes stray destination files. Per-link failures are logged
//! and excluded from the whitelist without stopping the walk; only failures
//! below the link-processing boundary (an unreadable directory mid-walk, an
//! unreadable destination) abort the run.

use crate::{
    config::MaintConfig,
    links::{
        inspect::{inspect, LinkState},
        patch::{patch_display_name, PatchError},
        repair::{canonical_path, Repairer},
        LinkError, WorkflowLink, LINK_FILENAME,
    },
};

use std::{
    collections::HashSet,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, instrument, warn};
use walkdir::WalkDir;

/// Aggregate result of one repair run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Number of links that settled on their invariants.
    pub fixed: usize,

    /// Number of links skipped as unrecoverable or failed mid-repair.
    pub failed: usize,

    /// Canonical filenames produced by successfully processed links.
    pub whitelist: HashSet<String>,
}

impl Outcome {
    /// Whether every discovered link settled.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Single-pass repair driver over one project tree.
#[derive(Clone, Debug)]
pub struct Driver<'a> {
    root: &'a Path,
    config: &'a MaintConfig,
}

impl<'a> Driver<'a> {
    /// Construct new driver for the given project root.
    pub fn new(root: &'a Path, config: &'a MaintConfig) -> Self {
        Self { root, config }
    }

    /// Repair every workflow link, then sweep the destination directory.
    ///
    /// # Errors
    ///
    /// - Return [`DriveError::Walk`] if the source tree cannot be traversed.
    /// - Return [`DriveError::ReadDestination`] or [`DriveError::Sweep`] if
    ///   the sweep cannot read or clean the destination directory.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&self) -> Result<Outcome> {
        let source = self.root.join(&self.config.dirs.source);
        let destination = self.root.join(&self.config.dirs.destination);
        let mut outcome = Outcome::default();

        for path in walk_links(&source)? {
            match self.process_link(&path, &source, &destination) {
                Ok(filename) => {
                    outcome.whitelist.insert(filename);
                    outcome.fixed += 1;
                }
                Err(err) => {
                    report(&err, &path, &self.config.dirs);
                    outcome.failed += 1;
                }
            }
        }

        debug!("workflow filename whitelist:");
        for filename in &outcome.whitelist {
            debug!("    '{filename}'");
        }

        sweep(&destination, &outcome.whitelist, self.config.dry_run.sweep)?;

        Ok(outcome)
    }

    /// Push one link through the inspect-repair-patch pipeline.
    fn process_link(
        &self,
        path: &Path,
        source: &Path,
        destination: &Path,
    ) -> Result<String, ProcessError> {
        info!("processing '{}'", path.display());

        let is_symlink = path
            .symlink_metadata()
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);
        if !is_symlink {
            return Err(LinkError::NotASymlink {
                path: path.to_path_buf(),
            }
            .into());
        }

        let link = WorkflowLink::new(path, source)?;
        let state = inspect(&link, destination)?;
        Repairer::new(&self.config.dry_run).apply(&link, &state, destination)?;

        let workfile = canonical_path(&link, destination);
        if workfile.is_file() {
            patch_display_name(
                &link,
                &workfile,
                &self.config.patch,
                self.config.dry_run.edit,
            )?;
        } else {
            // Reachable only when an earlier family ran dry; the canonical
            // file will appear once the operator applies for real.
            warn!(
                "skipping name patch: '{}' does not exist yet",
                workfile.display()
            );
        }

        Ok(link.canonical_filename())
    }
}

/// Find every workflow link under the source tree.
///
/// Recursive and follows directory links. A dangling leaf link surfaces as a
/// walk error when links are being followed, so errors naming a
/// `workflow.yml` are recovered as ordinary results; anything else aborts
/// the walk.
pub fn walk_links(source: &Path) -> Result<Vec<PathBuf>> {
    let mut links = Vec::new();

    for entry in WalkDir::new(source).follow_links(true).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if entry.file_name() == LINK_FILENAME {
                    links.push(entry.path().to_path_buf());
                }
            }
            Err(err) => match err.path() {
                Some(path) if path.file_name() == Some(OsStr::new(LINK_FILENAME)) => {
                    links.push(path.to_path_buf());
                }
                _ => return Err(DriveError::Walk(err)),
            },
        }
    }

    Ok(links)
}

/// Delete destination files whose name no processed link produced.
///
/// Assumes the destination directory holds nothing but generated workflow
/// files; anything placed there by hand is removed as well.
pub fn sweep(destination: &Path, whitelist: &HashSet<String>, dry_run: bool) -> Result<()> {
    let entries = fs::read_dir(destination).map_err(|err| DriveError::ReadDestination {
        source: err,
        path: destination.to_path_buf(),
    })?;

    for entry in entries {
        let entry = entry.map_err(|err| DriveError::ReadDestination {
            source: err,
            path: destination.to_path_buf(),
        })?;
        let filename = entry.file_name().to_string_lossy().into_owned();
        if whitelist.contains(&filename) {
            continue;
        }

        warn!(
            "unlinking '{}' since it's not on the whitelist",
            entry.path().display()
        );
        if !dry_run {
            fs::remove_file(entry.path()).map_err(|err| DriveError::Sweep {
                source: err,
                path: entry.path(),
            })?;
        }
    }

    Ok(())
}

/// Log a per-link failure with operator remediation instructions.
fn report(err: &ProcessError, path: &Path, dirs: &crate::config::Dirs) {
    match err {
        ProcessError::Link(LinkError::NotASymlink { .. }) => {
            error!(
                "not a symlink!\n\
                 '{path}' isn't a symlink.\n\
                 Each '{LINK_FILENAME}' under '{source}' must be a symlink to a file in '{destination}'.\n\n\
                 Fix this by running:\n\
                 1. cp -v '{path}' '{destination}/foo.yml'\n\
                 2. ln -vfs 'foo.yml' '{path}'\n\n\
                 'foo.yml' is a temporary filename. After running these commands, re-run this tool.\n\
                 The tool will adjust the filename and make necessary fixes.",
                path = path.display(),
                source = dirs.source.display(),
                destination = dirs.destination.display(),
            );
        }
        ProcessError::Link(LinkError::Unrecoverable { .. }) => {
            error!(
                "missing workflow file!\n\
                 The link '{path}' doesn't point to an existing file.\n\
                 The link must target a valid file in '{destination}'.\n\n\
                 Fix this by running:\n\
                 1. touch '{destination}/foo.yml'\n\
                 2. ln -vfs '{destination}/foo.yml' '{path}'\n\n\
                 'foo.yml' is a temporary filename. After running these commands, re-run this tool.\n\
                 The tool will adjust the filename and make necessary fixes.",
                path = path.display(),
                destination = dirs.destination.display(),
            );
        }
        ProcessError::Link(LinkError::InvalidPathSegment { segment, .. }) => {
            error!(
                "invalid path!\n\
                 Invalid part in workflow link: '{segment}'.\n\
                 Ensure each part contains only alphanumeric characters, underscores,\n\
                 hyphens, and periods, and does not start or end with a hyphen or period.\n\
                 Example of a valid path part: 'example_part-1.2_three'",
            );
        }
        _ => error!("skipping '{}': {err:?}", path.display()),
    }
}

/// Driver error types.
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    /// Source tree cannot be traversed.
    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    /// Destination directory cannot be read.
    #[error("failed to read destination directory '{}'", path.display())]
    ReadDestination {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Stray destination file cannot be removed.
    #[error("failed to sweep '{}'", path.display())]
    Sweep {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Per-link pipeline error types.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Link validation, inspection, or repair failed.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Name patching failed.
    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Friendly result alias :3
type Result<T, E = DriveError> = std::result::Result<T, E>;
