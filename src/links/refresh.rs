// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Workflow link refresh pass.
//!
//! The companion maintenance pass for trees whose destination directory holds
//! the links rather than the files: drop destination entries whose targets no
//! longer exist, then create a canonical link for every workflow file found
//! in the source tree that lacks one. Unlike the repair driver this pass
//! never rewrites existing links; it only removes dead ones and fills gaps.

use crate::{
    config::MaintConfig,
    links::{drive::walk_links, WorkflowLink},
    path::relative_from,
};

use std::{
    fs,
    os::unix::fs::symlink,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// Remove dead links from the destination directory, then create missing
/// canonical links for every workflow file in the source tree.
///
/// Honors the sweep dry-run toggle for removals and the relink toggle for
/// creations. The destination directory is created when absent.
///
/// # Errors
///
/// - Return [`RefreshError::CreateDestination`] if the destination directory
///   cannot be created.
/// - Return [`RefreshError::ReadDestination`] or [`RefreshError::Unlink`] if
///   the dead-link scan cannot read or clean the destination.
/// - Return [`RefreshError::Walk`] if the source tree cannot be traversed.
/// - Return [`RefreshError::Symlink`] if a missing link cannot be created.
#[instrument(skip(root, config), level = "debug")]
pub fn refresh(root: &Path, config: &MaintConfig) -> Result<()> {
    let source = root.join(&config.dirs.source);
    let destination = root.join(&config.dirs.destination);

    mkdirp::mkdirp(&destination).map_err(|err| RefreshError::CreateDestination {
        source: err,
        path: destination.clone(),
    })?;

    remove_dead_links(&destination, config.dry_run.sweep)?;
    create_missing_links(&source, &destination, config.dry_run.relink)?;

    Ok(())
}

/// Remove destination entries that are links to nowhere.
fn remove_dead_links(destination: &Path, dry_run: bool) -> Result<()> {
    let entries = fs::read_dir(destination).map_err(|err| RefreshError::ReadDestination {
        source: err,
        path: destination.to_path_buf(),
    })?;

    for entry in entries {
        let entry = entry.map_err(|err| RefreshError::ReadDestination {
            source: err,
            path: destination.to_path_buf(),
        })?;
        let path = entry.path();

        let is_symlink = path
            .symlink_metadata()
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);
        if !is_symlink || path.exists() {
            continue;
        }

        info!("removing dead symlink '{}'", path.display());
        if !dry_run {
            fs::remove_file(&path).map_err(|err| RefreshError::Unlink {
                source: err,
                path: path.clone(),
            })?;
        }
    }

    Ok(())
}

/// Create canonical links for workflow files that lack one.
fn create_missing_links(source: &Path, destination: &Path, dry_run: bool) -> Result<()> {
    for workfile in walk_links(source)? {
        let link_name = match WorkflowLink::new(&workfile, source) {
            Ok(link) => link.canonical_filename(),
            Err(err) => {
                warn!("skipping '{}': {err}", workfile.display());
                continue;
            }
        };

        let link = destination.join(&link_name);
        if link.symlink_metadata().is_ok() {
            continue;
        }

        let target = relative_from(&workfile, destination);
        info!(
            "creating new symlink '{}' -> '{}'",
            link.display(),
            target.display()
        );
        if !dry_run {
            symlink(&target, &link).map_err(|err| RefreshError::Symlink {
                source: err,
                path: link.clone(),
                target,
            })?;
        }
    }

    Ok(())
}

/// Refresh pass error types.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// Destination directory cannot be created.
    #[error("failed to create destination directory '{}'", path.display())]
    CreateDestination {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Destination directory cannot be read.
    #[error("failed to read destination directory '{}'", path.display())]
    ReadDestination {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Dead link cannot be removed.
    #[error("failed to unlink '{}'", path.display())]
    Unlink {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Source tree cannot be traversed.
    #[error(transparent)]
    Walk(#[from] crate::links::drive::DriveError),

    /// Missing link cannot be created.
    #[error("failed to link '{}' to '{}'", path.display(), target.display())]
    Symlink {
        #[source]
        source: std::io::Error,
        path: PathBuf,
        target: PathBuf,
    },
}

/// Friendly result alias :3
type Result<T, E = RefreshError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct Fixture {
        root: TempDir,
    }

    impl Fixture {
        fn new() -> anyhow::Result<Self> {
            let root = TempDir::new()?;
            fs::create_dir_all(root.path().join(".github/workflows"))?;
            Ok(Self { root })
        }

        fn destination(&self) -> PathBuf {
            self.root.path().join(".github/workflows")
        }

        fn refresh(&self, config: &MaintConfig) -> Result<()> {
            refresh(self.root.path(), config)
        }
    }

    #[test]
    fn removes_dead_links_and_keeps_live_ones() -> anyhow::Result<()> {
        let fix = Fixture::new()?;
        fs::write(fix.destination().join("alive-target.yml"), "name: x\n")?;
        symlink("alive-target.yml", fix.destination().join("alive.yml"))?;
        symlink("gone-target.yml", fix.destination().join("dead.yml"))?;

        fix.refresh(&MaintConfig::default())?;

        assert!(fix.destination().join("alive.yml").exists());
        assert!(fix
            .destination()
            .join("dead.yml")
            .symlink_metadata()
            .is_err());

        Ok(())
    }

    #[test]
    fn creates_missing_links_with_relative_targets() -> anyhow::Result<()> {
        let fix = Fixture::new()?;
        let dir = fix.root.path().join("Workflows/a/b");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("workflow.yml"), "name: \"a/b\"\non: push\n")?;

        fix.refresh(&MaintConfig::default())?;

        let link = fix.destination().join("a--b.yml");
        assert_eq!(
            fs::read_link(&link)?,
            PathBuf::from("../../Workflows/a/b/workflow.yml"),
        );
        // The link resolves to the workflow file.
        assert_eq!(
            fs::read_to_string(&link)?,
            "name: \"a/b\"\non: push\n",
        );

        Ok(())
    }

    #[test]
    fn leaves_existing_links_alone() -> anyhow::Result<()> {
        let fix = Fixture::new()?;
        let dir = fix.root.path().join("Workflows/a/b");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("workflow.yml"), "name: \"a/b\"\n")?;
        symlink("custom-target.yml", fix.destination().join("a--b.yml"))?;
        fs::write(fix.destination().join("custom-target.yml"), "kept\n")?;

        fix.refresh(&MaintConfig::default())?;

        assert_eq!(
            fs::read_link(fix.destination().join("a--b.yml"))?,
            PathBuf::from("custom-target.yml"),
        );

        Ok(())
    }

    #[test]
    fn creates_destination_directory_when_absent() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        let dir = root.path().join("Workflows/a");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("workflow.yml"), "name: \"a\"\n")?;

        refresh(root.path(), &MaintConfig::default())?;

        assert!(root.path().join(".github/workflows/a.yml").exists());

        Ok(())
    }

    #[test]
    fn dry_run_reports_without_touching_anything() -> anyhow::Result<()> {
        let fix = Fixture::new()?;
        symlink("gone-target.yml", fix.destination().join("dead.yml"))?;
        let dir = fix.root.path().join("Workflows/a/b");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("workflow.yml"), "name: \"a/b\"\n")?;

        let config = MaintConfig {
            dry_run: crate::config::DryRun::all(),
            ..MaintConfig::default()
        };
        fix.refresh(&config)?;

        assert!(fix
            .destination()
            .join("dead.yml")
            .symlink_metadata()
            .is_ok());
        assert!(fix
            .destination()
            .join("a--b.yml")
            .symlink_metadata()
            .is_err());

        Ok(())
    }
}
