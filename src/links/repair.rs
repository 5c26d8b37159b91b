// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Workflow link repair operations.
//!
//! Apply the corrective action an inspection decided on: rename a workflow
//! file out of a legacy filename, rewrite a link to its canonical target, or
//! both. Every operation family honors its dry-run toggle by logging the
//! intended action and stopping short of the filesystem call.

use crate::{
    config::DryRun,
    links::{inspect::LinkState, LinkError, Result, WorkflowLink},
};

use std::{
    fs,
    os::unix::fs::symlink,
    path::{Path, PathBuf},
};
use tracing::warn;

/// Apply corrective filesystem actions to workflow links.
#[derive(Clone, Debug)]
pub struct Repairer<'a> {
    dry_run: &'a DryRun,
}

impl<'a> Repairer<'a> {
    /// Construct new repairer honoring the given dry-run toggles.
    pub fn new(dry_run: &'a DryRun) -> Self {
        Self { dry_run }
    }

    /// Apply the corrective action for one inspected link.
    ///
    /// For a legacy filename the rename happens first, so the relink step can
    /// assume the canonical file exists afterwards.
    ///
    /// # Errors
    ///
    /// - Return [`LinkError::Unrecoverable`] for the unrecoverable state;
    ///   the caller decides how loudly to report it.
    /// - Return [`LinkError::RenameConflict`] if the canonical filename is
    ///   already occupied by another file.
    /// - Return [`LinkError::Rename`], [`LinkError::Unlink`], or
    ///   [`LinkError::Symlink`] if the underlying filesystem call fails.
    pub fn apply(
        &self,
        link: &WorkflowLink,
        state: &LinkState,
        destination: &Path,
    ) -> Result<()> {
        match state {
            LinkState::Correct => Ok(()),
            LinkState::Dangling => {
                warn!("non-existing workfile link on '{link}'");
                warn!("correct workfile exists at '{}'", link.canonical_filename());
                self.relink(link, destination)
            }
            LinkState::LegacyName { from } => {
                self.rename(from, &destination.join(link.canonical_filename()))?;
                self.relink(link, destination)
            }
            LinkState::StaleTarget => {
                warn!("link's parent levels seem to be wrong on '{link}'");
                self.relink(link, destination)
            }
            LinkState::Unrecoverable => Err(LinkError::Unrecoverable {
                path: link.path().to_path_buf(),
            }),
        }
    }

    /// Rename a workflow file to its canonical filename.
    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        if to.symlink_metadata().is_ok() {
            return Err(LinkError::RenameConflict {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
            });
        }

        warn!("renaming '{}' -> '{}'", from.display(), to.display());
        if self.dry_run.rename {
            return Ok(());
        }

        fs::rename(from, to).map_err(|err| LinkError::Rename {
            source: err,
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        })?;
        warn!("file renamed successfully");

        Ok(())
    }

    /// Rewrite a link to point at its canonical target.
    fn relink(&self, link: &WorkflowLink, destination: &Path) -> Result<()> {
        let target = link.canonical_target(destination);

        warn!("unlinking '{link}'");
        if !self.dry_run.relink {
            fs::remove_file(link.path()).map_err(|err| LinkError::Unlink {
                source: err,
                path: link.path().to_path_buf(),
            })?;
        }

        warn!("relinking '{link}' -> '{}'", target.display());
        if !self.dry_run.relink {
            symlink(&target, link.path()).map_err(|err| LinkError::Symlink {
                source: err,
                path: link.path().to_path_buf(),
                target: target.clone(),
            })?;
        }

        Ok(())
    }
}

/// Canonical destination path a repaired link settles on.
///
/// Convenience for callers that need the workflow file path after repair.
pub fn canonical_path(link: &WorkflowLink, destination: &Path) -> PathBuf {
    destination.join(link.canonical_filename())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::inspect::inspect;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct Fixture {
        root: TempDir,
        link: WorkflowLink,
        destination: PathBuf,
    }

    fn fixture(target_text: &str) -> anyhow::Result<Fixture> {
        let root = TempDir::new()?;
        let link_dir = root.path().join("Workflows/a/b");
        let destination = root.path().join(".github/workflows");
        fs::create_dir_all(&link_dir)?;
        fs::create_dir_all(&destination)?;
        symlink(target_text, link_dir.join("workflow.yml"))?;

        let link = WorkflowLink::new(
            link_dir.join("workflow.yml"),
            root.path().join("Workflows"),
        )?;

        Ok(Fixture {
            root,
            link,
            destination,
        })
    }

    #[test]
    fn renames_legacy_file_then_relinks() -> anyhow::Result<()> {
        let fix = fixture("../../../.github/workflows/old-name.yml")?;
        fs::write(fix.destination.join("old-name.yml"), "name: \"old\"\n")?;

        let dry_run = DryRun::default();
        let state = inspect(&fix.link, &fix.destination)?;
        Repairer::new(&dry_run).apply(&fix.link, &state, &fix.destination)?;

        assert!(!fix.destination.join("old-name.yml").exists());
        assert!(fix.destination.join("a--b.yml").is_file());
        assert_eq!(
            fs::read_link(fix.link.path())?,
            PathBuf::from("../../../.github/workflows/a--b.yml"),
        );

        drop(fix.root);
        Ok(())
    }

    #[test]
    fn relinks_dangling_link_onto_canonical_file() -> anyhow::Result<()> {
        let fix = fixture("../../../.github/workflows/gone.yml")?;
        fs::write(fix.destination.join("a--b.yml"), "name: \"a/b\"\n")?;

        let dry_run = DryRun::default();
        let state = inspect(&fix.link, &fix.destination)?;
        Repairer::new(&dry_run).apply(&fix.link, &state, &fix.destination)?;

        assert_eq!(
            fs::read_link(fix.link.path())?,
            PathBuf::from("../../../.github/workflows/a--b.yml"),
        );

        drop(fix.root);
        Ok(())
    }

    #[test]
    fn refuses_rename_over_occupied_canonical_name() -> anyhow::Result<()> {
        let fix = fixture("../../../.github/workflows/old-name.yml")?;
        fs::write(fix.destination.join("old-name.yml"), "legacy\n")?;
        fs::write(fix.destination.join("a--b.yml"), "occupied\n")?;

        let dry_run = DryRun::default();
        let state = inspect(&fix.link, &fix.destination)?;
        let result = Repairer::new(&dry_run).apply(&fix.link, &state, &fix.destination);

        assert!(matches!(result, Err(LinkError::RenameConflict { .. })));
        // Nothing moved.
        assert!(fix.destination.join("old-name.yml").is_file());
        assert_eq!(fs::read_to_string(fix.destination.join("a--b.yml"))?, "occupied\n");

        drop(fix.root);
        Ok(())
    }

    #[test]
    fn dry_run_leaves_filesystem_untouched() -> anyhow::Result<()> {
        let fix = fixture("../../../.github/workflows/old-name.yml")?;
        fs::write(fix.destination.join("old-name.yml"), "name: \"old\"\n")?;

        let dry_run = DryRun::all();
        let state = inspect(&fix.link, &fix.destination)?;
        Repairer::new(&dry_run).apply(&fix.link, &state, &fix.destination)?;

        assert!(fix.destination.join("old-name.yml").is_file());
        assert!(!fix.destination.join("a--b.yml").exists());
        assert_eq!(
            fs::read_link(fix.link.path())?,
            PathBuf::from("../../../.github/workflows/old-name.yml"),
        );

        drop(fix.root);
        Ok(())
    }
}
