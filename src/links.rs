// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Workflow link domain representation.
//!
//! A __workflow link__ is a symbolic link named `workflow.yml` that lives at
//! the bottom of a nested directory tree (the __source tree__, `Workflows/`
//! by default). Each link points at a regular workflow file inside one flat
//! __destination directory__ (`.github/workflows/` by default, since GitHub
//! refuses to pick up workflow files anywhere else).
//!
//! # Canonical Identity
//!
//! The directory segments between the source root and the link itself are the
//! workflow's identity. Everything else derives from them:
//!
//! - __canonical filename__: segments joined with `--` plus the `.yml`
//!   extension, e.g. `Workflows/GitHub/Repos/workflow.yml` owns the
//!   destination file `GitHub--Repos.yml`.
//! - __display name__: segments joined with `/`, which is the value the
//!   workflow file must carry in its top-level `name:` entry.
//! - __canonical target__: the relative path from the link's own directory to
//!   the canonical filename inside the destination directory.
//!
//! A repaired link satisfies all three at once: its literal target text equals
//! the canonical target, the canonical file exists, and the file's `name:`
//! line holds the quoted display name.
//!
//! # Segment Rules
//!
//! Every segment must consist of alphanumeric characters, underscores,
//! hyphens, or periods, and must not start or end with a hyphen or period.
//! Links violating this rule are rejected before any filesystem mutation
//! happens.

pub mod drive;
pub mod inspect;
pub mod patch;
pub mod refresh;
pub mod repair;

use crate::path::relative_from;

use regex::Regex;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Fixed leaf filename every workflow link must have.
pub const LINK_FILENAME: &str = "workflow.yml";

/// Separator used to join path segments into a canonical filename.
pub const SEGMENT_SEPARATOR: &str = "--";

/// Extension of every canonical workflow filename.
pub const WORKFLOW_EXTENSION: &str = ".yml";

/// Allowed shape of a single path segment.
///
/// Alphanumeric characters, underscores, hyphens, and periods only; a segment
/// must not start or end with a hyphen or period.
static SEGMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]([a-zA-Z0-9_.-]*[a-zA-Z0-9_])?$").unwrap());

/// A workflow link as a plain value.
///
/// Holds the link's path plus the path segments that define its canonical
/// identity. Construction validates the segments; all derivations afterwards
/// are pure and never touch the filesystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowLink {
    path: PathBuf,
    segments: Vec<String>,
}

impl WorkflowLink {
    /// Construct new workflow link from a path found under the source root.
    ///
    /// # Errors
    ///
    /// - Return [`LinkError::UnexpectedLeaf`] if the path is not named
    ///   `workflow.yml`, or lies outside the source root.
    /// - Return [`LinkError::EmptyPath`] if the path sits directly at the
    ///   source root, leaving no segments to derive an identity from.
    /// - Return [`LinkError::InvalidPathSegment`] if any segment breaks the
    ///   allowed-character rule.
    pub fn new(path: impl Into<PathBuf>, source_root: impl AsRef<Path>) -> Result<Self> {
        let path = path.into();

        if path.file_name().map_or(true, |name| name != LINK_FILENAME) {
            return Err(LinkError::UnexpectedLeaf { path });
        }

        let relative = match path.strip_prefix(source_root.as_ref()) {
            Ok(relative) => relative,
            Err(_) => return Err(LinkError::UnexpectedLeaf { path }),
        };

        let segments = relative
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .map(|comp| comp.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        if segments.is_empty() {
            return Err(LinkError::EmptyPath { path });
        }

        for segment in &segments {
            if !SEGMENT_PATTERN.is_match(segment) {
                return Err(LinkError::InvalidPathSegment {
                    segment: segment.clone(),
                    path,
                });
            }
        }

        Ok(Self { path, segments })
    }

    /// Path of the link itself.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Directory the link lives in.
    pub fn dir(&self) -> &Path {
        // INVARIANT: Construction guarantees at least one parent component.
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Path segments between the source root and the link.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Filename the destination workflow file must have.
    pub fn canonical_filename(&self) -> String {
        let mut name = self.segments.join(SEGMENT_SEPARATOR);
        name.push_str(WORKFLOW_EXTENSION);
        name
    }

    /// Name the workflow file must carry in its `name:` entry.
    pub fn display_name(&self) -> String {
        self.segments.join("/")
    }

    /// Relative path the link must point at.
    ///
    /// Computed from the link's own directory to the canonical filename
    /// inside the given destination directory.
    pub fn canonical_target(&self, destination: impl AsRef<Path>) -> PathBuf {
        relative_from(
            &destination.as_ref().join(self.canonical_filename()),
            self.dir(),
        )
    }
}

impl Display for WorkflowLink {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.path.to_string_lossy().as_ref())
    }
}

/// Workflow link error types.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Path is not a workflow link location.
    #[error("'{}' is not a '{LINK_FILENAME}' entry under the source tree", path.display())]
    UnexpectedLeaf { path: PathBuf },

    /// Link sits directly at the source root.
    #[error("'{}' has no path segments to derive a workflow identity from", path.display())]
    EmptyPath { path: PathBuf },

    /// A path segment breaks the allowed-character rule.
    #[error("invalid path segment '{segment}' in '{}'", path.display())]
    InvalidPathSegment { segment: String, path: PathBuf },

    /// Entry in the source tree is not a symbolic link.
    #[error("'{}' is not a symbolic link", path.display())]
    NotASymlink { path: PathBuf },

    /// Link target cannot be read.
    #[error("failed to read target of link '{}'", path.display())]
    ReadTarget {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Neither the current nor the canonical target file exists.
    #[error("link '{}' has no current or canonical target file to repair from", path.display())]
    Unrecoverable { path: PathBuf },

    /// Rename destination already occupied.
    #[error("cannot rename '{}' to '{}': destination already exists", from.display(), to.display())]
    RenameConflict { from: PathBuf, to: PathBuf },

    /// Workflow file rename failed.
    #[error("failed to rename '{}' to '{}'", from.display(), to.display())]
    Rename {
        #[source]
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },

    /// Link removal failed.
    #[error("failed to unlink '{}'", path.display())]
    Unlink {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Link creation failed.
    #[error("failed to link '{}' to '{}'", path.display(), target.display())]
    Symlink {
        #[source]
        source: std::io::Error,
        path: PathBuf,
        target: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test]
    fn derives_canonical_identity() -> anyhow::Result<()> {
        let link = WorkflowLink::new("Workflows/a/b/workflow.yml", "Workflows")?;

        assert_eq!(link.segments(), ["a".to_string(), "b".to_string()]);
        assert_eq!(link.canonical_filename(), "a--b.yml");
        assert_eq!(link.display_name(), "a/b");

        Ok(())
    }

    #[test]
    fn derives_canonical_target_across_depths() -> anyhow::Result<()> {
        let link = WorkflowLink::new("Workflows/GitHub/Repos/workflow.yml", "Workflows")?;

        assert_eq!(
            link.canonical_target(".github/workflows"),
            PathBuf::from("../../../.github/workflows/GitHub--Repos.yml"),
        );

        Ok(())
    }

    #[test_case("a"; "single character")]
    #[test_case("example_part-1.2_three"; "mixed characters")]
    #[test_case("UPPER9"; "uppercase and digits")]
    #[test]
    fn accepts_valid_segment(segment: &str) {
        let path = format!("Workflows/{segment}/workflow.yml");
        assert!(WorkflowLink::new(path, "Workflows").is_ok());
    }

    #[test_case("-bad"; "leading hyphen")]
    #[test_case("bad-"; "trailing hyphen")]
    #[test_case(".bad"; "leading period")]
    #[test_case("bad."; "trailing period")]
    #[test_case("sp ace"; "embedded space")]
    #[test]
    fn rejects_invalid_segment(segment: &str) {
        let path = format!("Workflows/{segment}/workflow.yml");
        let result = WorkflowLink::new(path, "Workflows");

        assert!(matches!(
            result,
            Err(LinkError::InvalidPathSegment { segment: got, .. }) if got == segment
        ));
    }

    #[test]
    fn rejects_wrong_leaf_name() {
        let result = WorkflowLink::new("Workflows/a/other.yml", "Workflows");
        assert!(matches!(result, Err(LinkError::UnexpectedLeaf { .. })));
    }

    #[test]
    fn rejects_link_at_source_root() {
        let result = WorkflowLink::new("Workflows/workflow.yml", "Workflows");
        assert!(matches!(result, Err(LinkError::EmptyPath { .. })));
    }
}
