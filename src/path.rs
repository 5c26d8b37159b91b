// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevant path information for the project tree being maintained,
//! plus the one relative-path computation the repair procedure needs that the
//! standard library does not provide.

use std::path::{Component, Path, PathBuf};

use git2::Repository;

/// Determine absolute path to the project root.
///
/// Walks upward from the current working directory until a Git repository is
/// found, and uses its working tree as the project root. All configured
/// directories are resolved relative to it.
///
/// # Errors
///
/// - Return [`PathError::NoProjectRoot`] if no repository encloses the
///   current working directory.
/// - Return [`PathError::BareRepository`] if the enclosing repository has no
///   working tree to operate on.
pub fn project_root() -> Result<PathBuf> {
    let repository = Repository::discover(".").map_err(PathError::NoProjectRoot)?;
    repository
        .workdir()
        .map(Path::to_path_buf)
        .ok_or(PathError::BareRepository)
}

/// Compute the relative path from `base` to `path`.
///
/// Equivalent of `os.path.relpath`: shared leading components are dropped and
/// every remaining component of `base` becomes a `..` hop. Neither argument
/// is touched on disk, so both may name files that do not exist yet. Both
/// paths must be either absolute or relative to the same location.
pub fn relative_from(path: &Path, base: &Path) -> PathBuf {
    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();

    let shared = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in shared..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[shared..] {
        relative.push(part.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }

    relative
}

/// Path resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// No Git repository encloses the current working directory.
    #[error("cannot find a project root enclosing the current directory")]
    NoProjectRoot(#[source] git2::Error),

    /// Enclosing repository is bare.
    #[error("enclosing repository is bare and has no working tree")]
    BareRepository,
}

/// Friendly result alias :3
pub type Result<T, E = PathError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case(
        ".github/workflows/a--b.yml",
        "Workflows/a/b",
        "../../../.github/workflows/a--b.yml";
        "up three levels"
    )]
    #[test_case("dir/file", "dir", "file"; "direct child")]
    #[test_case("dir", "dir", "."; "same path")]
    #[test_case("/top/other", "/top/nested/deep", "../../other"; "absolute paths")]
    #[test]
    fn computes_relative_path(path: &str, base: &str, expect: &str) {
        let result = relative_from(Path::new(path), Path::new(base));
        assert_eq!(result, PathBuf::from(expect));
    }
}
