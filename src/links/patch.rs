// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Workflow name patching.
//!
//! Rewrite the `name:` entry of a workflow file so it carries the quoted
//! display name derived from the link's path segments. Only the value bytes
//! of the first matching line change; the key token, its surrounding
//! whitespace, and every other line stay byte-for-byte identical. A unified
//! diff of the rewrite is logged before anything is written, so audit logs
//! capture exactly what changed.

use crate::{
    config::PatchPolicy,
    links::{Result, WorkflowLink},
};

use regex::Regex;
use similar::TextDiff;
use std::{fs, path::Path, sync::LazyLock};
use tracing::{debug, warn};

/// First line carrying the workflow name.
///
/// Line-anchored and case-sensitive; group 1 is the key token, group 2 the
/// current value.
static NAME_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(name:)[ \t]*(.*)$").unwrap());

/// What the patcher did to a workflow file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Value already matched the display name.
    Unchanged,

    /// Value of an existing `name:` line was replaced.
    Rewritten,

    /// No `name:` line existed; a fresh one was prepended.
    Inserted,

    /// No `name:` line existed and insertion is disabled.
    Missing,
}

/// Ensure the workflow file carries the link's display name.
///
/// # Errors
///
/// - Return [`PatchError::Read`] or [`PatchError::Write`] if the workflow
///   file cannot be read or written back.
pub fn patch_display_name(
    link: &WorkflowLink,
    workfile: &Path,
    policy: &PatchPolicy,
    dry_run: bool,
) -> Result<PatchOutcome, PatchError> {
    let old_content = fs::read_to_string(workfile).map_err(|err| PatchError::Read {
        source: err,
        path: workfile.to_path_buf(),
    })?;
    let quoted = format!("\"{}\"", link.display_name());

    let (new_content, outcome) = match NAME_LINE.captures(&old_content) {
        Some(captures) => {
            let value = captures.get(2).unwrap();
            if value.as_str() == quoted {
                return Ok(PatchOutcome::Unchanged);
            }

            let mut content =
                String::with_capacity(old_content.len() + quoted.len() - value.as_str().len());
            content.push_str(&old_content[..value.start()]);
            content.push_str(&quoted);
            content.push_str(&old_content[value.end()..]);
            (content, PatchOutcome::Rewritten)
        }
        None => {
            warn!("no workflow name found in '{}'", workfile.display());
            if !policy.insert_missing {
                return Ok(PatchOutcome::Missing);
            }

            warn!("prepending new line: name: {quoted}");
            (
                format!("name: {quoted}\n{old_content}"),
                PatchOutcome::Inserted,
            )
        }
    };

    let diff = unified_diff(&old_content, &new_content, &link.canonical_filename());
    warn!("updating workflow name in '{}'", workfile.display());
    warn!("  new name: `{quoted}`");
    debug!("diff:\n{diff}");

    if !dry_run {
        fs::write(workfile, new_content).map_err(|err| PatchError::Write {
            source: err,
            path: workfile.to_path_buf(),
        })?;
        warn!("file's content updated successfully");
    }

    Ok(outcome)
}

/// Render a unified line diff between two revisions of a file.
pub fn unified_diff(old_content: &str, new_content: &str, file_name: &str) -> String {
    TextDiff::from_lines(old_content, new_content)
        .unified_diff()
        .context_radius(3)
        .header(&format!("Old '{file_name}'"), &format!("New '{file_name}'"))
        .to_string()
}

/// Workflow name patching error types.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// Workflow file cannot be read.
    #[error("failed to read workflow file '{}'", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },

    /// Workflow file cannot be written back.
    #[error("failed to write workflow file '{}'", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: std::path::PathBuf,
    },
}
