// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Workflow link inspection.
//!
//! Read a workflow link's literal target text and probe the destination
//! directory to decide which corrective action, if any, the link needs. The
//! inspector never mutates anything; it only classifies.

use crate::links::{LinkError, Result, WorkflowLink};

use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Corrective action a workflow link needs.
///
/// States are checked in a fixed order, and the first that applies wins:
/// a dangling link with no canonical file to fall back on is unrecoverable,
/// a dangling link with a canonical file present only needs relinking, a
/// link at a legacy filename needs a rename before the relink, and a link
/// whose target name is canonical but whose literal relative path is stale
/// (the link moved to a different tree depth) needs relinking alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkState {
    /// Neither current nor canonical target file exists.
    Unrecoverable,

    /// Target file missing, canonical file present: rewrite the link.
    Dangling,

    /// Target file present under a legacy name: rename it, then rewrite the
    /// link.
    LegacyName {
        /// Current path of the misnamed workflow file.
        from: PathBuf,
    },

    /// Canonical file present but the literal target text is stale.
    StaleTarget,

    /// Nothing to do.
    Correct,
}

/// Classify the corrective action a workflow link needs.
///
/// Follows the link's literal target text by name only: whatever filename
/// the text ends in is looked up inside the destination directory, which is
/// the only place workflow files are allowed to live.
///
/// # Errors
///
/// - Return [`LinkError::ReadTarget`] if the link's target text cannot be
///   read.
pub fn inspect(link: &WorkflowLink, destination: &Path) -> Result<LinkState> {
    let target = fs::read_link(link.path()).map_err(|err| LinkError::ReadTarget {
        source: err,
        path: link.path().to_path_buf(),
    })?;

    let current_name = target.file_name().unwrap_or_default().to_os_string();
    let current_path = destination.join(&current_name);
    let canonical_filename = link.canonical_filename();
    let canonical_path = destination.join(&canonical_filename);

    let state = if !current_path.is_file() {
        if !canonical_path.is_file() {
            // No file on either name. Nothing to infer a repair from.
            LinkState::Unrecoverable
        } else {
            LinkState::Dangling
        }
    } else if current_name != canonical_filename.as_str() {
        LinkState::LegacyName { from: current_path }
    } else if target != link.canonical_target(destination) {
        LinkState::StaleTarget
    } else {
        LinkState::Correct
    };

    debug!(
        "inspected '{link}': target '{}', state {state:?}",
        target.display()
    );

    Ok(state)
}
