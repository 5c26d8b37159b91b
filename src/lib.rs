// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository upkeep chores.
//!
//! Repokeep gathers the small maintenance passes a continuous-integration
//! setup needs to keep a repository tidy: repairing the symlink farm that
//! maps a nested workflow tree onto the flat directory GitHub insists on,
//! refreshing that farm when files move, enforcing naming policy on
//! development forks, and rendering one-shot templates.
//!
//! # Workflow Links
//!
//! The heart of the crate is the [`links`] module. Workflows are organized
//! as a nested source tree (`Workflows/GitHub/Repos/...`) where each leaf
//! directory holds one `workflow.yml` symlink pointing into the flat
//! destination directory (`.github/workflows`). The directory path of a link
//! defines the canonical filename and display name of its workflow, and the
//! repair driver settles every link onto those invariants in one
//! deterministic, idempotent pass.

pub mod config;
pub mod forks;
pub mod links;
pub mod path;
pub mod render;

pub use config::{DryRun, MaintConfig};
pub use links::WorkflowLink;
