// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for the optional `repokeep.toml` configuration file at
//! the project root. File I/O is left to the caller to figure out; a missing
//! file simply means defaults everywhere.
//!
//! # Dry-Run Toggles
//!
//! Every destructive operation family the repair procedure performs (renaming
//! workflow files, rewriting links, editing file content, sweeping stray
//! files) carries its own dry-run toggle. A toggled family still logs the
//! action it would have taken, which allows staged roll-outs: sweep in
//! dry-run while renames go live, and so on. The `--dry-run` command line
//! flag forces every family at once.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Maintenance configuration layout.
///
/// Everything the repair driver needs for one run: where the source tree and
/// the destination directory live, which operation families run dry, and how
/// the content patcher treats files missing their `name:` entry.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MaintConfig {
    /// Source and destination directories, relative to the project root.
    pub dirs: Dirs,

    /// Per-family dry-run toggles.
    pub dry_run: DryRun,

    /// Content patcher policy.
    pub patch: PatchPolicy,
}

impl FromStr for MaintConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: MaintConfig = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on configured directories.
        config.dirs.source = expand(&config.dirs.source)?;
        config.dirs.destination = expand(&config.dirs.destination)?;

        Ok(config)
    }
}

impl Display for MaintConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

fn expand(path: &PathBuf) -> Result<PathBuf, ConfigError> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Directory layout of the maintained repository.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Dirs {
    /// Root of the nested workflow source tree.
    pub source: PathBuf,

    /// Flat directory holding the workflow files themselves.
    pub destination: PathBuf,
}

impl Default for Dirs {
    fn default() -> Self {
        Self {
            source: PathBuf::from("Workflows"),
            destination: PathBuf::from(".github/workflows"),
        }
    }
}

/// Per-family dry-run toggles.
///
/// A set family logs the intended action without executing it.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DryRun {
    /// Do not rename workflow files out of legacy filenames.
    pub rename: bool,

    /// Do not unlink or recreate workflow links.
    pub relink: bool,

    /// Do not edit the `name:` entry of workflow files.
    pub edit: bool,

    /// Do not delete stray destination files during the sweep.
    pub sweep: bool,
}

impl DryRun {
    /// Toggle every operation family at once.
    pub fn all() -> Self {
        Self {
            rename: true,
            relink: true,
            edit: true,
            sweep: true,
        }
    }
}

/// Content patcher policy.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PatchPolicy {
    /// Prepend a fresh `name:` line when a workflow file lacks one.
    ///
    /// Disabling this keeps the patcher from mutating file structure: files
    /// without a recognized `name:` line are reported and left alone.
    pub insert_missing: bool,
}

impl Default for PatchPolicy {
    fn default() -> Self {
        Self {
            insert_missing: true,
        }
    }
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("WF_ROOT", "/srv/workflows")])]
    fn deserialize_maint_config() -> anyhow::Result<()> {
        let result: MaintConfig = r#"
            [dirs]
            source = "$WF_ROOT"
            destination = ".github/workflows"

            [dry_run]
            sweep = true

            [patch]
            insert_missing = false
        "#
        .parse()?;

        let expect = MaintConfig {
            dirs: Dirs {
                source: PathBuf::from("/srv/workflows"),
                destination: PathBuf::from(".github/workflows"),
            },
            dry_run: DryRun {
                rename: false,
                relink: false,
                edit: false,
                sweep: true,
            },
            patch: PatchPolicy {
                insert_missing: false,
            },
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn serialize_maint_config() {
        let result = MaintConfig {
            dirs: Dirs {
                source: PathBuf::from("Workflows"),
                destination: PathBuf::from(".github/workflows"),
            },
            dry_run: DryRun {
                rename: false,
                relink: false,
                edit: false,
                sweep: true,
            },
            patch: PatchPolicy {
                insert_missing: false,
            },
        }
        .to_string();

        let expect = indoc::indoc! {r#"
            [dirs]
            source = "Workflows"
            destination = ".github/workflows"

            [dry_run]
            rename = false
            relink = false
            edit = false
            sweep = true

            [patch]
            insert_missing = false
        "#};

        assert_eq!(result, expect);
    }

    #[test]
    fn empty_input_yields_defaults() -> anyhow::Result<()> {
        let result: MaintConfig = "".parse()?;

        assert_eq!(result, MaintConfig::default());
        assert_eq!(result.dirs.source, PathBuf::from("Workflows"));
        assert_eq!(result.dirs.destination, PathBuf::from(".github/workflows"));
        assert!(result.patch.insert_missing);
        assert!(!result.dry_run.sweep);

        Ok(())
    }

    #[test]
    fn dry_run_all_sets_every_family() {
        let dry_run = DryRun::all();

        assert!(dry_run.rename && dry_run.relink && dry_run.edit && dry_run.sweep);
    }
}
