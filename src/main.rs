// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use repokeep::{
    config::{DryRun, MaintConfig},
    forks,
    links::{drive::Driver, refresh::refresh},
    path::project_root,
    render,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
    process::exit,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  repokeep [options] <repokeep-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Locations(opts) => run_locations(opts),
            Command::Refresh(opts) => run_refresh(opts),
            Command::Forks(opts) => run_forks(opts),
            Command::Render(opts) => run_render(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Repair workflow links, then sweep stray workflow files.
    #[command(override_usage = "repokeep locations [options]")]
    Locations(LocationsOptions),

    /// Remove dead workflow links and create missing ones.
    #[command(override_usage = "repokeep refresh [options]")]
    Refresh(RefreshOptions),

    /// Enforce naming and description policy on tagged development forks.
    #[command(override_usage = "repokeep forks [options]")]
    Forks(ForksOptions),

    /// Render a template from stdin to stdout against an empty context.
    #[command(override_usage = "repokeep render")]
    Render(RenderOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct LocationsOptions {
    /// Path to an alternate configuration file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Log every intended action without touching the filesystem.
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RefreshOptions {
    /// Path to an alternate configuration file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Log every intended action without touching the filesystem.
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ForksOptions {
    /// Topic that marks a repository as a development fork.
    #[arg(short, long, value_name = "topic", default_value = forks::DEV_FORK_TOPIC)]
    pub topic: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RenderOptions {}

fn main() {
    let layer = fmt::layer().compact();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry().with(layer).with(filter).init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_locations(opts: LocationsOptions) -> Result<()> {
    let root = project_root()?;
    info!("using project root '{}'", root.display());

    let mut config = load_config(&root, opts.config.as_deref())?;
    if opts.dry_run {
        config.dry_run = DryRun::all();
    }

    let outcome = Driver::new(&root, &config).run()?;
    info!(
        "{} link(s) settled, {} failure(s)",
        outcome.fixed, outcome.failed
    );

    if !outcome.is_clean() {
        bail!("{} workflow link(s) could not be repaired", outcome.failed);
    }

    Ok(())
}

fn run_refresh(opts: RefreshOptions) -> Result<()> {
    let root = project_root()?;
    info!("using project root '{}'", root.display());

    let mut config = load_config(&root, opts.config.as_deref())?;
    if opts.dry_run {
        config.dry_run = DryRun::all();
    }

    refresh(&root, &config)?;

    Ok(())
}

fn run_forks(opts: ForksOptions) -> Result<()> {
    let client = forks::GithubClient::from_env()?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let outcome = runtime.block_on(forks::enforce(&client, &opts.topic))?;

    info!(
        "{} fork(s) processed, {} failure(s)",
        outcome.processed, outcome.failed
    );

    if !outcome.is_clean() {
        bail!("{} fork(s) could not be processed", outcome.failed);
    }

    Ok(())
}

fn run_render(_opts: RenderOptions) -> Result<()> {
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .context("failed to read template from stdin")?;

    let rendered = render::render_str(&source)?;
    println!("{rendered}");

    Ok(())
}

/// Load the maintenance configuration for one run.
///
/// An explicit `--config` path must exist; the default `repokeep.toml` at
/// the project root is optional and falls back to defaults when missing.
fn load_config(root: &Path, explicit: Option<&Path>) -> Result<MaintConfig> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (root.join("repokeep.toml"), false),
    };

    match fs::read_to_string(&path) {
        Ok(data) => Ok(data
            .parse()
            .with_context(|| format!("failed to parse '{}'", path.display()))?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
            Ok(MaintConfig::default())
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    }
}
