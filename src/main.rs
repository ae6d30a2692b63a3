// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use oxikit::{
    config::{self, Manifest},
    docs::{self, RegenerateOptions},
    git,
    gui::{self, GuiOptions},
    pipeline::{self, GitParams, PushPlan, TestOptions},
    project::ProjectPaths,
    version::{self, VersionChange},
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use inquire::Confirm;
use std::{env, fs, path::PathBuf, process::exit};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  oxikit [options] <oxikit-command>",
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
            Command::Init(opts) => run_init(opts),
            Command::Push(opts) => run_push(opts),
            Command::Version(opts) => run_version(opts),
            Command::Docs(opts) => run_docs(opts),
            Command::Readme(opts) => run_readme(opts),
            Command::Gui(opts) => run_gui(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Write a starter manifest into the project root.
    #[command(override_usage = "oxikit init [options]")]
    Init(InitOptions),

    /// Run the release pipeline: tests, version stamp, docs, git, deploy.
    #[command(override_usage = "oxikit push [options]")]
    Push(PushOptions),

    /// Print the version stamp, or rewrite it.
    #[command(override_usage = "oxikit version [options]")]
    Version(VersionOptions),

    /// Regenerate Sphinx stub pages for the application package.
    #[command(override_usage = "oxikit docs [options]")]
    Docs(DocsOptions),

    /// Derive README.md from the init file docstring.
    #[command(override_usage = "oxikit readme [options]")]
    Readme(ReadmeOptions),

    /// Open the project's web front end in an app-mode browser window.
    #[command(override_usage = "oxikit gui [options]")]
    Gui(GuiCliOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InitOptions {
    /// Project root to write the manifest into.
    #[arg(short, long, value_name = "path")]
    pub root: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct PushOptions {
    /// Project root directory.
    #[arg(short, long, value_name = "path")]
    pub root: Option<PathBuf>,

    /// Init file holding the version stamp.
    #[arg(long, value_name = "path")]
    pub init: Option<PathBuf>,

    /// Message for the release commit.
    #[arg(short, long, value_name = "message")]
    pub commit_message: Option<String>,

    /// Tag to attach, or "__version__" to derive it from the version stamp.
    #[arg(short, long, value_name = "name")]
    pub tag: Option<String>,

    /// Annotation message for the tag.
    #[arg(short = 'm', long, value_name = "message")]
    pub tag_message: Option<String>,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct VersionOptions {
    /// Project root directory.
    #[arg(short, long, value_name = "path")]
    pub root: Option<PathBuf>,

    /// Init file holding the version stamp.
    #[arg(long, value_name = "path")]
    pub init: Option<PathBuf>,

    /// Rewrite the stamp: "increment" or an explicit version string.
    #[arg(short, long, value_name = "directive")]
    pub set: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DocsOptions {
    /// Project root directory.
    #[arg(short, long, value_name = "path")]
    pub root: Option<PathBuf>,

    /// Init file holding the version stamp.
    #[arg(long, value_name = "path")]
    pub init: Option<PathBuf>,

    /// Documentation directory. Defaults to docs under the project root.
    #[arg(short, long, value_name = "path")]
    pub docs_path: Option<PathBuf>,

    /// Build HTML locally after regenerating stubs.
    #[arg(short, long)]
    pub build: bool,

    /// Extra entry names the stale-stub sweep spares.
    #[arg(short, long, value_name = "name")]
    pub keep: Vec<String>,

    /// Leave regenerated files unstaged.
    #[arg(long)]
    pub no_stage: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ReadmeOptions {
    /// Project root directory.
    #[arg(short, long, value_name = "path")]
    pub root: Option<PathBuf>,

    /// Init file holding the module docstring.
    #[arg(long, value_name = "path")]
    pub init: Option<PathBuf>,

    /// Leave the generated file unstaged.
    #[arg(long)]
    pub no_stage: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct GuiCliOptions {
    /// Project root directory.
    #[arg(short, long, value_name = "path")]
    pub root: Option<PathBuf>,

    /// Force development mode.
    #[arg(group = "mode", short, long)]
    pub devel: bool,

    /// Force production mode.
    #[arg(group = "mode", short, long)]
    pub production: bool,

    /// Refuse to launch a second session over the same assets.
    #[arg(short, long)]
    pub single_instance: bool,

    /// Launch record log location.
    #[arg(short, long, value_name = "path")]
    pub log: Option<PathBuf>,

    /// Pre-built asset directory, skipping discovery.
    #[arg(short, long, value_name = "path")]
    pub built_gui_path: Option<PathBuf>,
}

fn main() {
    let layer = fmt::layer().compact().with_target(false).without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_init(opts: InitOptions) -> Result<()> {
    let root = match opts.root {
        Some(root) => root,
        None => env::current_dir()?,
    };

    let target = root.join(config::MANIFEST_FILE_NAME);
    if target.exists() {
        bail!("manifest {:?} already exists", target.display());
    }

    let mut manifest = Manifest::default();
    manifest.pipeline.tests = Some(true);
    manifest.pipeline.coverage = Some(true);
    manifest.pipeline.version = Some("increment".into());
    manifest.pipeline.docs = Some(true);
    manifest.pipeline.push = Some(true);
    manifest.pipeline.deploy = Some(false);
    manifest.git.commit_message = Some("<put release summary here>".into());
    manifest.git.tag = Some(pipeline::TAG_FROM_VERSION.into());
    manifest.git.tag_message = Some(git::DEFAULT_TAG_MESSAGE.into());

    fs::write(&target, manifest.to_string())?;
    info!("wrote starter manifest {:?}", target.display());

    Ok(())
}

fn run_push(opts: PushOptions) -> Result<()> {
    let manifest = load_manifest(opts.root.clone())?;
    let paths = ProjectPaths::discover(
        opts.root.clone().or(manifest.project.root.clone()),
        opts.init.clone().or(manifest.project.init.clone()),
    )?;
    let plan = build_plan(manifest, &opts);

    if !opts.yes {
        let proceed = Confirm::new("run the release pipeline?")
            .with_default(true)
            .prompt()?;
        if !proceed {
            info!("release pipeline aborted");
            return Ok(());
        }
    }

    let report = pipeline::push_pipeline(&paths, &plan)?;
    if let Some(version) = report.version {
        info!("stamped version {version}");
    }
    if let Some(cleanup) = report.docs {
        info!("swept {} stale stub entries", cleanup.removed.len());
    }
    if let Some(tag) = report.tag {
        info!("published tag {tag}");
    }

    Ok(())
}

fn run_version(opts: VersionOptions) -> Result<()> {
    let manifest = load_manifest(opts.root.clone())?;
    let paths = ProjectPaths::discover(
        opts.root.or(manifest.project.root),
        opts.init.or(manifest.project.init),
    )?;

    let directive = match opts.set {
        Some(directive) => directive,
        None => {
            println!("{}", version::get_version(&paths.init)?);
            return Ok(());
        }
    };

    match VersionChange::from_directive(&directive) {
        Some(change) => {
            let stamped = version::set_version(&paths.init, &change)?;
            info!("stamped version {stamped}");
        }
        None => println!("{}", version::get_version(&paths.init)?),
    }

    Ok(())
}

fn run_docs(opts: DocsOptions) -> Result<()> {
    let manifest = load_manifest(opts.root.clone())?;
    let paths = ProjectPaths::discover(
        opts.root.or(manifest.project.root),
        opts.init.or(manifest.project.init),
    )?;

    let mut extra_keep = manifest.docs.extra_keep.unwrap_or_default();
    extra_keep.extend(opts.keep);

    let options = RegenerateOptions {
        docs_path: opts.docs_path,
        build_locally: opts.build || manifest.docs.build_locally.unwrap_or(false),
        stage_for_commit: !opts.no_stage,
        extra_keep,
    };

    let report = docs::regenerate(&paths, &options)?;
    info!("swept {} stale stub entries", report.removed.len());

    Ok(())
}

fn run_readme(opts: ReadmeOptions) -> Result<()> {
    let manifest = load_manifest(opts.root.clone())?;
    let paths = ProjectPaths::discover(
        opts.root.or(manifest.project.root),
        opts.init.or(manifest.project.init),
    )?;

    let readme = docs::generate_readme(&paths, !opts.no_stage)?;
    info!("wrote {:?}", readme.display());

    Ok(())
}

fn run_gui(opts: GuiCliOptions) -> Result<()> {
    let manifest = load_manifest(opts.root.clone())?;
    let root = match opts.root.or(manifest.project.root) {
        Some(root) => root,
        None => env::current_dir()?,
    };

    let devel = if opts.devel {
        Some(true)
    } else if opts.production {
        Some(false)
    } else {
        manifest.gui.devel
    };

    let options = GuiOptions {
        devel,
        single_instance: opts.single_instance || manifest.gui.single_instance.unwrap_or(false),
        log_path: opts.log.or(manifest.gui.log),
        built_gui_path: opts.built_gui_path.or(manifest.gui.built_gui_path),
    };

    // INVARIANT: Missing web assets abort the launch; anything that goes
    //     wrong after the assets resolve is logged and the process moves on.
    match gui::run_gui(&root, &options) {
        Ok(report) => {
            info!("browser session over {} finished with {}", report.url, report.status);
            Ok(())
        }
        Err(error @ (gui::Error::Find(_) | gui::Error::WebFilesNotFound { .. })) => {
            Err(error.into())
        }
        Err(error) => {
            warn!("browser session abandoned: {error:?}");
            Ok(())
        }
    }
}

fn load_manifest(root: Option<PathBuf>) -> Result<Manifest> {
    let search_root = match root {
        Some(root) => root,
        None => env::current_dir()?,
    };

    let Some(path) = config::locate_manifest(&search_root) else {
        return Ok(Manifest::default());
    };

    debug!("reading manifest {:?}", path.display());
    Ok(fs::read_to_string(&path)?.parse::<Manifest>()?)
}

fn build_plan(manifest: Manifest, opts: &PushOptions) -> PushPlan {
    let tests = manifest.pipeline.tests.unwrap_or(true).then(|| TestOptions {
        coverage: manifest.pipeline.coverage.unwrap_or(true),
    });

    // INVARIANT: An unset version directive increments; "none" skips the
    //     version step entirely.
    let version = match manifest.pipeline.version {
        Some(directive) => VersionChange::from_directive(&directive),
        None => Some(VersionChange::Increment),
    };

    let docs = manifest
        .pipeline
        .docs
        .unwrap_or(true)
        .then(|| RegenerateOptions {
            build_locally: manifest.docs.build_locally.unwrap_or(false),
            extra_keep: manifest.docs.extra_keep.unwrap_or_default(),
            ..RegenerateOptions::default()
        });

    let git = manifest.pipeline.push.unwrap_or(true).then(|| {
        let defaults = GitParams::default();
        GitParams {
            commit_message: opts
                .commit_message
                .clone()
                .or(manifest.git.commit_message)
                .unwrap_or(defaults.commit_message),
            tag: opts.tag.clone().or(manifest.git.tag).unwrap_or(defaults.tag),
            tag_message: opts
                .tag_message
                .clone()
                .or(manifest.git.tag_message)
                .unwrap_or(defaults.tag_message),
        }
    });

    PushPlan {
        tests,
        version,
        docs,
        git,
        deploy: manifest.pipeline.deploy.unwrap_or(false),
    }
}
