use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use mkrelease::cargo::CargoCli;
use mkrelease::cli::{ReleaseOptions, Releaser};
use mkrelease::config;
use mkrelease::domain::Level;
use mkrelease::git::Git2Repository;
use mkrelease::github::GitHubLookup;
use mkrelease::logging;
use mkrelease::ui::{display_error, ConsoleSpeaker, TerminalPrompter};
use mkrelease::ReleaseError;

/// Manage the release process
///
/// You should be interacting with this because you opened a release issue,
/// which lists every step to take, in order.
#[derive(Parser, Debug)]
#[command(name = "mkrelease", version)]
struct Args {
    #[arg(short, long, action = ArgAction::Count, global = true, help = "Increase log verbosity (-v, -vv, -vvv)")]
    verbose: u8,

    #[arg(long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a brand new release
    ///
    /// LEVEL picks the part of the version to change: biweekly is the Z in
    /// X.Y.Z, feature the Y, major the X. rc increases the N in -rcN and is
    /// only for a second or later release candidate.
    NewRc {
        #[arg(value_enum)]
        level: Level,

        #[command(flatten)]
        git: GitArgs,
    },

    /// Update to the next patch version with a -dev suffix
    Incorporate {
        #[command(flatten)]
        git: GitArgs,
    },

    /// Create the final non-rc tag and a branch to incorporate into the repo
    Finish {
        #[arg(short = 'b', long, help = "Create a branch and check it out")]
        create_branch: Option<String>,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// List PRs between a range of refs
    ///
    /// Without refs, lists the PRs between the most recent tag and the
    /// previous release (release candidates of the same version excluded).
    ListPrs {
        recent_ref: Option<String>,
        ancestor_ref: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct GitArgs {
    #[arg(short = 'b', long, help = "Create a branch and check it out")]
    create_branch: Option<String>,

    #[arg(
        short = 'c',
        long,
        help = "Commit or branch to check out (before creating a new branch)"
    )]
    checkout: Option<String>,

    #[command(flatten)]
    remote: RemoteArgs,
}

impl GitArgs {
    fn options(self) -> ReleaseOptions {
        ReleaseOptions {
            checkout: self.checkout,
            create_branch: self.create_branch,
            affect_remote: self.remote.enabled(),
        }
    }
}

#[derive(clap::Args, Debug)]
struct RemoteArgs {
    #[arg(
        long = "affect-remote",
        overrides_with = "no_affect_remote",
        help = "Interact with the upstream remote (default)"
    )]
    affect_remote: bool,

    #[arg(
        long = "no-affect-remote",
        overrides_with = "affect_remote",
        help = "Do not fetch from or push to any remote"
    )]
    no_affect_remote: bool,
}

impl RemoteArgs {
    fn enabled(&self) -> bool {
        !self.no_affect_remote
    }
}

fn main() {
    let args = Args::parse();
    logging::init(args.verbose);

    if let Err(e) = run(args) {
        match e.downcast_ref::<ReleaseError>() {
            Some(ReleaseError::Aborted) => eprintln!("Aborted!"),
            _ => display_error(&format!("{:#}", e)),
        }
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config =
        config::load_config(args.config.as_deref()).context("Failed to load configuration")?;

    let repo = Git2Repository::open(".").context("Failed to open the git repository")?;
    let root = repo.workdir()?.to_path_buf();
    let build = CargoCli::new(config.project.cargo_package.clone(), root.clone());
    let prompter = TerminalPrompter;
    let speaker = ConsoleSpeaker;

    let releaser = Releaser::new(&repo, &build, &prompter, &speaker, &config).with_root(root);

    match args.command {
        Command::NewRc { level, git } => {
            releaser.new_rc(level, &git.options())?;
        }
        Command::Incorporate { git } => {
            releaser.incorporate(&git.options())?;
        }
        Command::Finish {
            create_branch,
            remote,
        } => {
            releaser.finish(create_branch, remote.enabled())?;
        }
        Command::ListPrs {
            recent_ref,
            ancestor_ref,
        } => {
            let lookup = GitHubLookup::from_config(&config);
            let pulls =
                releaser.list_prs(recent_ref.as_deref(), ancestor_ref.as_deref(), &lookup)?;
            for pull in pulls {
                println!("{} {}", pull.url, pull.title);
            }
        }
    }

    Ok(())
}
