mod commands;
mod formatting;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use wsrun_core::{LocateOptions, RunnerKind};

#[derive(Parser)]
#[command(name = "wsrun")]
#[command(about = "Run package scripts across monorepo workspaces")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory to start the workspace root search from
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Keep searching upward past node_modules directories
    #[arg(long, action)]
    cross_node_modules: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long, action)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script in every workspace under the package prefix
    Run {
        /// Start every task at once instead of one after another
        #[arg(short, long, action)]
        parallel: bool,
        /// Do not announce each task before it starts
        #[arg(short, long, action)]
        silent: bool,
        /// Comma-separated short names that run first, in this order
        #[arg(short, long)]
        order: Option<String>,
        /// Comma-separated short names to leave out
        #[arg(short, long)]
        exclude: Option<String>,
        /// Maximum concurrent tasks with --parallel
        #[arg(short = 'j', long)]
        jobs: Option<usize>,
        #[arg(long, value_enum)]
        runner: Option<RunnerArg>,
        /// Script name followed by arguments passed through verbatim
        #[arg(
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "COMMAND"
        )]
        command: Vec<String>,
    },
    /// Rewrite the tsconfig references list from the discovered workspaces
    Generate {
        /// References file relative to the workspace root
        #[arg(long)]
        file: Option<String>,
    },
    /// List discovered workspaces
    List {
        #[arg(long, action)]
        json: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum RunnerArg {
    Yarn,
    Npm,
    Pnpm,
    Shell,
}

impl From<RunnerArg> for RunnerKind {
    fn from(arg: RunnerArg) -> Self {
        match arg {
            RunnerArg::Yarn => RunnerKind::Yarn,
            RunnerArg::Npm => RunnerKind::Npm,
            RunnerArg::Pnpm => RunnerKind::Pnpm,
            RunnerArg::Shell => RunnerKind::Shell,
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let log_level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_env("WSRUN_LOG")
        .unwrap_or_else(|_| EnvFilter::default().add_directive(log_level.into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let start_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let locate = LocateOptions::new(start_dir).cross_dependency_cache(cli.cross_node_modules);

    match cli.command {
        Commands::Run {
            parallel,
            silent,
            order,
            exclude,
            jobs,
            runner,
            command,
        } => commands::cmd_run(
            locate,
            commands::RunArgs {
                parallel,
                silent,
                order,
                exclude,
                jobs,
                runner: runner.map(Into::into),
                command,
            },
        )?,
        Commands::Generate { file } => commands::cmd_generate(locate, file)?,
        Commands::List { json } => commands::cmd_list(locate, json)?,
    }

    Ok(())
}
