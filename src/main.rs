use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use replaycov::cli::{self, EvaluateArgs, Style};

/// replaycov — Branch coverage of replayed test suites from gcov annotations.
#[derive(Parser)]
#[command(name = "replaycov", version, about)]
struct Cli {
    /// Log debug diagnostics (otherwise controlled by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Output style.
    #[arg(long, global = true, value_enum, default_value = "text")]
    style: Style,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate branch visits, function coverage and switch counts from
    /// `.gcov` files found under the given directories.
    Branches {
        /// Directories to search for annotation files.
        #[arg(required = true)]
        roots: Vec<PathBuf>,
    },

    /// Compute cumulative branch coverage from gcov summary reports.
    Coverage {
        /// Summary reports, one per replay step, in replay order.
        #[arg(required = true)]
        summaries: Vec<PathBuf>,
    },

    /// Evaluate one run and update its CSV tables.
    Evaluate {
        /// Test-case directory of the run (names tool, program, repetition).
        #[arg(long)]
        src_dir: String,

        /// Build number substituted for `<gcov_num>` in the config.
        #[arg(long)]
        gcov_num: u32,

        /// Program configuration file.
        #[arg(long, default_value = "config.json")]
        config: PathBuf,

        /// Tool name, overriding the one inferred from --src-dir.
        #[arg(long)]
        tool: Option<String>,

        /// Summary report of a replay step; repeat in replay order.
        #[arg(long = "summary")]
        summaries: Vec<PathBuf>,

        /// Directory searched for annotation files (default from config).
        #[arg(long)]
        annotation_root: Option<PathBuf>,

        /// Output directory for the CSV tables.
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let output = match cli.command {
        Commands::Branches { roots } => cli::cmd_branches(&roots, cli.style)?,
        Commands::Coverage { summaries } => cli::cmd_coverage(&summaries, cli.style)?,
        Commands::Evaluate {
            src_dir,
            gcov_num,
            config,
            tool,
            summaries,
            annotation_root,
            out,
        } => cli::cmd_evaluate(
            &EvaluateArgs {
                src_dir,
                gcov_num,
                config,
                tool,
                summaries,
                annotation_root,
                out,
            },
            cli.style,
        )?,
    };
    print!("{output}");
    Ok(())
}
