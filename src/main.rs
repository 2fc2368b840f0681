use clap::{CommandFactory, Parser, Subcommand};
use crossterm::tty::IsTty;
use serde::Serialize;
use std::error::Error;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use sanity_logs::config::{self, ENV_SANITY_DIR};
use sanity_logs::{CommandPager, Config, LogViewer, Pager};

/// Sanity Logs - analyze and navigate sanity test logs
#[derive(Parser, Debug)]
#[command(
    name = "sanity-logs",
    about = "Analyze and navigate sanity test run logs",
    after_help = "EXAMPLES:\n\
        sanity-logs list                                    List all sanity runs\n\
        sanity-logs show 20250825_130529                    Show details for a run\n\
        sanity-logs summary 20250825_130529                 Step summary with durations and results\n\
        sanity-logs view 20250825_130529 --step dmtx_simple View a step log\n\
        sanity-logs view 20250825_130529 --lines 100:200    View lines 100-200 of the master log\n\
        sanity-logs search 20250825_130529 \"ERROR.*timeout\" Search all logs of a run\n\
        sanity-logs filter 20250825_130529 ERROR            Filter the master log by level\n\
        sanity-logs compare run1 run2                       Compare two runs\n\
        \n\
        ENVIRONMENT VARIABLES:\n\
        SANITY_LOGS_DIR             Root directory holding run directories\n\
        SANITY_LOGS_PAGER           Pager command (default: less -R, else more)\n\
        SANITY_LOGS_NO_PAGER        Disable the pager\n\
        SANITY_LOGS_DEFAULT_LINES   Line cap for invalid --lines values\n\
        SANITY_LOGS_STATUS_TAIL     Trailing lines inspected for step status\n\
        RUST_LOG                    Diagnostic log filter (default: warn)"
)]
struct Args {
    /// Path to the sanity directory
    #[arg(long, global = true, env = ENV_SANITY_DIR)]
    sanity_dir: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all sanity runs
    List,

    /// Show components and test steps of a run
    Show {
        /// Run name or partial name (e.g. "20250825_130529" or just "20250825")
        run: String,
    },

    /// View log content, paged unless a line range is given
    View {
        /// Run name or partial name
        run: String,

        /// Step to view (default: master log)
        #[arg(long)]
        step: Option<String>,

        /// Lines to show: "50" (first 50), "10:50", "100:" (to the end), ":50"
        #[arg(long, allow_hyphen_values = true)]
        lines: Option<String>,

        /// Print directly instead of using less/more
        #[arg(long)]
        no_pager: bool,
    },

    /// Search logs with a regular expression
    Search {
        /// Run name or partial name
        run: String,

        /// Search pattern (e.g. "ERROR.*timeout")
        pattern: String,

        /// Step to search in (default: all steps and the master log)
        #[arg(long)]
        step: Option<String>,

        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,
    },

    /// Filter a log by level (INFO, DEBUG, ERROR, WARNING, ...)
    Filter {
        /// Run name or partial name
        run: String,

        /// Level to keep
        level: String,

        /// Step to filter (default: master log)
        #[arg(long)]
        step: Option<String>,
    },

    /// Show status, duration and test results of every step
    Summary {
        /// Run name or partial name
        run: String,
    },

    /// Compare components and steps of two runs
    Compare {
        /// First run name or partial name
        run1: String,

        /// Second run name or partial name
        run2: String,
    },

    /// List the step headers found in a log
    Outline {
        /// Run name or partial name
        run: String,

        /// Step log to scan (default: master log)
        #[arg(long)]
        step: Option<String>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    let mut config = config::get().clone();
    if let Some(dir) = args.sanity_dir {
        config.sanity_dir = dir;
    }
    let viewer = LogViewer::new(config);
    let json = args.json;

    match command {
        Commands::List => emit(&viewer.list(), json)?,
        Commands::Show { run } => emit(&viewer.show(&run)?, json)?,
        Commands::View {
            run,
            step,
            lines,
            no_pager,
        } => {
            let view = viewer.view(&run, step.as_deref(), lines.as_deref())?;
            if json {
                return emit(&view, json);
            }

            let mut pager = open_pager(viewer.config(), no_pager);
            let mut stdout = io::stdout().lock();
            viewer.present(&view, pager.as_mut().map(|p| p as &mut dyn Pager), &mut stdout)?;
        }
        Commands::Search {
            run,
            pattern,
            step,
            case_sensitive,
        } => emit(&viewer.search(&run, step.as_deref(), &pattern, case_sensitive)?, json)?,
        Commands::Filter { run, level, step } => {
            emit(&viewer.filter(&run, &level, step.as_deref())?, json)?
        }
        Commands::Summary { run } => emit(&viewer.summary(&run)?, json)?,
        Commands::Compare { run1, run2 } => emit(&viewer.compare(&run1, &run2)?, json)?,
        Commands::Outline { run, step } => emit(&viewer.outline(&run, step.as_deref())?, json)?,
    }

    Ok(())
}

/// Print a result as text, or as pretty JSON with `--json`
fn emit<T: Display + Serialize>(value: &T, json: bool) -> Result<(), Box<dyn Error>> {
    let mut stdout = io::stdout().lock();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(value)?)?;
    } else {
        write!(stdout, "{}", value)?;
    }
    Ok(())
}

/// A pager, when paging is enabled and stdout is a terminal
fn open_pager(config: &Config, no_pager: bool) -> Option<CommandPager> {
    if no_pager || !config.pager.enabled || !io::stdout().is_tty() {
        return None;
    }
    match CommandPager::detect(&config.pager) {
        Ok(pager) => Some(pager),
        Err(e) => {
            log::warn!("{}; printing directly", e);
            None
        }
    }
}
