mod calc;
mod cmd;
mod data;
mod error;
mod logging;
mod service;
mod ui;

use calc::Preset;
use calc::dates::parse_date;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "ftcal", about = "fertility cycle calendar")]
struct Cli {
    /// Path to the data directory containing config and data files (default: ./config)
    #[arg(long, default_value = "./config")]
    data_dir: PathBuf,

    /// Tracker entry to use instead of the one in config.yaml
    #[arg(long)]
    entry: Option<String>,

    /// Log filter when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample config and tracker file
    Init,
    /// List tracker entries
    Entries,
    /// List recorded cycles and events
    Cycles,
    /// Print a month grid
    Month {
        /// Months relative to the current one (e.g. -1 for last month)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i32,
    },
    /// Show cycle predictions and risk for a date
    Stats {
        /// Date to evaluate (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Record a period
    Add {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change fields of a recorded period
    Edit {
        id: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a recorded period
    Delete { id: String },
    /// Log an intercourse event at the current time
    Log {
        #[arg(long)]
        protected: bool,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Apply a one-key preset
    Preset {
        #[command(subcommand)]
        preset: PresetCommand,
    },
    /// Dump the entry as JSON
    Export,
}

#[derive(Subcommand, Clone, Copy)]
enum PresetCommand {
    /// Open a period starting today
    StartToday,
    /// End the most recent period today
    EndToday,
    /// Add a period of N days starting today
    Fixed { days: i64 },
    /// Move the most recent period start by N days
    Shift {
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
}

impl From<PresetCommand> for Preset {
    fn from(cmd: PresetCommand) -> Self {
        match cmd {
            PresetCommand::StartToday => Preset::StartToday,
            PresetCommand::EndToday => Preset::EndLastToday,
            PresetCommand::Fixed { days } => Preset::FixedLength(days),
            PresetCommand::Shift { delta } => Preset::ShiftLastStart(delta),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = if cli.data_dir.is_absolute() {
        cli.data_dir.clone()
    } else {
        std::env::current_dir()?.join(&cli.data_dir)
    };

    // Checked before logging starts: the terminal UI writes its log file
    // into the data directory.
    let is_init_command = matches!(cli.command, Some(Commands::Init));
    let needs_init = !is_init_command && dir_needs_init(&data_dir);

    let log_file = cli.command.is_none().then(|| data_dir.join(logging::LOG_FILE));
    logging::init_tracing(&cli.log_level, log_file.as_deref())?;

    let today = calc::dates::today();
    if needs_init {
        eprintln!("Data directory '{}' is missing or empty; running init...", data_dir.display());
        cmd::init::run(&data_dir, today)?;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let open = || cmd::Session::open(&data_dir, cli.entry.clone());
    debug!(data_dir = %data_dir.display(), "starting");

    match cli.command {
        None => cmd::root::run(&open()?, &runtime),
        Some(Commands::Init) => cmd::init::run(&data_dir, today),
        Some(Commands::Entries) => runtime.block_on(cmd::entries::run(&open()?)),
        Some(Commands::Cycles) => runtime.block_on(cmd::cycles::run(&open()?)),
        Some(Commands::Month { offset }) => runtime.block_on(cmd::month::run(&open()?, offset, today)),
        Some(Commands::Stats { date }) => {
            let date = date.as_deref().map(parse_date).transpose()?.unwrap_or(today);
            runtime.block_on(cmd::stats::run(&open()?, date))
        }
        Some(Commands::Add { start, end, notes }) => {
            runtime.block_on(cmd::mutate::add(&open()?, &start, end.as_deref(), notes))
        }
        Some(Commands::Edit { id, start, end, notes }) => runtime.block_on(cmd::mutate::edit(
            &open()?,
            &id,
            start.as_deref(),
            end.as_deref(),
            notes,
        )),
        Some(Commands::Delete { id }) => runtime.block_on(cmd::mutate::delete(&open()?, &id)),
        Some(Commands::Log { protected, notes }) => runtime.block_on(cmd::mutate::log(&open()?, protected, notes)),
        Some(Commands::Preset { preset }) => {
            runtime.block_on(cmd::mutate::preset(&open()?, preset.into(), today))
        }
        Some(Commands::Export) => runtime.block_on(cmd::export::run(&open()?)),
    }
}

/// Returns true when `dir` does not exist or exists but contains no files.
fn dir_needs_init(dir: &std::path::Path) -> bool {
    if !dir.exists() {
        return true;
    }
    dir.read_dir()
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_dir_needs_init_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("does_not_exist");
        assert!(dir_needs_init(&missing));
    }

    #[test]
    fn test_dir_needs_init_empty_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(dir_needs_init(tmp.path()));
    }

    #[test]
    fn test_dir_needs_init_nonempty_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("file.txt"), "data").unwrap();
        assert!(!dir_needs_init(tmp.path()));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_negative_offsets() {
        let cli = Cli::try_parse_from(["ftcal", "month", "--offset", "-2"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Month { offset: -2 })));
        let cli = Cli::try_parse_from(["ftcal", "preset", "shift", "-1"]).unwrap();
        match cli.command {
            Some(Commands::Preset { preset }) => assert_eq!(Preset::from(preset), Preset::ShiftLastStart(-1)),
            _ => panic!("expected preset command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from(["ftcal", "--entry", "abc", "--log-level", "debug", "cycles"]).unwrap();
        assert_eq!(cli.entry.as_deref(), Some("abc"));
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.data_dir, PathBuf::from("./config"));
    }
}
