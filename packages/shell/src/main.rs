use std::path::PathBuf;

use arduinos_eeprom::DEFAULT_SIZE;
use arduinos_kernel::{KernelConfig, DEFAULT_MAX_PROCESSES, DEFAULT_TICKS_PER_COMMAND};
use arduinos_shell::{EditPreference, ShellOptions};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// ArduinOS - a tiny multitasking kernel on a simulated EEPROM
#[derive(Parser, Debug)]
#[command(name = "arduinos")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// EEPROM image file, created if missing. Without one the store lives in memory.
    #[arg(long, short)]
    image: Option<PathBuf>,

    /// Store size in bytes for a new image
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// Maximum number of process slots
    #[arg(long, default_value_t = DEFAULT_MAX_PROCESSES)]
    max_processes: usize,

    /// Scheduler passes run after every command
    #[arg(long, default_value_t = DEFAULT_TICKS_PER_COMMAND)]
    ticks_per_command: usize,

    /// Force vi editing mode
    #[arg(long)]
    vi: bool,

    /// Force emacs editing mode
    #[arg(long, conflicts_with = "vi")]
    emacs: bool,

    /// Log filter, e.g. `debug` or `arduinos_kernel=trace`. Defaults to RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let edit_mode = if args.vi {
        EditPreference::Vi
    } else if args.emacs {
        EditPreference::Emacs
    } else {
        EditPreference::Auto
    };

    let options = ShellOptions {
        image: args.image,
        size: args.size,
        kernel: KernelConfig {
            max_processes: args.max_processes,
            ticks_per_command: args.ticks_per_command,
            ..KernelConfig::default()
        },
        edit_mode,
    };

    if let Err(e) = arduinos_shell::run(options) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
