use clap::Parser;
use content_partition::{Rebuild, RunMode, config, output, partition};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log level flags. At most one may be given.
#[derive(clap::Args, Clone, Debug)]
#[group(multiple = false)]
struct Verbosity {
    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
    /// Log every copy and link
    #[arg(short, long)]
    verbose: bool,
    /// Log skipped files and routing decisions too
    #[arg(short = 'D', long)]
    debug: bool,
}

impl Verbosity {
    /// Level picked by a flag, or `None` to defer to `RUST_LOG`.
    fn directive(&self) -> Option<&'static str> {
        if self.quiet {
            Some("error")
        } else if self.verbose {
            Some("info")
        } else if self.debug {
            Some("debug")
        } else {
            None
        }
    }
}

#[derive(Parser)]
#[command(name = "content-partition", version)]
#[command(about = "Split a content tree into plain and component-driven trees")]
#[command(long_about = "\
Split a content tree into plain and component-driven trees

Every directory is decided by its index.md. If the index sets
`components: true` in its front matter, or uses a component tag such as
`<slot ` or `<g-image `, the index is copied into the rich tree and every
other file in that directory is linked next to it. All other files are
linked into the plain tree. Links are relative.

Config (JSON, or TOML when the file ends in .toml):

  {
    \"contentDir\": \"content\",
    \"build\": { \"mdDir\": \"build/md\", \"vueDir\": \"build/vue\" }
  }

Paths are relative to the config file. Both destination trees are emptied
first unless --incremental is given.")]
struct Cli {
    /// Project config file
    #[arg(default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log what would happen without touching the filesystem
    #[arg(short = 'n', long)]
    simulate: bool,

    /// Keep the destination trees and only add missing files
    #[arg(long)]
    incremental: bool,

    /// Print the run report as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Write log messages to FILE instead of stderr (overwrites it)
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    #[command(flatten)]
    verbosity: Verbosity,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.verbosity, cli.log.as_deref()) {
        eprintln!("Error: cannot set up logging: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(&cli.config)?;
    let mode = RunMode {
        simulate: cli.simulate,
        rebuild: if cli.incremental {
            Rebuild::Incremental
        } else {
            Rebuild::Full
        },
    };

    let report = partition(&config, mode)?;

    if cli.json {
        println!("{}", output::format_json(&report)?);
    } else {
        output::print_summary(&report);
    }
    Ok(())
}

/// Install the tracing subscriber. Messages are printed bare, one per line.
///
/// A flag wins over `RUST_LOG`; with neither, only warnings and errors show.
fn init_logging(verbosity: &Verbosity, log: Option<&Path>) -> std::io::Result<()> {
    let filter = match verbosity.directive() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .with_level(false);

    match log {
        Some(path) => {
            let file = File::create(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
