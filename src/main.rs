use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use symbiolab_core::config::AppConfig;
use symbiolab_core::init_logging;
use symbiolab_lib::app::App;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of updates to run
    #[arg(short, long, default_value_t = 1000)]
    updates: u64,

    /// Random seed, overriding the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Threads taking part in the CPU phase, overriding the config file
    #[arg(long)]
    threads: Option<usize>,

    /// Updates between checkpoint lines on stdout
    #[arg(long, default_value_t = 100)]
    data_interval: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.world.seed = Some(seed);
    }
    if let Some(threads) = args.threads {
        config.hardware.thread_count = threads;
    }
    config.validate()?;

    let mut app = App::new(config, args.data_interval)?;
    let stdout = std::io::stdout();
    app.run(args.updates, &mut stdout.lock())?;
    Ok(())
}
