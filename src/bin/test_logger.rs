//! Writes numbered lines to a log file at a fixed rate, for exercising a
//! running pair of capture coordinators by hand.

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

#[derive(Parser)]
#[command(name = "test_logger")]
#[command(about = "Append 'Log line <n>' to a file at a fixed interval")]
struct Args {
    /// File to create (truncated if it exists)
    path: PathBuf,

    /// Delay between lines in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Stop after this many lines instead of running until killed
    #[arg(long)]
    count: Option<u64>,
}

async fn write_lines(args: &Args) -> std::io::Result<()> {
    let mut file = File::create(&args.path).await?;
    let interval = Duration::from_millis(args.interval_ms);
    let limit = args.count.unwrap_or(u64::MAX);

    for i in 0..limit {
        file.write_all(format!("Log line {}\n", i).as_bytes()).await?;
        file.flush().await?;
        tokio::time::sleep(interval).await;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();

    let args = Args::parse();
    info!("Writing to {} every {} ms", args.path.display(), args.interval_ms);

    if let Err(e) = write_lines(&args).await {
        error!("Unable to write {}: {}", args.path.display(), e);
        std::process::exit(1);
    }
}
