use clap::Parser;
use dualcap::configuration::config::Config;
use dualcap::controller::controller_handler::Controller;
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dualcap")]
#[command(version = "0.1.0")]
#[command(about = "Coordinated two-sided packet capture with a shared stop trigger")]
struct Args {
    /// key=value configuration file
    config_file: PathBuf,

    /// Validate the configuration, print it as TOML and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() {
    // https://docs.rs/env_logger/latest/env_logger/
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_target(false)
        .init();

    let args = Args::parse();

    info!("Importing configuration from {}", args.config_file.display());
    let config = match Config::from_file(&args.config_file) {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to import configuration from file: {}", e);
            std::process::exit(1);
        }
    };

    if args.check {
        match config.to_toml() {
            Ok(rendered) => {
                print!("{}", rendered);
                return;
            }
            Err(e) => {
                error!("Unable to render configuration: {}", e);
                std::process::exit(1);
            }
        }
    }

    info!("Configuration imported successfully");

    let controller = Controller::new(config);
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for interrupts: {}", e);
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = controller.run_until(interrupt).await {
        error!("[{}] {}, exiting...", controller.session_id(), e);
        std::process::exit(1);
    }
}
