mod api;
mod core;
#[cfg(test)]
mod test_support;
mod tui;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

use crate::core::config::{ResolvedConfig, Transport, load_config};

#[derive(Parser)]
#[command(name = "karte", about = "Terminal client for a streaming consultation service")]
struct Args {
    /// Backend base URL (overrides config file and KARTE_BACKEND_URL)
    #[arg(short, long)]
    backend_url: Option<String>,

    /// How answer fragments are transported
    #[arg(short, long, value_enum)]
    transport: Option<Transport>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to karte.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("karte.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()));
        }
    };

    let resolved = ResolvedConfig::resolve(
        &file_config,
        std::env::var("KARTE_BACKEND_URL").ok(),
        args.backend_url,
        args.transport,
    );

    log::info!(
        "Karte starting up: backend={}, transport={:?}",
        resolved.base_url,
        resolved.transport
    );

    tui::run(resolved)
}
