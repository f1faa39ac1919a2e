use std::env;

use clap::Parser;
use takehome::api::{Cli, run_cli, run_http_server};
use takehome::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        if let Err(e) = run_http_server(port, AppConfig::from_env()).await {
            eprintln!("Server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let cli = Cli::parse_from(raw_args);
    match run_cli(cli).await {
        Ok(report) => println!("{report}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
