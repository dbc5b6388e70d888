//! qqwry: look up IPv4 addresses in a QQWry database.

use clap::Parser;
use qqwry::{CachedLocator, Location, LocatorConfig, QqwryError};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qqwry")]
#[command(version)]
#[command(about = "Resolve IPv4 addresses to city and ISP using a qqwry.dat file", long_about = None)]
struct Cli {
    /// Database file (overrides the config file)
    #[arg(short, long)]
    db: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print one JSON object per address
    #[arg(long)]
    json: bool,

    /// Addresses to look up
    #[arg(required = true)]
    ips: Vec<String>,
}

#[derive(Serialize)]
struct Output<'a> {
    ip: &'a str,
    city: &'a str,
    isp: &'a str,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Look up every address; returns `Ok(false)` if any lookup failed.
fn run(cli: &Cli) -> Result<bool, QqwryError> {
    let mut config = match &cli.config {
        Some(path) => LocatorConfig::from_json_file(path)?,
        None => LocatorConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }

    let locator = CachedLocator::from_config(&config)?;
    log::info!(
        "{} index entries in {}",
        locator.locator().entry_count()?,
        config.db_path.display()
    );

    let mut all_found = true;
    for ip in &cli.ips {
        match locator.query(ip) {
            Ok(location) => println!("{}", render(ip, &location, cli.json)?),
            Err(e) => {
                eprintln!("{}: {}", ip, e);
                all_found = false;
            }
        }
    }
    Ok(all_found)
}

fn render(ip: &str, location: &Location, json: bool) -> Result<String, QqwryError> {
    if json {
        let output = Output {
            ip,
            city: &location.city,
            isp: &location.isp,
        };
        Ok(serde_json::to_string(&output)?)
    } else {
        Ok(format!("{}\t{}\t{}", ip, location.city, location.isp))
    }
}
