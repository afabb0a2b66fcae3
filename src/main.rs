use chrono::Utc;
use clap::Parser;
use color_eyre::Result;
use dotenvy::dotenv;
use env_logger::Builder;
use gpg_identity::cli::{run_cli, Cli};
use log::LevelFilter;
use std::io::Write;

fn main() -> Result<()> {
    color_eyre::install()?;
    // load environment variables from .env file, if present
    dotenv().ok();

    let cli = Cli::parse();
    setup_cli_logging(cli.verbose);

    if let Err(e) = run_cli(cli) {
        eprintln!("gpg-identity error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Log to stderr so stdout only carries command output. `RUST_LOG`
/// overrides the level picked by `--verbose`.
fn setup_cli_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            let ts = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(
                buf,
                "[{}] {} [{}] {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
