//! Synchronize the wsprnet.org monthly spot archive into a local database.

use std::path::PathBuf;
use std::process;

use clap::{crate_version, value_parser, Arg, ArgAction, Command};
use tracing::error;
use tracing_subscriber::EnvFilter;

use wspr_data::{run_ingest, Config, IngestOptions, WsprDataErr};

// Exit status for missing configuration, distinct from the catch all
// failure status.
const EX_CONFIG: i32 = 78;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(ref err) = run() {
        error!("{}", err);

        let status = match err {
            WsprDataErr::MissingConfig(_) => EX_CONFIG,
            _ => 1,
        };
        process::exit(status);
    }
}

fn run() -> Result<(), WsprDataErr> {
    let matches = Command::new("wsprdn")
        .about("Download WSPR spot archives into your local database.")
        .version(crate_version!())
        .arg(
            Arg::new("force")
                .short('F')
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Force download and ingestion, skipping the freshness check."),
        )
        .arg(
            Arg::new("filename")
                .short('f')
                .long("filename")
                .value_name("PATH")
                .help("Ingest a local archive (gzipped) instead of downloading."),
        )
        .arg(
            Arg::new("month")
                .short('m')
                .long("month")
                .value_name("N")
                .value_parser(value_parser!(u32))
                .help("Month of the current year to download."),
        )
        .after_help(
            "The database file and the directory downloaded archives are kept in come \
             from the WSPR_DB and WSPR_WORK_DIR environment variables. Log verbosity \
             follows RUST_LOG and defaults to info.",
        )
        .get_matches();

    let config = Config::from_env()?;

    let options = IngestOptions {
        force: matches.get_flag("force"),
        filename: matches.get_one::<String>("filename").map(PathBuf::from),
        month: matches.get_one::<u32>("month").copied(),
    };

    run_ingest(&config, &options)?;

    Ok(())
}
