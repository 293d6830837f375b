//! p4tagged CLI
//!
//! Inspect message codes, convert tagged text into binary captures, and
//! replay captures through the result processor.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use p4tagged::engine::Processed;
use p4tagged::protocol::{format_ztag, parse_ztag, read_capture, write_capture, RawCode};
use p4tagged::{classify, Config, ResultPolicy, ResultProcessor, RowResult};
use tracing_subscriber::{fmt, EnvFilter};

/// p4tagged
#[derive(Parser, Debug)]
#[command(name = "p4tagged")]
#[command(about = "Decode and classify tagged Perforce command output")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decompose a packed message code
    Code {
        /// The code, in decimal
        raw: String,
    },

    /// Convert tagged text into a binary capture
    Capture {
        /// Tagged text file (`... key value` lines)
        input: PathBuf,

        /// Capture file to write
        output: PathBuf,
    },

    /// Run captured rows through the result processor
    Replay {
        /// Capture file to read
        input: PathBuf,

        /// Result policy (first-error, collect-all, scalar)
        #[arg(short, long, default_value = "first-error")]
        policy: ResultPolicy,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,p4tagged=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!("p4tagged v{}", p4tagged::VERSION);

    if let Err(e) = run(args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> p4tagged::Result<()> {
    let config = Config::default();
    config.validate()?;

    match command {
        Commands::Code { raw } => {
            let code = RawCode::parse(&raw)?;
            let parts = code.decompose();
            println!("code:           {}", code);
            println!("severity:       {} ({})", parts.severity, classify(&parts.severity));
            println!("arguments:      {}", parts.arg_count);
            println!("generic:        {}", parts.generic);
            println!("subsystem:      {}", parts.subsystem);
            println!("unique code:    {}", parts.unique_code);
            println!("sub code:       {}", parts.sub_code);
            println!("id:             {}", parts);
        }

        Commands::Capture { input, output } => {
            let text = fs::read_to_string(&input)?;
            let rows = parse_ztag(&text)?;
            let mut writer = BufWriter::new(File::create(&output)?);
            write_capture(&mut writer, &rows)?;
            tracing::info!("Captured {} rows into {}", rows.len(), output.display());
        }

        Commands::Replay { input, policy } => {
            let mut reader = BufReader::new(File::open(&input)?);
            let rows = read_capture(&mut reader, config.max_payload_size)?;
            tracing::info!("Replaying {} rows with policy {}", rows.len(), policy);

            let processor = ResultProcessor::new(config);
            match processor.process(policy, &rows)? {
                Processed::Rows(rows) => print!("{}", format_ztag(&rows)),
                Processed::Collected(results) => {
                    for result in results {
                        match result {
                            RowResult::Failed(message) => println!("error: {}", message),
                            RowResult::Valid { value, message } => {
                                if let Some(message) = message {
                                    println!("{}: {}", message.severity(), message);
                                }
                                print!("{}", format_ztag(std::slice::from_ref(&value)));
                            }
                        }
                    }
                }
                Processed::Scalar(text) => println!("{}", text),
            }
        }
    }

    Ok(())
}
