//! tokenlens - decode capability tokens and print what their caveats allow.
//!
//! # Environment Variables
//!
//! - `FLY_API_TOKEN`: token (or `FlyV1 ...` header value) used when neither
//!   `--token` nor `--file` is given
//! - `TOKENLENS_APPS`: application snapshot used when `--apps` is not given
//! - `RUST_LOG`: log filter, overrides `--log-level`
//!
//! A `.env` file in the working directory is loaded first.

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use secrecy::SecretString;
use tokenlens::debug::{self, DebugOptions, DebugReport};
use tokenlens::decode::{EnvelopeDecoder, split_tokens};
use tokenlens::resolver::{AppRecord, ApplicationListing, SnapshotListing};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const TOKEN_ENV: &str = "FLY_API_TOKEN";
const APPS_ENV: &str = "TOKENLENS_APPS";

/// Decode and print capability tokens.
#[derive(Parser, Debug)]
#[command(name = "tokenlens")]
#[command(version, about, long_about = None)]
struct Args {
    /// Token or authorization header value to debug (also: FLY_API_TOKEN)
    #[arg(short, long)]
    token: Option<String>,

    /// File to read tokens from, one header or token list per line; `-` reads stdin.
    /// Takes precedence over --token
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// TOML snapshot of visible applications used to name orgs and apps (also: TOKENLENS_APPS)
    #[arg(long, value_name = "PATH")]
    apps: Option<PathBuf>,

    /// Also print every decoded token as JSON
    #[arg(short, long)]
    verbose: bool,

    /// Append synthetic caveats to each token before rendering
    #[arg(long)]
    sample_caveats: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    // Missing .env is normal.
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let inputs = read_inputs(&args)?;
    if inputs.is_empty() {
        bail!("no tokens given: pass --token, --file, or set {TOKEN_ENV}");
    }

    let listing: Box<dyn ApplicationListing> = match args
        .apps
        .clone()
        .or_else(|| std::env::var_os(APPS_ENV).map(PathBuf::from))
    {
        Some(path) => Box::new(SnapshotListing::new(path)),
        None => {
            tracing::info!("no application snapshot configured, ids will be shown as numbers");
            Box::new(Vec::<AppRecord>::new())
        }
    };

    let options = DebugOptions {
        verbose: args.verbose,
        sample_caveats: args.sample_caveats,
    };

    let report = debug::run(
        &inputs,
        &EnvelopeDecoder,
        listing.as_ref(),
        options,
        |failure| eprintln!("{failure}"),
    )
    .context("token debug failed")?;

    write_report(&mut std::io::stdout().lock(), &report)
}

/// Write rendered blocks, then the JSON array when present. Write errors
/// (such as a closed pipe) are returned, not panicked on.
fn write_report(out: &mut impl Write, report: &DebugReport) -> Result<()> {
    for block in &report.blocks {
        write!(out, "{block}").context("cannot write report")?;
    }

    if let Some(json) = &report.json {
        writeln!(out, "{json}").context("cannot write report")?;
    }

    out.flush().context("cannot write report")
}

fn read_inputs(args: &Args) -> Result<Vec<SecretString>> {
    if let Some(path) = &args.file {
        let mut content = String::new();
        if path.as_os_str() == "-" {
            std::io::stdin()
                .read_to_string(&mut content)
                .context("cannot read tokens from stdin")?;
        } else {
            content = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read tokens from {}", path.display()))?;
        }
        return Ok(split_tokens(&content));
    }

    if let Some(token) = &args.token {
        return Ok(split_tokens(token));
    }

    match std::env::var(TOKEN_ENV) {
        Ok(value) => Ok(split_tokens(&value)),
        Err(std::env::VarError::NotPresent) => Ok(Vec::new()),
        Err(e) => Err(e).with_context(|| format!("cannot read {TOKEN_ENV}")),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use secrecy::ExposeSecret;

    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    fn report() -> DebugReport {
        DebugReport {
            blocks: vec!["Token ...aa (from a)\n".to_owned(), "Token ...bb (from b)\n".to_owned()],
            failures: Vec::new(),
            json: Some("[]".to_owned()),
        }
    }

    #[test]
    fn report_written_in_order() {
        let mut out = Vec::new();
        write_report(&mut out, &report()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Token ...aa (from a)\nToken ...bb (from b)\n[]\n"
        );
    }

    #[test]
    fn closed_output_is_an_error() {
        let err = write_report(&mut ClosedPipe, &report()).unwrap_err();
        assert!(err.to_string().contains("cannot write report"));
    }

    #[test]
    fn file_takes_precedence_over_token() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "FlyV1 fm2_fromfile").unwrap();
        let path = file.path().to_str().unwrap();

        let args = Args::try_parse_from(["tokenlens", "-t", "fm2_fromflag", "-f", path]).unwrap();
        let inputs = read_inputs(&args).unwrap();

        let exposed: Vec<&str> = inputs.iter().map(|t| t.expose_secret()).collect();
        assert_eq!(exposed, ["fm2_fromfile"]);
    }

    #[test]
    fn token_flag_used_without_file() {
        let args = Args::try_parse_from(["tokenlens", "--token", "fm2_a,fm2_b"]).unwrap();
        let inputs = read_inputs(&args).unwrap();
        assert_eq!(inputs.len(), 2);
    }
}
