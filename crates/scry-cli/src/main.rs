#![allow(missing_docs)]
#![allow(clippy::print_stderr)]

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use miette::{IntoDiagnostic, WrapErr};

use scry_cli::{CliAction, CliOpts};

use scry_remote::{ExternalStrings, SpecSet};

use tracing_subscriber::EnvFilter;

fn main() {
    let cli = CliOpts::parse_from_cmdline();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_env_var("SCRY_LOG")
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let res = match cli.action {
        CliAction::Hash { short, strings } => {
            scry_cli::evaluate_hash(&strings, short, std::io::stdout().lock())
        }
        CliAction::Decode { lookup, input } => evaluate_decode(lookup, input),
        CliAction::Specs { specs } => evaluate_specs(&specs),
    };

    if let Err(e) = res {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}

fn evaluate_decode(lookup: PathBuf, input: Option<PathBuf>) -> miette::Result<()> {
    let lookup = ExternalStrings::from_path(&lookup)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to load {}", lookup.display()))?;

    let output = std::io::stdout().lock();

    if let Some(input) = input {
        let input = File::open(input).into_diagnostic()?;
        scry_cli::evaluate_decode(&lookup, BufReader::new(input), output)
    } else {
        scry_cli::evaluate_decode(&lookup, std::io::stdin().lock(), output)
    }
}

fn evaluate_specs(specs: &str) -> miette::Result<()> {
    let specs = SpecSet::from_path_or_content(specs)?;
    scry_cli::evaluate_specs(&specs, std::io::stdout().lock())
}
