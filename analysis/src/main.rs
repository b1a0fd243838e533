use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::PathBuf,
};

use anyhow::{ensure, Context};
use clap::Parser;
use cordic_analysis::{init_logger, replay, ReplayConfig, Report, ReportConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "cordic-analysis",
    about = "Replay a CORDIC engine trace and report per-function operation costs."
)]
struct Args {
    /// Trace file to replay (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Output files are written to <BASE>.out and <BASE>.csv
    #[arg(long, value_name = "BASE", default_value = "log")]
    base_name: PathBuf,

    /// Multiplier applied to every raw operation count
    #[arg(long, value_name = "FACTOR", default_value_t = 1.0)]
    scale: f64,

    /// Leave this function out of the report (repeatable)
    #[arg(long = "ignore", value_name = "NAME")]
    ignored: Vec<String>,

    /// Deepest accepted call nesting
    #[arg(long, default_value_t = ReplayConfig::DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Fail on malformed hexadecimal addresses instead of reading them best effort
    #[arg(long, action = clap::ArgAction::SetTrue)]
    strict_addresses: bool,

    /// Accept a trace that ends inside a function
    #[arg(long, action = clap::ArgAction::SetTrue)]
    allow_unbalanced_calls: bool,

    /// Accept a value constructed over a live value at the same address
    #[arg(long, action = clap::ArgAction::SetTrue)]
    allow_value_reconstruction: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_logger()?;

    ensure!(
        args.scale.is_finite() && args.scale >= 0.0,
        "scale factor must be a non-negative number, got {}",
        args.scale
    );

    let replay_config = ReplayConfig {
        max_call_depth: args.max_call_depth,
        strict_addresses: args.strict_addresses,
        allow_unbalanced_calls: args.allow_unbalanced_calls,
        allow_value_reconstruction: args.allow_value_reconstruction,
        ..Default::default()
    };
    let report_config = ReportConfig {
        base_name: args.base_name,
        scale_factor: args.scale,
        ignored_functions: args.ignored,
    };

    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let tables = replay(input, &replay_config).context("trace replay failed")?;
    let report = Report::generate(&tables.functions, &report_config);
    let (text, csv) = report
        .write_files(&report_config.base_name)
        .with_context(|| {
            format!(
                "failed to write report to {}",
                report_config.base_name.display()
            )
        })?;
    info!(text = %text.display(), csv = %csv.display(), "report written");
    Ok(())
}
