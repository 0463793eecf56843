use anyhow::Result;
use clap::Parser;
use latmap::cli::{Cli, USAGE};
use latmap::config::HeatmapConfig;
use latmap::pipeline;
use latmap::sample_output::SampleWriter;
use std::io::{self, BufWriter};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let Some(input) = args.input() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let mut config = match &args.config {
        Some(path) => HeatmapConfig::from_toml(path)?,
        None => HeatmapConfig::default(),
    };
    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }

    let stdout = io::stdout();
    let mut sink = SampleWriter::new(BufWriter::new(stdout.lock()));
    let summary = pipeline::run(input, &config, &mut sink)?;
    sink.finish()?;

    if let Some(reason) = summary.degenerate {
        eprintln!(
            "warning: degenerate latency scale ({}), heatmap left blank",
            reason
        );
    }

    if summary.unplottable > 0 {
        eprintln!(
            "warning: {} latency sample(s) left off the heatmap (non-positive latency or negative time offset)",
            summary.unplottable
        );
    }

    if args.summary {
        eprintln!("{}", summary);
    }

    Ok(())
}
