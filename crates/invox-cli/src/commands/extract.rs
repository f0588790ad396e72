//! Extract command - digitize a single invoice image.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use invox_core::client::GeminiClient;
use invox_core::error::SessionError;
use invox_core::invoice::line_item_issues;
use invox_core::request::ImageSource;
use invox_core::session::{Session, Settlement};
use invox_core::settings::ModelChoice;

use super::output::{OutputFormat, describe_failure, format_invoice, format_invoice_plain};
use super::{Context, parse_model};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Invoice image or PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Model to use (overrides the stored preference)
    #[arg(short, long, value_parser = parse_model)]
    model: Option<ModelChoice>,

    /// API key (overrides GEMINI_API_KEY and the stored key)
    #[arg(long)]
    api_key: Option<String>,

    /// Exit with an error when totals do not reconcile
    #[arg(long)]
    strict: bool,
}

pub async fn run(args: ExtractArgs, ctx: &Context) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = ctx.load_config()?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let settings = ctx.resolve_settings(args.api_key.clone(), args.model);
    info!("Processing file: {}", args.input.display());

    let source = ImageSource::from_path(&args.input, config.extraction.max_image_bytes)?;
    let client = GeminiClient::new(&config.api)?;

    let mut session = Session::new().with_tolerance(config.extraction.tolerance);
    session.select(source)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.set_message(format!("Extracting with {}...", settings.model));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = session.extract(&client, &settings).await.map(|_| ());
    pb.finish_and_clear();

    match result {
        Ok(()) | Err(SessionError::MissingCredential) => {}
        Err(e) => return Err(e.into()),
    }

    let Some(settlement) = session.settlement() else {
        anyhow::bail!("Extraction did not settle");
    };

    let (invoice, warning) = match settlement {
        Settlement::Failed(failure) => anyhow::bail!("{}", describe_failure(failure)),
        Settlement::Extracted { invoice, warning } => (invoice, warning),
    };

    let default_currency = &config.extraction.default_currency;

    if let Some(output_path) = &args.output {
        let output = format_invoice_plain(invoice, args.format, default_currency)?;
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", format_invoice(invoice, args.format, default_currency)?);
    }

    for issue in line_item_issues(invoice, config.extraction.tolerance) {
        eprintln!("{} {}", style("ℹ").blue(), issue);
    }

    if let Some(discrepancy) = warning {
        eprintln!("{} {}", style("⚠").yellow(), style(discrepancy).yellow());
        if args.strict {
            anyhow::bail!("Totals do not reconcile");
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
