//! Batch command - digitize many invoice files, one request each.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use invox_core::client::GeminiClient;
use invox_core::error::ConfigError;
use invox_core::models::config::InvoxConfig;
use invox_core::models::invoice::InvoiceData;
use invox_core::request::ImageSource;
use invox_core::session::{Session, Settlement};
use invox_core::settings::{ModelChoice, Settings};

use super::output::{OutputFormat, describe_failure, format_invoice_plain};
use super::{Context, parse_model};

const SUPPORTED_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "webp", "gif", "heic", "heif", "pdf"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching invoice files
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file results
    #[arg(short = 'O', long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model to use (overrides the stored preference)
    #[arg(short, long, value_parser = parse_model)]
    model: Option<ModelChoice>,

    /// API key (overrides GEMINI_API_KEY and the stored key)
    #[arg(long)]
    api_key: Option<String>,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    invoice: Option<InvoiceData>,
    warning: Option<String>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, ctx: &Context) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = ctx.load_config()?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    let settings = ctx.resolve_settings(args.api_key.clone(), args.model);
    if settings.credential().is_none() {
        return Err(ConfigError::MissingCredential.into());
    }

    println!(
        "{} Found {} files to process with {}",
        style("ℹ").blue(),
        files.len(),
        settings.model
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let client = GeminiClient::new(&config.api)?;

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    // Sequential: one request in flight at a time.
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let file_start = Instant::now();
        let outcome = process_single_file(&path, &client, &settings, &config).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok((invoice, warning)) => {
                if let Some(ref w) = warning {
                    warn!("{}: {}", path.display(), w);
                }
                results.push(FileResult {
                    path,
                    invoice: Some(invoice),
                    warning,
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        invoice: None,
                        warning: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_and_clear();

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            if let Some(invoice) = &result.invoice {
                write_output(
                    output_dir,
                    &result.path,
                    invoice,
                    args.format,
                    &config.extraction.default_currency,
                )?;
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.invoice.is_some()).count();
    let flagged = results.iter().filter(|r| r.warning.is_some()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful ({} with total mismatches), {} failed",
        style(successful).green(),
        style(flagged).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

async fn process_single_file(
    path: &Path,
    client: &GeminiClient,
    settings: &Settings,
    config: &InvoxConfig,
) -> anyhow::Result<(InvoiceData, Option<String>)> {
    let source = ImageSource::from_path(path, config.extraction.max_image_bytes)?;

    let mut session = Session::new().with_tolerance(config.extraction.tolerance);
    session.select(source)?;

    match session.extract(client, settings).await? {
        Settlement::Extracted { invoice, warning } => {
            Ok((invoice.clone(), warning.as_ref().map(|w| w.to_string())))
        }
        Settlement::Failed(failure) => anyhow::bail!("{}", describe_failure(failure)),
    }
}

fn write_output(
    output_dir: &Path,
    input: &Path,
    invoice: &InvoiceData,
    format: OutputFormat,
    default_currency: &str,
) -> anyhow::Result<()> {
    let output_name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice");
    let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));

    let content = format_invoice_plain(invoice, format, default_currency)?;
    fs::write(&output_path, content)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "vendor_name",
        "invoice_number",
        "invoice_date",
        "total_amount",
        "currency",
        "line_items",
        "warning",
        "processing_time_ms",
        "processed_at",
        "error",
    ])?;

    let processed_at = chrono::Local::now().to_rfc3339();

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(invoice) = &result.invoice {
            wtr.write_record([
                filename,
                if result.warning.is_some() { "mismatch" } else { "success" },
                &invoice.vendor_name,
                &invoice.invoice_number,
                &invoice.invoice_date,
                &invoice.total_amount.to_string(),
                &invoice.currency,
                &invoice.line_items.len().to_string(),
                result.warning.as_deref().unwrap_or(""),
                &result.processing_time_ms.to_string(),
                &processed_at,
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                &processed_at,
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
