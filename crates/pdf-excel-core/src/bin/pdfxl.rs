use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use pdf_excel_core::{
    ConversionReport, ConvertError, ExtractOptions, PageSelection, QualityMode, excel_to_pdf,
    pdf_to_excel,
};
use tracing_subscriber::EnvFilter;

const EXIT_NO_CONTENT: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "pdfxl",
    version,
    about = "Convert PDF tables to Excel workbooks and worksheets back to PDF"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract tables (or page text) from a PDF into an .xlsx workbook.
    PdfToExcel(PdfToExcelArgs),
    /// Render the first worksheet of a workbook as a PDF table.
    ExcelToPdf(ExcelToPdfArgs),
}

#[derive(Debug, Args)]
struct PdfToExcelArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output workbook path.
    #[arg(short, long)]
    output: PathBuf,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Minimum cells required per candidate table row.
    #[arg(long, default_value_t = 2)]
    min_cols: usize,

    /// Fail when a detected table has an inconsistent column layout.
    #[arg(long, conflicts_with = "skip_ambiguous")]
    strict: bool,

    /// Drop tables with an inconsistent column layout.
    #[arg(long, conflicts_with = "strict")]
    skip_ambiguous: bool,

    /// Print each extraction warning.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ExcelToPdfArgs {
    /// Input .xlsx/.xls path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output PDF path.
    #[arg(short, long)]
    output: PathBuf,
}

fn parse_options(args: &PdfToExcelArgs) -> Result<ExtractOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;

    let quality_mode = if args.strict {
        QualityMode::Strict
    } else if args.skip_ambiguous {
        QualityMode::SkipAmbiguous
    } else {
        QualityMode::BestEffort
    };

    Ok(ExtractOptions {
        pages,
        min_cols: args.min_cols,
        quality_mode,
    })
}

fn log_report(report: &ConversionReport, verbose: bool) {
    eprintln!(
        "wrote {} sheet(s) via {} extraction: {}",
        report.table_count(),
        report.path.as_str(),
        report.sheet_names.join(", ")
    );
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!("  - {warning}");
        }
    }
}

fn run_pdf_to_excel(args: &PdfToExcelArgs) -> Result<ConversionReport, ConvertError> {
    let options = parse_options(args)
        .map_err(|error| ConvertError::InvalidOption(format!("{error:#}")))?;
    pdf_to_excel(&args.input, &args.output, &options)
}

fn run_excel_to_pdf(args: &ExcelToPdfArgs) -> Result<()> {
    let report = excel_to_pdf(&args.input, &args.output)
        .with_context(|| format!("failed to render '{}'", args.input.display()))?;
    eprintln!(
        "wrote {} row(s) on {} page(s)",
        report.row_count, report.page_count
    );
    Ok(())
}

fn main() -> ExitCode {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pdf_excel_core=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::PdfToExcel(args) => match run_pdf_to_excel(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                ExitCode::SUCCESS
            }
            Err(error) if error.is_empty_content() => {
                eprintln!("error: {error}");
                ExitCode::from(EXIT_NO_CONTENT)
            }
            Err(error) => {
                eprintln!(
                    "error: failed to extract tables from '{}': {error}",
                    args.input.display()
                );
                ExitCode::from(1)
            }
        },
        Commands::ExcelToPdf(args) => match run_excel_to_pdf(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
