//! CLI tool for filling report templates and checking their placeholders.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use report_convert::{Converter, LibreOfficeConverter};
use report_core::{
    config, DocumentFormat, ReportPayload, ServiceConfig, TemplateLocation, PAYLOAD_KEYS,
};
use report_pptx::{SlideReader, TemplateBinder, TemplateReport};
use std::fs;
use std::path::{Path, PathBuf};

/// Generate sick-leave reports offline and inspect PPTX templates.
#[derive(Parser, Debug)]
#[command(name = "report-gen")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill the template with a JSON payload and write the document
    Generate {
        /// JSON payload file
        #[arg(short, long)]
        payload: PathBuf,

        /// PPTX template (default: PPTX_TEMPLATE_PATH or the bundled template)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pptx)]
        format: Format,

        /// Output file (default: the download filename in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// LibreOffice executable (default: LIBREOFFICE_PATH or soffice on PATH)
        #[arg(long)]
        converter: Option<PathBuf>,

        /// Seconds before a conversion is killed
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Print slide text and the placeholders a template offers
    Inspect {
        /// PPTX template to inspect
        template: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Pptx,
    Pdf,
}

impl From<Format> for DocumentFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Pptx => DocumentFormat::Pptx,
            Format::Pdf => DocumentFormat::Pdf,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match args.command {
        Command::Generate {
            payload,
            template,
            format,
            output,
            converter,
            timeout,
        } => {
            let mut config = ServiceConfig::from_env().context("Invalid configuration")?;
            if let Some(path) = template {
                config.template = TemplateLocation::Path(path);
            }
            if let Some(path) = converter {
                config.converter.executable = Some(path);
            }
            if let Some(secs) = timeout {
                config.converter.timeout = config::parse_timeout(&secs.to_string())?;
            }

            let written = generate(&config, &payload, format.into(), output)?;
            eprintln!("Written to: {}", written.display());
        }
        Command::Inspect { template } => {
            let bytes = fs::read(&template)
                .with_context(|| format!("Failed to read {}", template.display()))?;
            let report = SlideReader::new().inspect(&bytes)?;
            print!("{}", render_report(&report));
        }
    }

    Ok(())
}

/// Fill the template, convert if asked, and write the result.
fn generate(
    config: &ServiceConfig,
    payload_path: &Path,
    format: DocumentFormat,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let json = fs::read_to_string(payload_path)
        .with_context(|| format!("Failed to read {}", payload_path.display()))?;
    let payload: ReportPayload = serde_json::from_str(&json)
        .with_context(|| format!("Invalid payload in {}", payload_path.display()))?;

    let template_path = match &config.template {
        TemplateLocation::Path(path) => path,
        TemplateLocation::Url(url) => {
            bail!("Template URLs are only supported by the server ({url}); pass --template")
        }
    };
    let template = fs::read(template_path)
        .with_context(|| format!("Template not found: {}", template_path.display()))?;

    log::debug!("Binding {} with {}", template_path.display(), payload_path.display());
    let mut document = TemplateBinder::new().bind(&template, &payload.placeholders())?;

    if format == DocumentFormat::Pdf {
        let converter = LibreOfficeConverter::new(config.converter.clone());
        log::debug!("Converting with {}", converter.name());
        document = converter.convert(&document)?;
    }

    let path = output.unwrap_or_else(|| PathBuf::from(payload.download_filename(format)));
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    }
    fs::write(&path, &document).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

/// Human-readable summary of a template.
fn render_report(report: &TemplateReport) -> String {
    let mut out = String::new();

    for slide in &report.slides {
        out.push_str(&format!("Slide {} ({})\n", slide.number, slide.part));
        for line in slide.non_empty_lines() {
            out.push_str(&format!("  {}\n", line));
        }
    }

    out.push_str("\nPlaceholders:\n");
    if report.placeholders.is_empty() {
        out.push_str("  (none)\n");
    }
    for key in &report.placeholders {
        if PAYLOAD_KEYS.contains(&key.as_str()) {
            out.push_str(&format!("  {}\n", key));
        } else {
            out.push_str(&format!("  {}  [not in payload, left as-is]\n", key));
        }
    }

    if !report.split_placeholders.is_empty() {
        out.push_str("\nSplit across runs (never filled):\n");
        for key in &report.split_placeholders {
            out.push_str(&format!("  {}\n", key));
        }
    }

    out
}
