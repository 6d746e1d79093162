use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use report_convert::LibreOfficeConverter;
use report_core::{config, ServiceConfig, TemplateLocation};
use report_server::{cors, pipeline::ReportPipeline, template::TemplateLoader};
use std::path::PathBuf;
use std::sync::Arc;

/// Generate PPTX and PDF reports from JSON payloads.
///
/// Settings come from the environment (and a `.env` file); flags override them.
#[derive(Parser, Debug)]
#[command(name = "report-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind (env: HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (env: PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// PPTX template file (env: PPTX_TEMPLATE_PATH)
    #[arg(short, long, conflicts_with = "template_url")]
    template: Option<PathBuf>,

    /// Fetch the template from this URL instead (env: PPTX_TEMPLATE_URL)
    #[arg(long)]
    template_url: Option<String>,

    /// LibreOffice executable (env: LIBREOFFICE_PATH)
    #[arg(long)]
    converter: Option<PathBuf>,

    /// Seconds before a conversion is killed (env: CONVERSION_TIMEOUT_SECS)
    #[arg(long)]
    timeout: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut ServiceConfig) -> Result<()> {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = &self.template {
            config.template = TemplateLocation::Path(path.clone());
        }
        if let Some(url) = &self.template_url {
            config.template = TemplateLocation::Url(url.clone());
        }
        if let Some(path) = &self.converter {
            config.converter.executable = Some(path.clone());
        }
        if let Some(secs) = self.timeout {
            config.converter.timeout = config::parse_timeout(&secs.to_string())?;
        }
        Ok(())
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = ServiceConfig::from_env().context("Invalid configuration")?;
    args.apply(&mut config).context("Invalid command-line option")?;

    log::info!("Template: {}", config.template.describe());
    if let TemplateLocation::Path(path) = &config.template {
        if !path.exists() {
            log::warn!(
                "Template {} does not exist yet; generate requests will fail until it does",
                path.display()
            );
        }
    }

    let converter = LibreOfficeConverter::new(config.converter.clone());
    match converter.executable() {
        Ok(path) => log::info!(
            "Converter: {} (timeout {}s)",
            path.display(),
            config.converter.timeout.as_secs()
        ),
        Err(e) => log::warn!("{e}; /generate-pdf will fail until it is installed"),
    }

    let loader = TemplateLoader::new(config.template.clone())?;
    let pipeline = web::Data::new(ReportPipeline::new(loader, Arc::new(converter)));

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::from_fn(cors::permissive_cors))
            .wrap(middleware::Logger::default())
            .app_data(pipeline.clone())
            .configure(report_server::configure)
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?
    .run()
    .await?;

    Ok(())
}
