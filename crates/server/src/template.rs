//! Loading the report template from disk or over HTTP.

use report_core::{Error, Result, TemplateLocation};
use std::io::ErrorKind;
use std::time::Duration;

/// How long a template download may take.
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Reads the template bytes from its configured location on every request,
/// so a replaced template file is picked up without a restart.
pub struct TemplateLoader {
    location: TemplateLocation,
    client: reqwest::Client,
}

impl TemplateLoader {
    pub fn new(location: TemplateLocation) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { location, client })
    }

    pub fn location(&self) -> &TemplateLocation {
        &self.location
    }

    /// Load the template bytes.
    pub async fn load(&self) -> Result<Vec<u8>> {
        match &self.location {
            TemplateLocation::Path(path) => match tokio::fs::read(path).await {
                Ok(bytes) => Ok(bytes),
                Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::ConfigError(format!(
                    "Template not found: {}",
                    path.display()
                ))),
                Err(e) => Err(Error::TemplateError(format!(
                    "could not read {}: {e}",
                    path.display()
                ))),
            },
            TemplateLocation::Url(url) => self.fetch(url).await,
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("Fetching template from {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::ConfigError(format!("Error fetching template: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ConfigError(format!(
                "Failed to fetch template from URL: {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::ConfigError(format!("Error fetching template: {e}")))?;
        Ok(bytes.to_vec())
    }
}
