// Labelary HTTP client

use crate::config::{self, ConfigSource, EnvConfig, JsonConfig, LabelaryConfig};
use crate::errors::{ClientError, ConfigError};
use labelary_core::{BarcodeRequest, BarcodeType, ConversionRequest, Density, OutputFormat, RenderConfig};
use reqwest::header::ACCEPT;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Labelary client for rendering ZPL labels and barcodes
///
/// Holds the label parameters used for every render call. Setters take
/// `&mut self`, so a client shared between tasks has to sit behind a lock
/// if it is reconfigured while in use.
#[derive(Clone)]
pub struct LabelaryClient {
    client: reqwest::Client,
    printers_url: String,
    barcodes_url: String,
    config: RenderConfig,
    key_source: Option<Arc<dyn ConfigSource>>,
}

impl LabelaryClient {
    /// Create a client pointing at the public Labelary service
    pub fn new() -> Result<Self, ClientError> {
        Self::from_config(LabelaryConfig::default())
    }

    /// Create a client from explicit settings
    pub fn from_config(settings: LabelaryConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }
        if settings.no_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            printers_url: settings.printers_url.trim_end_matches('/').to_string(),
            barcodes_url: settings.barcodes_url,
            config: settings.label,
            key_source: None,
        })
    }

    /// Create a client from `LABELARY_*` environment variables, with the
    /// environment also serving as the fallback key source
    pub fn from_env() -> Result<Self, ClientError> {
        let settings = LabelaryConfig::from_env()?;
        Ok(Self::from_config(settings)?.with_key_source(Arc::new(EnvConfig)))
    }

    /// Create a client from a JSON settings document, with the same document
    /// serving as the fallback key source for `labelary.api_key`
    pub fn from_json_str(json: &str) -> Result<Self, ClientError> {
        let root: serde_json::Value = serde_json::from_str(json).map_err(ConfigError::from)?;
        let source = JsonConfig::from_settings(root.clone());
        let settings = LabelaryConfig::from_json_value(root)?;
        Ok(Self::from_config(settings)?.with_key_source(Arc::new(source)))
    }

    /// Same as `from_json_str`, reading the document from a file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_json_str(&content)
    }

    /// Install the source consulted for `labelary.api_key` when no key was
    /// passed to a call
    pub fn with_key_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.key_source = Some(source);
        self
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.config
    }

    /// Label width, in inches
    pub fn set_width(&mut self, width: f64) -> &mut Self {
        self.config.width = width;
        self
    }

    /// Label height, in inches
    pub fn set_height(&mut self, height: f64) -> &mut Self {
        self.config.height = height;
        self
    }

    pub fn set_density(&mut self, density: Density) -> &mut Self {
        self.config.density = density;
        self
    }

    /// Render only the label at `index` (base 0)
    pub fn set_index(&mut self, index: u32) -> &mut Self {
        self.config.index = Some(index);
        self
    }

    /// Render all labels again
    pub fn clear_index(&mut self) -> &mut Self {
        self.config.index = None;
        self
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> &mut Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    pub fn clear_api_key(&mut self) -> &mut Self {
        self.config.api_key = None;
        self
    }

    /// Full render URL for the current label parameters
    pub fn render_url(&self) -> String {
        format!("{}/{}", self.printers_url, self.config.label_path())
    }

    /// Build a render request
    ///
    /// Key precedence: `api_key` argument, then the key set on the client,
    /// then the fallback source.
    pub fn conversion_request(
        &self,
        zpl: &str,
        format: Option<OutputFormat>,
        api_key: Option<&str>,
    ) -> ConversionRequest {
        let api_key = non_empty(api_key)
            .or_else(|| non_empty(self.config.api_key.as_deref()))
            .or_else(|| self.fallback_api_key());

        ConversionRequest::new(zpl, format.unwrap_or_default(), api_key)
    }

    /// Build a barcode request
    ///
    /// Key precedence: `api_key` argument, then the fallback source.
    /// Fails with `MissingApiKey` when neither yields a key.
    pub fn barcode_request(
        &self,
        data: &str,
        barcode_type: Option<BarcodeType>,
        api_key: Option<&str>,
    ) -> Result<BarcodeRequest, ClientError> {
        let api_key = non_empty(api_key)
            .or_else(|| self.fallback_api_key())
            .ok_or(ClientError::MissingApiKey)?;

        Ok(BarcodeRequest::new(data, barcode_type.unwrap_or_default(), api_key))
    }

    /// Render ZPL with the current label parameters
    ///
    /// # Arguments
    /// * `zpl` - ZPL source, sent verbatim as the request body
    /// * `format` - Output format, PNG when `None`
    /// * `api_key` - Overrides the configured key for this call
    ///
    /// # Returns
    /// The raw PNG or PDF bytes returned by Labelary
    pub async fn convert(
        &self,
        zpl: &str,
        format: Option<OutputFormat>,
        api_key: Option<&str>,
    ) -> Result<Vec<u8>, ClientError> {
        let request = self.conversion_request(zpl, format, api_key);
        let url = self.render_url();
        tracing::debug!(url = %url, accept = request.format.mime_type(), "Sending Labelary render request");

        let result = self.send_render(&url, request).await;
        log_outcome("render", &result);
        result
    }

    /// Render ZPL to a PNG image
    pub async fn convert_to_png(&self, zpl: &str, api_key: Option<&str>) -> Result<Vec<u8>, ClientError> {
        self.convert(zpl, Some(OutputFormat::Png), api_key).await
    }

    /// Render ZPL to a PDF document
    pub async fn convert_to_pdf(&self, zpl: &str, api_key: Option<&str>) -> Result<Vec<u8>, ClientError> {
        self.convert(zpl, Some(OutputFormat::Pdf), api_key).await
    }

    /// Render a barcode to a PNG image
    ///
    /// No request is sent when no API key can be resolved.
    pub async fn generate_barcode(
        &self,
        data: &str,
        barcode_type: Option<BarcodeType>,
        api_key: Option<&str>,
    ) -> Result<Vec<u8>, ClientError> {
        let request = self
            .barcode_request(data, barcode_type, api_key)
            .inspect_err(|e| tracing::error!("Labelary barcode request not sent: {}", e))?;
        tracing::debug!(url = %self.barcodes_url, barcode_type = %request.barcode_type, "Sending Labelary barcode request");

        let result = self.send_barcode(&request).await;
        log_outcome("barcode", &result);
        result
    }

    async fn send_render(&self, url: &str, request: ConversionRequest) -> Result<Vec<u8>, ClientError> {
        let builder = self
            .client
            .post(url)
            .header(ACCEPT, request.format.mime_type())
            .query(&request.query());

        let response = builder
            .body(request.zpl)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        read_body(response).await
    }

    async fn send_barcode(&self, request: &BarcodeRequest) -> Result<Vec<u8>, ClientError> {
        let response = self
            .client
            .get(&self.barcodes_url)
            .query(&request.query())
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        read_body(response).await
    }

    /// Best-effort lookup; a failing source counts as "no key"
    fn fallback_api_key(&self) -> Option<String> {
        let source = self.key_source.as_ref()?;
        match source.get(config::API_KEY) {
            Ok(key) => key.filter(|key| !key.is_empty()),
            Err(e) => {
                tracing::debug!("Fallback API key lookup failed: {}", e);
                None
            }
        }
    }
}

impl fmt::Debug for LabelaryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelaryClient")
            .field("printers_url", &self.printers_url)
            .field("barcodes_url", &self.barcodes_url)
            .field("label_path", &self.config.label_path())
            .field("has_api_key", &self.config.api_key.is_some())
            .field("has_key_source", &self.key_source.is_some())
            .finish()
    }
}

fn non_empty(key: Option<&str>) -> Option<String> {
    key.filter(|key| !key.is_empty()).map(str::to_string)
}

/// Labelary answers errors with a non-2xx status and a plain-text reason
async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Failed to read Labelary error body: {}", e);
                String::new()
            }
        };
        return Err(ClientError::Server {
            status: status.as_u16(),
            body,
        });
    }

    let data = response.bytes().await.map_err(ClientError::from_transport)?;
    Ok(data.to_vec())
}

fn log_outcome(operation: &str, result: &Result<Vec<u8>, ClientError>) {
    match result {
        Ok(data) => tracing::info!("Labelary {} successful: {} bytes", operation, data.len()),
        Err(e) => tracing::error!("Labelary {} failed: {}", operation, e),
    }
}
