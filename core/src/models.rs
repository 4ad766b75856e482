// Core data models for the Labelary client

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Print density, in dots per millimeter
///
/// Labelary accepts "6dpmm", "8dpmm", "12dpmm" and "24dpmm". Any other value
/// is kept in `Custom` and sent as-is; the service decides whether it is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Density {
    Dpmm6,
    #[default]
    Dpmm8,
    Dpmm12,
    Dpmm24,
    Custom(String),
}

impl Density {
    /// Path segment used in the render URL
    pub fn as_str(&self) -> &str {
        match self {
            Density::Dpmm6 => "6dpmm",
            Density::Dpmm8 => "8dpmm",
            Density::Dpmm12 => "12dpmm",
            Density::Dpmm24 => "24dpmm",
            Density::Custom(value) => value,
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Density {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Density::from(s.to_string()))
    }
}

impl From<String> for Density {
    fn from(value: String) -> Self {
        match value.as_str() {
            "6dpmm" => Density::Dpmm6,
            "8dpmm" => Density::Dpmm8,
            "12dpmm" => Density::Dpmm12,
            "24dpmm" => Density::Dpmm24,
            _ => Density::Custom(value),
        }
    }
}

impl From<Density> for String {
    fn from(density: Density) -> Self {
        match density {
            Density::Custom(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

/// Output format for rendered labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Pdf,
}

impl OutputFormat {
    /// Value of the `Accept` header that selects this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Pdf => "application/pdf",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" | "image/png" => Ok(OutputFormat::Png),
            "pdf" | "application/pdf" => Ok(OutputFormat::Pdf),
            _ => Err(ModelError::UnknownOutputFormat(s.to_string())),
        }
    }
}

/// Barcode symbologies supported by the Labelary barcode endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarcodeType {
    #[default]
    Code128,
    Code39,
    Ean13,
    Ean8,
    Upca,
    Upce,
    Qr,
    DataMatrix,
}

impl BarcodeType {
    pub const ALL: [BarcodeType; 8] = [
        BarcodeType::Code128,
        BarcodeType::Code39,
        BarcodeType::Ean13,
        BarcodeType::Ean8,
        BarcodeType::Upca,
        BarcodeType::Upce,
        BarcodeType::Qr,
        BarcodeType::DataMatrix,
    ];

    /// Value of the `type` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeType::Code128 => "code128",
            BarcodeType::Code39 => "code39",
            BarcodeType::Ean13 => "ean13",
            BarcodeType::Ean8 => "ean8",
            BarcodeType::Upca => "upca",
            BarcodeType::Upce => "upce",
            BarcodeType::Qr => "qr",
            BarcodeType::DataMatrix => "datamatrix",
        }
    }
}

impl fmt::Display for BarcodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BarcodeType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        BarcodeType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ModelError::UnknownBarcodeType(s.to_string()))
    }
}

/// Model parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("unknown output format: {0} (expected png or pdf)")]
    UnknownOutputFormat(String),

    #[error("unknown barcode type: {0}")]
    UnknownBarcodeType(String),
}

/// Label rendering parameters
///
/// Nothing here is range-checked: width, height and density go into the URL
/// verbatim and Labelary rejects what it cannot render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Label width, in inches
    pub width: f64,

    /// Label height, in inches
    pub height: f64,

    /// Label index (base 0). `None` renders every label, which is mostly
    /// useful for PDF output (one label per page).
    pub index: Option<u32>,

    /// Print density
    pub density: Density,

    /// API key sent with render requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl RenderConfig {
    pub const DEFAULT_WIDTH: f64 = 4.0;
    pub const DEFAULT_HEIGHT: f64 = 6.0;

    /// Path below the printers endpoint, e.g. `8dpmm/labels/4x6` or
    /// `8dpmm/labels/4x6/3/` when an index is set
    pub fn label_path(&self) -> String {
        let mut path = format!("{}/labels/{}x{}", self.density, self.width, self.height);
        if let Some(index) = self.index {
            path.push_str(&format!("/{}/", index));
        }
        path
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            index: None,
            density: Density::default(),
            api_key: None,
        }
    }
}

/// A single ZPL render call, built right before it is sent
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    /// ZPL source, sent as the request body
    pub zpl: String,

    pub format: OutputFormat,

    /// Resolved API key; rendering works without one
    pub api_key: Option<String>,
}

impl ConversionRequest {
    pub fn new(zpl: impl Into<String>, format: OutputFormat, api_key: Option<String>) -> Self {
        Self {
            zpl: zpl.into(),
            format,
            api_key,
        }
    }

    /// Query parameters for the render URL
    pub fn query(&self) -> Vec<(&'static str, &str)> {
        match &self.api_key {
            Some(key) => vec![("key", key.as_str())],
            None => Vec::new(),
        }
    }
}

/// A single barcode call. The key is mandatory for this endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeRequest {
    pub data: String,
    pub barcode_type: BarcodeType,
    pub api_key: String,
}

impl BarcodeRequest {
    pub fn new(data: impl Into<String>, barcode_type: BarcodeType, api_key: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            barcode_type,
            api_key: api_key.into(),
        }
    }

    /// Query parameters in the order Labelary documents them
    pub fn query(&self) -> [(&'static str, &str); 3] {
        [
            ("key", self.api_key.as_str()),
            ("type", self.barcode_type.as_str()),
            ("data", self.data.as_str()),
        ]
    }
}
