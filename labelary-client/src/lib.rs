// Labelary Client Library
//
// This crate provides HTTP client functionality for rendering ZPL labels
// and barcodes through the Labelary web service.

mod client;
pub mod config;
mod errors;

pub use client::LabelaryClient;
pub use config::{ConfigSource, EnvConfig, JsonConfig, LabelaryConfig, StaticConfig};
pub use errors::{ClientError, ConfigError};
pub use labelary_core::{BarcodeType, Density, OutputFormat, RenderConfig};
