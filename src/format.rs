use crate::error::{DisaggError, Result};
use std::path::Path;

/// GeoTIFF compression used unless another one is asked for.
pub const DEFAULT_COMPRESSION: &str = "DEFLATE";

/// Destination name that selects an in-memory dataset.
pub const MEMORY_DESTINATION: &str = "MEM";

/// Output container, chosen from the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Memory,
    NetCdf,
    GeoTiff,
}

impl OutputFormat {
    /// `MEM` selects memory, a `.nc` extension (any case) netCDF, anything else GeoTIFF.
    pub fn from_destination(destination: &str) -> Self {
        if destination == MEMORY_DESTINATION {
            return OutputFormat::Memory;
        }
        match Path::new(destination)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) if ext.eq_ignore_ascii_case("nc") => OutputFormat::NetCdf,
            _ => OutputFormat::GeoTiff,
        }
    }

    pub fn driver_name(&self) -> &'static str {
        match self {
            OutputFormat::Memory => "MEM",
            OutputFormat::NetCdf => "netCDF",
            OutputFormat::GeoTiff => "GTiff",
        }
    }

    /// Creation options passed to the driver.
    pub fn creation_options(&self, compression: &str) -> Result<Vec<String>> {
        Ok(match self {
            OutputFormat::Memory => Vec::new(),
            OutputFormat::NetCdf => vec!["FORMAT=NC2".to_string()],
            OutputFormat::GeoTiff => {
                validate_compression(compression)?;
                vec![
                    format!("COMPRESS={}", compression),
                    "PREDICTOR=1".to_string(),
                    "BIGTIFF=IF_SAFER".to_string(),
                ]
            }
        })
    }

    /// Whether the destination path is a file that will exist after writing.
    pub fn is_persisted(&self) -> bool {
        !matches!(self, OutputFormat::Memory)
    }
}

/// Validate GeoTIFF compression type
pub fn validate_compression(compression: &str) -> Result<()> {
    let valid_types = ["DEFLATE", "LZW", "ZSTD", "NONE"];
    if !valid_types.contains(&compression) {
        return Err(DisaggError::InvalidCompression(compression.to_string()));
    }
    Ok(())
}
