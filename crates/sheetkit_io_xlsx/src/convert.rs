//! Pass-through boundary to external document converters.

use std::fmt::Display;

use crate::error::{GridMapError, Result};

/// Converts a rendered XLSX buffer into another document format.
pub trait DocumentConverter {
    /// Converter failure type.
    type Error: Display;

    /// Convert `bytes`; the output format is the converter's concern.
    fn convert(&self, bytes: &[u8]) -> std::result::Result<Vec<u8>, Self::Error>;
}

/// Run `converter` over `bytes`, wrapping failures in [`GridMapError::ConversionFailed`].
pub fn convert_document<C: DocumentConverter + ?Sized>(
    converter: &C,
    bytes: &[u8],
) -> Result<Vec<u8>> {
    if bytes.is_empty() {
        return Err(GridMapError::MissingInput(
            "document bytes are empty".to_string(),
        ));
    }
    let v_out = converter
        .convert(bytes)
        .map_err(|err| GridMapError::ConversionFailed(err.to_string()))?;
    if v_out.is_empty() {
        return Err(GridMapError::ConversionFailed(
            "converter returned an empty buffer".to_string(),
        ));
    }
    Ok(v_out)
}
