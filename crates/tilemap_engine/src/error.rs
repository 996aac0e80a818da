//! Unified error types for the tile-map engine.

use thiserror::Error;

/// Main error type for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    // === Grid Errors ===
    #[error("Invalid map dimensions {width}x{height}")]
    InvalidDimension { width: i32, height: i32 },

    #[error("Coordinate ({x}, {y}) outside the current grid")]
    OutOfBounds { x: i32, y: i32 },

    #[error("Layer {layer} out of range (0..{max})")]
    LayerOutOfRange { layer: usize, max: usize },

    // === Import Errors ===
    #[error("Malformed import: {message}")]
    MalformedImport { message: String },

    // === Palette Errors ===
    #[error("Invalid hex color: {value}")]
    InvalidHexColor { value: String },

    // === External Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Parse int error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

// === Convenience constructors ===
impl EngineError {
    /// Create a malformed-import error from any displayable message
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedImport { message: message.into() }
    }
}
