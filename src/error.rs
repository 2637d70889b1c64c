use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GaitError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("PDF read error: {0}")]
    PdfReadError(String),

    #[error("File is not a valid PDF: '{path}' (first bytes: {magic:?})")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("Render error: {0}")]
    RenderError(String),

    /// Unknown curve color tag. Raised for caller bugs, never for document variability.
    #[error("Invalid color '{0}': color must be 'red' or 'blue'")]
    InvalidColor(String),

    #[error("A patient with ID '{0}' already exists")]
    DuplicateSubject(String),

    #[error("Store conflict: {0}")]
    StoreConflict(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`GaitError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl GaitError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create a PDF read error.
    pdf_read => PdfReadError,
    /// Create a render error.
    render => RenderError,
    /// Create an invalid color error.
    invalid_color => InvalidColor,
    /// Create a duplicate subject error.
    duplicate_subject => DuplicateSubject,
    /// Create a store conflict error.
    store_conflict => StoreConflict,
    /// Create a store error.
    store => StoreError,
    /// Create a cache error.
    cache => CacheError,
}

impl From<lopdf::Error> for GaitError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfReadError(e.to_string())
    }
}

impl From<serde_json::Error> for GaitError {
    fn from(e: serde_json::Error) -> Self {
        Self::CacheError(e.to_string())
    }
}

impl From<serde_yml::Error> for GaitError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<pdfium_render::prelude::PdfiumError> for GaitError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

impl From<rusqlite::Error> for GaitError {
    fn from(e: rusqlite::Error) -> Self {
        Self::StoreError(e.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for GaitError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        Self::ConfigError(format!("failed to build worker pool: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, GaitError>;
