use std::path::PathBuf;

use crate::compression::{CompressionRegistry, CustomCompression};

/// Default document appended to targets ending in `/`.
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// Construction-time settings for [`Negotiator`](crate::negotiation::Negotiator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationOptions {
    /// Directory to index, or a single file whose siblings are its variants.
    pub root: PathBuf,
    /// Registered ahead of the built-in encodings, in this order.
    pub custom_compressions: Vec<CustomCompression>,
    pub enable_brotli: bool,
    pub index_from_empty_path: bool,
}

impl Default for NegotiationOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            custom_compressions: Vec::new(),
            enable_brotli: false,
            index_from_empty_path: true,
        }
    }
}

impl NegotiationOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_custom_compression(mut self, encoding: &str, suffix: &str) -> Self {
        self.custom_compressions.push(CustomCompression {
            encoding: encoding.to_string(),
            suffix: suffix.to_string(),
        });
        self
    }

    pub fn with_brotli(mut self, enable: bool) -> Self {
        self.enable_brotli = enable;
        self
    }

    pub fn with_index_from_empty_path(mut self, enable: bool) -> Self {
        self.index_from_empty_path = enable;
        self
    }

    pub fn registry(&self) -> CompressionRegistry {
        CompressionRegistry::from_options(self)
    }
}
