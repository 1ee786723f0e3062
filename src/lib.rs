//! Serves pre-compressed static assets (`app.js.gz`, `app.js.br`, ...) in
//! place of their originals when the client accepts the encoding.
//!
//! A [`VariantIndex`] is built once from the root directory. A
//! [`Negotiator`] then consults it per request, rewrites the request target
//! and response headers, and delegates to a [`FileServer`].

pub mod args;
pub mod compression;
pub mod config;
pub mod error;
pub mod exchange;
pub mod file_serving;
pub mod index;
pub mod logging;
pub mod negotiation;
pub mod server;

pub use compression::{Compression, CompressionRegistry, CustomCompression};
pub use config::NegotiationOptions;
pub use error::{Error, Result};
pub use exchange::{Exchange, HttpExchange};
pub use index::{FileEntry, VariantIndex};
pub use negotiation::{FileServer, Negotiator};
