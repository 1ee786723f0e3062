//! Minimal disk-backed file server that the negotiator delegates to.

pub mod handlers;
mod path_utils;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::compression::CompressionRegistry;
use crate::error::{Error, Result};
use crate::exchange::HttpExchange;
use crate::logging::LoggingExt;
use crate::negotiation::FileServer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResponse {
    pub status: u16,
    pub reason: &'static str,
    pub headers: Vec<(String, String)>,
    pub content: Vec<u8>,
    pub head_only: bool,
}

impl FileResponse {
    pub fn not_found() -> Self {
        Self {
            status: 404,
            reason: "Not Found",
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            content: b"Not Found".to_vec(),
            head_only: false,
        }
    }

    /// A 404 that keeps `Vary` from negotiation, since the outcome still
    /// depends on `Accept-Encoding` for an indexed path.
    pub fn not_found_for(exchange: &HttpExchange) -> Self {
        let mut response = Self::not_found();
        if let Some(vary) = exchange.response_header("Vary") {
            response.headers.push(("Vary".to_string(), vary.to_string()));
        }
        response
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(writer, "HTTP/1.1 {} {}\r\n", self.status, self.reason)?;
        for (key, value) in &self.headers {
            write!(writer, "{}: {}\r\n", key, value)?;
        }
        write!(writer, "Content-Length: {}\r\n", self.content.len())?;
        writer.write_all(b"Connection: close\r\n\r\n")?;
        if !self.head_only {
            writer.write_all(&self.content)?;
        }
        writer.flush()
    }
}

/// Serves files below a base directory. With a single-file root only that
/// file and its `{file}{suffix}` siblings for registered suffixes are
/// reachable.
#[derive(Debug, Clone)]
pub struct DiskFileServer {
    base_dir: PathBuf,
    allowed_names: Option<Vec<String>>,
}

impl DiskFileServer {
    pub fn new(root: &Path, registry: &CompressionRegistry) -> Result<Self> {
        let root = root.log_operation("canonicalize", || {
            fs::canonicalize(root).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => Error::RootNotFound(root.to_path_buf()),
                _ => Error::io(root, e),
            })
        })?;

        if root.is_dir() {
            return Ok(Self {
                base_dir: root,
                allowed_names: None,
            });
        }

        let allowed_names: Vec<String> = root
            .file_name()
            .and_then(|n| n.to_str())
            .map(|name| {
                std::iter::once(name.to_string())
                    .chain(registry.iter().map(|c| format!("{}{}", name, c.suffix())))
                    .collect()
            })
            .unwrap_or_default();
        let base_dir = root
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        Ok(Self {
            base_dir,
            allowed_names: Some(allowed_names),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl FileServer<HttpExchange> for DiskFileServer {
    type Output = io::Result<FileResponse>;

    fn serve(&self, exchange: &mut HttpExchange) -> Self::Output {
        handlers::serve_file(self, exchange)
    }
}
