//! Per-request selection of a pre-compressed variant.
//!
//! A [`Negotiator`] owns the [`VariantIndex`] built at startup and the file
//! server it delegates to. For every request it may rewrite the target to a
//! compressed sibling (`/app.js` -> `/app.js.gz`) and annotate the response
//! headers, then hands the request on unconditionally.

use mime_guess::mime::{self, Mime};

use crate::compression::{find_compression_matching_encoding, Compression};
use crate::config::{NegotiationOptions, DEFAULT_DOCUMENT};
use crate::error::Result;
use crate::exchange::{split_target, Exchange};
use crate::index::VariantIndex;

/// Serves a (possibly rewritten) request. The negotiator never looks at the
/// output, it only returns it to its caller.
pub trait FileServer<E: ?Sized> {
    type Output;

    fn serve(&self, exchange: &mut E) -> Self::Output;
}

impl<E: ?Sized, F, T> FileServer<E> for F
where
    F: Fn(&mut E) -> T,
{
    type Output = T;

    fn serve(&self, exchange: &mut E) -> T {
        self(exchange)
    }
}

#[derive(Debug)]
pub struct Negotiator<S> {
    index: VariantIndex,
    index_from_empty_path: bool,
    file_server: S,
}

impl<S> Negotiator<S> {
    /// Builds the registry and scans `options.root`. Fails if the root is
    /// missing or cannot be read.
    pub fn new(options: &NegotiationOptions, file_server: S) -> Result<Self> {
        let registry = options.registry();
        let index = VariantIndex::build(&options.root, &registry)?;
        Ok(Self::from_index(
            index,
            options.index_from_empty_path,
            file_server,
        ))
    }

    pub fn from_index(index: VariantIndex, index_from_empty_path: bool, file_server: S) -> Self {
        Self {
            index,
            index_from_empty_path,
            file_server,
        }
    }

    pub fn index(&self) -> &VariantIndex {
        &self.index
    }

    pub fn file_server(&self) -> &S {
        &self.file_server
    }

    /// Negotiates, then always delegates to the file server exactly once.
    pub fn handle<E>(&self, exchange: &mut E) -> S::Output
    where
        E: Exchange + ?Sized,
        S: FileServer<E>,
    {
        self.negotiate(exchange);
        self.file_server.serve(exchange)
    }

    /// Rewrites `exchange` in place and returns the chosen compression, if
    /// any. Never fails: anything unexpected leaves the request as is.
    pub fn negotiate<E>(&self, exchange: &mut E) -> Option<&Compression>
    where
        E: Exchange + ?Sized,
    {
        if self.index_from_empty_path {
            let (path, query) = split_target(exchange.target());
            if path.ends_with('/') {
                let target = join_target(&format!("{}{}", path, DEFAULT_DOCUMENT), query);
                exchange.set_target(target);
            }
        }

        let path = exchange.path();
        let entry = self.index.get(&path)?;

        // the representation depends on Accept-Encoding whenever a variant exists
        exchange.set_response_header("Vary", "Accept-Encoding".to_string());

        let compression = find_compression_matching_encoding(
            entry.compressions(),
            exchange.request_header("accept-encoding"),
        );
        let Some(compression) = compression else {
            log::debug!("No acceptable encoding for {}", path);
            return None;
        };

        let (raw_path, query) = split_target(exchange.target());
        let target = join_target(&format!("{}{}", raw_path, compression.suffix()), query);
        log::debug!("Serving {} as {}", path, target);

        exchange.set_target(target);
        exchange.set_response_header("Content-Encoding", compression.encoding().to_string());
        exchange.set_response_header("Content-Type", content_type(&path));
        Some(compression)
    }
}

fn join_target(path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path.to_string(),
    }
}

/// Extensions served as `application/javascript`, which `mime_guess` maps
/// to `text/javascript`.
const JAVASCRIPT_EXTENSIONS: &[&str] = &["js", "mjs"];

/// MIME type guessed from `path`, with `; charset=UTF-8` for textual types.
pub fn content_type(path: &str) -> String {
    let mime_type = if is_javascript(path) {
        mime::APPLICATION_JAVASCRIPT
    } else {
        mime_guess::from_path(path).first_or_octet_stream()
    };
    match default_charset(&mime_type) {
        Some(charset) => format!("{}; charset={}", mime_type.essence_str(), charset),
        None => mime_type.essence_str().to_string(),
    }
}

fn is_javascript(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            JAVASCRIPT_EXTENSIONS
                .iter()
                .any(|js| ext.eq_ignore_ascii_case(js))
        })
}

fn default_charset(mime_type: &Mime) -> Option<&'static str> {
    let textual = mime_type.type_() == mime::TEXT
        || (mime_type.type_() == mime::APPLICATION
            && (mime_type.subtype() == mime::JAVASCRIPT || mime_type.subtype() == mime::JSON));
    textual.then_some("UTF-8")
}
