use percent_encoding::percent_decode_str;
use std::io::{self, BufRead};

/// The request/response pair seen by the negotiation step.
///
/// Header names are matched case-insensitively. The target is the raw
/// request target, path plus optional query.
pub trait Exchange {
    fn target(&self) -> &str;

    fn set_target(&mut self, target: String);

    fn request_header(&self, name: &str) -> Option<&str>;

    /// Replaces any earlier value set under the same name.
    fn set_response_header(&mut self, name: &str, value: String);

    /// Percent-decoded path of the current target, without the query.
    fn path(&self) -> String {
        let (path, _) = split_target(self.target());
        percent_decode_str(path).decode_utf8_lossy().into_owned()
    }
}

/// Splits a target at the first `?`.
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// An HTTP/1.x request read off a connection, plus the response headers
/// accumulated for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpExchange {
    pub method: String,
    target: String,
    request_headers: Vec<(String, String)>,
    response_headers: Vec<(String, String)>,
}

impl HttpExchange {
    pub fn new(method: &str, target: &str) -> Self {
        Self {
            method: method.to_string(),
            target: target.to_string(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.request_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    /// Reads the request line and headers. Returns `None` on a closed or
    /// malformed connection.
    pub fn read_from<R: BufRead>(reader: &mut R) -> io::Result<Option<Self>> {
        let mut first_line = String::new();
        if reader.read_line(&mut first_line)? == 0 {
            return Ok(None);
        }

        let mut parts = first_line.split_whitespace();
        let (method, target) = match (parts.next(), parts.next()) {
            (Some(method), Some(target)) => (method, target),
            _ => {
                log::warn!("Invalid request line: {}", first_line.trim());
                return Ok(None);
            }
        };
        let mut exchange = Self::new(method, target);

        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 || line.trim().is_empty() {
                break;
            }
            log::trace!("Header line: {}", line.trim());
            if let Some((name, value)) = line.split_once(':') {
                exchange
                    .request_headers
                    .push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        Ok(Some(exchange))
    }

    pub fn response_header(&self, name: &str) -> Option<&str> {
        self.response_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn response_headers(&self) -> &[(String, String)] {
        &self.response_headers
    }

    pub fn is_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("HEAD")
    }
}

impl Exchange for HttpExchange {
    fn target(&self) -> &str {
        &self.target
    }

    fn set_target(&mut self, target: String) {
        self.target = target;
    }

    fn request_header(&self, name: &str) -> Option<&str> {
        self.request_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn set_response_header(&mut self, name: &str, value: String) {
        match self
            .response_headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value,
            None => self.response_headers.push((name.to_string(), value)),
        }
    }
}
