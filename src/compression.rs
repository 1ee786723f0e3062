use std::fmt;
use std::str::FromStr;

use crate::config::NegotiationOptions;
use crate::error::Error;

/// Token and suffix of the encoding that is always available.
pub const GZIP: (&str, &str) = ("gzip", "gz");
/// Token and suffix of the optional brotli encoding.
pub const BROTLI: (&str, &str) = ("br", "br");

/// One supported encoding: the `Accept-Encoding` token and the suffix that
/// marks its pre-compressed files on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Compression {
    encoding: String,
    suffix: String,
}

impl Compression {
    pub fn new(encoding: impl Into<String>, suffix: &str) -> Self {
        let suffix = if suffix.starts_with('.') {
            suffix.to_string()
        } else {
            format!(".{}", suffix)
        };
        Self {
            encoding: encoding.into(),
            suffix,
        }
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Always starts with `.`.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.encoding, self.suffix)
    }
}

/// A custom encoding as given on the command line, `TOKEN=SUFFIX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomCompression {
    pub encoding: String,
    pub suffix: String,
}

impl FromStr for CustomCompression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (encoding, suffix) = s
            .split_once('=')
            .map(|(e, x)| (e.trim(), x.trim()))
            .ok_or_else(|| Error::InvalidCompression(s.to_string()))?;

        if encoding.is_empty() || suffix.is_empty() || suffix == "." {
            return Err(Error::InvalidCompression(s.to_string()));
        }

        Ok(Self {
            encoding: encoding.to_string(),
            suffix: suffix.to_string(),
        })
    }
}

/// Ordered set of encodings. Registration order is the preference order
/// used during negotiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressionRegistry {
    compressions: Vec<Compression>,
}

impl CompressionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom encodings in listed order, then brotli if enabled, then gzip.
    pub fn from_options(options: &NegotiationOptions) -> Self {
        let mut registry = Self::new();

        for custom in &options.custom_compressions {
            registry.register(&custom.encoding, &custom.suffix);
        }

        if options.enable_brotli {
            registry.register(BROTLI.0, BROTLI.1);
        }

        registry.register(GZIP.0, GZIP.1);

        log::debug!(
            "Registered compressions: {}",
            registry
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        registry
    }

    /// Appends a compression unless one with the same token already exists.
    /// Returns `true` if the registry changed.
    pub fn register(&mut self, encoding: &str, suffix: &str) -> bool {
        if self.find_by_token(encoding).is_some() {
            log::trace!("Compression {} already registered, ignoring", encoding);
            return false;
        }
        self.compressions.push(Compression::new(encoding, suffix));
        true
    }

    pub fn find_by_token(&self, encoding: &str) -> Option<&Compression> {
        self.compressions.iter().find(|c| c.encoding == encoding)
    }

    /// First compression, in registry order, whose suffix ends `name`,
    /// together with its registry position.
    pub fn match_suffix(&self, name: &str) -> Option<(usize, &Compression)> {
        self.compressions
            .iter()
            .enumerate()
            .find(|(_, c)| name.ends_with(&c.suffix))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Compression> {
        self.compressions.iter()
    }

    pub fn len(&self) -> usize {
        self.compressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compressions.is_empty()
    }
}

/// Picks the first compression whose token occurs anywhere in the
/// `Accept-Encoding` value. Quality values are not parsed.
pub fn find_compression_matching_encoding<'a>(
    compressions: &'a [Compression],
    accept_encoding: Option<&str>,
) -> Option<&'a Compression> {
    let accept_encoding = accept_encoding.filter(|v| !v.is_empty())?;
    compressions
        .iter()
        .find(|c| accept_encoding.contains(c.encoding()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_register_gzip() {
        let mut registry = CompressionRegistry::new();
        assert!(registry.register("gzip", "gz"));

        assert_eq!(registry.len(), 1);
        let gzip = registry.find_by_token("gzip").unwrap();
        assert_eq!(gzip.encoding(), "gzip");
        assert_eq!(gzip.suffix(), ".gz");
    }

    #[rstest]
    fn test_register_same_token_keeps_first_suffix() {
        let mut registry = CompressionRegistry::new();
        registry.register("gzip", "gzip");
        assert!(!registry.register("gzip", "gz"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find_by_token("gzip").unwrap().suffix(), ".gzip");
    }

    #[rstest]
    #[case("gz", ".gz")]
    #[case(".gz", ".gz")]
    #[case("tar.zst", ".tar.zst")]
    fn test_suffix_normalized(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(Compression::new("x", input).suffix(), expected);
    }

    #[rstest]
    fn test_from_options_order() {
        let options = NegotiationOptions::new("static")
            .with_custom_compression("deflate", "zz")
            .with_brotli(true);
        let registry = CompressionRegistry::from_options(&options);

        let tokens: Vec<&str> = registry.iter().map(|c| c.encoding()).collect();
        assert_eq!(tokens, vec!["deflate", "br", "gzip"]);
    }

    #[rstest]
    fn test_from_options_gzip_always_present() {
        let registry = CompressionRegistry::from_options(&NegotiationOptions::new("static"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find_by_token("gzip").unwrap().suffix(), ".gz");
    }

    #[rstest]
    fn test_custom_gzip_shadows_default() {
        let options = NegotiationOptions::new("static").with_custom_compression("gzip", "gzip");
        let registry = CompressionRegistry::from_options(&options);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find_by_token("gzip").unwrap().suffix(), ".gzip");
    }

    #[rstest]
    fn test_match_suffix_first_registered_wins() {
        let mut registry = CompressionRegistry::new();
        registry.register("zstd-gz", "zst.gz");
        registry.register("gzip", "gz");

        let (position, compression) = registry.match_suffix("app.js.zst.gz").unwrap();
        assert_eq!((position, compression.encoding()), (0, "zstd-gz"));
        let (position, compression) = registry.match_suffix("app.js.gz").unwrap();
        assert_eq!((position, compression.encoding()), (1, "gzip"));
        assert!(registry.match_suffix("app.js").is_none());
    }

    #[rstest]
    #[case(Some("gzip, br"), Some("br"))]
    #[case(Some("gzip"), Some("gzip"))]
    #[case(Some("deflate"), None)]
    #[case(Some(""), None)]
    #[case(None, None)]
    fn test_find_compression_matching_encoding(
        #[case] accept: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let compressions = vec![Compression::new("br", "br"), Compression::new("gzip", "gz")];
        let found = find_compression_matching_encoding(&compressions, accept);
        assert_eq!(found.map(|c| c.encoding()), expected);
    }

    #[rstest]
    fn test_custom_compression_parse() {
        let custom: CustomCompression = "zstd=zst".parse().unwrap();
        assert_eq!(custom.encoding, "zstd");
        assert_eq!(custom.suffix, "zst");

        assert!("zstd".parse::<CustomCompression>().is_err());
        assert!("=zst".parse::<CustomCompression>().is_err());
        assert!("zstd=".parse::<CustomCompression>().is_err());
    }
}
