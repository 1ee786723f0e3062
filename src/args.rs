use clap::Parser;
use std::path::PathBuf;

use crate::compression::CustomCompression;
use crate::config::NegotiationOptions;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    pub listen_addr: String,

    /// Directory to serve, or a single file served with its compressed siblings
    #[arg(short, long)]
    pub serve_dir: PathBuf,

    /// Also look for brotli (.br) variants, preferred over gzip
    #[arg(short = 'b', long)]
    pub enable_brotli: bool,

    /// Extra encoding as TOKEN=SUFFIX, e.g. zstd=zst; repeatable, earlier wins
    #[arg(short, long = "compression", value_name = "TOKEN=SUFFIX")]
    pub compressions: Vec<CustomCompression>,

    /// Do not map targets ending in `/` to index.html
    #[arg(long)]
    pub no_index_from_empty_path: bool,

    /// Log debug output unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn negotiation_options(&self) -> NegotiationOptions {
        NegotiationOptions {
            root: self.serve_dir.clone(),
            custom_compressions: self.compressions.clone(),
            enable_brotli: self.enable_brotli,
            index_from_empty_path: !self.no_index_from_empty_path,
        }
    }
}
