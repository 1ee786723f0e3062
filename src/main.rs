use clap::Parser;
use log::LevelFilter;

use staticgz::args::Args;
use staticgz::logging::setup_logging;
use staticgz::server::start_server;

fn main() -> staticgz::Result<()> {
    let args = Args::parse();
    setup_logging(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    start_server(args)
}
