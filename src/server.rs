use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

use crate::args::Args;
use crate::error::Result;
use crate::file_serving::handlers::handle_file_request;
use crate::file_serving::DiskFileServer;
use crate::log_error;
use crate::negotiation::Negotiator;

/// Builds the variant index, then accepts connections until the listener
/// fails. Index build errors abort before anything is bound.
pub fn start_server(args: Args) -> Result<()> {
    let options = args.negotiation_options();
    let file_server = DiskFileServer::new(&options.root, &options.registry())?;
    let negotiator = Arc::new(Negotiator::new(&options, file_server)?);

    let listener = TcpListener::bind(&args.listen_addr)?;
    log::info!("Listening on: {}", args.listen_addr);
    log::info!(
        "Serving {} ({} compressed path(s))",
        options.root.display(),
        negotiator.index().len()
    );

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                log_error!(e, "Failed to accept connection");
                continue;
            }
        };
        let negotiator = Arc::clone(&negotiator);

        thread::spawn(move || {
            if let Err(e) = handle_file_request(stream, &negotiator) {
                log_error!(e, "Error handling connection");
            }
        });
    }

    Ok(())
}
