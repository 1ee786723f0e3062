use std::io::{BufReader, ErrorKind};
use std::net::TcpStream;
use std::time::Instant;

use super::path_utils::{is_reachable, sanitize_path};
use super::*;
use crate::config::DEFAULT_DOCUMENT;
use crate::exchange::Exchange;
use crate::negotiation::{content_type, Negotiator};
use crate::{log_request, log_response};

/// Reads the file the exchange currently targets. Headers set during
/// negotiation are carried into the response; `Content-Type` falls back to
/// a guess from the served file name.
pub fn serve_file(server: &DiskFileServer, exchange: &HttpExchange) -> io::Result<FileResponse> {
    if !exchange.method.eq_ignore_ascii_case("GET") && !exchange.is_head() {
        return Ok(FileResponse {
            status: 405,
            reason: "Method Not Allowed",
            headers: vec![("Allow".to_string(), "GET, HEAD".to_string())],
            content: Vec::new(),
            head_only: false,
        });
    }

    let path = match sanitize_path(server.base_dir(), exchange.target()) {
        Ok(Some(p)) => p,
        Ok(None) => return Ok(FileResponse::not_found_for(exchange)),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            return Ok(FileResponse::not_found_for(exchange))
        }
        Err(e) => return Err(e),
    };

    let final_path = if path.is_dir() {
        path.join(DEFAULT_DOCUMENT)
    } else {
        path
    };
    log::debug!("Final resolved path: {}", final_path.display());

    if !is_reachable(server.base_dir(), server.allowed_names.as_deref(), &final_path) {
        log::debug!("Outside single-file root: {}", final_path.display());
        return Ok(FileResponse::not_found_for(exchange));
    }

    let content = match fs::metadata(&final_path) {
        Ok(metadata) if metadata.is_file() => fs::read(&final_path)?,
        Ok(_) => {
            log::warn!(
                "Path exists but is not a regular file: {}",
                final_path.display()
            );
            return Ok(FileResponse::not_found_for(exchange));
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("File not found: {}", final_path.display());
            return Ok(FileResponse::not_found_for(exchange));
        }
        Err(e) => return Err(e),
    };

    let mut headers = exchange.response_headers().to_vec();
    if exchange.response_header("Content-Type").is_none() {
        let name = final_path.to_string_lossy();
        headers.push(("Content-Type".to_string(), content_type(&name)));
    }
    headers.push(("X-Content-Type-Options".to_string(), "nosniff".to_string()));

    Ok(FileResponse {
        status: 200,
        reason: "OK",
        headers,
        content,
        head_only: exchange.is_head(),
    })
}

/// Reads one request off `client`, negotiates, serves and writes the
/// response.
pub fn handle_file_request(
    client: TcpStream,
    negotiator: &Negotiator<DiskFileServer>,
) -> io::Result<()> {
    let start_time = Instant::now();
    let mut reader = BufReader::new(&client);
    let Some(mut exchange) = HttpExchange::read_from(&mut reader)? else {
        return Ok(());
    };
    log_request!(exchange.method, exchange.target());

    let response = negotiator.handle(&mut exchange)?;

    let mut writer = &client;
    response.write_to(&mut writer)?;

    log_response!(
        response.status,
        start_time.elapsed(),
        response.header("Content-Encoding"),
        response.content.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn gzip_registry() -> CompressionRegistry {
        let mut registry = CompressionRegistry::new();
        registry.register("gzip", "gz");
        registry
    }

    fn server_with(files: &[(&str, &str)]) -> (TempDir, DiskFileServer) {
        let temp_dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = temp_dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let server = DiskFileServer::new(temp_dir.path(), &gzip_registry()).unwrap();
        (temp_dir, server)
    }

    #[rstest]
    fn test_serves_file_with_guessed_type() {
        let (_dir, server) = server_with(&[("style.css", "body {}")]);
        let response = serve_file(&server, &HttpExchange::new("GET", "/style.css")).unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content, b"body {}");
        assert_eq!(response.header("content-type"), Some("text/css; charset=UTF-8"));
    }

    #[rstest]
    fn test_keeps_negotiated_headers() {
        let (_dir, server) = server_with(&[("app.js.gz", "zipped")]);
        let mut exchange = HttpExchange::new("GET", "/app.js.gz");
        exchange.set_response_header("Content-Type", "application/javascript".into());
        exchange.set_response_header("Content-Encoding", "gzip".into());

        let response = serve_file(&server, &exchange).unwrap();
        assert_eq!(response.content, b"zipped");
        assert_eq!(response.header("content-type"), Some("application/javascript"));
        assert_eq!(response.header("content-encoding"), Some("gzip"));
    }

    #[rstest]
    fn test_directory_serves_default_document() {
        let (_dir, server) = server_with(&[("docs/index.html", "<p>docs</p>")]);
        let response = serve_file(&server, &HttpExchange::new("GET", "/docs")).unwrap();
        assert_eq!(response.content, b"<p>docs</p>");
    }

    #[rstest]
    #[case("/missing.html")]
    #[case("/../../etc/passwd")]
    #[case("/%FF")]
    fn test_not_found(#[case] target: &str) {
        let (_dir, server) = server_with(&[("index.html", "hi")]);
        let response = serve_file(&server, &HttpExchange::new("GET", target)).unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.header("content-encoding"), None);
    }

    #[rstest]
    fn test_head_has_no_body() {
        let (_dir, server) = server_with(&[("index.html", "hello")]);
        let response = serve_file(&server, &HttpExchange::new("HEAD", "/index.html")).unwrap();

        let mut written = Vec::new();
        response.write_to(&mut written).unwrap();
        let written = String::from_utf8(written).unwrap();
        assert!(written.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(written.contains("Content-Length: 5\r\n"));
        assert!(written.ends_with("\r\n\r\n"));
    }

    #[rstest]
    fn test_rejects_other_methods() {
        let (_dir, server) = server_with(&[("index.html", "hello")]);
        let response = serve_file(&server, &HttpExchange::new("POST", "/index.html")).unwrap();
        assert_eq!(response.status, 405);
    }

    #[rstest]
    fn test_single_file_root_limits_reach() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("main.js"), "js").unwrap();
        fs::write(temp_dir.path().join("main.js.gz"), "gz").unwrap();
        fs::write(temp_dir.path().join("secret.txt"), "no").unwrap();
        fs::write(temp_dir.path().join("main.json"), "json").unwrap();
        fs::write(temp_dir.path().join("main.js.map"), "map").unwrap();
        let server =
            DiskFileServer::new(&temp_dir.path().join("main.js"), &gzip_registry()).unwrap();

        let ok = serve_file(&server, &HttpExchange::new("GET", "/main.js.gz")).unwrap();
        assert_eq!(ok.content, b"gz");
        let original = serve_file(&server, &HttpExchange::new("GET", "/main.js")).unwrap();
        assert_eq!(original.content, b"js");

        for target in ["/secret.txt", "/main.json", "/main.js.map"] {
            let denied = serve_file(&server, &HttpExchange::new("GET", target)).unwrap();
            assert_eq!(denied.status, 404, "{}", target);
        }
    }

    #[rstest]
    fn test_not_found_keeps_vary() {
        let (_dir, server) = server_with(&[("app.js.gz", "zipped")]);
        let mut exchange = HttpExchange::new("GET", "/app.js");
        exchange.set_response_header("Vary", "Accept-Encoding".into());

        let response = serve_file(&server, &exchange).unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.header("vary"), Some("Accept-Encoding"));
        assert_eq!(response.header("content-type"), Some("text/plain"));
    }
}
