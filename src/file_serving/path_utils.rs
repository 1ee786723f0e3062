use super::*;
use crate::log_error;
use percent_encoding::percent_decode_str;
use std::path::Component;
use std::time::Instant;

/// Maps a request target onto a path below `base_dir`, dropping `..` and
/// other non-normal components. `None` if the result would escape the base.
pub fn sanitize_path(base_dir: &Path, request_target: &str) -> io::Result<Option<PathBuf>> {
    let start_time = Instant::now();
    log::debug!(
        "Sanitizing path - base: {}, request: {}",
        base_dir.display(),
        request_target
    );

    // Strip query parameters from the request path
    let path_without_query = request_target.split('?').next().unwrap_or(request_target);

    let decoded_path = request_target.log_operation("decode_path", || {
        percent_decode_str(path_without_query)
            .decode_utf8()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    })?;

    let cleaned_path = PathBuf::from(decoded_path.as_ref())
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect::<PathBuf>();
    log::trace!("Cleaned path: {}", cleaned_path.display());

    let requested_path = base_dir.join(&cleaned_path);

    match fs::canonicalize(&requested_path) {
        Ok(path) => {
            log::debug!(
                "Path sanitization complete in {:?} - result: {}",
                start_time.elapsed(),
                path.display()
            );

            if path.starts_with(base_dir) {
                Ok(Some(path))
            } else {
                log::warn!("Path escapes base directory: {}", path.display());
                Ok(None)
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!(
                "Using non-canonicalized path (not found): {}",
                requested_path.display()
            );
            Ok(Some(requested_path))
        }
        Err(e) => {
            log_error!(
                e,
                format!("Failed to canonicalize path: {}", requested_path.display())
            );
            Err(e)
        }
    }
}

/// In single-file mode a path is reachable only if it sits directly in the
/// base directory and its name is one of `allowed_names`.
pub fn is_reachable(base_dir: &Path, allowed_names: Option<&[String]>, path: &Path) -> bool {
    let Some(allowed_names) = allowed_names else {
        return true;
    };
    path.parent() == Some(base_dir)
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| allowed_names.iter().any(|allowed| allowed == n))
}
