use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary copy of the usual test site:
///
/// ```text
/// index.html  index.html.gz
/// style.css   style.css.gz  style.css.br
/// js/main.js  js/main.js.gz
/// ```
pub struct StaticDir {
    inner: TempDir,
}

impl StaticDir {
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.inner.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

pub fn static_dir() -> StaticDir {
    let dir = StaticDir {
        inner: TempDir::new().unwrap(),
    };
    dir.write("index.html", "<h1>index</h1>");
    dir.write("index.html.gz", "index-gzip");
    dir.write("style.css", "body { color: red; }");
    dir.write("style.css.gz", "style-gzip");
    dir.write("style.css.br", "style-brotli");
    dir.write("js/main.js", "console.log('main');");
    dir.write("js/main.js.gz", "main-gzip");
    dir
}
