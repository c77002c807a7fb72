// ABOUTME: Ephemeral local directory holding rendered site files for one run.
// ABOUTME: Removed explicitly on success, or on drop when a run stops early.

use std::io;
use std::path::Path;
use tempfile::TempDir;

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create(prefix: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("sitesmith-{prefix}-"))
            .tempdir()?;
        tracing::debug!(path = %dir.path().display(), "created workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory, reporting failures instead of swallowing them.
    pub fn close(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!(path = %path.display(), "removed workspace");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_removes_directory() {
        let workspace = Workspace::create("test").unwrap();
        let path = workspace.path().to_path_buf();
        std::fs::write(path.join("index.html"), "<h1>hi</h1>").unwrap();

        workspace.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn drop_removes_directory() {
        let path = {
            let workspace = Workspace::create("test").unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
