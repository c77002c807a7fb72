// ABOUTME: Site template collaborator that renders source files for a configuration.
// ABOUTME: DirectoryTemplate copies a template tree verbatim and adds site.config.json.

use std::io;
use std::path::{Path, PathBuf};

use super::{SiteConfiguration, SourceFile};

pub const CONFIG_FILE_NAME: &str = "site.config.json";

pub trait SiteTemplate: Send + Sync {
    /// Write the site's files under `workspace` and return them with
    /// workspace-relative, `/`-separated paths.
    fn render(&self, config: &SiteConfiguration, workspace: &Path) -> io::Result<Vec<SourceFile>>;
}

#[derive(Debug, Clone)]
pub struct DirectoryTemplate {
    root: PathBuf,
}

impl DirectoryTemplate {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SiteTemplate for DirectoryTemplate {
    fn render(&self, config: &SiteConfiguration, workspace: &Path) -> io::Result<Vec<SourceFile>> {
        let mut files = Vec::new();
        copy_tree(&self.root, &self.root, workspace, &mut files)?;

        let json = serde_json::to_vec_pretty(config).map_err(io::Error::other)?;
        std::fs::write(workspace.join(CONFIG_FILE_NAME), &json)?;
        files.retain(|f| f.path != CONFIG_FILE_NAME);
        files.push(SourceFile::new(CONFIG_FILE_NAME, json));

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

fn copy_tree(
    root: &Path,
    dir: &Path,
    workspace: &Path,
    files: &mut Vec<SourceFile>,
) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();

        if name == ".git" {
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let target = workspace.join(relative);

        if entry.file_type()?.is_dir() {
            std::fs::create_dir_all(&target)?;
            copy_tree(root, &path, workspace, files)?;
        } else {
            let contents = std::fs::read(&path)?;
            std::fs::write(&target, &contents)?;
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push(SourceFile::new(relative, contents));
        }
    }
    Ok(())
}
