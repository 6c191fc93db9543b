//! Filesystem sink for rendered artifacts.
//!
//! Emitters never touch the disk; they return [`Artifact`]s and the
//! [`ArtifactWriter`] owns directory creation, file handles and permissions.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the output root, e.g. `functions/get-user/main.go`.
    pub path: PathBuf,
    pub contents: String,
    /// Written with mode `0o755` on unix.
    pub executable: bool,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Artifact {
            path: path.into(),
            contents: contents.into(),
            executable: false,
        }
    }

    pub fn executable(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Artifact {
            executable: true,
            ..Artifact::new(path, contents)
        }
    }
}

/// Writes artifacts below a fixed root directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactWriter { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write one artifact, creating parent directories as needed.
    pub fn write(&self, artifact: &Artifact) -> anyhow::Result<PathBuf> {
        let path = self.root.join(&artifact.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        {
            let mut file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            file.write_all(artifact.contents.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
        }

        if artifact.executable {
            make_executable(&path)?;
        }

        debug!(path = %path.display(), bytes = artifact.contents.len(), "Wrote artifact");
        Ok(path)
    }

    /// Write every artifact in order, stopping at the first failure.
    pub fn write_all(&self, artifacts: &[Artifact]) -> anyhow::Result<usize> {
        for artifact in artifacts {
            self.write(artifact)?;
        }
        Ok(artifacts.len())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
        .with_context(|| format!("failed to chmod {}", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        let path = writer
            .write(&Artifact::new("a/b/c.txt", "hello\n"))
            .unwrap();
        assert_eq!(path, dir.path().join("a/b/c.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "hello\n");
    }

    #[test]
    fn test_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        writer.write(&Artifact::new("x.txt", "first")).unwrap();
        writer.write(&Artifact::new("x.txt", "second")).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("x.txt")).unwrap(), "second");
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        let path = writer
            .write(&Artifact::executable("deploy.sh", "#!/bin/bash\n"))
            .unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);

        let plain = writer.write(&Artifact::new("plain.txt", "")).unwrap();
        let mode = fs::metadata(&plain).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0);
    }

    #[test]
    fn test_write_all_counts() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        let n = writer
            .write_all(&[Artifact::new("a", "1"), Artifact::new("b", "2")])
            .unwrap();
        assert_eq!(n, 2);
    }
}
