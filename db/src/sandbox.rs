//! Sandboxed resolution of database names to file paths.
//!
//! Every managed database lives directly or indirectly under one root
//! directory. [`Sandbox::resolve`] maps a caller-supplied name onto that
//! root and refuses names that would land anywhere else: absolute paths,
//! `..` components climbing above the root, and symlinks pointing out of
//! it.
//!
//! # Example
//!
//! ```no_run
//! use sqlite_mcp_db::Sandbox;
//!
//! let sandbox = Sandbox::open("./data").unwrap();
//! let path = sandbox.resolve("main.db").unwrap();
//! assert!(path.starts_with(sandbox.root()));
//! assert!(sandbox.resolve("../etc/passwd").is_err());
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local};
use sqlite_mcp_core::DatabaseEntry;
use tracing::debug;

use crate::error::{Result, SandboxError};

/// File extension of databases reported by [`Sandbox::list_databases`].
pub const DATABASE_EXTENSION: &str = "db";

/// The fixed root directory that bounds every database path.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Creates the root directory if needed and canonicalizes it.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::IoError`] if the directory cannot be created
    /// or canonicalized.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let root = root.canonicalize()?;
        debug!(root = %root.display(), "Opened data directory");
        Ok(Self { root })
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a database name to a path under the root.
    ///
    /// The file is not required to exist. Names are normalized lexically
    /// first (`.` is dropped, `..` removes the previous component); if any
    /// ancestor of the result exists on disk it is canonicalized and must
    /// still lie under the root.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::PathEscape`] for empty names, absolute names,
    /// and names that resolve outside the root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let escape = || SandboxError::PathEscape(name.to_string());

        let mut relative = PathBuf::new();
        for component in Path::new(name).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !relative.pop() {
                        return Err(escape());
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(escape()),
            }
        }
        if relative.as_os_str().is_empty() {
            return Err(escape());
        }

        let path = self.root.join(&relative);
        if !self.contains_existing_ancestor(&path)? {
            return Err(escape());
        }
        Ok(path)
    }

    /// Checks the nearest existing ancestor of `path` against the root.
    ///
    /// Entries are probed without following links, so a dangling symlink
    /// counts as existing. A link whose target cannot be resolved is
    /// treated as outside the root.
    fn contains_existing_ancestor(&self, path: &Path) -> Result<bool> {
        for ancestor in path.ancestors() {
            let metadata = match fs::symlink_metadata(ancestor) {
                Ok(metadata) => metadata,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            return match ancestor.canonicalize() {
                Ok(canonical) => Ok(canonical.starts_with(&self.root)),
                Err(_) if metadata.file_type().is_symlink() => Ok(false),
                Err(err) => Err(err.into()),
            };
        }
        Ok(false)
    }

    /// Lists `*.db` files directly inside the root, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::IoError`] if the directory or a file's
    /// metadata cannot be read.
    pub fn list_databases(&self) -> Result<Vec<DatabaseEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            let is_database = path
                .extension()
                .is_some_and(|ext| ext == DATABASE_EXTENSION);
            if !is_database {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified: DateTime<Local> = metadata.modified()?.into();
            entries.push(DatabaseEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size_bytes: metadata.len(),
                modified: modified.to_rfc3339(),
                path: path.display().to_string(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
