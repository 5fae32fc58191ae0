//! Access to files bundled with the installed package

use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;

use tracing::debug;

use crate::package::types::PackageIdentity;

/// Trait for reading files shipped with the installed copy of a package
#[cfg_attr(test, automock)]
pub trait LocalFiles: Send + Sync {
    /// Contents of `filename`, `None` when missing, unreadable or empty
    fn get_local_file(&self, identity: &PackageIdentity, filename: &str) -> Option<String>;

    /// Whether `filename` exists in the installed copy
    fn exists(&self, identity: &PackageIdentity, filename: &str) -> bool;
}

/// Reads installed packages from `<root>/<repo>/`
pub struct FsLocalFiles {
    root: PathBuf,
}

impl FsLocalFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, identity: &PackageIdentity, filename: &str) -> PathBuf {
        self.root.join(&identity.repo).join(filename)
    }
}

impl LocalFiles for FsLocalFiles {
    fn get_local_file(&self, identity: &PackageIdentity, filename: &str) -> Option<String> {
        let path = self.path(identity, filename);
        match std::fs::read_to_string(&path) {
            Ok(contents) if !contents.trim().is_empty() => Some(contents),
            Ok(_) => None,
            Err(e) => {
                debug!("No local {:?}: {}", path, e);
                None
            }
        }
    }

    fn exists(&self, identity: &PackageIdentity, filename: &str) -> bool {
        self.path(identity, filename).is_file()
    }
}
