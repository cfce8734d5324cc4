//! Loads document content from a local repository checkout.

use crate::document::Document;
use crate::manifest::ManifestNames;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

/// A repository checked out on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
    repository_url: String,
    manifests: ManifestNames,
}

impl LocalRepository {
    /// Creates a repository rooted at `root` and identified by `repository_url`.
    pub fn new(
        root: impl Into<PathBuf>,
        repository_url: impl Into<String>,
        manifests: ManifestNames,
    ) -> Self {
        Self {
            root: root.into(),
            repository_url: repository_url.into(),
            manifests,
        }
    }

    /// True when `document` belongs to this repository.
    pub fn contains(&self, document: &Document) -> bool {
        document.repository_url == self.repository_url
    }

    /// Points a directory reference at the manifest inside it.
    ///
    /// Paths naming a file are left unchanged.
    pub fn locate(&self, document: &mut Document) -> Result<(), RepositoryError> {
        let path = self.local_path(document)?;
        if !path.is_dir() {
            return Ok(());
        }

        let name = self
            .manifests
            .names()
            .iter()
            .find(|name| path.join(name).is_file())
            .ok_or_else(|| RepositoryError::MissingManifest { path: path.clone() })?;
        document.file_path = if document.file_path.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", document.file_path.trim_end_matches('/'), name)
        };
        Ok(())
    }

    /// Reads the document's content and creation time from disk.
    pub fn load(&self, document: &mut Document) -> Result<(), RepositoryError> {
        let path = self.local_path(document)?;
        let bytes = fs::read(&path).map_err(|source| RepositoryError::Io {
            path: path.clone(),
            source,
        })?;
        document.document_data =
            String::from_utf8(bytes).map_err(|_| RepositoryError::NotUtf8 { path: path.clone() })?;

        if let Ok(metadata) = fs::metadata(&path) {
            if let Ok(created) = metadata.created().or_else(|_| metadata.modified()) {
                *document = std::mem::take(document).with_creation_time(created);
            }
        }
        Ok(())
    }

    fn local_path(&self, document: &Document) -> Result<PathBuf, RepositoryError> {
        if !self.contains(document) {
            return Err(RepositoryError::Foreign {
                repository_url: document.repository_url.clone(),
            });
        }
        Ok(self.root.join(&document.file_path))
    }
}

/// Errors surfaced while reading from a local repository.
#[derive(Debug)]
pub enum RepositoryError {
    /// Reading the file failed.
    Io {
        /// Local path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The file is not UTF-8 text.
    NotUtf8 {
        /// Local path that was read.
        path: PathBuf,
    },
    /// A directory reference holds no recognized manifest.
    MissingManifest {
        /// Directory that was searched.
        path: PathBuf,
    },
    /// The document belongs to a different repository.
    Foreign {
        /// Repository the document points at.
        repository_url: String,
    },
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::NotUtf8 { path } => write!(f, "{} is not UTF-8 text", path.display()),
            Self::MissingManifest { path } => {
                write!(f, "no kustomization found in {}", path.display())
            }
            Self::Foreign { repository_url } => {
                write!(f, "document belongs to another repository: {repository_url}")
            }
        }
    }
}

impl Error for RepositoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
