//! Crawl document descriptors and relative reference resolution.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

const REMOTE_SCHEMES: [&str; 4] = ["https://", "http://", "ssh://", "git::"];
const FORGE_HOSTS: [&str; 3] = ["github.com/", "gitlab.com/", "bitbucket.org/"];

/// Role a referenced file plays in the manifest that points at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// Listed under `resources`.
    Resource,
    /// Listed under `generators`.
    Generator,
    /// Listed under `transformers`.
    Transformer,
}

impl FileType {
    /// Label stored in the index.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Generator => "generator",
            Self::Transformer => "transformer",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file in a repository, as seen by the crawler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Path of the file relative to the repository root.
    pub file_path: String,
    /// Source repository URL.
    pub repository_url: String,
    /// Raw file contents.
    #[serde(default)]
    pub document_data: String,
    /// Branch the file was read from.
    #[serde(default)]
    pub default_branch: String,
    /// Epoch milliseconds when the file was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time_epoch_ms: Option<u64>,
    /// Whether the indexed copy is already up to date.
    #[serde(default)]
    pub is_same: bool,
    /// Role assigned by the manifest that referenced this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
}

impl Document {
    /// Creates a document descriptor with no content loaded.
    pub fn new(repository_url: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            repository_url: repository_url.into(),
            ..Self::default()
        }
    }

    /// Sets the raw file contents.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.document_data = data.into();
        self
    }

    /// Sets the branch the file belongs to.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }

    /// Records the creation time as epoch milliseconds.
    pub fn with_creation_time(mut self, created: SystemTime) -> Self {
        self.creation_time_epoch_ms = created
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|dur| dur.as_millis() as u64);
        self
    }

    /// Resolves `reference` against this document's location.
    ///
    /// Local references are joined onto this file's directory and cleaned
    /// lexically; they inherit the repository and branch. Remote references
    /// (`https://...`, `git@host:org/repo`, `github.com/org/repo/path?ref=v1`)
    /// produce a document rooted in the referenced repository.
    pub fn from_relative_path(&self, reference: &str) -> Result<Document, ResolveError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ResolveError::Empty);
        }
        if is_remote_reference(reference) {
            return remote_document(reference);
        }

        let base = if reference.starts_with('/') {
            ""
        } else {
            parent_dir(&self.file_path)
        };
        let file_path =
            clean_join(base, reference).ok_or_else(|| ResolveError::EscapesRepository {
                base: self.file_path.clone(),
                reference: reference.to_string(),
            })?;

        Ok(Document {
            file_path,
            repository_url: self.repository_url.clone(),
            default_branch: self.default_branch.clone(),
            ..Document::default()
        })
    }
}

/// Errors surfaced while resolving a reference into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The reference was blank.
    Empty,
    /// The reference climbs above the repository root.
    EscapesRepository {
        /// Path of the referring document.
        base: String,
        /// Reference as written.
        reference: String,
    },
    /// A remote reference could not be parsed.
    Remote {
        /// Reference as written.
        reference: String,
        /// Parser diagnostic.
        reason: String,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty reference"),
            Self::EscapesRepository { base, reference } => write!(
                f,
                "reference '{reference}' from '{base}' escapes the repository root"
            ),
            Self::Remote { reference, reason } => {
                write!(f, "invalid remote reference '{reference}': {reason}")
            }
        }
    }
}

impl Error for ResolveError {}

fn is_remote_reference(reference: &str) -> bool {
    reference.starts_with("git@")
        || REMOTE_SCHEMES
            .iter()
            .chain(FORGE_HOSTS.iter())
            .any(|prefix| reference.starts_with(prefix))
}

fn remote_document(reference: &str) -> Result<Document, ResolveError> {
    let remote_error = |reason: String| ResolveError::Remote {
        reference: reference.to_string(),
        reason,
    };

    let trimmed = reference.strip_prefix("git::").unwrap_or(reference);
    let normalized = if let Some(rest) = trimmed.strip_prefix("git@") {
        // scp-like syntax: git@host:org/repo
        format!("ssh://git@{}", rest.replacen(':', "/", 1))
    } else if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&normalized).map_err(|err| remote_error(err.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| remote_error("missing host".to_string()))?;
    let branch = url
        .query_pairs()
        .find(|(key, _)| key == "ref" || key == "version")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();

    let path = url.path().trim_start_matches('/');
    let (repo_part, sub_path) = match path.split_once("//") {
        Some((repo, sub)) => (repo, sub),
        None => {
            let mut parts = path.splitn(3, '/');
            let org = parts.next().unwrap_or_default();
            let repo = parts.next().unwrap_or_default();
            let sub = parts.next().unwrap_or_default();
            let end = org.len() + repo.len() + usize::from(!repo.is_empty());
            (&path[..end.min(path.len())], sub)
        }
    };

    let segments: Vec<&str> = repo_part.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return Err(remote_error("expected <org>/<repo> in path".to_string()));
    }
    let repo_path = segments.join("/");
    let repo_path = repo_path.trim_end_matches(".git");
    let file_path = clean_join("", sub_path)
        .ok_or_else(|| remote_error("path escapes the repository root".to_string()))?;

    Ok(Document {
        file_path,
        repository_url: format!("https://{host}/{repo_path}"),
        default_branch: branch,
        ..Document::default()
    })
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

fn clean_join(base: &str, reference: &str) -> Option<String> {
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}
