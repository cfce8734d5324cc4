//! Resolution of the resource, generator and transformer paths a manifest lists.

use crate::document::{Document, FileType};
use crate::kustomization::Kustomization;
use tracing::warn;

/// Which reference lists to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSelection {
    /// Follow `resources` (and folded `bases`).
    pub resources: bool,
    /// Follow `generators`.
    pub generators: bool,
    /// Follow `transformers`.
    pub transformers: bool,
}

impl ReferenceSelection {
    /// Follow every list.
    pub const ALL: Self = Self::new(true, true, true);
    /// Follow nothing.
    pub const NONE: Self = Self::new(false, false, false);

    /// Builds a selection from the three inclusion flags.
    pub const fn new(resources: bool, generators: bool, transformers: bool) -> Self {
        Self {
            resources,
            generators,
            transformers,
        }
    }
}

impl Default for ReferenceSelection {
    fn default() -> Self {
        Self::ALL
    }
}

/// Resolves the selected lists of `kustomization` against `document`.
///
/// Order is resources, then generators, then transformers, each in source order.
pub fn extract_references(
    document: &Document,
    kustomization: &Kustomization,
    selection: ReferenceSelection,
) -> Vec<Document> {
    let lists = [
        (selection.resources, &kustomization.resources, FileType::Resource),
        (selection.generators, &kustomization.generators, FileType::Generator),
        (selection.transformers, &kustomization.transformers, FileType::Transformer),
    ];

    let mut children = Vec::new();
    for (included, paths, file_type) in lists {
        if included {
            children.extend(collect_documents(document, paths, file_type));
        }
    }
    children
}

/// Builds a child document for every non-blank path, tagged with `file_type`.
///
/// Paths that fail to resolve are logged and skipped; the rest of the batch
/// is unaffected.
pub fn collect_documents(
    document: &Document,
    paths: &[String],
    file_type: FileType,
) -> Vec<Document> {
    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        if path.trim().is_empty() {
            continue;
        }
        match document.from_relative_path(path) {
            Ok(mut next) => {
                next.file_type = Some(file_type);
                docs.push(next);
            }
            Err(err) => {
                warn!(
                    from = %document.file_path,
                    reference = %path,
                    kind = %file_type,
                    "skipping unresolvable reference: {err}"
                );
            }
        }
    }
    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn manifest() -> Document {
        Document::new("https://github.com/acme/deploy", "apps/web/kustomization.yaml")
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, logs.contents())
    }

    #[test]
    fn unresolvable_entries_are_skipped() {
        let paths = vec![
            "deployment.yaml".to_string(),
            "../../../escape.yaml".to_string(),
            "service.yaml".to_string(),
        ];
        let (docs, logs) =
            with_captured_logs(|| collect_documents(&manifest(), &paths, FileType::Resource));
        let got: Vec<&str> = docs.iter().map(|d| d.file_path.as_str()).collect();
        assert_eq!(got, vec!["apps/web/deployment.yaml", "apps/web/service.yaml"]);
        assert!(docs.iter().all(|d| d.file_type == Some(FileType::Resource)));

        let warnings: Vec<&str> = logs.lines().filter(|line| line.contains("WARN")).collect();
        assert_eq!(warnings.len(), 1, "logs: {logs}");
        assert!(warnings[0].contains("skipping unresolvable reference"));
        assert!(warnings[0].contains("reference=../../../escape.yaml"));
        assert!(warnings[0].contains("kind=resource"));
    }

    #[test]
    fn blank_entries_are_ignored() {
        let paths = vec!["  ".to_string(), String::new(), "cm.yaml".to_string()];
        let docs = collect_documents(&manifest(), &paths, FileType::Generator);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].file_type, Some(FileType::Generator));
    }

    #[test]
    fn order_is_resources_generators_transformers() {
        let kustomization = Kustomization {
            resources: vec!["a.yaml".into(), "b.yaml".into()],
            generators: vec!["g.yaml".into()],
            ..Kustomization::default()
        };
        let docs = extract_references(&manifest(), &kustomization, ReferenceSelection::ALL);
        let got: Vec<(&str, Option<FileType>)> = docs
            .iter()
            .map(|d| (d.file_path.as_str(), d.file_type))
            .collect();
        assert_eq!(
            got,
            vec![
                ("apps/web/a.yaml", Some(FileType::Resource)),
                ("apps/web/b.yaml", Some(FileType::Resource)),
                ("apps/web/g.yaml", Some(FileType::Generator)),
            ]
        );
        assert!(
            extract_references(&manifest(), &kustomization, ReferenceSelection::NONE).is_empty()
        );
    }
}
