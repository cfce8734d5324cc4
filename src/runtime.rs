//! Synchronous crawl driver: seeds in, index records out.

use crate::controls::IndexControls;
use crate::document::Document;
use crate::frontier::{CrawlTask, Frontier, FrontierError};
use crate::indexed::IndexedDocument;
use crate::parser::DocumentParser;
use crate::repository::LocalRepository;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Counters reported at the end of a crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Records handed to the sink.
    pub emitted: usize,
    /// Records emitted without derived fields because parsing failed.
    pub parse_failures: usize,
    /// Documents that could not be read.
    pub load_failures: usize,
    /// References resolved from manifests.
    pub references: usize,
    /// References already scheduled earlier.
    pub duplicates: usize,
    /// References into other repositories.
    pub skipped_remote: usize,
    /// References dropped because the frontier was full.
    pub dropped: usize,
}

/// Crawls `repository` starting from `seeds`, handing every record to `sink`.
///
/// Manifests contribute their references back into the frontier until
/// `controls.max_depth()` hops from the seed. Load and parse failures are
/// logged and counted; only a sink error stops the crawl.
pub fn run<F, E>(
    controls: &IndexControls,
    repository: &LocalRepository,
    seeds: Vec<Document>,
    mut sink: F,
) -> Result<CrawlStats, E>
where
    F: FnMut(IndexedDocument) -> Result<(), E>,
{
    let parser = DocumentParser::new(controls.manifest_names().clone());
    let mut frontier = Frontier::new(controls.frontier_capacity());
    let mut stats = CrawlStats::default();

    for seed in seeds {
        schedule(&mut frontier, repository, CrawlTask::new(seed, 0), &mut stats);
    }

    while let Some(task) = frontier.next_task() {
        let (mut document, depth) = task.into_parts();
        if let Err(err) = repository.load(&mut document) {
            warn!(path = %document.file_path, "skipping document: {err}");
            stats.load_failures += 1;
            continue;
        }

        let mut indexed = IndexedDocument::new(document);
        if let Err(err) = indexed.parse_yaml(&parser) {
            warn!(path = %indexed.document.file_path, "indexing without derived fields: {err}");
            stats.parse_failures += 1;
        }

        if depth < controls.max_depth() {
            match indexed.get_resources(&parser, controls.selection()) {
                Ok(children) => {
                    for child in children {
                        stats.references += 1;
                        let task = CrawlTask::new(child, depth + 1);
                        schedule(&mut frontier, repository, task, &mut stats);
                    }
                }
                Err(err) => {
                    warn!(
                        path = %indexed.document.file_path,
                        "could not collect references: {err}"
                    );
                }
            }
        } else {
            debug!(path = %indexed.document.file_path, depth, "max depth reached");
        }

        sink(indexed)?;
        stats.emitted += 1;
    }

    info!(
        emitted = stats.emitted,
        parse_failures = stats.parse_failures,
        load_failures = stats.load_failures,
        references = stats.references,
        "crawl finished"
    );
    Ok(stats)
}

fn schedule(
    frontier: &mut Frontier,
    repository: &LocalRepository,
    mut task: CrawlTask,
    stats: &mut CrawlStats,
) {
    if !repository.contains(task.document()) {
        debug!(
            repository = %task.document().repository_url,
            path = %task.document().file_path,
            "skipping remote reference"
        );
        stats.skipped_remote += 1;
        return;
    }
    if let Err(err) = repository.locate(task.document_mut()) {
        debug!("leaving path as written: {err}");
    }

    match frontier.push_task(task) {
        Ok(()) => {}
        Err(FrontierError::Duplicate(_)) => stats.duplicates += 1,
        Err(err @ FrontierError::QueueFull(_)) => {
            warn!("{err}");
            stats.dropped += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestNames;
    use crate::references::ReferenceSelection;
    use std::convert::Infallible;
    use std::fs;
    use tempfile::TempDir;

    const REPO: &str = "https://github.com/acme/deploy";

    fn write(dir: &TempDir, path: &str, content: &str) {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(full, content).expect("write");
    }

    fn crawl(dir: &TempDir, controls: &IndexControls) -> (CrawlStats, Vec<IndexedDocument>) {
        let repository = LocalRepository::new(dir.path(), REPO, controls.manifest_names().clone());
        let mut out = Vec::new();
        let seeds = vec![Document::new(REPO, "")];
        let stats = run::<_, Infallible>(controls, &repository, seeds, |doc| {
            out.push(doc);
            Ok(())
        })
        .expect("crawl");
        (stats, out)
    }

    #[test]
    fn follows_references_breadth_first() {
        let dir = TempDir::new().expect("tempdir");
        write(&dir, "kustomization.yaml", "resources:\n  - base\n  - svc.yaml\n");
        write(&dir, "svc.yaml", "kind: Service\n");
        write(
            &dir,
            "base/kustomization.yaml",
            "resources:\n  - deploy.yaml\n  - ../svc.yaml\n",
        );
        write(&dir, "base/deploy.yaml", "kind: Deployment\n");

        let (stats, docs) = crawl(&dir, &IndexControls::default());
        let paths: Vec<&str> = docs.iter().map(|d| d.document.file_path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "kustomization.yaml",
                "base/kustomization.yaml",
                "svc.yaml",
                "base/deploy.yaml",
            ]
        );
        assert_eq!(stats.emitted, 4);
        assert_eq!(stats.references, 4);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(docs[3].kinds, vec!["Deployment"]);
    }

    #[test]
    fn failures_do_not_stop_the_crawl() {
        let dir = TempDir::new().expect("tempdir");
        write(
            &dir,
            "kustomization.yaml",
            "resources:\n  - broken.yaml\n  - missing.yaml\n  - github.com/acme/other/base\n",
        );
        write(&dir, "broken.yaml", "kind: [oops\n");

        let (stats, docs) = crawl(&dir, &IndexControls::default());
        assert_eq!(stats.emitted, 2);
        assert_eq!(stats.parse_failures, 1);
        assert_eq!(stats.load_failures, 1);
        assert_eq!(stats.skipped_remote, 1);
        assert!(docs[1].kinds.is_empty());
        assert_eq!(docs[1].document.file_type.map(|t| t.as_str()), Some("resource"));
    }

    #[test]
    fn depth_limit_stops_expansion() {
        let dir = TempDir::new().expect("tempdir");
        write(&dir, "kustomization.yaml", "resources:\n  - a\n");
        write(&dir, "a/kustomization.yaml", "resources:\n  - b.yaml\n");
        write(&dir, "a/b.yaml", "kind: ConfigMap\n");

        let controls =
            IndexControls::new(ManifestNames::default(), ReferenceSelection::ALL, 1, 16);
        let (stats, docs) = crawl(&dir, &controls);
        assert_eq!(stats.emitted, 2);
        assert_eq!(docs[1].document.file_path, "a/kustomization.yaml");
    }
}
