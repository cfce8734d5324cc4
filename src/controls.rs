//! Crawl and indexing controls shared by the library and the CLI.

use crate::document::Document;
use crate::frontier::DEFAULT_FRONTIER_CAPACITY;
use crate::manifest::{ManifestNames, DEFAULT_MANIFEST_NAMES};
use crate::references::ReferenceSelection;
use clap::Parser;
use std::path::PathBuf;

/// Default limit on how many reference hops the crawler follows from a seed.
pub const DEFAULT_MAX_DEPTH: u8 = 8;

/// Tunable knobs that bound indexing behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexControls {
    manifest_names: ManifestNames,
    selection: ReferenceSelection,
    max_depth: u8,
    frontier_capacity: usize,
}

impl IndexControls {
    /// Constructs a new set of controls.
    pub fn new(
        manifest_names: ManifestNames,
        selection: ReferenceSelection,
        max_depth: u8,
        frontier_capacity: usize,
    ) -> Self {
        Self {
            manifest_names,
            selection,
            max_depth,
            frontier_capacity,
        }
    }

    /// File names treated as composition manifests.
    pub fn manifest_names(&self) -> &ManifestNames {
        &self.manifest_names
    }

    /// Reference lists the crawler follows.
    pub fn selection(&self) -> ReferenceSelection {
        self.selection
    }

    /// Maximum reference depth followed from a seed.
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Maximum number of documents waiting in the frontier.
    pub fn frontier_capacity(&self) -> usize {
        self.frontier_capacity
    }
}

impl Default for IndexControls {
    fn default() -> Self {
        Self {
            manifest_names: ManifestNames::default(),
            selection: ReferenceSelection::ALL,
            max_depth: DEFAULT_MAX_DEPTH,
            frontier_capacity: DEFAULT_FRONTIER_CAPACITY,
        }
    }
}

/// Command-line interface for the `kustcrawl` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "kustcrawl",
    about = "Flatten kustomizations and the files they reference into search index records"
)]
pub struct Cli {
    /// Local checkout of the repository to crawl
    pub root: PathBuf,

    /// Seed paths relative to the root (defaults to the root directory's kustomization)
    pub seeds: Vec<String>,

    /// Repository URL recorded on every document
    #[arg(long, env = "KUSTCRAWL_REPOSITORY_URL", default_value = "")]
    pub repository_url: String,

    /// Branch recorded on every document
    #[arg(long, env = "KUSTCRAWL_BRANCH", default_value = "")]
    pub branch: String,

    /// Manifest file names, comma separated
    #[arg(
        long,
        env = "KUSTCRAWL_MANIFEST_NAMES",
        default_value_t = DEFAULT_MANIFEST_NAMES.join(",")
    )]
    pub manifest_names: String,

    /// Do not follow `resources` (or `bases`) references
    #[arg(long, env = "KUSTCRAWL_SKIP_RESOURCES")]
    pub skip_resources: bool,

    /// Do not follow `generators` references
    #[arg(long, env = "KUSTCRAWL_SKIP_GENERATORS")]
    pub skip_generators: bool,

    /// Do not follow `transformers` references
    #[arg(long, env = "KUSTCRAWL_SKIP_TRANSFORMERS")]
    pub skip_transformers: bool,

    /// Maximum reference depth followed from a seed
    #[arg(long, env = "KUSTCRAWL_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: u8,

    /// Maximum documents queued at once
    #[arg(
        long,
        env = "KUSTCRAWL_FRONTIER_CAPACITY",
        default_value_t = DEFAULT_FRONTIER_CAPACITY
    )]
    pub frontier_capacity: usize,

    /// Write JSON lines here instead of stdout
    #[arg(long, short, env = "KUSTCRAWL_OUTPUT")]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Converts the parsed CLI into `IndexControls`.
    pub fn build_controls(&self) -> IndexControls {
        IndexControls::new(
            ManifestNames::new(self.names_vec()),
            ReferenceSelection::new(
                !self.skip_resources,
                !self.skip_generators,
                !self.skip_transformers,
            ),
            self.max_depth,
            self.frontier_capacity.max(1),
        )
    }

    /// Seed documents for the crawl.
    pub fn seed_documents(&self) -> Vec<Document> {
        let seeds = if self.seeds.is_empty() {
            vec![String::new()]
        } else {
            self.seeds.clone()
        };
        seeds
            .into_iter()
            .map(|path| {
                let path = path.trim().trim_start_matches("./").to_string();
                Document::new(self.repository_url.clone(), path).with_branch(self.branch.clone())
            })
            .collect()
    }

    fn names_vec(&self) -> Vec<String> {
        self.manifest_names
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_control_defaults() {
        let cli = Cli::try_parse_from(["kustcrawl", "/repo"]).expect("parse");
        assert_eq!(cli.build_controls(), IndexControls::default());
        let seeds = cli.seed_documents();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].file_path, "");
    }

    #[test]
    fn cli_flags_shape_controls() {
        let cli = Cli::try_parse_from([
            "kustcrawl",
            "/repo",
            "./apps/kustomization.yaml",
            "--manifest-names",
            "bundle.yaml, ",
            "--skip-generators",
            "--max-depth",
            "2",
            "--repository-url",
            "https://github.com/acme/deploy",
        ])
        .expect("parse");
        let controls = cli.build_controls();
        assert_eq!(controls.manifest_names().names(), ["bundle.yaml".to_string()]);
        assert_eq!(controls.selection(), ReferenceSelection::new(true, false, true));
        assert_eq!(controls.max_depth(), 2);

        let seeds = cli.seed_documents();
        assert_eq!(seeds[0].file_path, "apps/kustomization.yaml");
        assert_eq!(seeds[0].repository_url, "https://github.com/acme/deploy");
    }
}
