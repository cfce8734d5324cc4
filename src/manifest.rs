//! Recognition of composition manifests by file name.

/// File names kustomize accepts for a kustomization manifest.
pub const DEFAULT_MANIFEST_NAMES: [&str; 3] =
    ["kustomization.yaml", "kustomization.yml", "Kustomization"];

/// Set of base names that mark a file as a composition manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestNames {
    names: Vec<String>,
}

impl ManifestNames {
    /// Builds a recognizer from the provided base names, dropping blanks and repeats.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into().trim().to_string();
            if !name.is_empty() && !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self { names: unique }
    }

    /// Recognized base names, in lookup priority order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Determines whether the base name of `path` is a recognized manifest name.
    pub fn is_manifest(&self, path: &str) -> bool {
        let base = base_name(path);
        self.names.iter().any(|name| name == base)
    }
}

impl Default for ManifestNames {
    fn default() -> Self {
        Self::new(DEFAULT_MANIFEST_NAMES)
    }
}

/// Determines whether `path` names a kustomization file, using the default name set.
pub fn is_manifest(path: &str) -> bool {
    DEFAULT_MANIFEST_NAMES.contains(&base_name(path))
}

fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_base_name_only() {
        assert!(is_manifest("kustomization.yaml"));
        assert!(is_manifest("overlays/prod/kustomization.yml"));
        assert!(is_manifest("base/Kustomization"));
        assert!(!is_manifest("base/kustomization.yaml.bak"));
        assert!(!is_manifest("kustomization.yaml/deployment.yaml"));
        assert!(!is_manifest("base/my-kustomization.yaml"));
        assert!(!is_manifest(""));
    }

    #[test]
    fn custom_names_replace_defaults() {
        let names = ManifestNames::new(["bundle.yaml", " ", "bundle.yaml"]);
        assert_eq!(names.names(), ["bundle.yaml".to_string()]);
        assert!(names.is_manifest("apps/bundle.yaml"));
        assert!(!names.is_manifest("apps/kustomization.yaml"));
    }
}
