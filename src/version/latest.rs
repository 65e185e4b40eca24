//! Latest version selection for registries that return a version listing

use semver::Version;

use crate::config::LatestVersionPolicy;

/// Find the semantically maximum version from a list
///
/// Handles both `v`-prefixed (e.g., "v1.0.0") and non-prefixed versions.
/// Invalid versions are skipped.
pub fn find_semantic_max(versions: &[String]) -> Option<String> {
    versions
        .iter()
        .filter_map(|v| {
            let v_stripped = v.strip_prefix('v').unwrap_or(v);
            Version::parse(v_stripped).ok().map(|parsed| (v, parsed))
        })
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(original, _)| original.clone())
}

impl LatestVersionPolicy {
    /// Pick the latest version from a registry listing
    ///
    /// Returns None only for an empty listing.
    pub fn select(&self, versions: &[String]) -> Option<String> {
        match self {
            LatestVersionPolicy::SemanticMax => {
                find_semantic_max(versions).or_else(|| versions.last().cloned())
            }
            LatestVersionPolicy::PublishOrder => versions.last().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strings(versions: &[&str]) -> Vec<String> {
        versions.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(vec![], None)]
    #[case(vec!["v1.0.0", "v2.0.0", "v1.5.0"], Some("v2.0.0"))]
    #[case(vec!["1.0.0", "2.0.0", "1.5.0"], Some("2.0.0"))]
    #[case(vec!["v1.0.0", "2.0.0", "v1.5.0"], Some("2.0.0"))]
    #[case(vec!["invalid", "v1.0.0", "not-semver"], Some("v1.0.0"))]
    #[case(vec!["invalid", "not-semver"], None)]
    fn find_semantic_max_returns_expected(
        #[case] versions: Vec<&str>,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            find_semantic_max(&strings(&versions)),
            expected.map(|s| s.to_string())
        );
    }

    #[rstest]
    #[case(LatestVersionPolicy::SemanticMax, vec!["2.0.0", "10.0.0", "3.1.0"], Some("10.0.0"))]
    #[case(LatestVersionPolicy::SemanticMax, vec!["beta", "alpha"], Some("alpha"))]
    #[case(LatestVersionPolicy::SemanticMax, vec![], None)]
    #[case(LatestVersionPolicy::PublishOrder, vec!["2.0.0", "10.0.0", "3.1.0"], Some("3.1.0"))]
    #[case(LatestVersionPolicy::PublishOrder, vec![], None)]
    fn select_applies_policy(
        #[case] policy: LatestVersionPolicy,
        #[case] versions: Vec<&str>,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            policy.select(&strings(&versions)),
            expected.map(|s| s.to_string())
        );
    }
}
