//! PEP 440 specifier matching.
//!
//! Satisfaction checks accept pre-releases unconditionally. Pre-release
//! exclusion only applies when the index is searched, following the usual
//! installer rule: pre-releases are skipped unless allowed, unless the
//! specifier itself names one, or unless nothing else matches.

use pep440_rs::{Version, VersionSpecifiers};

/// Test whether `candidate` lies inside `specifier`.
///
/// An empty specifier set matches every version.
pub fn version_matches(candidate: &Version, specifier: &VersionSpecifiers) -> bool {
    specifier.contains(candidate)
}

/// Whether any clause of `specifier` is written against a pre-release.
pub fn mentions_prerelease(specifier: &VersionSpecifiers) -> bool {
    specifier
        .iter()
        .any(|clause| clause.version().any_prerelease())
}

/// Keep the items whose version matches `specifier`, applying the
/// pre-release policy. Relative order is preserved.
pub fn filter_versions<T>(
    items: Vec<T>,
    version_of: impl Fn(&T) -> &Version,
    specifier: &VersionSpecifiers,
    allow_prereleases: bool,
) -> Vec<T> {
    let matching: Vec<T> = items
        .into_iter()
        .filter(|item| version_matches(version_of(item), specifier))
        .collect();

    if allow_prereleases || mentions_prerelease(specifier) {
        return matching;
    }

    let has_final = matching
        .iter()
        .any(|item| !version_of(item).any_prerelease());
    if !has_final {
        return matching;
    }
    matching
        .into_iter()
        .filter(|item| !version_of(item).any_prerelease())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn v(s: &str) -> Version {
        Version::from_str(s).unwrap()
    }

    fn spec(s: &str) -> VersionSpecifiers {
        VersionSpecifiers::from_str(s).unwrap()
    }

    #[test]
    fn range_matches_inside() {
        assert!(version_matches(&v("1.5"), &spec(">=1.0,<2.0")));
    }

    #[test]
    fn range_excludes_upper_bound() {
        assert!(!version_matches(&v("2.0"), &spec(">=1.0,<2.0")));
    }

    #[test]
    fn empty_specifier_matches_everything() {
        assert!(version_matches(&v("0.0.1"), &spec("")));
    }

    #[test]
    fn compatible_release() {
        assert!(version_matches(&v("1.4.9"), &spec("~=1.4.2")));
        assert!(!version_matches(&v("1.5.0"), &spec("~=1.4.2")));
    }

    #[test]
    fn wildcard_equality() {
        assert!(version_matches(&v("3.9.7"), &spec("==3.9.*")));
        assert!(!version_matches(&v("3.10.0"), &spec("==3.9.*")));
    }

    #[test]
    fn prerelease_mentioned() {
        assert!(mentions_prerelease(&spec(">=2.0b1")));
        assert!(!mentions_prerelease(&spec(">=2.0")));
    }

    #[test]
    fn filter_drops_prereleases_when_finals_match() {
        let versions = vec![v("1.0"), v("2.0rc1"), v("1.1")];
        let kept = filter_versions(versions, |x| x, &spec(">=1.0"), false);
        assert_eq!(kept, vec![v("1.0"), v("1.1")]);
    }

    #[test]
    fn filter_keeps_prereleases_when_allowed() {
        let versions = vec![v("1.0"), v("2.0rc1")];
        let kept = filter_versions(versions, |x| x, &spec(">=1.0"), true);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn filter_falls_back_to_prereleases() {
        let versions = vec![v("1.0"), v("2.0rc1")];
        let kept = filter_versions(versions, |x| x, &spec(">=2.0.dev0"), false);
        assert_eq!(kept, vec![v("2.0rc1")]);

        let versions = vec![v("2.0rc1"), v("2.0rc2")];
        let kept = filter_versions(versions, |x| x, &spec(""), false);
        assert_eq!(kept.len(), 2);
    }
}
