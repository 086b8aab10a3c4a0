//! Install requests and the links they may pin.
//!
//! An [`InstallRequest`] is the normalized form of one line a user (or a
//! package's `Requires-Dist` metadata) asked for. It names a project, or pins
//! an exact artifact through a [`Link`], or both. [`RequestConstructor`] is
//! the collaborator that turns raw requirement strings into requests.

use std::collections::BTreeSet;
use std::fmt;

use pep440_rs::VersionSpecifiers;
use pep508_rs::{ExtraName, MarkerTree, PackageName, VersionOrUrl};

use crate::error::ResolveError;

/// Locator for one distributable artifact (a URL or a local path).
///
/// Links compare and hash by their exact text; they are the key of the
/// factory's identity cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Link(String);

impl Link {
    /// Wrap a URL or path.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The full URL or path.
    pub fn url(&self) -> &str {
        &self.0
    }

    /// Last path segment, without query or fragment.
    pub fn filename(&self) -> &str {
        let path = self.0.split(['#', '?']).next().unwrap_or(&self.0);
        let path = path.trim_end_matches('/');
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Whether the link points at the local filesystem.
    pub fn is_file(&self) -> bool {
        self.0.starts_with("file:") || !self.0.contains("://")
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an install request points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RequestTarget {
    /// A project to look up on the index.
    Project(PackageName),
    /// One exact artifact, with the project name expected there if known.
    Artifact {
        name: Option<PackageName>,
        link: Link,
    },
}

/// A concrete request to install something.
///
/// Every request carries a project name, a link, or both. Requests built
/// from a bare link (for example a local wheel path) may not know their
/// name until the link's metadata has been prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    target: RequestTarget,
    extras: BTreeSet<ExtraName>,
    specifier: VersionSpecifiers,
    marker: MarkerTree,
    comes_from: Option<String>,
    user_supplied: bool,
}

impl InstallRequest {
    fn with_target(target: RequestTarget, specifier: VersionSpecifiers) -> Self {
        Self {
            target,
            extras: BTreeSet::new(),
            specifier,
            marker: MarkerTree::TRUE,
            comes_from: None,
            user_supplied: false,
        }
    }

    /// Request `name` constrained by `specifier`.
    pub fn named(name: PackageName, specifier: VersionSpecifiers) -> Self {
        Self::with_target(RequestTarget::Project(name), specifier)
    }

    /// Request the exact artifact behind `link`.
    pub fn from_link(link: Link, name: Option<PackageName>) -> Self {
        Self::with_target(RequestTarget::Artifact { name, link }, any_version())
    }

    /// Parse a user-supplied PEP 508 requirement such as `foo[bar]>=1.0`,
    /// `foo @ https://example.org/foo-1.0.tar.gz` or
    /// `foo; python_version < "3.10"`.
    ///
    /// The environment marker is kept on the request; the factory decides
    /// whether it applies.
    pub fn parse(spec: &str) -> Result<Self, ResolveError> {
        let mut request = Self::from_pep508(spec, None)?;
        request.user_supplied = true;
        Ok(request)
    }

    fn from_pep508(spec: &str, comes_from: Option<String>) -> Result<Self, ResolveError> {
        let requirement = spec
            .parse::<pep508_rs::Requirement>()
            .map_err(|err| ResolveError::InvalidRequirement {
                spec: spec.to_string(),
                origin: comes_from
                    .clone()
                    .unwrap_or_else(|| "user request".to_string()),
                message: err.to_string(),
            })?;

        let name = requirement.name;
        let (target, specifier) = match requirement.version_or_url {
            None => (RequestTarget::Project(name), any_version()),
            Some(VersionOrUrl::VersionSpecifier(specifier)) => {
                (RequestTarget::Project(name), specifier)
            }
            Some(VersionOrUrl::Url(url)) => (
                RequestTarget::Artifact {
                    name: Some(name),
                    link: Link::new(url.to_string()),
                },
                any_version(),
            ),
        };

        Ok(Self {
            target,
            extras: requirement.extras.into_iter().collect(),
            specifier,
            marker: requirement.marker,
            comes_from,
            user_supplied: false,
        })
    }

    /// Add requested extras.
    pub fn with_extras(mut self, extras: impl IntoIterator<Item = ExtraName>) -> Self {
        self.extras.extend(extras);
        self
    }

    /// Record where this request was declared.
    pub fn with_comes_from(mut self, origin: impl Into<String>) -> Self {
        self.comes_from = Some(origin.into());
        self
    }

    /// Only apply the request where `marker` holds.
    pub fn with_marker(mut self, marker: MarkerTree) -> Self {
        self.marker = marker;
        self
    }

    /// Mark the request as coming straight from the user.
    pub fn with_user_supplied(mut self, user_supplied: bool) -> Self {
        self.user_supplied = user_supplied;
        self
    }

    pub fn name(&self) -> Option<&PackageName> {
        match &self.target {
            RequestTarget::Project(name) => Some(name),
            RequestTarget::Artifact { name, .. } => name.as_ref(),
        }
    }

    pub fn extras(&self) -> &BTreeSet<ExtraName> {
        &self.extras
    }

    pub fn specifier(&self) -> &VersionSpecifiers {
        &self.specifier
    }

    /// The pinned artifact, if the request names one.
    pub fn link(&self) -> Option<&Link> {
        match &self.target {
            RequestTarget::Project(_) => None,
            RequestTarget::Artifact { link, .. } => Some(link),
        }
    }

    pub(crate) fn target(&self) -> &RequestTarget {
        &self.target
    }

    /// Environment marker guarding the request; always true when none was given.
    pub fn marker(&self) -> &MarkerTree {
        &self.marker
    }

    pub fn comes_from(&self) -> Option<&str> {
        self.comes_from.as_deref()
    }

    pub fn is_user_supplied(&self) -> bool {
        self.user_supplied
    }

    /// Same request with the version constraint removed.
    pub(crate) fn without_specifier(&self) -> Self {
        Self {
            specifier: any_version(),
            ..self.clone()
        }
    }
}

impl fmt::Display for InstallRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            RequestTarget::Project(name) => {
                write!(f, "{name}")?;
                write_extras(f, &self.extras)?;
                write!(f, "{}", self.specifier)
            }
            RequestTarget::Artifact {
                name: Some(name),
                link,
            } => {
                write!(f, "{name}")?;
                write_extras(f, &self.extras)?;
                write!(f, " @ {link}")
            }
            RequestTarget::Artifact { name: None, link } => write!(f, "{link}"),
        }
    }
}

/// Write `[a,b]` for a non-empty extras set.
pub(crate) fn write_extras(
    f: &mut fmt::Formatter<'_>,
    extras: &BTreeSet<ExtraName>,
) -> fmt::Result {
    if extras.is_empty() {
        return Ok(());
    }
    write!(f, "[")?;
    for (i, extra) in extras.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{extra}")?;
    }
    write!(f, "]")
}

/// The specifier set that admits every version.
pub(crate) fn any_version() -> VersionSpecifiers {
    std::iter::empty().collect()
}

/// Builds install requests from raw requirement strings.
///
/// The factory calls this when a candidate's declared dependencies have to be
/// turned into further requirements.
pub trait RequestConstructor {
    /// Parse `spec`, attributing it to `comes_from`.
    fn make_install_req(
        &self,
        spec: &str,
        comes_from: &InstallRequest,
    ) -> Result<InstallRequest, ResolveError>;
}

/// [`RequestConstructor`] for PEP 508 requirement strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pep508RequestConstructor;

impl RequestConstructor for Pep508RequestConstructor {
    fn make_install_req(
        &self,
        spec: &str,
        comes_from: &InstallRequest,
    ) -> Result<InstallRequest, ResolveError> {
        InstallRequest::from_pep508(spec, Some(comes_from.to_string()))
    }
}
