//! Construction and memoization of candidates and requirements.
//!
//! One [`Factory`] lives for one resolution run. It owns the identity cache
//! that maps each [`Link`] to a single [`LinkCandidate`], and threads the
//! collaborators (index, metadata pipeline, request constructor) and the
//! interpreter policy into everything it builds.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use log::{debug, trace, warn};
use pep440_rs::{Version, VersionSpecifiers};
use pep508_rs::{ExtraName, MarkerEnvironment, MarkerEnvironmentBuilder, PackageName};

use crate::candidate::{
    Candidate, ExtrasCandidate, Identifier, LinkCandidate, RequiresPythonCandidate,
};
use crate::error::ResolveError;
use crate::repository::{MetadataPreparer, PackageFinder};
use crate::request::{InstallRequest, Link, RequestConstructor, RequestTarget};
use crate::requirement::{
    ExplicitRequirement, NoMatchRequirement, Requirement, SpecifierRequirement,
};
use crate::version_match::{filter_versions, version_matches};

/// Per-run policy, fixed when the factory is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryOptions {
    /// Version of the interpreter packages will be installed into.
    pub python_version: Version,
    /// Skip `Requires-Python` checks entirely.
    pub ignore_requires_python: bool,
    /// Consider pre-releases when searching the index.
    pub allow_prereleases: bool,
    /// Environment that markers are evaluated against. When unset, one is
    /// derived from `python_version` and the host platform.
    pub marker_environment: Option<MarkerEnvironment>,
}

impl FactoryOptions {
    /// Options for the given interpreter version, all checks enabled.
    pub fn new(python_version: Version) -> Self {
        Self {
            python_version,
            ignore_requires_python: false,
            allow_prereleases: false,
            marker_environment: None,
        }
    }

    /// Options from an interpreter version tuple such as `[3, 11, 4, 0]`.
    ///
    /// Only the first three components are kept.
    pub fn from_version_info(info: &[u64]) -> Self {
        Self::new(Version::new(info.iter().take(3)))
    }

    pub fn with_ignore_requires_python(mut self, ignore: bool) -> Self {
        self.ignore_requires_python = ignore;
        self
    }

    pub fn with_allow_prereleases(mut self, allow: bool) -> Self {
        self.allow_prereleases = allow;
        self
    }

    pub fn with_marker_environment(mut self, environment: MarkerEnvironment) -> Self {
        self.marker_environment = Some(environment);
        self
    }
}

/// CPython on the host platform at `python_version`.
fn interpreter_environment(python_version: &Version) -> Option<MarkerEnvironment> {
    let full = python_version.to_string();
    let short = python_version
        .release()
        .iter()
        .take(2)
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".");
    let (os_name, sys_platform, platform_system) = match std::env::consts::OS {
        "windows" => ("nt", "win32", "Windows"),
        "macos" => ("posix", "darwin", "Darwin"),
        "linux" => ("posix", "linux", "Linux"),
        other => ("posix", other, other),
    };
    let builder = MarkerEnvironmentBuilder {
        implementation_name: "cpython",
        implementation_version: &full,
        os_name,
        platform_machine: std::env::consts::ARCH,
        platform_python_implementation: "CPython",
        platform_release: "",
        platform_system,
        platform_version: "",
        python_full_version: &full,
        python_version: &short,
        sys_platform,
    };
    match MarkerEnvironment::try_from(builder) {
        Ok(environment) => Some(environment),
        Err(err) => {
            warn!("cannot evaluate markers for Python {full}: {err}");
            None
        }
    }
}

/// Builds and caches the candidates and requirements of one resolution.
///
/// The factory is single-threaded. Its cache only ever grows: once a link
/// has produced a [`LinkCandidate`], every later request for that link gets
/// the same object back, whichever install request asks for it.
pub struct Factory<'a> {
    finder: &'a dyn PackageFinder,
    preparer: &'a dyn MetadataPreparer,
    make_install_req: &'a dyn RequestConstructor,
    python_candidate: Candidate,
    ignore_requires_python: bool,
    allow_prereleases: bool,
    marker_environment: Option<MarkerEnvironment>,
    candidate_cache: RefCell<HashMap<Link, Rc<LinkCandidate>>>,
}

impl<'a> Factory<'a> {
    pub fn new(
        finder: &'a dyn PackageFinder,
        preparer: &'a dyn MetadataPreparer,
        make_install_req: &'a dyn RequestConstructor,
        options: FactoryOptions,
    ) -> Self {
        let marker_environment = options
            .marker_environment
            .or_else(|| interpreter_environment(&options.python_version));
        Self {
            finder,
            preparer,
            make_install_req,
            python_candidate: Candidate::RequiresPython(Rc::new(RequiresPythonCandidate::new(
                options.python_version,
            ))),
            ignore_requires_python: options.ignore_requires_python,
            allow_prereleases: options.allow_prereleases,
            marker_environment,
            candidate_cache: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn preparer(&self) -> &'a dyn MetadataPreparer {
        self.preparer
    }

    /// The interpreter candidate of this run.
    pub fn python_candidate(&self) -> &Candidate {
        &self.python_candidate
    }

    /// Environment markers are evaluated against, if one could be built.
    pub fn marker_environment(&self) -> Option<&MarkerEnvironment> {
        self.marker_environment.as_ref()
    }

    /// Whether `request`'s marker holds for this interpreter with `extras`
    /// requested. Without an environment every marker holds.
    pub fn marker_applies(&self, request: &InstallRequest, extras: &[ExtraName]) -> bool {
        match &self.marker_environment {
            Some(environment) => request.marker().evaluate(environment, extras),
            None => true,
        }
    }

    /// Number of distinct links seen so far.
    pub fn cached_candidate_count(&self) -> usize {
        self.candidate_cache.borrow().len()
    }

    /// Return the cached candidate for `link`, creating it on first use.
    fn link_candidate(
        &self,
        link: &Link,
        parent: &InstallRequest,
        name_hint: Option<&PackageName>,
        version_hint: Option<&Version>,
    ) -> Rc<LinkCandidate> {
        let mut cache = self.candidate_cache.borrow_mut();
        let candidate = cache.entry(link.clone()).or_insert_with(|| {
            debug!("new candidate for {link} (from {parent})");
            Rc::new(LinkCandidate::new(
                link.clone(),
                parent.clone(),
                name_hint.cloned(),
                version_hint.cloned(),
            ))
        });
        Rc::clone(candidate)
    }

    fn decorate(base: Rc<LinkCandidate>, extras: &BTreeSet<ExtraName>) -> Candidate {
        if extras.is_empty() {
            Candidate::Link(base)
        } else {
            Candidate::Extras(Rc::new(ExtrasCandidate::new(base, extras.clone())))
        }
    }

    /// Candidate for `link`, decorated with `extras` when non-empty.
    ///
    /// The underlying [`LinkCandidate`] is shared per link. Extras
    /// candidates are not cached: each call returns a new one.
    pub fn make_candidate(
        &self,
        link: &Link,
        extras: &BTreeSet<ExtraName>,
        parent: &InstallRequest,
    ) -> Candidate {
        let base = self.link_candidate(link, parent, None, None);
        Self::decorate(base, extras)
    }

    /// Candidates the index offers for `request`, in index order, filtered
    /// by its specifier and the pre-release policy.
    ///
    /// Requests without a name yield nothing.
    pub fn iter_found_candidates(
        &self,
        request: &InstallRequest,
        extras: &BTreeSet<ExtraName>,
    ) -> Vec<Candidate> {
        let Some(name) = request.name() else {
            return Vec::new();
        };
        let found = filter_versions(
            self.finder.find_all_candidates(name),
            |found| &found.version,
            request.specifier(),
            self.allow_prereleases,
        );
        trace!("index offers {} candidates for {request}", found.len());
        found
            .into_iter()
            .map(|found| {
                let base = self.link_candidate(
                    &found.link,
                    request,
                    Some(&found.name),
                    Some(&found.version),
                );
                Self::decorate(base, extras)
            })
            .collect()
    }

    /// Requirement represented by a concrete install request.
    ///
    /// A request pinning a link becomes an [`ExplicitRequirement`] on that
    /// link's candidate (extras are not applied); anything else is left to
    /// the solver as a [`SpecifierRequirement`].
    pub fn make_requirement_from_install_req(&self, request: &InstallRequest) -> Requirement {
        match request.target() {
            RequestTarget::Artifact { name, link } => {
                // A request pinning a link declares the name it expects to find there.
                let base = self.link_candidate(link, request, name.as_ref(), None);
                Requirement::Explicit(ExplicitRequirement::new(Candidate::Link(base)))
            }
            RequestTarget::Project(name) => {
                Requirement::Specifier(SpecifierRequirement::new(name.clone(), request.clone()))
            }
        }
    }

    /// Parse `specifier` as declared by `comes_from` and build its requirement.
    pub fn make_requirement_from_spec(
        &self,
        specifier: &str,
        comes_from: &InstallRequest,
    ) -> Result<Requirement, ResolveError> {
        let request = self.make_install_req.make_install_req(specifier, comes_from)?;
        trace!("{comes_from} requires {request}");
        Ok(self.make_requirement_from_install_req(&request))
    }

    /// Requirement for one declared dependency of `comes_from`, evaluated
    /// with `extras` requested.
    ///
    /// Returns `None` when the dependency's marker excludes this environment.
    pub fn make_dependency(
        &self,
        specifier: &str,
        comes_from: &InstallRequest,
        extras: &[ExtraName],
    ) -> Result<Option<Requirement>, ResolveError> {
        let request = self.make_install_req.make_install_req(specifier, comes_from)?;
        if !self.marker_applies(&request, extras) {
            trace!("{comes_from}: skipping {specifier}, marker does not match");
            return Ok(None);
        }
        trace!("{comes_from} requires {request}");
        Ok(Some(self.make_requirement_from_install_req(&request)))
    }

    /// Requirement that pins `candidate` exactly.
    pub fn make_requirement_from_candidate(&self, candidate: Candidate) -> Requirement {
        Requirement::Explicit(ExplicitRequirement::new(candidate))
    }

    /// Turn a `Requires-Python` declaration into a graph node.
    ///
    /// Returns `None` when the check is disabled or nothing was declared, an
    /// explicit requirement on the interpreter candidate when its version
    /// matches, and a [`NoMatchRequirement`] otherwise.
    pub fn make_requires_python_requirement(
        &self,
        specifier: Option<&VersionSpecifiers>,
    ) -> Option<Requirement> {
        if self.ignore_requires_python {
            return None;
        }
        let specifier = specifier?;
        let python = self.python_candidate.clone();
        let matches = match &python {
            Candidate::RequiresPython(c) => version_matches(c.version(), specifier),
            _ => false,
        };
        if matches {
            Some(Requirement::Explicit(ExplicitRequirement::new(python)))
        } else {
            debug!("Requires-Python {specifier} excludes the running interpreter");
            Some(Requirement::NoMatch(NoMatchRequirement::new(
                Identifier::RequiresPython,
            )))
        }
    }
}
