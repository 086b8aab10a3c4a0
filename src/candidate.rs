//! Candidate variants: the concrete things the resolver may select.
//!
//! A [`Candidate`] is a cheap, clonable handle. [`LinkCandidate`]s are owned
//! by the [`Factory`]'s identity cache and shared by reference counting, so
//! two handles built from the same [`Link`] point at the same object and
//! share its lazily prepared metadata.

use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use log::{debug, warn};
use pep440_rs::Version;
use pep508_rs::{ExtraName, PackageName};

use crate::error::ResolveError;
use crate::factory::Factory;
use crate::repository::PackageMetadata;
use crate::request::{InstallRequest, Link, write_extras};
use crate::requirement::Requirement;

/// Name of the synthetic interpreter candidate.
pub const REQUIRES_PYTHON_IDENTIFIER: &str = "<Python from Requires-Python>";

/// Name under which the solver tracks a candidate or requirement.
///
/// Extras are part of the identifier, so `foo[bar]` and `foo` are distinct
/// nodes in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// A project, optionally decorated with extras.
    Package {
        name: PackageName,
        extras: BTreeSet<ExtraName>,
    },
    /// The running interpreter, as constrained by `Requires-Python`.
    RequiresPython,
}

impl Identifier {
    /// Identifier of a plain project.
    pub fn package(name: PackageName) -> Self {
        Self::Package {
            name,
            extras: BTreeSet::new(),
        }
    }

    /// The project name, if this is not the interpreter.
    pub fn project_name(&self) -> Option<&PackageName> {
        match self {
            Self::Package { name, .. } => Some(name),
            Self::RequiresPython => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package { name, extras } => {
                write!(f, "{name}")?;
                write_extras(f, extras)
            }
            Self::RequiresPython => f.write_str(REQUIRES_PYTHON_IDENTIFIER),
        }
    }
}

/// Value identity of a candidate.
///
/// Link candidates are unique per key by construction; extras candidates
/// are not cached, so two of them with the same key are equal but not the
/// same object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CandidateKey {
    Link(Link),
    Extras(Link, BTreeSet<ExtraName>),
    RequiresPython,
}

/// A distribution reached through a link.
#[derive(Debug)]
pub struct LinkCandidate {
    link: Link,
    parent: InstallRequest,
    name_hint: Option<PackageName>,
    version_hint: Option<Version>,
    metadata: OnceCell<PackageMetadata>,
}

impl LinkCandidate {
    pub(crate) fn new(
        link: Link,
        parent: InstallRequest,
        name_hint: Option<PackageName>,
        version_hint: Option<Version>,
    ) -> Self {
        Self {
            link,
            parent,
            name_hint,
            version_hint,
            metadata: OnceCell::new(),
        }
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    /// The install request that first introduced this link.
    pub fn parent(&self) -> &InstallRequest {
        &self.parent
    }

    /// Whether metadata has been prepared already.
    pub fn is_prepared(&self) -> bool {
        self.metadata.get().is_some()
    }

    /// Prepare (once) and return this distribution's metadata.
    pub fn metadata(&self, factory: &Factory<'_>) -> Result<&PackageMetadata, ResolveError> {
        if let Some(meta) = self.metadata.get() {
            return Ok(meta);
        }
        debug!("preparing metadata for {}", self.link);
        let meta = factory
            .preparer()
            .prepare_metadata(&self.link, &self.parent)
            .map_err(|source| ResolveError::Metadata {
                link: self.link.clone(),
                source,
            })?;
        self.check_consistency(&meta)?;
        Ok(self.metadata.get_or_init(|| meta))
    }

    fn check_consistency(&self, meta: &PackageMetadata) -> Result<(), ResolveError> {
        if let Some(expected) = &self.name_hint {
            if *expected != meta.name {
                return Err(ResolveError::InconsistentMetadata {
                    link: self.link.clone(),
                    field: "name",
                    expected: expected.to_string(),
                    found: meta.name.to_string(),
                });
            }
        }
        if let Some(expected) = &self.version_hint {
            if *expected != meta.version {
                return Err(ResolveError::InconsistentMetadata {
                    link: self.link.clone(),
                    field: "version",
                    expected: expected.to_string(),
                    found: meta.version.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn name(&self, factory: &Factory<'_>) -> Result<PackageName, ResolveError> {
        match &self.name_hint {
            Some(name) => Ok(name.clone()),
            None => Ok(self.metadata(factory)?.name.clone()),
        }
    }

    pub fn version(&self, factory: &Factory<'_>) -> Result<Version, ResolveError> {
        match &self.version_hint {
            Some(version) => Ok(version.clone()),
            None => Ok(self.metadata(factory)?.version.clone()),
        }
    }

    /// `Requires-Dist` entries whose markers hold, plus the
    /// `Requires-Python` requirement, if any.
    pub fn dependencies(&self, factory: &Factory<'_>) -> Result<Vec<Requirement>, ResolveError> {
        let meta = self.metadata(factory)?;
        let mut deps = Vec::with_capacity(meta.requires_dist.len() + 1);
        for spec in &meta.requires_dist {
            if let Some(requirement) = factory.make_dependency(spec, &self.parent, &[])? {
                deps.push(requirement);
            }
        }
        if let Some(python) = factory.make_requires_python_requirement(meta.requires_python.as_ref())
        {
            deps.push(python);
        }
        Ok(deps)
    }
}

impl fmt::Display for LinkCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name_hint {
            Some(name) => write!(f, "{name} @ {}", self.link),
            None => write!(f, "{}", self.link),
        }
    }
}

/// A link candidate with extras requested on top of it.
#[derive(Debug)]
pub struct ExtrasCandidate {
    base: Rc<LinkCandidate>,
    extras: BTreeSet<ExtraName>,
}

impl ExtrasCandidate {
    pub(crate) fn new(base: Rc<LinkCandidate>, extras: BTreeSet<ExtraName>) -> Self {
        Self { base, extras }
    }

    pub fn base(&self) -> &Rc<LinkCandidate> {
        &self.base
    }

    pub fn extras(&self) -> &BTreeSet<ExtraName> {
        &self.extras
    }

    /// The base's dependencies followed by those of each requested extra.
    ///
    /// `Requires-Dist` entries guarded by an `extra == ...` marker are
    /// evaluated with this candidate's extras. Extras the distribution does
    /// not declare are skipped.
    pub fn dependencies(&self, factory: &Factory<'_>) -> Result<Vec<Requirement>, ResolveError> {
        let mut deps = self.base.dependencies(factory)?;
        let meta = self.base.metadata(factory)?;
        let extras: Vec<ExtraName> = self.extras.iter().cloned().collect();
        for spec in &meta.requires_dist {
            if let Some(requirement) = factory.make_dependency(spec, self.base.parent(), &extras)? {
                if !deps.contains(&requirement) {
                    deps.push(requirement);
                }
            }
        }
        for extra in &self.extras {
            let Some(specs) = meta.extras.get(extra) else {
                warn!(
                    "{} {} does not provide the extra '{}'",
                    meta.name, meta.version, extra
                );
                continue;
            };
            for spec in specs {
                let Some(requirement) = factory.make_dependency(spec, self.base.parent(), &extras)?
                else {
                    continue;
                };
                if !deps.contains(&requirement) {
                    deps.push(requirement);
                }
            }
        }
        Ok(deps)
    }
}

impl fmt::Display for ExtrasCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base.name_hint {
            Some(name) => {
                write!(f, "{name}")?;
                write_extras(f, &self.extras)?;
                write!(f, " @ {}", self.base.link)
            }
            None => {
                write!(f, "{}", self.base.link)?;
                write_extras(f, &self.extras)
            }
        }
    }
}

/// The running interpreter. One per factory.
#[derive(Debug)]
pub struct RequiresPythonCandidate {
    version: Version,
}

impl RequiresPythonCandidate {
    pub(crate) fn new(version: Version) -> Self {
        Self { version }
    }

    pub fn version(&self) -> &Version {
        &self.version
    }
}

/// Handle to a candidate.
///
/// `==` compares [`CandidateKey`]s; use [`Candidate::is_same`] for object
/// identity.
#[derive(Debug, Clone)]
pub enum Candidate {
    Link(Rc<LinkCandidate>),
    Extras(Rc<ExtrasCandidate>),
    RequiresPython(Rc<RequiresPythonCandidate>),
}

impl Candidate {
    pub fn key(&self) -> CandidateKey {
        match self {
            Self::Link(c) => CandidateKey::Link(c.link.clone()),
            Self::Extras(c) => CandidateKey::Extras(c.base.link.clone(), c.extras.clone()),
            Self::RequiresPython(_) => CandidateKey::RequiresPython,
        }
    }

    /// Whether both handles point at the same object.
    pub fn is_same(&self, other: &Candidate) -> bool {
        match (self, other) {
            (Self::Link(a), Self::Link(b)) => Rc::ptr_eq(a, b),
            (Self::Extras(a), Self::Extras(b)) => Rc::ptr_eq(a, b),
            (Self::RequiresPython(a), Self::RequiresPython(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The artifact behind this candidate, if any.
    pub fn link(&self) -> Option<&Link> {
        match self {
            Self::Link(c) => Some(&c.link),
            Self::Extras(c) => Some(&c.base.link),
            Self::RequiresPython(_) => None,
        }
    }

    /// Project name. An extras candidate reports its base's name.
    pub fn name(&self, factory: &Factory<'_>) -> Result<Identifier, ResolveError> {
        match self {
            Self::Link(c) => Ok(Identifier::package(c.name(factory)?)),
            Self::Extras(c) => Ok(Identifier::package(c.base.name(factory)?)),
            Self::RequiresPython(_) => Ok(Identifier::RequiresPython),
        }
    }

    /// Name including extras, as tracked by the solver.
    pub fn identifier(&self, factory: &Factory<'_>) -> Result<Identifier, ResolveError> {
        match self {
            Self::Extras(c) => Ok(Identifier::Package {
                name: c.base.name(factory)?,
                extras: c.extras.clone(),
            }),
            _ => self.name(factory),
        }
    }

    pub fn version(&self, factory: &Factory<'_>) -> Result<Version, ResolveError> {
        match self {
            Self::Link(c) => c.version(factory),
            Self::Extras(c) => c.base.version(factory),
            Self::RequiresPython(c) => Ok(c.version.clone()),
        }
    }

    pub fn dependencies(&self, factory: &Factory<'_>) -> Result<Vec<Requirement>, ResolveError> {
        match self {
            Self::Link(c) => c.dependencies(factory),
            Self::Extras(c) => c.dependencies(factory),
            Self::RequiresPython(_) => Ok(Vec::new()),
        }
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Candidate {}

impl Hash for Candidate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(c) => write!(f, "{c}"),
            Self::Extras(c) => write!(f, "{c}"),
            Self::RequiresPython(c) => write!(f, "Python {}", c.version),
        }
    }
}
