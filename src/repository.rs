//! Package index and metadata collaborators.
//!
//! [`PackageFinder`] locates the artifacts published for a project and
//! [`MetadataPreparer`] turns one artifact into [`PackageMetadata`].
//! [`InMemoryRepository`] implements both for tests.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

use pep440_rs::{Version, VersionSpecifiers};
use pep508_rs::{ExtraName, PackageName};

use crate::error::PrepareError;
use crate::request::{InstallRequest, Link};

/// Metadata of one prepared distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Normalized project name.
    pub name: PackageName,
    /// Distribution version.
    pub version: Version,
    /// Unconditional `Requires-Dist` entries, as PEP 508 strings.
    pub requires_dist: Vec<String>,
    /// Additional requirements per declared extra.
    pub extras: BTreeMap<ExtraName, Vec<String>>,
    /// `Requires-Python`, if declared.
    pub requires_python: Option<VersionSpecifiers>,
}

impl PackageMetadata {
    /// Metadata with no dependencies.
    pub fn new(name: PackageName, version: Version) -> Self {
        Self {
            name,
            version,
            requires_dist: Vec::new(),
            extras: BTreeMap::new(),
            requires_python: None,
        }
    }

    /// Add unconditional dependencies.
    pub fn with_requires_dist<S: Into<String>>(mut self, deps: impl IntoIterator<Item = S>) -> Self {
        self.requires_dist.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Declare an extra and its additional dependencies.
    pub fn with_extra<S: Into<String>>(
        mut self,
        extra: ExtraName,
        deps: impl IntoIterator<Item = S>,
    ) -> Self {
        self.extras
            .entry(extra)
            .or_default()
            .extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_requires_python(mut self, specifier: VersionSpecifiers) -> Self {
        self.requires_python = Some(specifier);
        self
    }
}

/// One artifact the index advertises for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCandidate {
    pub name: PackageName,
    pub version: Version,
    pub link: Link,
}

/// Index lookup service.
pub trait PackageFinder {
    /// Return every artifact published for `name`, in any order.
    fn find_all_candidates(&self, name: &PackageName) -> Vec<IndexCandidate>;
}

/// Metadata pipeline: download, unpack or build `link` and read its metadata.
///
/// Implementations own any temporary artifacts they create and must release
/// them before returning.
pub trait MetadataPreparer {
    /// Prepare `link`, which was introduced by `parent`.
    fn prepare_metadata(
        &self,
        link: &Link,
        parent: &InstallRequest,
    ) -> Result<PackageMetadata, PrepareError>;
}

/// In-memory index and metadata store, useful for tests.
///
/// Every added release gets a synthetic link on `index.invalid`. Artifacts
/// added through [`add_direct`](Self::add_direct) are preparable but not
/// listed by the finder, like a wheel on local disk.
pub struct InMemoryRepository {
    listed: HashMap<PackageName, Vec<IndexCandidate>>,
    metadata: HashMap<Link, PackageMetadata>,
    prepared: Cell<usize>,
}

impl InMemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            listed: HashMap::new(),
            metadata: HashMap::new(),
            prepared: Cell::new(0),
        }
    }

    /// Publish a release on the index and return its link.
    pub fn add(&mut self, meta: PackageMetadata) -> Link {
        let link = Link::new(format!(
            "https://index.invalid/{name}/{name}-{version}.tar.gz",
            name = meta.name,
            version = meta.version
        ));
        self.listed
            .entry(meta.name.clone())
            .or_default()
            .push(IndexCandidate {
                name: meta.name.clone(),
                version: meta.version.clone(),
                link: link.clone(),
            });
        self.metadata.insert(link.clone(), meta);
        link
    }

    /// Make `link` preparable without listing it on the index.
    pub fn add_direct(&mut self, link: Link, meta: PackageMetadata) {
        self.metadata.insert(link, meta);
    }

    /// Number of metadata preparations served so far.
    pub fn prepare_count(&self) -> usize {
        self.prepared.get()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageFinder for InMemoryRepository {
    fn find_all_candidates(&self, name: &PackageName) -> Vec<IndexCandidate> {
        self.listed.get(name).cloned().unwrap_or_default()
    }
}

impl MetadataPreparer for InMemoryRepository {
    fn prepare_metadata(
        &self,
        link: &Link,
        _parent: &InstallRequest,
    ) -> Result<PackageMetadata, PrepareError> {
        self.prepared.set(self.prepared.get() + 1);
        self.metadata
            .get(link)
            .cloned()
            .ok_or_else(|| format!("no such artifact: {link}").into())
    }
}
