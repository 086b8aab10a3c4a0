//! Candidate and requirement construction for Python package resolution,
//! bridged to the [`resolvo`] dependency solver.
//!
//! A [`Factory`] turns install requests, index listings and distribution
//! metadata into [`Candidate`]s and [`Requirement`]s, guaranteeing that each
//! link is represented by exactly one candidate object for the whole run.
//! [`Pep508DependencyProvider`] exposes those to resolvo, and [`resolve`]
//! drives a complete resolution.

mod candidate;
mod error;
mod factory;
mod pool;
mod provider;
mod repository;
mod request;
mod requirement;
mod version_match;

pub use candidate::{
    Candidate, CandidateKey, ExtrasCandidate, Identifier, LinkCandidate,
    REQUIRES_PYTHON_IDENTIFIER, RequiresPythonCandidate,
};
pub use error::{PrepareError, ResolveError};
pub use factory::{Factory, FactoryOptions};
pub use pep440_rs::{Version, VersionSpecifiers};
pub use pep508_rs::{ExtraName, PackageName};
pub use pool::CandidatePool;
pub use provider::{Pep508DependencyProvider, resolve};
pub use repository::{
    InMemoryRepository, IndexCandidate, MetadataPreparer, PackageFinder, PackageMetadata,
};
pub use request::{InstallRequest, Link, Pep508RequestConstructor, RequestConstructor};
pub use requirement::{
    ExplicitRequirement, NoMatchRequirement, Requirement, SpecifierRequirement,
};
pub use version_match::{filter_versions, mentions_prerelease, version_matches};
