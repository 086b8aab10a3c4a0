//! Requirement variants: constraints some candidate has to satisfy.

use std::fmt;

use pep508_rs::PackageName;

use crate::candidate::{Candidate, Identifier};
use crate::error::ResolveError;
use crate::factory::Factory;
use crate::request::{InstallRequest, write_extras};
use crate::version_match::version_matches;

/// A constraint the solver must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Exactly one pre-selected candidate.
    Explicit(ExplicitRequirement),
    /// Any candidate of a name whose version is in a specifier set.
    Specifier(SpecifierRequirement),
    /// Nothing satisfies this. Lets the solver report the conflict through
    /// its ordinary "no candidate" path.
    NoMatch(NoMatchRequirement),
}

/// Satisfied by one candidate only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitRequirement {
    candidate: Candidate,
}

impl ExplicitRequirement {
    pub fn new(candidate: Candidate) -> Self {
        Self { candidate }
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }
}

/// Name plus version specifier, taken from an install request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierRequirement {
    name: PackageName,
    request: InstallRequest,
}

impl SpecifierRequirement {
    pub(crate) fn new(name: PackageName, request: InstallRequest) -> Self {
        Self { name, request }
    }

    pub fn request(&self) -> &InstallRequest {
        &self.request
    }
}

/// Satisfied by nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoMatchRequirement {
    name: Identifier,
}

impl NoMatchRequirement {
    pub fn new(name: Identifier) -> Self {
        Self { name }
    }
}

impl Requirement {
    /// Project name the requirement applies to, without extras.
    pub fn name(&self, factory: &Factory<'_>) -> Result<Identifier, ResolveError> {
        match self {
            Self::Explicit(r) => r.candidate.name(factory),
            Self::Specifier(r) => Ok(Identifier::package(r.name.clone())),
            Self::NoMatch(r) => Ok(r.name.clone()),
        }
    }

    /// Name including requested extras, as tracked by the solver.
    pub fn identifier(&self, factory: &Factory<'_>) -> Result<Identifier, ResolveError> {
        match self {
            Self::Explicit(r) => r.candidate.identifier(factory),
            Self::Specifier(r) => Ok(Identifier::Package {
                name: r.name.clone(),
                extras: r.request.extras().clone(),
            }),
            Self::NoMatch(r) => Ok(r.name.clone()),
        }
    }

    /// Whether `candidate` satisfies this requirement.
    ///
    /// An explicit requirement accepts its own candidate, or one with the
    /// same [`CandidateKey`](crate::CandidateKey). Specifier matching accepts
    /// pre-releases.
    pub fn is_satisfied_by(
        &self,
        candidate: &Candidate,
        factory: &Factory<'_>,
    ) -> Result<bool, ResolveError> {
        match self {
            Self::Explicit(r) => Ok(r.candidate.is_same(candidate) || r.candidate == *candidate),
            Self::Specifier(r) => {
                if candidate.name(factory)?.project_name() != Some(&r.name) {
                    return Ok(false);
                }
                let version = candidate.version(factory)?;
                Ok(version_matches(&version, r.request.specifier()))
            }
            Self::NoMatch(_) => Ok(false),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(r) => write!(f, "{}", r.candidate),
            Self::Specifier(r) => {
                write!(f, "{}", r.name)?;
                write_extras(f, r.request.extras())?;
                write!(f, "{}", r.request.specifier())
            }
            Self::NoMatch(r) => write!(f, "{} (unsatisfiable)", r.name),
        }
    }
}
