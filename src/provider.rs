//! Bridge between the [`Factory`] and resolvo's [`DependencyProvider`] trait.
//!
//! [`Pep508DependencyProvider`] grows a [`CandidatePool`] lazily while the
//! solver runs: index listings, metadata and dependency lists are only
//! fetched when resolvo asks for them. It implements both [`Interner`] and
//! [`DependencyProvider`] so that [`resolvo::Solver`] can resolve Python
//! package requirements.
//!
//! [`Interner`]: resolvo::Interner
//! [`DependencyProvider`]: resolvo::DependencyProvider

use std::any::Any;
use std::cell::{Ref, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};
use pep440_rs::Version;
use pep508_rs::{ExtraName, PackageName};
use resolvo::{
    Candidates, Condition, ConditionId, ConditionalRequirement, Dependencies,
    HintDependenciesAvailable, KnownDependencies, NameId, Problem, SolvableId, Solver,
    SolverCache, StringId, UnsolvableOrCancelled, VersionSetId, VersionSetUnionId,
};

use crate::candidate::{Candidate, Identifier};
use crate::error::ResolveError;
use crate::factory::Factory;
use crate::pool::CandidatePool;
use crate::request::InstallRequest;
use crate::requirement::Requirement;

/// Dependency provider feeding [`Factory`] products to the resolvo solver.
///
/// Names are [`Identifier`]s, solvables are [`Candidate`]s and version sets
/// are [`Requirement`]s. Everything is interned on first sight.
///
/// Errors raised while the solver is running (metadata preparation, parse
/// failures) cannot be returned through resolvo's callbacks. The first one is
/// recorded and handed back through
/// [`should_cancel_with_value`](resolvo::DependencyProvider::should_cancel_with_value),
/// which makes the solver stop.
///
/// resolvo asks for the candidates of a name only once. A pin discovered
/// after that cannot be offered any more: it is queued as a late pin
/// (see [`take_late_pins`](Self::take_late_pins)) and the solver is stopped
/// the same way. [`resolve`] then starts over with those pins registered up
/// front.
pub struct Pep508DependencyProvider<'a> {
    factory: &'a Factory<'a>,
    pool: RefCell<CandidatePool>,
    /// Install requests seen per name, used to query the index.
    requests: RefCell<HashMap<NameId, Vec<InstallRequest>>>,
    /// Candidates registered by explicit requirements, per name.
    pinned: RefCell<HashMap<NameId, Vec<SolvableId>>>,
    /// Solvables handed to the solver, per listed name.
    offered: RefCell<HashMap<NameId, HashSet<SolvableId>>>,
    late_pins: RefCell<Vec<Candidate>>,
    python_solvable: SolvableId,
    error: RefCell<Option<ResolveError>>,
}

/// Cancellation value used when late pins require a fresh run.
#[derive(Debug)]
struct PinsDiscovered;

impl<'a> Pep508DependencyProvider<'a> {
    /// Create a provider over `factory`.
    ///
    /// The interpreter candidate is interned up front, so it is always the
    /// single candidate of the Requires-Python name.
    pub fn new(factory: &'a Factory<'a>) -> Self {
        let mut pool = CandidatePool::new();
        let python_name = pool.intern_name(Identifier::RequiresPython);
        let python_solvable = pool.intern_solvable(python_name, factory.python_candidate().clone());
        Self {
            factory,
            pool: RefCell::new(pool),
            requests: RefCell::new(HashMap::new()),
            pinned: RefCell::new(HashMap::new()),
            offered: RefCell::new(HashMap::new()),
            late_pins: RefCell::new(Vec::new()),
            python_solvable,
            error: RefCell::new(None),
        }
    }

    pub fn factory(&self) -> &'a Factory<'a> {
        self.factory
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> Ref<'_, CandidatePool> {
        self.pool.borrow()
    }

    /// The candidate behind a solvable.
    pub fn candidate(&self, solvable: SolvableId) -> Candidate {
        self.pool.borrow().resolve_solvable(solvable).clone()
    }

    /// Take the error recorded while solving, if any.
    pub fn take_error(&self) -> Option<ResolveError> {
        self.error.borrow_mut().take()
    }

    fn record_error(&self, err: ResolveError) {
        debug!("stopping resolution: {err}");
        let mut slot = self.error.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    /// Take the pins discovered after their name had been listed.
    pub fn take_late_pins(&self) -> Vec<Candidate> {
        std::mem::take(&mut *self.late_pins.borrow_mut())
    }

    /// Register `candidate` as a pinned candidate of its name before
    /// solving, so it is part of that name's listing.
    pub fn pin_candidate(&self, candidate: &Candidate) -> Result<(), ResolveError> {
        let identifier = candidate.identifier(self.factory)?;
        let (name, solvable) = {
            let mut pool = self.pool.borrow_mut();
            let name = pool.intern_name(identifier);
            (name, pool.intern_solvable(name, candidate.clone()))
        };
        self.register_pin(name, solvable, candidate);
        Ok(())
    }

    fn register_pin(&self, name: NameId, solvable: SolvableId, candidate: &Candidate) {
        let mut pinned = self.pinned.borrow_mut();
        let pins = pinned.entry(name).or_default();
        if pins.contains(&solvable) {
            return;
        }
        pins.push(solvable);

        let late = self
            .offered
            .borrow()
            .get(&name)
            .is_some_and(|offered| !offered.contains(&solvable));
        if late {
            debug!("{candidate} was pinned after its name was listed");
            self.late_pins.borrow_mut().push(candidate.clone());
        }
    }

    /// Intern a [`Requirement`] as a resolvo requirement.
    ///
    /// Specifier requirements remember their install request so the index
    /// can be queried for that name later; explicit requirements register
    /// their candidate as a pinned candidate of the name.
    pub fn intern_requirement(
        &self,
        requirement: &Requirement,
    ) -> Result<ConditionalRequirement, ResolveError> {
        let identifier = requirement.identifier(self.factory)?;
        let mut pool = self.pool.borrow_mut();
        let name_id = pool.intern_name(identifier);

        match requirement {
            Requirement::Specifier(r) => {
                let mut requests = self.requests.borrow_mut();
                let seen = requests.entry(name_id).or_default();
                if !seen.contains(r.request()) {
                    seen.push(r.request().clone());
                }
            }
            Requirement::Explicit(r) => {
                let solvable = pool.intern_solvable(name_id, r.candidate().clone());
                self.register_pin(name_id, solvable, r.candidate());
            }
            Requirement::NoMatch(_) => {}
        }

        let version_set = pool.intern_version_set(name_id, requirement.clone());
        Ok(ConditionalRequirement {
            condition: None,
            requirement: resolvo::Requirement::Single(version_set),
        })
    }

    /// Intern the requirement an install request stands for.
    pub fn intern_install_request(
        &self,
        request: &InstallRequest,
    ) -> Result<ConditionalRequirement, ResolveError> {
        let requirement = self.factory.make_requirement_from_install_req(request);
        self.intern_requirement(&requirement)
    }

    /// Parse a user requirement string and intern it.
    pub fn intern_spec(&self, spec: &str) -> Result<ConditionalRequirement, ResolveError> {
        self.intern_install_request(&InstallRequest::parse(spec)?)
    }

    /// Requests recorded for `name` first, then those recorded for the same
    /// project under other extras.
    fn project_requests(&self, name: NameId, project: &PackageName) -> Vec<InstallRequest> {
        let pool = self.pool.borrow();
        let requests = self.requests.borrow();
        let mut found = requests.get(&name).cloned().unwrap_or_default();
        let mut others: Vec<&InstallRequest> = requests
            .iter()
            .filter(|&(&other, _)| other != name)
            .filter(|&(&other, _)| match pool.resolve_name(other) {
                Identifier::Package { name, .. } => name == project,
                Identifier::RequiresPython => false,
            })
            .flat_map(|(_, seen)| seen)
            .collect();
        others.sort_by_key(|request| request.to_string());
        found.extend(others.into_iter().cloned());
        found
    }

    /// Index candidates for a name.
    ///
    /// The listing is queried once without a version constraint, so later
    /// requirements on the name still find their versions, and once per
    /// recorded request so each keeps its own pre-release allowance.
    fn list_candidates(
        &self,
        requests: &[InstallRequest],
        extras: &BTreeSet<ExtraName>,
    ) -> Vec<Candidate> {
        let Some(first) = requests.first() else {
            return Vec::new();
        };
        let mut listed = self
            .factory
            .iter_found_candidates(&first.without_specifier(), extras);
        for request in requests {
            listed.extend(self.factory.iter_found_candidates(request, extras));
        }
        listed
    }

    fn known_dependencies(&self, candidate: &Candidate) -> Result<KnownDependencies, ResolveError> {
        let mut deps = candidate.dependencies(self.factory)?;
        // The extras node and the plain node must agree on one artifact.
        if let Candidate::Extras(c) = candidate {
            deps.push(
                self.factory
                    .make_requirement_from_candidate(Candidate::Link(Rc::clone(c.base()))),
            );
        }
        trace!("{candidate} has {} dependencies", deps.len());

        let requirements = deps
            .iter()
            .map(|dep| self.intern_requirement(dep))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(KnownDependencies {
            requirements,
            constrains: Vec::new(),
        })
    }
}

/// Resolve `roots` to the set of distributions to install.
///
/// Only link candidates are returned: extras candidates and the interpreter
/// are solver bookkeeping, and every extras candidate is accompanied by its
/// base in the solution.
///
/// Roots whose environment marker does not hold are dropped. When the solver
/// meets a direct reference for a name it has already listed, the run is
/// repeated with every such pin registered up front; the set of pins only
/// grows, so this ends.
pub fn resolve(
    factory: &Factory<'_>,
    roots: &[InstallRequest],
) -> Result<Vec<Candidate>, ResolveError> {
    let mut applicable = Vec::with_capacity(roots.len());
    for request in roots {
        if factory.marker_applies(request, &[]) {
            applicable.push(request);
        } else {
            debug!("ignoring {request}: marker does not match");
        }
    }

    let mut pins: Vec<Candidate> = Vec::new();
    loop {
        let late = match solve_once(factory, &applicable, &pins)? {
            Attempt::Solved(solution) => return Ok(solution),
            Attempt::Restart(late) => late,
        };
        let known = pins.len();
        for pin in late {
            if !pins.contains(&pin) {
                pins.push(pin);
            }
        }
        if pins.len() == known {
            return Err(ResolveError::Cancelled);
        }
        debug!("restarting with {} pinned candidates", pins.len());
    }
}

enum Attempt {
    Solved(Vec<Candidate>),
    Restart(Vec<Candidate>),
}

fn solve_once(
    factory: &Factory<'_>,
    roots: &[&InstallRequest],
    pins: &[Candidate],
) -> Result<Attempt, ResolveError> {
    let provider = Pep508DependencyProvider::new(factory);
    for pin in pins {
        provider.pin_candidate(pin)?;
    }
    let requirements = roots
        .iter()
        .map(|request| provider.intern_install_request(request))
        .collect::<Result<Vec<_>, _>>()?;
    let problem = Problem::new().requirements(requirements);

    let mut solver = Solver::new(provider);
    let outcome = solver.solve(problem);
    let provider = solver.provider();
    if let Some(err) = provider.take_error() {
        return Err(err);
    }
    // Recorded errors are moved into the cancellation value.
    let outcome = match outcome {
        Err(UnsolvableOrCancelled::Cancelled(value)) => match value.downcast::<ResolveError>() {
            Ok(err) => return Err(*err),
            Err(value) => Err(UnsolvableOrCancelled::Cancelled(value)),
        },
        other => other,
    };
    let late = provider.take_late_pins();
    if !late.is_empty() {
        return Ok(Attempt::Restart(late));
    }

    match outcome {
        Ok(solution) => Ok(Attempt::Solved(
            solution
                .into_iter()
                .map(|solvable| provider.candidate(solvable))
                .filter(|candidate| matches!(candidate, Candidate::Link(_)))
                .collect(),
        )),
        Err(UnsolvableOrCancelled::Unsolvable(conflict)) => Err(ResolveError::Unsatisfiable(
            conflict.display_user_friendly(&solver).to_string(),
        )),
        Err(UnsolvableOrCancelled::Cancelled(_)) => Err(ResolveError::Cancelled),
    }
}

// --- Display wrappers ---

struct DisplaySolvable<'p, 'a>(&'p Pep508DependencyProvider<'a>, SolvableId);

impl fmt::Display for DisplaySolvable<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let candidate = self.0.candidate(self.1);
        if let Candidate::RequiresPython(_) = candidate {
            return write!(f, "{candidate}");
        }
        let factory = self.0.factory;
        match (candidate.identifier(factory), candidate.version(factory)) {
            (Ok(identifier), Ok(version)) => write!(f, "{identifier} {version}"),
            _ => write!(f, "{candidate}"),
        }
    }
}

struct DisplayName<'p, 'a>(&'p Pep508DependencyProvider<'a>, NameId);

impl fmt::Display for DisplayName<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.pool.borrow().resolve_name(self.1))
    }
}

struct DisplayVersionSet<'p, 'a>(&'p Pep508DependencyProvider<'a>, VersionSetId);

impl fmt::Display for DisplayVersionSet<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pool = self.0.pool.borrow();
        match pool.resolve_version_set(self.1) {
            Requirement::Explicit(r) => match r.candidate() {
                Candidate::RequiresPython(c) => write!(f, "=={}", c.version()),
                other => match other.link() {
                    Some(link) => write!(f, "@ {link}"),
                    None => write!(f, "{other}"),
                },
            },
            Requirement::Specifier(r) => {
                let specifier = r.request().specifier();
                if specifier.iter().next().is_none() {
                    f.write_str("*")
                } else {
                    write!(f, "{specifier}")
                }
            }
            Requirement::NoMatch(_) => f.write_str("(no matching candidate)"),
        }
    }
}

struct DisplayString<'p, 'a>(&'p Pep508DependencyProvider<'a>, StringId);

impl fmt::Display for DisplayString<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.pool.borrow().resolve_string(self.1))
    }
}

// --- Interner ---

impl resolvo::Interner for Pep508DependencyProvider<'_> {
    fn display_solvable(&self, solvable: SolvableId) -> impl fmt::Display + '_ {
        DisplaySolvable(self, solvable)
    }

    fn display_name(&self, name: NameId) -> impl fmt::Display + '_ {
        DisplayName(self, name)
    }

    fn display_version_set(&self, version_set: VersionSetId) -> impl fmt::Display + '_ {
        DisplayVersionSet(self, version_set)
    }

    fn display_string(&self, string_id: StringId) -> impl fmt::Display + '_ {
        DisplayString(self, string_id)
    }

    fn version_set_name(&self, version_set: VersionSetId) -> NameId {
        self.pool.borrow().version_set_name(version_set)
    }

    fn solvable_name(&self, solvable: SolvableId) -> NameId {
        self.pool.borrow().solvable_name(solvable)
    }

    fn version_sets_in_union(
        &self,
        _version_set_union: VersionSetUnionId,
    ) -> impl Iterator<Item = VersionSetId> {
        // Every requirement is interned as a single version set.
        std::iter::empty()
    }

    fn resolve_condition(&self, _condition: ConditionId) -> Condition {
        unreachable!("conditional requirements are never interned")
    }
}

// --- DependencyProvider ---

impl resolvo::DependencyProvider for Pep508DependencyProvider<'_> {
    async fn get_candidates(&self, name: NameId) -> Option<Candidates> {
        let identifier = self.pool.borrow().resolve_name(name).clone();
        let listed = match &identifier {
            Identifier::RequiresPython => Vec::new(),
            Identifier::Package { name: project, extras } => {
                let requests = self.project_requests(name, project);
                self.list_candidates(&requests, extras)
            }
        };

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        {
            let mut pool = self.pool.borrow_mut();
            if identifier == Identifier::RequiresPython {
                seen.insert(self.python_solvable);
                candidates.push(self.python_solvable);
            }
            for candidate in listed {
                let solvable = pool.intern_solvable(name, candidate);
                if seen.insert(solvable) {
                    candidates.push(solvable);
                }
            }
        }
        for &solvable in self.pinned.borrow().get(&name).into_iter().flatten() {
            if seen.insert(solvable) {
                candidates.push(solvable);
            }
        }

        debug!("{} candidates for {identifier}", candidates.len());
        self.offered
            .borrow_mut()
            .insert(name, candidates.iter().copied().collect());
        if candidates.is_empty() {
            return None;
        }
        Some(Candidates {
            candidates,
            favored: None,
            locked: None,
            hint_dependencies_available: HintDependenciesAvailable::None,
            excluded: Vec::new(),
        })
    }

    async fn sort_candidates(&self, _solver: &SolverCache<Self>, solvables: &mut [SolvableId]) {
        // Newest first so the solver prefers newer versions.
        let versions: HashMap<SolvableId, Option<Version>> = solvables
            .iter()
            .map(|&sid| {
                let version = match self.candidate(sid).version(self.factory) {
                    Ok(version) => Some(version),
                    Err(err) => {
                        self.record_error(err);
                        None
                    }
                };
                (sid, version)
            })
            .collect();
        solvables.sort_by(|a, b| versions[b].cmp(&versions[a]));
    }

    async fn filter_candidates(
        &self,
        candidates: &[SolvableId],
        version_set: VersionSetId,
        inverse: bool,
    ) -> Vec<SolvableId> {
        let requirement = self.pool.borrow().resolve_version_set(version_set).clone();

        candidates
            .iter()
            .copied()
            .filter(|&sid| {
                let candidate = self.candidate(sid);
                let matches = requirement
                    .is_satisfied_by(&candidate, self.factory)
                    .unwrap_or_else(|err| {
                        self.record_error(err);
                        false
                    });
                matches != inverse
            })
            .collect()
    }

    async fn get_dependencies(&self, solvable: SolvableId) -> Dependencies {
        let candidate = self.candidate(solvable);
        match self.known_dependencies(&candidate) {
            Ok(deps) => Dependencies::Known(deps),
            Err(err) => {
                let reason = self.pool.borrow_mut().intern_string(err.to_string());
                self.record_error(err);
                Dependencies::Unknown(reason)
            }
        }
    }

    fn should_cancel_with_value(&self) -> Option<Box<dyn Any>> {
        if let Some(err) = self.take_error() {
            return Some(Box::new(err) as Box<dyn Any>);
        }
        if !self.late_pins.borrow().is_empty() {
            return Some(Box::new(PinsDiscovered) as Box<dyn Any>);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::str::FromStr;
    use std::task::{Context, Poll, Waker};

    use resolvo::{ArenaId, DependencyProvider, Interner};

    use super::*;
    use crate::factory::FactoryOptions;
    use crate::repository::{InMemoryRepository, PackageMetadata};
    use crate::request::{Link, Pep508RequestConstructor};

    fn name(s: &str) -> PackageName {
        PackageName::from_str(s).unwrap()
    }

    fn v(s: &str) -> Version {
        Version::from_str(s).unwrap()
    }

    fn factory(repo: &InMemoryRepository) -> Factory<'_> {
        Factory::new(
            repo,
            repo,
            &Pep508RequestConstructor,
            FactoryOptions::new(v("3.11")),
        )
    }

    /// Provider callbacks never suspend, so one poll completes them.
    fn block_on<F: Future>(future: F) -> F::Output {
        let mut future = std::pin::pin!(future);
        match future.as_mut().poll(&mut Context::from_waker(Waker::noop())) {
            Poll::Ready(output) => output,
            Poll::Pending => panic!("provider callback suspended"),
        }
    }

    fn version_set(req: &ConditionalRequirement) -> VersionSetId {
        match &req.requirement {
            resolvo::Requirement::Single(vs) => *vs,
            _ => panic!("expected a single version set"),
        }
    }

    #[test]
    fn python_is_interned_up_front() {
        let repo = InMemoryRepository::new();
        let factory = factory(&repo);
        let provider = Pep508DependencyProvider::new(&factory);

        assert_eq!(provider.pool().solvable_count(), 1);
        let python = provider.candidate(SolvableId::from_usize(0));
        assert!(python.is_same(factory.python_candidate()));
        assert_eq!(
            provider.display_solvable(SolvableId::from_usize(0)).to_string(),
            "Python 3.11"
        );
    }

    #[test]
    fn specifier_requirement_display() {
        let repo = InMemoryRepository::new();
        let factory = factory(&repo);
        let provider = Pep508DependencyProvider::new(&factory);

        let vs = version_set(&provider.intern_spec("foo[bar]>=1.0").unwrap());
        let name_id = provider.version_set_name(vs);
        assert_eq!(provider.display_name(name_id).to_string(), "foo[bar]");
        assert_eq!(provider.display_version_set(vs).to_string(), ">=1.0");

        let any = version_set(&provider.intern_spec("foo[bar]").unwrap());
        assert_eq!(provider.display_version_set(any).to_string(), "*");
        assert_eq!(provider.version_set_name(any), name_id);
    }

    #[test]
    fn pinned_requirement_registers_candidate() {
        let mut repo = InMemoryRepository::new();
        let link = repo.add(PackageMetadata::new(name("foo"), v("1.0")));
        let factory = factory(&repo);
        let provider = Pep508DependencyProvider::new(&factory);

        let request = InstallRequest::from_link(link.clone(), Some(name("foo")));
        let vs = version_set(&provider.intern_install_request(&request).unwrap());
        assert_eq!(
            provider.display_version_set(vs).to_string(),
            format!("@ {link}")
        );
        let name_id = provider.version_set_name(vs);
        assert_eq!(provider.pinned.borrow()[&name_id].len(), 1);
        assert_eq!(provider.pool().solvable_count(), 2);
    }

    #[test]
    fn malformed_root_is_rejected() {
        let repo = InMemoryRepository::new();
        let factory = factory(&repo);
        let provider = Pep508DependencyProvider::new(&factory);
        assert!(matches!(
            provider.intern_spec("foo>=>1"),
            Err(ResolveError::InvalidRequirement { .. })
        ));
    }

    #[test]
    fn recorded_error_is_kept_once() {
        let repo = InMemoryRepository::new();
        let factory = factory(&repo);
        let provider = Pep508DependencyProvider::new(&factory);

        provider.record_error(ResolveError::Cancelled);
        provider.record_error(ResolveError::Unsatisfiable("later".into()));
        assert!(matches!(provider.take_error(), Some(ResolveError::Cancelled)));
        assert!(provider.take_error().is_none());
    }

    #[test]
    fn pin_after_listing_is_queued() {
        let mut repo = InMemoryRepository::new();
        let indexed = repo.add(PackageMetadata::new(name("foo"), v("1.0")));
        let factory = factory(&repo);
        let provider = Pep508DependencyProvider::new(&factory);

        let foo = provider.version_set_name(version_set(&provider.intern_spec("foo").unwrap()));
        let listed = block_on(provider.get_candidates(foo)).unwrap();
        assert_eq!(listed.candidates.len(), 1);

        // Pinning the artifact that was already offered is not late.
        provider
            .intern_install_request(&InstallRequest::from_link(indexed, Some(name("foo"))))
            .unwrap();
        assert!(provider.should_cancel_with_value().is_none());

        provider
            .intern_spec("foo @ https://files.example/foo-0.5.tar.gz")
            .unwrap();
        assert!(provider.should_cancel_with_value().is_some());

        let late = provider.take_late_pins();
        assert_eq!(late.len(), 1);
        assert_eq!(
            late[0].link().map(Link::url),
            Some("https://files.example/foo-0.5.tar.gz")
        );
        assert!(provider.should_cancel_with_value().is_none());
    }

    #[test]
    fn pins_registered_up_front_are_listed() {
        let mut repo = InMemoryRepository::new();
        repo.add(PackageMetadata::new(name("foo"), v("1.0")));
        let factory = factory(&repo);
        let provider = Pep508DependencyProvider::new(&factory);

        let request = InstallRequest::parse("foo @ https://files.example/foo-0.5.tar.gz").unwrap();
        let pinned = match factory.make_requirement_from_install_req(&request) {
            Requirement::Explicit(r) => r.candidate().clone(),
            other => panic!("expected an explicit requirement, got {other}"),
        };
        provider.pin_candidate(&pinned).unwrap();
        let foo = provider.version_set_name(version_set(&provider.intern_spec("foo").unwrap()));
        let listed = block_on(provider.get_candidates(foo)).unwrap();
        assert_eq!(listed.candidates.len(), 2);
        assert!(provider.take_late_pins().is_empty());
    }

    #[test]
    fn sort_records_version_errors() {
        let mut repo = InMemoryRepository::new();
        repo.add(PackageMetadata::new(name("foo"), v("1.0")));
        let factory = factory(&repo);
        let cache = SolverCache::new(Pep508DependencyProvider::new(&factory));
        let provider = cache.provider();

        provider.intern_spec("foo").unwrap();
        let broken = InstallRequest::from_link(
            Link::new("https://files.example/foo-0.5.tar.gz"),
            Some(name("foo")),
        );
        let foo = provider.version_set_name(version_set(
            &provider.intern_install_request(&broken).unwrap(),
        ));

        let mut solvables = block_on(provider.get_candidates(foo)).unwrap().candidates;
        assert_eq!(solvables.len(), 2);
        block_on(provider.sort_candidates(&cache, &mut solvables));

        assert_eq!(
            provider.candidate(solvables[0]).version(&factory).unwrap(),
            v("1.0")
        );
        match provider.take_error() {
            Some(ResolveError::Metadata { link, .. }) => {
                assert_eq!(link.url(), "https://files.example/foo-0.5.tar.gz")
            }
            other => panic!("expected a metadata error, got {other:?}"),
        }
    }
}
