//! Arena-based pool mapping resolvo IDs to candidates and requirements.
//!
//! [`CandidatePool`] backs every resolvo identifier ([`NameId`],
//! [`SolvableId`], [`VersionSetId`], [`StringId`]) with a concrete value.
//! Unlike a pre-computed index it grows while the solver runs, as the
//! provider discovers candidates and dependencies lazily.

use std::collections::HashMap;

use resolvo::{ArenaId, NameId, SolvableId, StringId, VersionSetId};

use crate::candidate::{Candidate, CandidateKey, Identifier};
use crate::requirement::Requirement;

/// Arena-based storage for all resolvo-interned objects.
///
/// Every resolvo ID type is backed by a `Vec` here, indexed by the ID's
/// inner `usize`. Reverse-lookup `HashMap`s prevent duplicate interning.
pub struct CandidatePool {
    // NameId arena
    names: Vec<Identifier>,
    names_rev: HashMap<Identifier, NameId>,

    // SolvableId arena, deduplicated by candidate key
    solvables: Vec<Candidate>,
    solvable_names: Vec<NameId>,
    solvables_rev: HashMap<CandidateKey, SolvableId>,

    // VersionSetId arena, deduplicated by name and rendered requirement
    version_sets: Vec<Requirement>,
    version_set_names: Vec<NameId>,
    version_sets_rev: HashMap<(NameId, String), VersionSetId>,

    // StringId arena
    strings: Vec<String>,
}

impl CandidatePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            names_rev: HashMap::new(),
            solvables: Vec::new(),
            solvable_names: Vec::new(),
            solvables_rev: HashMap::new(),
            version_sets: Vec::new(),
            version_set_names: Vec::new(),
            version_sets_rev: HashMap::new(),
            strings: Vec::new(),
        }
    }

    // --- NameId ---

    /// Intern an identifier, returning the existing ID if already interned.
    pub fn intern_name(&mut self, name: Identifier) -> NameId {
        if let Some(&id) = self.names_rev.get(&name) {
            return id;
        }
        let id = NameId::from_usize(self.names.len());
        self.names_rev.insert(name.clone(), id);
        self.names.push(name);
        id
    }

    pub fn resolve_name(&self, id: NameId) -> &Identifier {
        &self.names[id.to_usize()]
    }

    // --- SolvableId ---

    /// Add a candidate, returning the existing ID for an equal candidate.
    ///
    /// Extras candidates are not unique objects, so two equal ones share
    /// one solvable.
    pub fn intern_solvable(&mut self, name_id: NameId, candidate: Candidate) -> SolvableId {
        let key = candidate.key();
        if let Some(&id) = self.solvables_rev.get(&key) {
            return id;
        }
        let id = SolvableId::from_usize(self.solvables.len());
        self.solvables_rev.insert(key, id);
        self.solvables.push(candidate);
        self.solvable_names.push(name_id);
        id
    }

    pub fn resolve_solvable(&self, id: SolvableId) -> &Candidate {
        &self.solvables[id.to_usize()]
    }

    pub fn solvable_name(&self, id: SolvableId) -> NameId {
        self.solvable_names[id.to_usize()]
    }

    /// Return the number of interned solvables.
    pub fn solvable_count(&self) -> usize {
        self.solvables.len()
    }

    // --- VersionSetId ---

    /// Intern a requirement under `name_id`, deduplicating by its rendering.
    pub fn intern_version_set(
        &mut self,
        name_id: NameId,
        requirement: Requirement,
    ) -> VersionSetId {
        let key = (name_id, requirement.to_string());
        if let Some(&id) = self.version_sets_rev.get(&key) {
            return id;
        }
        let id = VersionSetId::from_usize(self.version_sets.len());
        self.version_sets_rev.insert(key, id);
        self.version_sets.push(requirement);
        self.version_set_names.push(name_id);
        id
    }

    pub fn resolve_version_set(&self, id: VersionSetId) -> &Requirement {
        &self.version_sets[id.to_usize()]
    }

    pub fn version_set_name(&self, id: VersionSetId) -> NameId {
        self.version_set_names[id.to_usize()]
    }

    /// Return the number of interned version sets.
    pub fn version_set_count(&self) -> usize {
        self.version_sets.len()
    }

    // --- StringId ---

    /// Intern a string (used for solver error messages).
    pub fn intern_string(&mut self, s: String) -> StringId {
        let id = StringId::from_usize(self.strings.len());
        self.strings.push(s);
        id
    }

    pub fn resolve_string(&self, id: StringId) -> &str {
        &self.strings[id.to_usize()]
    }
}

impl Default for CandidatePool {
    fn default() -> Self {
        Self::new()
    }
}
