//! Bookkeeping of the methods inserted into a target during one composition.
//!
//! Every part gets its own [`PartRegistry`], filled in insertion order while
//! the part is merged. Lookups compare parameter lists with the host
//! [`TypeSystem`], so they scan instead of hashing; the map key only keeps two
//! overloads of one alias apart.

use crate::naming::{alias_depth, is_alias_of};
use crate::types::{Type, TypeSystem};
use indexmap::IndexMap;

/// (base name, parameter types) of a method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub name: String,
    pub params: Vec<Type>,
}

impl Signature {
    pub fn new(name: impl Into<String>, params: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// A method as it was inserted into the target
#[derive(Debug, Clone, PartialEq)]
pub struct Registered {
    /// Name under which the method lives in the target
    pub alias: String,
    pub params: Vec<Type>,
    /// Position in the target's method list
    pub index: usize,
}

impl Registered {
    /// Whether this entry is a layer of the chain `base(params)`
    pub fn serves(&self, base: &str, params: &[Type], ts: &TypeSystem) -> bool {
        is_alias_of(&self.alias, base) && ts.params_equivalent(&self.params, params)
    }
}

/// Methods one part inserted, keyed by alias and parameter types
#[derive(Debug, Clone)]
pub struct PartRegistry {
    part: String,
    entries: IndexMap<Signature, Registered>,
}

impl PartRegistry {
    pub fn new(part: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            entries: IndexMap::new(),
        }
    }

    /// Qualified name of the part this registry belongs to
    pub fn part(&self) -> &str {
        &self.part
    }

    pub fn insert(&mut self, alias: impl Into<String>, params: Vec<Type>, index: usize) {
        let alias = alias.into();
        let key = Signature::new(alias.clone(), params.clone());
        self.entries.insert(
            key,
            Registered {
                alias,
                params,
                index,
            },
        );
    }

    /// The entry serving as a layer of `base(params)`, if this part inserted one
    pub fn find(&self, base: &str, params: &[Type], ts: &TypeSystem) -> Option<&Registered> {
        self.entries.values().find(|r| r.serves(base, params, ts))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registered> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All part registries of one composition, in processing order
#[derive(Debug, Default)]
pub struct Registry {
    parts: Vec<PartRegistry>,
}

impl Registry {
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    pub fn push(&mut self, part: PartRegistry) {
        self.parts.push(part);
    }

    /// The method of equal signature inserted by the most recently processed part
    ///
    /// That part holds the deepest layer so far, so the next collision goes
    /// exactly one layer below it.
    pub fn previous(&self, base: &str, params: &[Type], ts: &TypeSystem) -> Option<&Registered> {
        self.parts
            .iter()
            .rev()
            .find_map(|part| part.find(base, params, ts))
    }

    /// The deepest layer of `base(params)` inserted by any part
    pub fn deepest(&self, base: &str, params: &[Type], ts: &TypeSystem) -> Option<&Registered> {
        self.parts
            .iter()
            .flat_map(PartRegistry::iter)
            .filter(|r| r.serves(base, params, ts))
            .max_by_key(|r| alias_depth(&r.alias).map_or(0, |d| u64::from(d) + 1))
    }

    pub fn len(&self) -> usize {
        self.parts.iter().map(PartRegistry::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(PartRegistry::is_empty)
    }
}
