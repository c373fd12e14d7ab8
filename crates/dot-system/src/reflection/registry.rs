//! Process-wide type registry
//!
//! Every type gets a once-cell keyed by its `TypeId`. Builds run one at a
//! time under a reentrant lock, so a build may trigger the builds of the
//! types it mentions, and two types that mention each other never wait on
//! builds held by different threads. Once sealed, a descriptor is read
//! without taking any lock beyond a shard read.
//!
//! While a thread is building a type, that thread (and only that thread)
//! sees the unsealed shell, which is what lets a type mention itself.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::mem;
use std::sync::{Arc, LazyLock, OnceLock};

use dashmap::DashMap;
use parking_lot::{ReentrantMutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::type_info::Type;
use super::Reflected;
use crate::error::ReflectionResult;

type TypeCell = Arc<OnceLock<ReflectionResult<Type>>>;

static GLOBAL: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::new);

thread_local! {
    static UNDER_CONSTRUCTION: RefCell<FxHashMap<TypeId, Type>> = RefCell::new(FxHashMap::default());
}

/// Held by a builder from `begin` until it goes away. Removes the shell from
/// this thread's under-construction table and, unless the shell was sealed,
/// withdraws its aliases.
pub(crate) struct ConstructionGuard {
    registry: &'static TypeRegistry,
    shell: Type,
    /// Aliases `begin` took over, with what they pointed to before
    displaced: Vec<(String, Option<Type>)>,
}

impl Drop for ConstructionGuard {
    fn drop(&mut self) {
        let id = self.shell.type_id();
        // The table may already be gone during thread teardown.
        let _ = UNDER_CONSTRUCTION.try_with(|building| building.borrow_mut().remove(&id));
        if !self.shell.is_sealed() {
            self.registry.abandon(&self.shell, mem::take(&mut self.displaced));
        }
    }
}

fn under_construction(id: TypeId) -> Option<Type> {
    UNDER_CONSTRUCTION
        .try_with(|building| building.borrow().get(&id).cloned())
        .ok()
        .flatten()
}

/// Name-to-type map plus the per-type build cells
pub struct TypeRegistry {
    by_name: DashMap<String, Type>,
    cells: DashMap<TypeId, TypeCell>,
    derived: RwLock<FxHashMap<String, Vec<Type>>>,
    building: ReentrantMutex<()>,
}

impl TypeRegistry {
    fn new() -> Self {
        Self {
            by_name: DashMap::new(),
            cells: DashMap::new(),
            derived: RwLock::new(FxHashMap::default()),
            building: ReentrantMutex::new(()),
        }
    }

    /// The registry shared by the whole process
    pub fn global() -> &'static TypeRegistry {
        &GLOBAL
    }

    /// Look up by full name, simple name or Rust type name
    pub fn get(&self, name: &str) -> Option<Type> {
        self.by_name.get(name).map(|entry| entry.value().clone())
    }

    /// Whether any type answers to `name`
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All sealed types, ordered by full name
    pub fn types(&self) -> Vec<Type> {
        let mut types: Vec<Type> = self
            .cells
            .iter()
            .filter_map(|entry| match entry.value().get() {
                Some(Ok(ty)) => Some(ty.clone()),
                _ => None,
            })
            .collect();
        types.sort_by(|a, b| a.full_name().cmp(b.full_name()));
        types
    }

    /// Types deriving, directly or not, from the type named `base`
    pub fn derived_types(&self, base: &str) -> Vec<Type> {
        self.derived.read().get(base).cloned().unwrap_or_default()
    }

    /// Display name for `T`: its registered full name when sealed, the Rust
    /// type name otherwise
    pub(crate) fn name_of<T: Any>(&self) -> String {
        let cell = self
            .cells
            .get(&TypeId::of::<T>())
            .map(|entry| Arc::clone(entry.value()));
        match cell.as_deref().and_then(OnceLock::get) {
            Some(Ok(ty)) => ty.full_name().to_string(),
            _ => type_name::<T>().to_string(),
        }
    }

    pub(crate) fn resolve<T: Reflected>(&self) -> ReflectionResult<Type> {
        let id = TypeId::of::<T>();
        let cell = self.cells.get(&id).map(|entry| Arc::clone(entry.value()));
        if let Some(result) = cell.as_deref().and_then(OnceLock::get) {
            return result.clone();
        }
        if let Some(shell) = under_construction(id) {
            return Ok(shell);
        }
        let _building = self.building.lock();
        let cell = match cell {
            Some(cell) => cell,
            None => Arc::clone(self.cells.entry(id).or_default().value()),
        };
        cell.get_or_init(T::build_type).clone()
    }

    /// Publish a shell under its aliases and mark it as being built by the
    /// current thread
    pub(crate) fn begin(&'static self, shell: &Type, rust_name: &str) -> ConstructionGuard {
        let mut displaced = Vec::new();
        for alias in [shell.full_name(), shell.name(), rust_name] {
            if alias.is_empty() {
                continue;
            }
            let previous = self.by_name.insert(alias.to_string(), shell.clone());
            if previous.as_ref().is_some_and(|previous| Type::ptr_eq(previous, shell)) {
                continue;
            }
            if let Some(previous) = previous.as_ref().filter(|previous| *previous != shell) {
                warn!(
                    alias,
                    previous = %previous,
                    current = %shell,
                    "type alias now refers to a different type"
                );
            }
            displaced.push((alias.to_string(), previous));
        }
        let id = shell.type_id();
        let _ = UNDER_CONSTRUCTION.try_with(|building| building.borrow_mut().insert(id, shell.clone()));
        ConstructionGuard {
            registry: self,
            shell: shell.clone(),
            displaced,
        }
    }

    /// Record a freshly sealed type in the derived-type table of each ancestor
    pub(crate) fn seal(&self, ty: &Type) {
        let mut derived = self.derived.write();
        let mut ancestor = ty.base_type();
        while let Some(base) = ancestor {
            derived
                .entry(base.full_name().to_string())
                .or_default()
                .push(ty.clone());
            ancestor = base.base_type();
        }
        drop(derived);

        debug!(
            type_name = %ty,
            fields = ty.get_fields().len(),
            methods = ty.get_methods().len(),
            constructors = ty.get_constructors().len(),
            "type registered"
        );
    }

    /// Withdraw the aliases of a shell whose build failed, handing each one
    /// back to the type it pointed to before
    fn abandon(&self, shell: &Type, displaced: Vec<(String, Option<Type>)>) {
        for (alias, previous) in displaced.into_iter().rev() {
            let removed = self
                .by_name
                .remove_if(&alias, |_, registered| Type::ptr_eq(registered, shell));
            if let (Some(_), Some(previous)) = (removed, previous) {
                self.by_name.insert(alias, previous);
            }
        }
        debug!(type_name = %shell, "type registration abandoned");
    }
}
