//! Class registry entries
//!
//! One [`Class`] exists per registered type. It owns the ordered property
//! and method lists (inherited entries included), the direct base and heir
//! edges, and the upcast table keyed by every transitive descendant.
//!
//! # Inheritance
//!
//! A derived type embeds its bases as fields and names them in its
//! registration. Linking copies each ancestor's members into the heir with
//! the heir-to-ancestor upcast attached:
//!
//! ```text
//!          Animal                Cat.properties
//!         /      \               ┌──────────────────────┐
//!      Pet        Furious        │ Animal.name  (->pet->animal)
//!         \      /               │ Pet.owner    (->pet)
//!           Cat                  │ Furious.claws (->furious)
//!                                │ Cat.lives    (identity)
//!                                └──────────────────────┘
//! ```
//!
//! `Animal` reaches `Cat` through both `Pet` and `Furious`; its members are
//! copied once, through the first path linked.

mod builder;
mod link;
mod members;

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{MirrorError, MirrorResult};
use crate::identity::{Scope, TypeIdentity};
use crate::method::{IntoMethod, Method};
use crate::object::{Reflect, Reflected};
use crate::property::{Property, PropertySpec};
use crate::upcast::Upcast;

pub use builder::ClassBuilder;
use members::Members;

/// Transitive descendant with the precomputed upcast to this class
struct Descendant {
    identity: TypeIdentity,
    class: Weak<Class>,
    upcast: Upcast,
}

/// One declaring group of a member list
struct LineageEntry {
    scope: Scope,
    class: Weak<Class>,
}

#[derive(Default)]
struct Links {
    bases: Vec<Weak<Class>>,
    heirs: Vec<Weak<Class>>,
    descendants: Vec<Descendant>,
    /// Declaring groups of this class's member lists, ancestors first
    lineage: Vec<LineageEntry>,
}

/// Construction hooks captured at registration
struct Constructors {
    default: fn() -> Box<dyn Any>,
    reflected: Option<fn() -> Box<dyn Reflected>>,
}

/// Registry entry for one type
pub struct Class {
    scope: Scope,
    properties: RwLock<Members<Property>>,
    methods: RwLock<Members<Method>>,
    links: RwLock<Links>,
    constructors: OnceLock<Constructors>,
    ready: OnceLock<()>,
}

impl Class {
    pub(crate) fn new(scope: Scope) -> Self {
        Self {
            scope,
            properties: RwLock::new(Members::new()),
            methods: RwLock::new(Members::new()),
            links: RwLock::new(Links::default()),
            constructors: OnceLock::new(),
            ready: OnceLock::new(),
        }
    }

    /// Registry entry for `T`, registering it on first use
    pub fn of<T: Reflect>() -> Arc<Class> {
        crate::registry::ensure::<T>()
    }

    /// Registered name
    pub fn name(&self) -> &'static str {
        self.scope.name
    }

    pub fn identity(&self) -> TypeIdentity {
        self.scope.identity
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Whether registration (including base linking) has completed
    pub fn is_ready(&self) -> bool {
        self.ready.get().is_some()
    }

    pub(crate) fn mark_ready(&self) {
        let _ = self.ready.set(());
    }

    // ==================== PROPERTIES ====================

    /// Every property in declaration order, inherited groups first
    pub fn properties(&self) -> Vec<Arc<Property>> {
        self.properties.read().snapshot()
    }

    pub fn properties_len(&self) -> usize {
        self.properties.read().len()
    }

    /// Most-derived property called `name`
    pub fn property(&self, name: &str) -> Option<Arc<Property>> {
        self.properties.read().get(name)
    }

    pub fn property_at(&self, index: usize) -> Option<Arc<Property>> {
        self.properties.read().at(index)
    }

    /// First property whose declared type is `ty`
    pub fn property_by_type(&self, ty: TypeIdentity) -> Option<Arc<Property>> {
        self.properties.read().first_of_type(ty)
    }

    /// Every property whose declared type is `ty`, in order
    pub fn properties_by_type(&self, ty: TypeIdentity) -> Vec<Arc<Property>> {
        self.properties.read().all_of_type(ty)
    }

    /// Like [`Class::property`], reporting a miss as an error
    pub fn find_property(&self, name: &str) -> MirrorResult<Arc<Property>> {
        self.property(name).ok_or_else(|| MirrorError::PropertyNotFound {
            class: self.name().to_string(),
            property: name.to_string(),
        })
    }

    // ==================== METHODS ====================

    pub fn methods(&self) -> Vec<Arc<Method>> {
        self.methods.read().snapshot()
    }

    pub fn methods_len(&self) -> usize {
        self.methods.read().len()
    }

    pub fn method(&self, name: &str) -> Option<Arc<Method>> {
        self.methods.read().get(name)
    }

    pub fn method_at(&self, index: usize) -> Option<Arc<Method>> {
        self.methods.read().at(index)
    }

    /// Every method whose signature identity is `signature`
    pub fn methods_by_signature(&self, signature: TypeIdentity) -> Vec<Arc<Method>> {
        self.methods.read().all_of_type(signature)
    }

    pub fn find_method(&self, name: &str) -> MirrorResult<Arc<Method>> {
        self.method(name).ok_or_else(|| MirrorError::MethodNotFound {
            class: self.name().to_string(),
            method: name.to_string(),
        })
    }

    // ==================== HIERARCHY ====================

    /// Direct bases in link order
    pub fn bases(&self) -> Vec<Arc<Class>> {
        self.links
            .read()
            .bases
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// The single direct base, or `None` with zero or several
    pub fn base(&self) -> Option<Arc<Class>> {
        let links = self.links.read();
        match links.bases.as_slice() {
            [only] => only.upgrade(),
            _ => None,
        }
    }

    /// Direct heirs registered so far
    pub fn heirs(&self) -> Vec<Arc<Class>> {
        self.links
            .read()
            .heirs
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Declaring groups of the member lists, ancestors first, this class last
    pub fn lineage(&self) -> Vec<Scope> {
        self.links.read().lineage.iter().map(|entry| entry.scope).collect()
    }

    /// Whether this class derives (directly or not) from `base`
    pub fn is_heir_of(&self, base: &Class) -> bool {
        base.upcast_from(self.identity()).is_some() && base.identity() != self.identity()
    }

    /// Upcast from `heir` to this class; identity for the class itself
    pub fn upcast_from(&self, heir: TypeIdentity) -> Option<Upcast> {
        if heir == self.identity() {
            return Some(Upcast::identity());
        }
        self.links
            .read()
            .descendants
            .iter()
            .find(|d| d.identity == heir)
            .map(|d| d.upcast.clone())
    }

    /// Adjust a pointer to a `heir` object into a pointer to its embedded
    /// instance of this class; `None` if unrelated
    ///
    /// # Safety
    /// `ptr` must point to a live object of type `heir`.
    pub unsafe fn cast(&self, heir: TypeIdentity, ptr: *const u8) -> Option<*const u8> {
        self.upcast_from(heir).map(|up| up.apply(ptr))
    }

    /// Mutable variant of [`Class::cast`]
    ///
    /// # Safety
    /// `ptr` must point to a live object of type `heir`, with write
    /// provenance.
    pub unsafe fn cast_mut(&self, heir: TypeIdentity, ptr: *mut u8) -> Option<*mut u8> {
        self.upcast_from(heir).map(|up| up.apply_mut(ptr))
    }

    // ==================== PATHS ====================

    /// Resolve a dotted path into its chain of properties; empty on a miss
    pub fn resolve(&self, path: &str) -> Vec<Arc<Property>> {
        crate::path::resolve(self, path)
    }

    // ==================== CONSTRUCTION ====================

    pub(crate) fn set_constructors(
        &self,
        default: Option<fn() -> Box<dyn Any>>,
        reflected: Option<fn() -> Box<dyn Reflected>>,
    ) {
        if let Some(default) = default {
            let _ = self.constructors.set(Constructors { default, reflected });
        }
    }

    pub fn is_default_constructible(&self) -> bool {
        self.constructors.get().is_some()
    }

    /// Default-construct an instance
    pub fn make_default(&self) -> Option<Box<dyn Any>> {
        self.constructors.get().map(|c| (c.default)())
    }

    /// Default-construct an instance behind the reflection interface
    pub fn make_reflected(&self) -> Option<Box<dyn Reflected>> {
        self.constructors
            .get()
            .and_then(|c| c.reflected)
            .map(|make| make())
    }

    // ==================== LATE MEMBERS ====================

    fn check_owner<T: Any>(&self, member: &str) -> MirrorResult<()> {
        if self.identity().is::<T>() {
            Ok(())
        } else {
            Err(MirrorError::type_mismatch(
                &format!("{}.{}", self.name(), member),
                self.identity().type_name(),
                std::any::type_name::<T>(),
            ))
        }
    }

    /// Declare a property on this class and copy it into every heir
    /// registered so far
    pub fn add_property<T: Any, V: Any>(&self, spec: PropertySpec<T, V>) -> MirrorResult<Arc<Property>> {
        self.check_owner::<T>(spec.name())?;
        let property = Arc::new(spec.build(self.scope));
        link::declare_property(self, property.clone())?;
        debug!("Added property {}.{}", self.name(), property.name());
        crate::path::clear_cache();
        Ok(property)
    }

    /// Declare a method on this class and copy it into every heir
    /// registered so far
    pub fn add_method<T: Any, M, F>(&self, name: &str, f: F) -> MirrorResult<Arc<Method>>
    where
        F: IntoMethod<T, M>,
    {
        self.check_owner::<T>(name)?;
        let method = Arc::new(Method::new(name, self.scope, f.into_method(), ""));
        link::declare_method(self, method.clone())?;
        debug!("Added method {}.{}", self.name(), name);
        Ok(method)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name())
            .field("type", &self.identity().type_name())
            .field("properties", &self.properties_len())
            .field("methods", &self.methods_len())
            .field("bases", &self.links.read().bases.len())
            .finish()
    }
}
