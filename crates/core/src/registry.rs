//! Global class registry and lifecycle
//!
//! Classes are registered lazily by [`Class::of`] or eagerly by
//! [`bootstrap`], and live until [`teardown`]. Registration runs under a
//! re-entrant lock so that registering a type may register its bases and
//! nested types first.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};
use tracing::{debug, info, trace, warn};

use crate::class::{Class, ClassBuilder};
use crate::config::MirrorConfig;
use crate::error::{MirrorError, MirrorResult};
use crate::identity::{Scope, TypeIdentity};
use crate::object::Reflect;

#[derive(Default)]
struct Registry {
    by_type: HashMap<TypeIdentity, Arc<Class>>,
    by_name: HashMap<&'static str, Arc<Class>>,
    /// Registration order
    order: Vec<Arc<Class>>,
}

static REGISTRY: LazyLock<RwLock<Registry>> = LazyLock::new(|| RwLock::new(Registry::default()));

/// Serializes registration and late member declaration
static BOOTSTRAP: LazyLock<ReentrantMutex<()>> = LazyLock::new(|| ReentrantMutex::new(()));

/// Installed configuration; `None` until [`init`]
static CONFIG: LazyLock<RwLock<Option<MirrorConfig>>> = LazyLock::new(|| RwLock::new(None));

pub(crate) fn bootstrap_guard() -> ReentrantMutexGuard<'static, ()> {
    BOOTSTRAP.lock()
}

/// Install the process-wide configuration
///
/// Fails with [`MirrorError::AlreadyInitialized`] until [`teardown`] runs.
pub fn init(config: MirrorConfig) -> MirrorResult<()> {
    let mut slot = CONFIG.write();
    if slot.is_some() {
        return Err(MirrorError::AlreadyInitialized);
    }
    info!(
        "Reflection registry initialized (config v{}, separator '{}', path cache {})",
        config.version,
        config.path_separator,
        if config.path_cache { "on" } else { "off" }
    );
    *slot = Some(config);
    Ok(())
}

/// Whether [`init`] has run since the last [`teardown`]
pub fn is_initialized() -> bool {
    CONFIG.read().is_some()
}

/// Current configuration (defaults before [`init`])
pub fn config() -> MirrorConfig {
    CONFIG.read().clone().unwrap_or_default()
}

fn log_registration(class: &Class) {
    let verbose = CONFIG
        .read()
        .as_ref()
        .map_or(true, |config| config.trace_registration);
    if verbose {
        debug!(
            "Registered class {} ({} properties, {} methods, {} bases)",
            class.name(),
            class.properties_len(),
            class.methods_len(),
            class.bases().len()
        );
    } else {
        trace!("Registered class {}", class.name());
    }
}

/// Registry entry for `T`, registering it (and its bases) on first use
pub(crate) fn ensure<T: Reflect>() -> Arc<Class> {
    let identity = TypeIdentity::of::<T>();
    if let Some(class) = find(identity).filter(|c| c.is_ready()) {
        return class;
    }

    let _guard = BOOTSTRAP.lock();
    if let Some(class) = find(identity) {
        if !class.is_ready() {
            // only this thread can hold the lock while the class is unfinished
            warn!("Re-entrant registration of {} while it is still being built", class.name());
        }
        return class;
    }

    let scope = Scope::of::<T>(T::NAME);
    let class = Arc::new(Class::new(scope));
    insert(class.clone());

    let mut builder = ClassBuilder::<T>::new(scope);
    T::register(&mut builder);
    builder.finish(&class);

    log_registration(&class);
    class
}

fn insert(class: Arc<Class>) {
    let mut registry = REGISTRY.write();
    if let Some(previous) = registry.by_name.get(class.name()) {
        if previous.identity() != class.identity() {
            warn!(
                "Class name {} is registered by both {} and {}; name lookup keeps the latest",
                class.name(),
                previous.identity(),
                class.identity()
            );
        }
    }
    registry.by_type.insert(class.identity(), class.clone());
    registry.by_name.insert(class.name(), class.clone());
    registry.order.push(class);
}

/// Register `T` eagerly; repeated calls return the same class
pub fn bootstrap<T: Reflect>() -> Arc<Class> {
    ensure::<T>()
}

/// Class registered for `identity`
pub fn find(identity: TypeIdentity) -> Option<Arc<Class>> {
    REGISTRY.read().by_type.get(&identity).cloned()
}

/// Class registered under `name`
pub fn find_by_name(name: &str) -> Option<Arc<Class>> {
    REGISTRY.read().by_name.get(name).cloned()
}

/// Like [`find_by_name`], reporting a miss as an error
pub fn lookup(name: &str) -> MirrorResult<Arc<Class>> {
    find_by_name(name).ok_or_else(|| MirrorError::ClassNotFound(name.to_string()))
}

/// Every registered class in registration order
pub fn classes() -> Vec<Arc<Class>> {
    REGISTRY.read().order.clone()
}

/// Number of registered classes
pub fn len() -> usize {
    REGISTRY.read().order.len()
}

pub fn is_empty() -> bool {
    len() == 0
}

/// Drop every class and enum table, clear caches and the installed
/// configuration
///
/// Descriptors still held by callers stay usable; classes registered again
/// afterwards are new entries.
pub fn teardown() {
    let _guard = BOOTSTRAP.lock();
    let dropped = {
        let mut registry = REGISTRY.write();
        let count = registry.order.len();
        *registry = Registry::default();
        count
    };
    crate::enums::clear();
    crate::path::clear_cache();
    crate::scratch::clear();
    *CONFIG.write() = None;
    info!("Reflection registry torn down ({} classes dropped)", dropped);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        _value: u32,
    }

    impl Reflect for Probe {
        const NAME: &'static str = "registry::Probe";

        fn register(class: &mut ClassBuilder<Self>) {
            class.field("value", |p| &p._value, |p| &mut p._value);
        }
    }

    #[test]
    fn test_lazy_registration_is_stable() {
        let first = Class::of::<Probe>();
        let second = bootstrap::<Probe>();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.properties_len(), 1);
        assert!(first.is_ready());
    }

    #[test]
    fn test_find_by_identity_and_name() {
        let class = Class::of::<Probe>();
        let by_type = find(TypeIdentity::of::<Probe>()).unwrap();
        let by_name = find_by_name("registry::Probe").unwrap();
        assert!(Arc::ptr_eq(&class, &by_type));
        assert!(Arc::ptr_eq(&class, &by_name));
        assert!(classes().iter().any(|c| Arc::ptr_eq(c, &class)));
        assert!(len() >= 1);
    }

    #[test]
    fn test_lookup_miss() {
        assert!(find_by_name("registry::Nothing").is_none());
        assert!(matches!(
            lookup("registry::Nothing"),
            Err(MirrorError::ClassNotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_first_use() {
        struct Shared {
            a: i64,
        }

        impl Reflect for Shared {
            const NAME: &'static str = "registry::Shared";

            fn register(class: &mut ClassBuilder<Self>) {
                class.field("a", |s| &s.a, |s| &mut s.a);
            }
        }

        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(Class::of::<Shared>))
            .collect();
        let classes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for class in &classes {
            assert!(Arc::ptr_eq(class, &classes[0]));
            assert_eq!(class.properties_len(), 1);
        }
    }
}
