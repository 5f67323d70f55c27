//! Dotted-path resolution across nested registered types
//!
//! `"owner.address.city"` against `Pet` resolves to the chain
//! `[Pet.owner, Person.address, Address.city]`: every non-terminal segment
//! must name a property whose declared type is itself registered.
//!
//! Resolved chains are cached per class identity and path text. Any late
//! member declaration clears the cache.

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::class::Class;
use crate::error::{MirrorError, MirrorResult};
use crate::identity::TypeIdentity;
use crate::object::Reflected;
use crate::property::Property;
use crate::registry;

type PathKey = (TypeIdentity, Box<str>);

/// Global resolution cache keyed by class and path
static PATH_CACHE: LazyLock<DashMap<PathKey, Vec<Arc<Property>>>> = LazyLock::new(DashMap::new);

/// Resolve `path` against `class`; empty if any segment is missing or a
/// non-terminal segment has no nested class
pub fn resolve(class: &Class, path: &str) -> Vec<Arc<Property>> {
    let config = registry::config();
    let key: PathKey = (class.identity(), path.into());

    if config.path_cache {
        if let Some(chain) = PATH_CACHE.get(&key) {
            trace!("Path cache hit for {}.{}", class.name(), path);
            return chain.value().clone();
        }
        trace!("Path cache miss for {}.{}", class.name(), path);
    }

    let chain = walk(class, path, config.path_separator);
    if config.path_cache && !chain.is_empty() {
        PATH_CACHE.insert(key, chain.clone());
    }
    chain
}

fn walk(class: &Class, path: &str, separator: char) -> Vec<Arc<Property>> {
    let segments: Vec<&str> = path.split(separator).collect();
    let mut chain = Vec::with_capacity(segments.len());
    let mut nested: Option<Arc<Class>> = None;

    for (i, segment) in segments.iter().enumerate() {
        let found = match &nested {
            Some(current) => current.property(segment),
            None => class.property(segment),
        };
        let Some(property) = found else {
            return Vec::new();
        };
        if i + 1 < segments.len() {
            let Some(next) = property.nested_class() else {
                return Vec::new();
            };
            nested = Some(next);
        }
        chain.push(property);
    }
    chain
}

/// Like [`resolve`], reporting a miss as [`MirrorError::PathNotFound`]
pub fn resolve_checked(class: &Class, path: &str) -> MirrorResult<Vec<Arc<Property>>> {
    let chain = resolve(class, path);
    if chain.is_empty() {
        Err(MirrorError::PathNotFound {
            class: class.name().to_string(),
            path: path.to_string(),
        })
    } else {
        Ok(chain)
    }
}

/// Drop every cached chain
pub fn clear_cache() {
    PATH_CACHE.clear();
    debug!("Path cache cleared");
}

/// Number of cached chains
pub fn cache_size() -> usize {
    PATH_CACHE.len()
}

/// Resolve a batch of paths up front, warming the cache and surfacing
/// missing paths early
pub fn prefetch(class: &Class, paths: &[&str]) -> Vec<MirrorResult<Vec<Arc<Property>>>> {
    paths.iter().map(|path| resolve_checked(class, path)).collect()
}

fn qualified(property: &Property) -> String {
    format!("{}.{}", property.holder().name, property.name())
}

pub(crate) fn resolve_in<O: Reflected + ?Sized>(
    obj: &O,
    path: &str,
) -> MirrorResult<(*const u8, Arc<Property>)> {
    let chain = resolve_checked(&obj.class(), path)?;
    let Some((last, intermediates)) = chain.split_last() else {
        return Err(MirrorError::PathNotFound {
            class: obj.class().name().to_string(),
            path: path.to_string(),
        });
    };

    let mut this = obj.this_ptr();
    for step in intermediates {
        // SAFETY: `this` is the root object or the value reached by the
        // previous step, whose type is `step`'s holder
        this = unsafe { step.value_ptr(this)? };
    }
    Ok((this, last.clone()))
}

pub(crate) fn get_nested<V, O>(obj: &O, path: &str) -> MirrorResult<V>
where
    V: std::any::Any + Clone,
    O: Reflected + ?Sized,
{
    let (this, last) = resolve_in(obj, path)?;
    // SAFETY: `this` points to an object of `last`'s holder type
    unsafe { last.get_at(this) }
}

pub(crate) fn set_nested<V, O>(obj: &mut O, path: &str, value: V) -> MirrorResult<()>
where
    V: std::any::Any,
    O: Reflected + ?Sized,
{
    let chain = resolve_checked(&obj.class(), path)?;
    let Some((last, intermediates)) = chain.split_last() else {
        return Err(MirrorError::PathNotFound {
            class: obj.class().name().to_string(),
            path: path.to_string(),
        });
    };

    let mut this = obj.this_ptr_mut();
    for step in intermediates {
        if !step.can_move() {
            return Err(MirrorError::access_denied(&qualified(step), "write through"));
        }
        // SAFETY: `this` is the root object or the field reached by the
        // previous step, whose type is `step`'s holder
        this = unsafe { step.get_ptr_mut(this) }
            .ok_or_else(|| MirrorError::access_denied(&qualified(step), "write through"))?;
    }
    // SAFETY: `this` points to an object of `last`'s holder type, derived
    // from the exclusive borrow of `obj`
    unsafe { last.set_at(this, value) }
}
