//! Base linking and member propagation

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::members::{Member, Members};
use super::{Class, Descendant};
use crate::error::{MirrorError, MirrorResult};
use crate::identity::Scope;
use crate::method::Method;
use crate::property::Property;
use crate::registry;
use crate::upcast::Upcast;

/// Members that can be copied into an heir
pub(super) trait Inherit: Member + Sized {
    fn rehomed(&self, holder: Scope, upcast: &Upcast) -> Self;
}

impl Inherit for Property {
    fn rehomed(&self, holder: Scope, upcast: &Upcast) -> Self {
        self.rehome(holder, upcast)
    }
}

impl Inherit for Method {
    fn rehomed(&self, holder: Scope, upcast: &Upcast) -> Self {
        self.rehome(holder, upcast)
    }
}

/// Selects one of a class's member lists
pub(super) type ListOf<M> = fn(&Class) -> &RwLock<Members<M>>;

fn properties(class: &Class) -> &RwLock<Members<Property>> {
    &class.properties
}

fn methods(class: &Class) -> &RwLock<Members<Method>> {
    &class.methods
}

/// Link `base` (and, first, every ancestor of `base`) into `heir`
///
/// `upcast` adjusts `heir` objects to `base`.
pub(super) fn link_base(heir: &Arc<Class>, base: &Arc<Class>, upcast: Upcast) {
    heir.links.write().bases.push(Arc::downgrade(base));
    {
        let mut links = base.links.write();
        if !links.heirs.iter().any(|h| h.ptr_eq(&Arc::downgrade(heir))) {
            links.heirs.push(Arc::downgrade(heir));
        }
    }

    let ancestors: Vec<Weak<Class>> = base
        .links
        .read()
        .lineage
        .iter()
        .filter(|entry| entry.scope.identity != base.identity())
        .map(|entry| entry.class.clone())
        .collect();

    for ancestor in ancestors.iter().filter_map(Weak::upgrade) {
        let Some(to_ancestor) = ancestor.upcast_from(base.identity()) else {
            warn!(
                "{} lists {} in its lineage without an upcast",
                base.name(),
                ancestor.name()
            );
            continue;
        };
        link_one(heir, &ancestor, upcast.then(&to_ancestor));
    }
    link_one(heir, base, upcast);
}

fn link_one(heir: &Arc<Class>, ancestor: &Arc<Class>, upcast: Upcast) {
    {
        let mut links = ancestor.links.write();
        if links.descendants.iter().any(|d| d.identity == heir.identity()) {
            debug!(
                "{} already inherits {}; skipping repeated base",
                heir.name(),
                ancestor.name()
            );
            return;
        }
        links.descendants.push(Descendant {
            identity: heir.identity(),
            class: Arc::downgrade(heir),
            upcast: upcast.clone(),
        });
    }

    heir.links.write().lineage.push(super::LineageEntry {
        scope: ancestor.scope,
        class: Arc::downgrade(ancestor),
    });
    copy_declared(heir, ancestor, &upcast, properties);
    copy_declared(heir, ancestor, &upcast, methods);
}

fn copy_declared<M: Inherit>(heir: &Class, ancestor: &Class, upcast: &Upcast, list: ListOf<M>) {
    let declared = list(ancestor).read().declared_by(ancestor.identity());
    let mut target = list(heir).write();
    for member in declared {
        target.push(Arc::new(member.rehomed(heir.scope, upcast)));
    }
}

/// Append a class's own members after every inherited group and close its
/// lineage with itself
pub(super) fn seal(class: &Arc<Class>, own_properties: Vec<Property>, own_methods: Vec<Method>) {
    push_own(class, properties, own_properties);
    push_own(class, methods, own_methods);
    class.links.write().lineage.push(super::LineageEntry {
        scope: class.scope,
        class: Arc::downgrade(class),
    });
}

fn push_own<M: Inherit>(class: &Class, list: ListOf<M>, own: Vec<M>) {
    let mut target = list(class).write();
    for member in own {
        if target.declares(class.identity(), member.member_name()) {
            warn!(
                "Duplicate member {}.{} skipped",
                class.name(),
                member.member_name()
            );
            continue;
        }
        target.push(Arc::new(member));
    }
}

/// Declare a late member on `class`, then copy it into every descendant
/// registered so far
fn declare<M: Inherit>(class: &Class, list: ListOf<M>, member: Arc<M>) -> MirrorResult<()> {
    let _guard = registry::bootstrap_guard();

    {
        let mut own = list(class).write();
        if own.declares(class.identity(), member.member_name()) {
            return Err(MirrorError::DuplicateMember {
                class: class.name().to_string(),
                member: member.member_name().to_string(),
            });
        }
        own.push(member.clone());
    }

    let descendants: Vec<(Weak<Class>, Upcast)> = class
        .links
        .read()
        .descendants
        .iter()
        .map(|d| (d.class.clone(), d.upcast.clone()))
        .collect();

    for (heir, upcast) in descendants {
        let Some(heir) = heir.upgrade() else {
            continue;
        };
        let lineage = heir.lineage();
        let Some(group) = lineage.iter().position(|s| s.identity == class.identity()) else {
            warn!(
                "{} is a descendant of {} but not in its lineage",
                heir.name(),
                class.name()
            );
            continue;
        };
        let copy = Arc::new(member.rehomed(heir.scope, &upcast));
        list(&heir).write().insert_grouped(copy, &lineage, group);
        debug!(
            "Propagated {}.{} to {}",
            class.name(),
            member.member_name(),
            heir.name()
        );
    }
    Ok(())
}

pub(super) fn declare_property(class: &Class, property: Arc<Property>) -> MirrorResult<()> {
    declare(class, properties, property)
}

pub(super) fn declare_method(class: &Class, method: Arc<Method>) -> MirrorResult<()> {
    declare(class, methods, method)
}
