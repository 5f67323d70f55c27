//! Ordered member list with name and type indices
//!
//! Members are grouped contiguously by declaring class. Groups follow the
//! holder's lineage: ancestors in link order first, the holder itself last.
//! The name index points at the last (most-derived) entry with that name;
//! the type index keeps every entry in order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::identity::{Scope, TypeIdentity};
use crate::method::Method;
use crate::property::Property;

/// What the list needs to know about an entry
pub(crate) trait Member {
    fn member_name(&self) -> &str;

    fn member_owner(&self) -> Scope;

    /// Key of the type index (declared type or signature identity)
    fn member_type(&self) -> TypeIdentity;
}

impl Member for Property {
    fn member_name(&self) -> &str {
        self.name()
    }

    fn member_owner(&self) -> Scope {
        self.owner()
    }

    fn member_type(&self) -> TypeIdentity {
        self.declared_type()
    }
}

impl Member for Method {
    fn member_name(&self) -> &str {
        self.name()
    }

    fn member_owner(&self) -> Scope {
        self.owner()
    }

    fn member_type(&self) -> TypeIdentity {
        self.signature().identity()
    }
}

pub(crate) struct Members<M> {
    items: Vec<Arc<M>>,
    by_name: HashMap<String, usize>,
    by_type: HashMap<TypeIdentity, Vec<usize>>,
}

impl<M: Member> Members<M> {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            by_name: HashMap::new(),
            by_type: HashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn at(&self, index: usize) -> Option<Arc<M>> {
        self.items.get(index).cloned()
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<M>> {
        self.by_name.get(name).map(|&i| self.items[i].clone())
    }

    pub(crate) fn first_of_type(&self, ty: TypeIdentity) -> Option<Arc<M>> {
        self.by_type
            .get(&ty)
            .and_then(|slots| slots.first())
            .map(|&i| self.items[i].clone())
    }

    pub(crate) fn all_of_type(&self, ty: TypeIdentity) -> Vec<Arc<M>> {
        self.by_type
            .get(&ty)
            .map(|slots| slots.iter().map(|&i| self.items[i].clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<M>> {
        self.items.clone()
    }

    /// Members declared by `owner`, in order
    pub(crate) fn declared_by(&self, owner: TypeIdentity) -> Vec<Arc<M>> {
        self.items
            .iter()
            .filter(|m| m.member_owner().identity == owner)
            .cloned()
            .collect()
    }

    /// Whether `owner` already declares a member called `name`
    pub(crate) fn declares(&self, owner: TypeIdentity, name: &str) -> bool {
        self.items
            .iter()
            .any(|m| m.member_owner().identity == owner && m.member_name() == name)
    }

    /// Append at the end (the holder's own group, or a group being linked)
    pub(crate) fn push(&mut self, member: Arc<M>) {
        let index = self.items.len();
        self.by_name.insert(member.member_name().to_string(), index);
        self.by_type.entry(member.member_type()).or_default().push(index);
        self.items.push(member);
    }

    /// Insert a member declared by `lineage[group]` after the last entry
    /// whose owner belongs to `lineage[..=group]`, or at the front if there
    /// is none
    pub(crate) fn insert_grouped(&mut self, member: Arc<M>, lineage: &[Scope], group: usize) {
        if lineage.is_empty() {
            self.push(member);
            return;
        }
        let upto = &lineage[..=group.min(lineage.len() - 1)];
        let position = self
            .items
            .iter()
            .rposition(|m| upto.iter().any(|s| s.identity == m.member_owner().identity))
            .map_or(0, |i| i + 1);

        if position == self.items.len() {
            self.push(member);
        } else {
            self.items.insert(position, member);
            self.reindex();
        }
    }

    fn reindex(&mut self) {
        self.by_name.clear();
        self.by_type.clear();
        for (index, member) in self.items.iter().enumerate() {
            self.by_name.insert(member.member_name().to_string(), index);
            self.by_type.entry(member.member_type()).or_default().push(index);
        }
    }
}
