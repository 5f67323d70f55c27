//! Process-stable type identity

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Opaque, hashable key for a native type
///
/// Equality and hashing use only the `TypeId`; the name is carried for
/// diagnostics and never compared.
#[derive(Clone, Copy)]
pub struct TypeIdentity {
    id: TypeId,
    name: &'static str,
}

impl TypeIdentity {
    /// Identity of `T`
    #[inline]
    pub fn of<T: ?Sized + Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Native `TypeId`
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Native type name (as reported by `std::any::type_name`)
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Check whether this identity denotes `T`
    #[inline]
    pub fn is<T: ?Sized + Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeIdentity {}

impl Hash for TypeIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialEq<TypeId> for TypeIdentity {
    fn eq(&self, other: &TypeId) -> bool {
        self.id == *other
    }
}

impl From<TypeIdentity> for TypeId {
    fn from(identity: TypeIdentity) -> Self {
        identity.id
    }
}

impl fmt::Debug for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeIdentity({})", self.name)
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A registered class as seen from one of its members
///
/// `owner` scopes name the declaring class; `holder` scopes name the class
/// whose member list holds a (possibly inherited) copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Scope {
    /// Identity of the class type
    pub identity: TypeIdentity,
    /// Registered class name
    pub name: &'static str,
}

impl Scope {
    pub fn of<T: Any>(name: &'static str) -> Self {
        Self {
            identity: TypeIdentity::of::<T>(),
            name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_equality() {
        assert_eq!(TypeIdentity::of::<i32>(), TypeIdentity::of::<i32>());
        assert_ne!(TypeIdentity::of::<i32>(), TypeIdentity::of::<u32>());
        assert!(TypeIdentity::of::<String>().is::<String>());
    }

    #[test]
    fn test_identity_hashable() {
        let mut set = HashSet::new();
        set.insert(TypeIdentity::of::<bool>());
        set.insert(TypeIdentity::of::<bool>());
        set.insert(TypeIdentity::of::<i64>());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_identity_name() {
        assert_eq!(TypeIdentity::of::<u8>().type_name(), "u8");
        assert_eq!(TypeIdentity::of::<u8>().to_string(), "u8");
    }
}
