//! Boxed, copy-carrying values for generic property exchange
//!
//! Only clonable types can be boxed; the descriptor layer refuses boxed
//! exchange for properties whose declared type is not `Clone`.

use std::any::Any;
use std::fmt;

use crate::error::{MirrorError, MirrorResult};
use crate::identity::TypeIdentity;

/// Object-safe clone for boxed payloads
trait CloneAny {
    fn clone_box(&self) -> Box<dyn CloneAny>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Payload paired with the clone function captured when it was boxed
struct Payload<V> {
    value: V,
    cloner: fn(&V) -> V,
}

impl<V: Any> CloneAny for Payload<V> {
    fn clone_box(&self) -> Box<dyn CloneAny> {
        Box::new(Payload {
            value: (self.cloner)(&self.value),
            cloner: self.cloner,
        })
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.value
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        Box::new(self.value)
    }
}

/// Type-erased value of a clonable type
pub struct Boxed {
    value: Box<dyn CloneAny>,
    identity: TypeIdentity,
}

impl Boxed {
    /// Box a value
    pub fn new<V: Any + Clone>(value: V) -> Self {
        Self::from_parts(value, V::clone)
    }

    pub(crate) fn from_parts<V: Any>(value: V, cloner: fn(&V) -> V) -> Self {
        Self {
            value: Box::new(Payload { value, cloner }),
            identity: TypeIdentity::of::<V>(),
        }
    }

    /// Identity of the carried type
    pub fn identity(&self) -> TypeIdentity {
        self.identity
    }

    /// Name of the carried type
    pub fn type_name(&self) -> &'static str {
        self.identity.type_name()
    }

    /// Check the carried type
    pub fn is<V: Any>(&self) -> bool {
        self.identity.is::<V>()
    }

    /// Borrow the payload as `V`
    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        self.value.as_any().downcast_ref::<V>()
    }

    /// Mutably borrow the payload as `V`
    pub fn downcast_mut<V: Any>(&mut self) -> Option<&mut V> {
        self.value.as_any_mut().downcast_mut::<V>()
    }

    /// Take the payload as `V`
    pub fn take<V: Any>(self) -> MirrorResult<V> {
        if !self.is::<V>() {
            return Err(MirrorError::type_mismatch(
                "boxed value",
                std::any::type_name::<V>(),
                self.type_name(),
            ));
        }
        let actual = self.type_name();
        self.value
            .into_any()
            .downcast::<V>()
            .map(|v| *v)
            .map_err(|_| MirrorError::type_mismatch("boxed value", std::any::type_name::<V>(), actual))
    }

    pub(crate) fn as_any(&self) -> &dyn Any {
        self.value.as_any()
    }

    pub(crate) fn into_any(self) -> Box<dyn Any> {
        self.value.into_any()
    }
}

impl Clone for Boxed {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone_box(),
            identity: self.identity,
        }
    }
}

impl fmt::Debug for Boxed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Boxed<{}>", self.identity.type_name())
    }
}
