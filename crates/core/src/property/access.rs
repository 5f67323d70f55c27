//! Typed accessors behind the erased property interface
//!
//! Each property stores one `TypedAccess<T, V>` (object type `T`, value type
//! `V`) behind `dyn ErasedAccess`. Callers hand in raw object pointers of the
//! owner type; the descriptor layer has already applied the upcast and
//! checked the value type before any of these are reached.

use std::any::Any;

use super::{AccessKind, PropertyFlags};
use crate::error::{MirrorError, MirrorResult};
use crate::scratch;
use crate::value::Boxed;

/// How a property is read
pub(crate) enum Getter<T, V> {
    /// Field projection; the address is the member's storage
    Field {
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    },
    /// Getter returning a reference with a stable address
    Ref(fn(&T) -> &V),
    /// Getter returning by value
    Value(fn(&T) -> V),
}

/// How a property is written (copy or move)
pub(crate) enum Setter<T, V> {
    /// Assign through a field projection
    Field(fn(&mut T) -> &mut V),
    /// Route through a setter function taking the value
    Method(fn(&mut T, V)),
}

impl<T, V> Clone for Getter<T, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Field { get, get_mut } => Self::Field {
                get: *get,
                get_mut: *get_mut,
            },
            Self::Ref(f) => Self::Ref(*f),
            Self::Value(f) => Self::Value(*f),
        }
    }
}

impl<T, V> Clone for Setter<T, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Field(f) => Self::Field(*f),
            Self::Method(f) => Self::Method(*f),
        }
    }
}

/// Object-type-erased property operations
pub(crate) trait ErasedAccess: Send + Sync {
    fn kind(&self) -> AccessKind;

    fn flags(&self) -> PropertyFlags;

    /// Stable address of the value (field storage or reference getter)
    unsafe fn address(&self, this: *const u8) -> Option<*const u8>;

    /// Writable address of the value (field storage only)
    unsafe fn address_mut(&self, this: *mut u8) -> Option<*mut u8>;

    /// Address of the value, parking by-value getter results in the
    /// per-thread scratch slot
    unsafe fn value_ptr(&self, this: *const u8) -> Option<*const u8>;

    /// Read into `out`, which must be `Option<V>`
    unsafe fn read_into(&self, this: *const u8, out: &mut dyn Any) -> MirrorResult<()>;

    /// Copy-assign from `value`, which must be `&V`
    unsafe fn write_from(&self, this: *mut u8, value: &dyn Any) -> MirrorResult<()>;

    /// Move-assign from `value`, which must be `Option<V>` holding a value
    unsafe fn move_from(&self, this: *mut u8, value: &mut dyn Any) -> MirrorResult<()>;

    /// Move-assign from a boxed `V`
    unsafe fn move_boxed(&self, this: *mut u8, value: Box<dyn Any>) -> MirrorResult<()>;

    /// Copy the value out into a box
    unsafe fn read_boxed(&self, this: *const u8) -> MirrorResult<Boxed>;
}

pub(crate) struct TypedAccess<T, V> {
    pub(crate) name: std::sync::Arc<str>,
    pub(crate) getter: Option<Getter<T, V>>,
    pub(crate) setter: Option<Setter<T, V>>,
    pub(crate) mover: Option<Setter<T, V>>,
    pub(crate) cloner: Option<fn(&V) -> V>,
    pub(crate) boxed: bool,
}

impl<T: 'static, V: 'static> TypedAccess<T, V> {
    fn denied(&self, operation: &'static str) -> MirrorError {
        MirrorError::access_denied(&self.name, operation)
    }

    fn mismatch(&self, actual: &str) -> MirrorError {
        MirrorError::type_mismatch(&self.name, std::any::type_name::<V>(), actual)
    }

    unsafe fn assign(&self, this: *mut u8, value: V, via: &Setter<T, V>) {
        let object = &mut *(this as *mut T);
        match via {
            Setter::Field(project) => *project(object) = value,
            Setter::Method(setter) => setter(object, value),
        }
    }

    unsafe fn do_move(&self, this: *mut u8, value: V) -> MirrorResult<()> {
        // a setter doubles as the mover when no dedicated one exists
        let via = self
            .mover
            .as_ref()
            .or(self.setter.as_ref())
            .ok_or_else(|| self.denied("move"))?;
        self.assign(this, value, via);
        Ok(())
    }

    unsafe fn copy_out(&self, this: *const u8) -> MirrorResult<V> {
        let getter = self.getter.as_ref().ok_or_else(|| self.denied("read"))?;
        let object = &*(this as *const T);
        match getter {
            Getter::Value(get) => Ok(get(object)),
            Getter::Field { get, .. } | Getter::Ref(get) => {
                let cloner = self
                    .cloner
                    .ok_or_else(|| MirrorError::NotCopyConstructible(std::any::type_name::<V>().to_string()))?;
                Ok(cloner(get(object)))
            }
        }
    }
}

impl<T: 'static, V: 'static> ErasedAccess for TypedAccess<T, V> {
    fn kind(&self) -> AccessKind {
        match &self.getter {
            Some(Getter::Field { .. }) => AccessKind::Field,
            Some(Getter::Ref(_)) => AccessKind::Projected,
            Some(Getter::Value(_)) => AccessKind::Computed,
            None => match &self.setter {
                Some(Setter::Field(_)) => AccessKind::Field,
                _ => AccessKind::Computed,
            },
        }
    }

    fn flags(&self) -> PropertyFlags {
        let mut flags = PropertyFlags::empty();
        let clonable = self.cloner.is_some();

        if self.getter.is_some() {
            flags |= PropertyFlags::READ;
        }
        if self.setter.is_some() && clonable {
            flags |= PropertyFlags::WRITE;
        }
        if self.mover.is_some() || self.setter.is_some() {
            flags |= PropertyFlags::MOVE;
        }
        if self.boxed && clonable {
            flags |= PropertyFlags::BOXED;
        }
        if clonable {
            flags |= PropertyFlags::COPY_CONSTRUCTIBLE | PropertyFlags::COPY_ASSIGNABLE;
        }
        if matches!(self.getter, Some(Getter::Field { .. }) | Some(Getter::Ref(_))) {
            flags |= PropertyFlags::ADDRESSABLE;
        }
        flags
    }

    unsafe fn address(&self, this: *const u8) -> Option<*const u8> {
        let object = &*(this as *const T);
        match self.getter.as_ref()? {
            Getter::Field { get, .. } | Getter::Ref(get) => Some(get(object) as *const V as *const u8),
            Getter::Value(_) => None,
        }
    }

    unsafe fn address_mut(&self, this: *mut u8) -> Option<*mut u8> {
        match self.getter.as_ref()? {
            Getter::Field { get_mut, .. } => {
                let object = &mut *(this as *mut T);
                Some(get_mut(object) as *mut V as *mut u8)
            }
            _ => None,
        }
    }

    unsafe fn value_ptr(&self, this: *const u8) -> Option<*const u8> {
        match self.getter.as_ref()? {
            Getter::Value(get) => {
                let value = get(&*(this as *const T));
                Some(scratch::park(value))
            }
            _ => self.address(this),
        }
    }

    unsafe fn read_into(&self, this: *const u8, out: &mut dyn Any) -> MirrorResult<()> {
        let actual = "unknown output slot";
        let slot = out
            .downcast_mut::<Option<V>>()
            .ok_or_else(|| self.mismatch(actual))?;
        *slot = Some(self.copy_out(this)?);
        Ok(())
    }

    unsafe fn write_from(&self, this: *mut u8, value: &dyn Any) -> MirrorResult<()> {
        let setter = self.setter.as_ref().ok_or_else(|| self.denied("write"))?;
        let cloner = self
            .cloner
            .ok_or_else(|| MirrorError::NotCopyConstructible(std::any::type_name::<V>().to_string()))?;
        let value = value
            .downcast_ref::<V>()
            .ok_or_else(|| self.mismatch("unknown value"))?;
        self.assign(this, cloner(value), setter);
        Ok(())
    }

    unsafe fn move_from(&self, this: *mut u8, value: &mut dyn Any) -> MirrorResult<()> {
        let slot = value
            .downcast_mut::<Option<V>>()
            .ok_or_else(|| self.mismatch("unknown value"))?;
        let value = slot.take().ok_or_else(|| self.denied("move from an empty slot"))?;
        self.do_move(this, value)
    }

    unsafe fn move_boxed(&self, this: *mut u8, value: Box<dyn Any>) -> MirrorResult<()> {
        let value = value
            .downcast::<V>()
            .map_err(|_| self.mismatch("boxed value of another type"))?;
        self.do_move(this, *value)
    }

    unsafe fn read_boxed(&self, this: *const u8) -> MirrorResult<Boxed> {
        let cloner = self
            .cloner
            .ok_or_else(|| MirrorError::NotCopyConstructible(std::any::type_name::<V>().to_string()))?;
        if !self.boxed {
            return Err(self.denied("box"));
        }
        let value = self.copy_out(this)?;
        Ok(Boxed::from_parts(value, cloner))
    }
}
