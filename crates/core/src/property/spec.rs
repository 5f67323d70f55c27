//! Registration-time property description

use std::any::Any;
use std::sync::Arc;

use super::access::{Getter, Setter, TypedAccess};
use super::Property;
use crate::identity::{Scope, TypeIdentity};

/// Typed description of one property of `T` with value type `V`
///
/// Turned into a [`Property`] when the class is built. Field properties
/// start with every accessor present; computed ones start empty and gain
/// accessors through the chained setters below.
///
/// ```ignore
/// builder.property(
///     PropertySpec::<Cat, i32>::computed("lives")
///         .getter(Cat::lives)
///         .setter(Cat::set_lives)
///         .text("remaining lives"),
/// );
/// ```
pub struct PropertySpec<T, V> {
    name: &'static str,
    getter: Option<Getter<T, V>>,
    setter: Option<Setter<T, V>>,
    mover: Option<Setter<T, V>>,
    cloner: Option<fn(&V) -> V>,
    boxed: bool,
    readonly: bool,
    text: &'static str,
}

impl<T: Any, V: Any> PropertySpec<T, V> {
    fn empty(name: &'static str, cloner: Option<fn(&V) -> V>) -> Self {
        Self {
            name,
            getter: None,
            setter: None,
            mover: None,
            cloner,
            boxed: true,
            readonly: false,
            text: "",
        }
    }

    /// Field of a clonable type
    pub fn field(name: &'static str, get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self
    where
        V: Clone,
    {
        let mut spec = Self::empty(name, Some(V::clone));
        spec.getter = Some(Getter::Field { get, get_mut });
        spec.setter = Some(Setter::Field(get_mut));
        spec
    }

    /// Field whose type can be moved but not cloned
    pub fn field_move_only(
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        let mut spec = Self::empty(name, None);
        spec.getter = Some(Getter::Field { get, get_mut });
        spec.mover = Some(Setter::Field(get_mut));
        spec
    }

    /// Accessor pair of a clonable type; add a getter and/or setter
    pub fn computed(name: &'static str) -> Self
    where
        V: Clone,
    {
        Self::empty(name, Some(V::clone))
    }

    /// Accessor pair of a move-only type
    pub fn computed_move_only(name: &'static str) -> Self {
        Self::empty(name, None)
    }

    /// By-value getter
    pub fn getter(mut self, get: fn(&T) -> V) -> Self {
        self.getter = Some(Getter::Value(get));
        self
    }

    /// Getter returning a reference into the object
    pub fn getter_ref(mut self, get: fn(&T) -> &V) -> Self {
        self.getter = Some(Getter::Ref(get));
        self
    }

    /// Setter taking the new value; also used for moves unless a dedicated
    /// mover is given
    pub fn setter(mut self, set: fn(&mut T, V)) -> Self {
        self.setter = Some(Setter::Method(set));
        self
    }

    /// Dedicated move-assignment function
    pub fn mover(mut self, mv: fn(&mut T, V)) -> Self {
        self.mover = Some(Setter::Method(mv));
        self
    }

    /// Drop every write accessor
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Attach free-form metadata text
    pub fn text(mut self, text: &'static str) -> Self {
        self.text = text;
        self
    }

    /// Disable boxed exchange
    pub fn no_boxed(mut self) -> Self {
        self.boxed = false;
        self
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn build(self, owner: Scope) -> Property {
        let qualified: Arc<str> = Arc::from(format!("{}.{}", owner.name, self.name));
        let (setter, mover) = if self.readonly {
            (None, None)
        } else {
            (self.setter, self.mover)
        };
        let access = TypedAccess {
            name: qualified,
            getter: self.getter,
            setter,
            mover,
            cloner: self.cloner,
            boxed: self.boxed,
        };
        Property::new(
            Arc::from(self.name),
            TypeIdentity::of::<V>(),
            owner,
            Arc::new(access),
            Arc::from(self.text),
        )
    }
}
