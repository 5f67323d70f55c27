//! Registration builder handed to [`Reflect::register`]

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{link, Class};
use crate::enums::{self, ReflectEnum};
use crate::identity::Scope;
use crate::method::{IntoMethod, Method};
use crate::object::{Reflect, Reflected};
use crate::property::{Property, PropertySpec};
use crate::upcast::Upcast;

/// Collects the bases and members of `T` during registration
///
/// ```ignore
/// impl Reflect for Cat {
///     const NAME: &'static str = "Cat";
///
///     fn register(class: &mut ClassBuilder<Self>) {
///         class
///             .base::<Pet>(|c| &c.pet, |c| &mut c.pet)
///             .field("lives", |c| &c.lives, |c| &mut c.lives)
///             .computed::<bool>("alive", |p| p.getter(Cat::alive))
///             .method("meow", Cat::meow)
///             .default_constructible();
///     }
/// }
/// ```
pub struct ClassBuilder<T> {
    scope: Scope,
    bases: Vec<(Arc<Class>, Upcast)>,
    properties: Vec<Property>,
    methods: Vec<Method>,
    default: Option<fn() -> Box<dyn Any>>,
    reflected: Option<fn() -> Box<dyn Reflected>>,
    _marker: PhantomData<fn() -> T>,
}

fn make_default<T: Default + Any>() -> Box<dyn Any> {
    Box::new(T::default())
}

fn make_reflected<T: Default + Reflect>() -> Box<dyn Reflected> {
    Box::new(T::default())
}

impl<T: Reflect> ClassBuilder<T> {
    pub(crate) fn new(scope: Scope) -> Self {
        Self {
            scope,
            bases: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            default: None,
            reflected: None,
            _marker: PhantomData,
        }
    }

    /// Declare `B` as a base embedded in `T`
    ///
    /// Registers `B` first if needed. Bases are linked in declaration order.
    pub fn base<B: Reflect>(&mut self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B) -> &mut Self {
        let class = Class::of::<B>();
        self.bases.push((class, Upcast::step(get, get_mut)));
        self
    }

    /// Field of a clonable type
    pub fn field<V: Any + Clone>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self {
        self.property(PropertySpec::field(name, get, get_mut))
    }

    /// Field of a move-only type
    pub fn field_move_only<V: Any>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self {
        self.property(PropertySpec::field_move_only(name, get, get_mut))
    }

    /// Accessor-pair property configured by `configure`
    pub fn computed<V: Any + Clone>(
        &mut self,
        name: &'static str,
        configure: impl FnOnce(PropertySpec<T, V>) -> PropertySpec<T, V>,
    ) -> &mut Self {
        self.property(configure(PropertySpec::computed(name)))
    }

    /// Any fully described property
    pub fn property<V: Any>(&mut self, spec: PropertySpec<T, V>) -> &mut Self {
        self.properties.push(spec.build(self.scope));
        self
    }

    pub fn method<M>(&mut self, name: &'static str, f: impl IntoMethod<T, M>) -> &mut Self {
        self.method_with_text(name, f, "")
    }

    /// Method carrying free-form metadata text
    pub fn method_with_text<M>(
        &mut self,
        name: &'static str,
        f: impl IntoMethod<T, M>,
        text: &'static str,
    ) -> &mut Self {
        self.methods
            .push(Method::new(name, self.scope, f.into_method(), text));
        self
    }

    /// Make sure the class of a member type exists, so that the member's
    /// nested class resolves
    pub fn nested<V: Reflect>(&mut self) -> &mut Self {
        Class::of::<V>();
        self
    }

    /// Make sure the enum table of a member type exists
    pub fn enumeration<E: ReflectEnum>(&mut self) -> &mut Self {
        enums::of::<E>();
        self
    }

    pub fn default_constructible(&mut self) -> &mut Self
    where
        T: Default,
    {
        self.default = Some(make_default::<T>);
        self
    }

    /// Allow construction behind [`Reflected`] (implies default construction)
    pub fn reflected_constructible(&mut self) -> &mut Self
    where
        T: Default,
    {
        self.default = Some(make_default::<T>);
        self.reflected = Some(make_reflected::<T>);
        self
    }

    /// Link bases, then append own members
    pub(crate) fn finish(self, class: &Arc<Class>) {
        for (base, upcast) in self.bases {
            link::link_base(class, &base, upcast);
        }
        link::seal(class, self.properties, self.methods);
        class.set_constructors(self.default, self.reflected);
        class.mark_ready();
    }
}
