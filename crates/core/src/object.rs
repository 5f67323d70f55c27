//! Reflected objects and object-level helpers

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use crate::class::{Class, ClassBuilder};
use crate::error::MirrorResult;
use crate::identity::TypeIdentity;
use crate::property::Property;

/// A type with a class in the registry
///
/// Usually derived with `#[derive(Reflect)]`.
pub trait Reflect: Any + Sized {
    /// Registered class name
    const NAME: &'static str;

    /// Declare bases and members
    fn register(class: &mut ClassBuilder<Self>);
}

/// Object-safe view of a reflected value
pub trait Reflected: Any {
    fn class(&self) -> Arc<Class>;

    fn identity(&self) -> TypeIdentity;

    fn this_ptr(&self) -> *const u8;

    fn this_ptr_mut(&mut self) -> *mut u8;
}

impl<T: Reflect> Reflected for T {
    fn class(&self) -> Arc<Class> {
        Class::of::<T>()
    }

    fn identity(&self) -> TypeIdentity {
        TypeIdentity::of::<T>()
    }

    fn this_ptr(&self) -> *const u8 {
        self as *const T as *const u8
    }

    fn this_ptr_mut(&mut self) -> *mut u8 {
        self as *mut T as *mut u8
    }
}

/// Store `value` into the property `name` of `obj`
pub fn set_value<V: Any, O: Reflected + ?Sized>(obj: &mut O, name: &str, value: V) -> MirrorResult<()> {
    obj.class().find_property(name)?.set(obj, value)
}

/// Read a copy of the property `name` of `obj`
pub fn get_value<V: Any + Clone, O: Reflected + ?Sized>(obj: &O, name: &str) -> MirrorResult<V> {
    obj.class().find_property(name)?.get(obj)
}

/// Store `value` at the end of the dotted `path`
pub fn set_nested<V: Any, O: Reflected + ?Sized>(obj: &mut O, path: &str, value: V) -> MirrorResult<()> {
    crate::path::set_nested(obj, path, value)
}

/// Read a copy of the value at the end of the dotted `path`
pub fn get_nested<V: Any + Clone, O: Reflected + ?Sized>(obj: &O, path: &str) -> MirrorResult<V> {
    crate::path::get_nested(obj, path)
}

/// Address of the object holding the last property of `path`, with that
/// property
///
/// The address stays valid while `obj` is borrowed and not moved, unless a
/// computed intermediate parked it in the per-thread scratch slot.
pub fn resolve_in<O: Reflected + ?Sized>(obj: &O, path: &str) -> MirrorResult<(*const u8, Arc<Property>)> {
    crate::path::resolve_in(obj, path)
}

/// Borrow the embedded `B` inside `obj`, if `B` is `obj`'s class or one of
/// its ancestors
pub fn upcast_ref<B: Reflect, O: Reflected + ?Sized>(obj: &O) -> Option<&B> {
    let base = Class::of::<B>();
    // SAFETY: the upcast for `obj.identity()` was built from projections
    // over that exact type
    unsafe {
        base.cast(obj.identity(), obj.this_ptr())
            .map(|ptr| &*(ptr as *const B))
    }
}

/// Mutable variant of [`upcast_ref`]
pub fn upcast_mut<B: Reflect, O: Reflected + ?Sized>(obj: &mut O) -> Option<&mut B> {
    let base = Class::of::<B>();
    let identity = obj.identity();
    // SAFETY: as in `upcast_ref`, with the exclusive borrow of `obj`
    unsafe {
        base.cast_mut(identity, obj.this_ptr_mut())
            .map(|ptr| &mut *(ptr as *mut B))
    }
}

/// Copy every property name `dst` shares with `src`, through the getters
/// and setters
///
/// Each name is copied once, between the most-derived properties on both
/// sides. Names whose declared types differ, or that cannot be read, boxed
/// or written, are skipped. Returns the number copied.
pub fn copy_properties<D, S>(dst: &mut D, src: &S) -> usize
where
    D: Reflected + ?Sized,
    S: Reflected + ?Sized,
{
    let dst_class = dst.class();
    let src_class = src.class();
    let mut seen = HashSet::new();
    let mut copied = 0;
    for listed in dst_class.properties() {
        if !seen.insert(listed.name().to_string()) {
            continue;
        }
        let (Some(to), Some(from)) = (dst_class.property(listed.name()), src_class.property(listed.name())) else {
            continue;
        };
        if to.declared_type() != from.declared_type() || !to.can_write() {
            continue;
        }
        let Ok(value) = from.get_boxed(src) else {
            continue;
        };
        if to.assign_boxed(dst, &value).is_ok() {
            copied += 1;
        }
    }
    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MirrorError;

    #[derive(Default)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl Reflect for Point {
        const NAME: &'static str = "object::Point";

        fn register(class: &mut ClassBuilder<Self>) {
            class
                .field("x", |p| &p.x, |p| &mut p.x)
                .field("y", |p| &p.y, |p| &mut p.y)
                .reflected_constructible();
        }
    }

    #[derive(Default)]
    struct Labeled {
        point: Point,
        label: String,
        x: i32,
    }

    impl Reflect for Labeled {
        const NAME: &'static str = "object::Labeled";

        fn register(class: &mut ClassBuilder<Self>) {
            class
                .base::<Point>(|l| &l.point, |l| &mut l.point)
                .field("label", |l| &l.label, |l| &mut l.label)
                .field("x", |l| &l.x, |l| &mut l.x);
        }
    }

    #[test]
    fn test_set_and_get_value() {
        let mut point = Point::default();
        set_value(&mut point, "x", 4i32).unwrap();
        assert_eq!(get_value::<i32, _>(&point, "x").unwrap(), 4);
        assert_eq!(point.x, 4);

        let err = set_value(&mut point, "z", 1i32).unwrap_err();
        assert!(matches!(err, MirrorError::PropertyNotFound { .. }));
    }

    #[test]
    fn test_through_dyn_reflected() {
        let mut object: Box<dyn Reflected> = Class::of::<Point>().make_reflected().unwrap();
        set_value(object.as_mut(), "y", 9i32).unwrap();
        assert_eq!(get_value::<i32, _>(object.as_ref(), "y").unwrap(), 9);
        assert_eq!(object.class().name(), "object::Point");
    }

    #[test]
    fn test_upcast_helpers() {
        let mut labeled = Labeled::default();
        labeled.point.y = 3;
        assert_eq!(upcast_ref::<Point, _>(&labeled).map(|p| p.y), Some(3));
        upcast_mut::<Point, _>(&mut labeled).unwrap().x = 8;
        assert_eq!(labeled.point.x, 8);
        assert!(upcast_ref::<Labeled, _>(&Point::default()).is_none());
    }

    #[test]
    fn test_shadowed_name_resolves_most_derived() {
        let mut labeled = Labeled::default();
        set_value(&mut labeled, "x", 5i32).unwrap();
        assert_eq!(labeled.x, 5);
        assert_eq!(labeled.point.x, 0);
        set_value(&mut labeled, "y", 6i32).unwrap();
        assert_eq!(labeled.point.y, 6);
    }

    #[test]
    fn test_copy_properties() {
        let src = Labeled {
            point: Point { x: 1, y: 2 },
            label: String::from("a"),
            x: 3,
        };
        let mut dst = Point::default();
        let copied = copy_properties(&mut dst, &src);
        assert_eq!(copied, 2);
        // "x" resolves to Labeled's own field on the source side
        assert_eq!(dst.x, 3);
        assert_eq!(dst.y, 2);
    }
}
