//! Method descriptors and erased invocation

mod invoke;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{MirrorError, MirrorResult};
use crate::identity::{Scope, TypeIdentity};
use crate::object::Reflected;
use crate::upcast::Upcast;
use crate::value::Boxed;

use invoke::{ErasedInvoke, This};
pub use invoke::{IntoMethod, MethodBody};

/// Mutability of a method's receiver
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// `&self`
    Shared,
    /// `&mut self`
    Exclusive,
}

/// Captured `(argument tuple, return type)` of a method
#[derive(Clone, Debug)]
pub struct Signature {
    identity: TypeIdentity,
    args: Arc<[TypeIdentity]>,
    ret: TypeIdentity,
    receiver: Receiver,
}

impl Signature {
    pub(crate) fn capture<A: Any, R: Any>(receiver: Receiver, args: Vec<TypeIdentity>) -> Self {
        Self {
            identity: Self::identity_of::<A, R>(),
            args: args.into(),
            ret: TypeIdentity::of::<R>(),
            receiver,
        }
    }

    /// Identity compared at call time for argument tuple `A` and return `R`
    pub fn identity_of<A: Any, R: Any>() -> TypeIdentity {
        TypeIdentity::of::<fn(A) -> R>()
    }

    pub fn identity(&self) -> TypeIdentity {
        self.identity
    }

    /// Argument types in order
    pub fn args(&self) -> &[TypeIdentity] {
        &self.args
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn return_type(&self) -> TypeIdentity {
        self.ret
    }

    pub fn receiver(&self) -> Receiver {
        self.receiver
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let receiver = match self.receiver {
            Receiver::Shared => "&self",
            Receiver::Exclusive => "&mut self",
        };
        write!(f, "fn({receiver}")?;
        for arg in self.args.iter() {
            write!(f, ", {arg}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

/// Metadata and invoker for one method of a registered class
#[derive(Clone)]
pub struct Method {
    name: Arc<str>,
    signature: Signature,
    owner: Scope,
    holder: Scope,
    upcast: Upcast,
    invoker: Arc<dyn ErasedInvoke>,
    text: Arc<str>,
}

impl Method {
    pub(crate) fn new(name: &str, owner: Scope, body: MethodBody, text: &str) -> Self {
        Self {
            name: Arc::from(name),
            signature: body.signature,
            owner,
            holder: owner,
            upcast: Upcast::identity(),
            invoker: body.invoker,
            text: Arc::from(text),
        }
    }

    /// Copy of this descriptor held by `holder`, reaching `self.holder`
    /// through `upcast`
    pub(crate) fn rehome(&self, holder: Scope, upcast: &Upcast) -> Self {
        Self {
            holder,
            upcast: upcast.then(&self.upcast),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn arity(&self) -> usize {
        self.signature.arity()
    }

    pub fn receiver(&self) -> Receiver {
        self.signature.receiver
    }

    /// Declaring class
    pub fn owner(&self) -> Scope {
        self.owner
    }

    /// Class whose member list holds this descriptor
    pub fn holder(&self) -> Scope {
        self.holder
    }

    pub fn is_inherited(&self) -> bool {
        self.owner.identity != self.holder.identity
    }

    pub fn upcast(&self) -> &Upcast {
        &self.upcast
    }

    /// Free-form metadata text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether a call with argument tuple `A` returning `R` matches
    pub fn accepts<A: Any, R: Any>(&self) -> bool {
        self.signature.identity == Signature::identity_of::<A, R>()
    }

    fn qualified(&self) -> String {
        format!("{}.{}", self.holder.name, self.name)
    }

    fn check_signature<A: Any, R: Any>(&self) -> MirrorResult<()> {
        if self.accepts::<A, R>() {
            Ok(())
        } else {
            Err(MirrorError::type_mismatch(
                &self.qualified(),
                &self.signature.to_string(),
                Signature::identity_of::<A, R>().type_name(),
            ))
        }
    }

    fn check_object(&self, identity: TypeIdentity) -> MirrorResult<()> {
        if identity == self.holder.identity {
            Ok(())
        } else {
            Err(MirrorError::type_mismatch(
                &self.qualified(),
                self.holder.identity.type_name(),
                identity.type_name(),
            ))
        }
    }

    unsafe fn dispatch(&self, this: This, args: Box<dyn Any>) -> MirrorResult<Boxed> {
        let this = match this {
            This::Shared(ptr) => This::Shared(self.upcast.apply(ptr)),
            This::Exclusive(ptr) => This::Exclusive(self.upcast.apply_mut(ptr)),
        };
        self.invoker.call(this, args).map_err(|err| match err {
            MirrorError::AccessDenied { operation, .. } => {
                MirrorError::access_denied(&self.qualified(), operation)
            }
            other => other,
        })
    }

    /// Call with argument tuple `args`, expecting a return of `R`
    ///
    /// # Safety
    /// `this` must point to a live object of the holder type, with write
    /// provenance.
    pub unsafe fn invoke_at<A: Any, R: Any>(&self, this: *mut u8, args: A) -> MirrorResult<R> {
        self.check_signature::<A, R>()?;
        self.dispatch(This::Exclusive(this), Box::new(args))?.take::<R>()
    }

    /// Call a `&self` method through a shared pointer
    ///
    /// # Safety
    /// `this` must point to a live object of the holder type.
    pub unsafe fn invoke_ref_at<A: Any, R: Any>(&self, this: *const u8, args: A) -> MirrorResult<R> {
        self.check_signature::<A, R>()?;
        self.dispatch(This::Shared(this), Box::new(args))?.take::<R>()
    }

    /// Call with a boxed argument tuple, producing a boxed return
    ///
    /// # Safety
    /// Same requirements as [`Method::invoke_at`].
    pub unsafe fn invoke_boxed_at(&self, this: *mut u8, args: Boxed) -> MirrorResult<Boxed> {
        self.dispatch(This::Exclusive(this), args.into_any())
    }

    /// Call on `obj` with argument tuple `args`
    ///
    /// ```ignore
    /// let rename = Class::of::<Cat>().method("rename").unwrap();
    /// let old: String = rename.invoke(&mut cat, (String::from("Bob"),))?;
    /// ```
    pub fn invoke<A: Any, R: Any, O: Reflected + ?Sized>(&self, obj: &mut O, args: A) -> MirrorResult<R> {
        self.check_object(obj.identity())?;
        // SAFETY: object type checked against the holder
        unsafe { self.invoke_at(obj.this_ptr_mut(), args) }
    }

    /// Call a `&self` method on a shared `obj`
    pub fn invoke_ref<A: Any, R: Any, O: Reflected + ?Sized>(&self, obj: &O, args: A) -> MirrorResult<R> {
        self.check_object(obj.identity())?;
        // SAFETY: object type checked against the holder
        unsafe { self.invoke_ref_at(obj.this_ptr(), args) }
    }

    /// Call on `obj` with a boxed argument tuple
    pub fn invoke_boxed<O: Reflected + ?Sized>(&self, obj: &mut O, args: Boxed) -> MirrorResult<Boxed> {
        self.check_object(obj.identity())?;
        // SAFETY: object type checked against the holder
        unsafe { self.invoke_boxed_at(obj.this_ptr_mut(), args) }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("signature", &self.signature.to_string())
            .field("owner", &self.owner.name)
            .field("holder", &self.holder.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        total: i64,
    }

    impl Counter {
        fn total(&self) -> i64 {
            self.total
        }

        fn add(&mut self, amount: i64) -> i64 {
            self.total += amount;
            self.total
        }

        fn scaled(&self, a: i64, b: i64, c: i64, d: i64, e: i64, f: i64) -> i64 {
            self.total * (a + b + c + d + e + f)
        }
    }

    fn method<M>(name: &str, f: impl IntoMethod<Counter, M>) -> Method {
        Method::new(name, Scope::of::<Counter>("Counter"), f.into_method(), "")
    }

    fn ptr(counter: &mut Counter) -> *mut u8 {
        counter as *mut Counter as *mut u8
    }

    #[test]
    fn test_signature_capture() {
        let add = method("add", Counter::add);
        assert_eq!(add.arity(), 1);
        assert_eq!(add.receiver(), Receiver::Exclusive);
        assert!(add.accepts::<(i64,), i64>());
        assert!(!add.accepts::<(i32,), i64>());
        assert_eq!(add.signature().args(), &[TypeIdentity::of::<i64>()]);

        let total = method("total", Counter::total);
        assert_eq!(total.arity(), 0);
        assert_eq!(total.receiver(), Receiver::Shared);
    }

    #[test]
    fn test_invoke_typed() {
        let add = method("add", Counter::add);
        let mut counter = Counter { total: 1 };
        let result: i64 = unsafe { add.invoke_at(ptr(&mut counter), (4i64,)).unwrap() };
        assert_eq!(result, 5);
        assert_eq!(counter.total, 5);
    }

    #[test]
    fn test_signature_mismatch() {
        let add = method("add", Counter::add);
        let mut counter = Counter { total: 0 };
        let err = unsafe { add.invoke_at::<(i32,), i64>(ptr(&mut counter), (1i32,)).unwrap_err() };
        assert!(matches!(err, MirrorError::TypeMismatch { .. }));
        assert_eq!(counter.total, 0);
    }

    #[test]
    fn test_six_arguments() {
        let scaled = method("scaled", Counter::scaled);
        let mut counter = Counter { total: 2 };
        assert_eq!(scaled.arity(), 6);
        let result: i64 = unsafe {
            scaled
                .invoke_at(ptr(&mut counter), (1i64, 1i64, 1i64, 1i64, 1i64, 1i64))
                .unwrap()
        };
        assert_eq!(result, 12);
    }

    #[test]
    fn test_exclusive_method_through_shared_pointer() {
        let add = method("add", Counter::add);
        let counter = Counter { total: 0 };
        let err = unsafe {
            add.invoke_ref_at::<(i64,), i64>(&counter as *const Counter as *const u8, (1,))
                .unwrap_err()
        };
        assert!(matches!(err, MirrorError::AccessDenied { .. }));
    }

    #[test]
    fn test_invoke_boxed() {
        let add = method("add", Counter::add);
        let mut counter = Counter { total: 10 };
        let out = unsafe { add.invoke_boxed_at(ptr(&mut counter), Boxed::new((5i64,))).unwrap() };
        assert_eq!(out.downcast_ref::<i64>(), Some(&15));

        let err = unsafe {
            add.invoke_boxed_at(ptr(&mut counter), Boxed::new((5u8,)))
                .unwrap_err()
        };
        assert!(matches!(err, MirrorError::TypeMismatch { .. }));
    }

    #[test]
    fn test_closure_method() {
        let reset = method("reset", |c: &mut Counter| c.total = 0);
        let mut counter = Counter { total: 9 };
        unsafe { reset.invoke_at::<(), ()>(ptr(&mut counter), ()).unwrap() };
        assert_eq!(counter.total, 0);
    }
}
