//! Conversion of native functions into erased invokers
//!
//! Any `Fn(&T, A1, .., An) -> R` or `Fn(&mut T, A1, .., An) -> R` with up to
//! six arguments converts into a [`MethodBody`]. The marker parameter of
//! [`IntoMethod`] is the matching fn-pointer type, which keeps the shared and
//! exclusive receiver impls apart during inference.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{Receiver, Signature};
use crate::error::{MirrorError, MirrorResult};
use crate::value::Boxed;

/// Receiver pointer handed to an invoker, after the upcast
#[derive(Clone, Copy)]
pub(crate) enum This {
    Shared(*const u8),
    Exclusive(*mut u8),
}

impl This {
    fn shared(self) -> *const u8 {
        match self {
            Self::Shared(ptr) => ptr,
            Self::Exclusive(ptr) => ptr as *const u8,
        }
    }
}

pub(crate) trait ErasedInvoke: Send + Sync {
    /// Call with `args` holding the argument tuple
    ///
    /// # Safety
    /// `this` must point to a live object of the receiver type.
    unsafe fn call(&self, this: This, args: Box<dyn Any>) -> MirrorResult<Boxed>;
}

/// Signature and erased invoker of a native function
pub struct MethodBody {
    pub(crate) signature: Signature,
    pub(crate) invoker: Arc<dyn ErasedInvoke>,
}

/// Functions usable as methods of `T`
pub trait IntoMethod<T, Marker> {
    fn into_method(self) -> MethodBody;
}

struct Invoker<F, Marker> {
    f: F,
    _marker: PhantomData<fn() -> Marker>,
}

fn argument_mismatch(expected: &'static str) -> MirrorError {
    MirrorError::type_mismatch("method arguments", expected, "another argument tuple")
}

macro_rules! impl_into_method {
    ($($arg:ident),*) => {
        impl<T, F, R, $($arg,)*> IntoMethod<T, fn(&T, $($arg),*) -> R> for F
        where
            T: Any,
            R: Any + Clone,
            $($arg: Any,)*
            F: Fn(&T, $($arg),*) -> R + Send + Sync + 'static,
        {
            fn into_method(self) -> MethodBody {
                MethodBody {
                    signature: Signature::capture::<($($arg,)*), R>(
                        Receiver::Shared,
                        vec![$(crate::identity::TypeIdentity::of::<$arg>()),*],
                    ),
                    invoker: Arc::new(Invoker::<F, fn(&T, $($arg),*) -> R> {
                        f: self,
                        _marker: PhantomData,
                    }),
                }
            }
        }

        impl<T, F, R, $($arg,)*> IntoMethod<T, fn(&mut T, $($arg),*) -> R> for F
        where
            T: Any,
            R: Any + Clone,
            $($arg: Any,)*
            F: Fn(&mut T, $($arg),*) -> R + Send + Sync + 'static,
        {
            fn into_method(self) -> MethodBody {
                MethodBody {
                    signature: Signature::capture::<($($arg,)*), R>(
                        Receiver::Exclusive,
                        vec![$(crate::identity::TypeIdentity::of::<$arg>()),*],
                    ),
                    invoker: Arc::new(Invoker::<F, fn(&mut T, $($arg),*) -> R> {
                        f: self,
                        _marker: PhantomData,
                    }),
                }
            }
        }

        impl<T, F, R, $($arg,)*> ErasedInvoke for Invoker<F, fn(&T, $($arg),*) -> R>
        where
            T: Any,
            R: Any + Clone,
            $($arg: Any,)*
            F: Fn(&T, $($arg),*) -> R + Send + Sync + 'static,
        {
            #[allow(non_snake_case)]
            unsafe fn call(&self, this: This, args: Box<dyn Any>) -> MirrorResult<Boxed> {
                let ($($arg,)*) = *args
                    .downcast::<($($arg,)*)>()
                    .map_err(|_| argument_mismatch(std::any::type_name::<($($arg,)*)>()))?;
                let object = &*(this.shared() as *const T);
                Ok(Boxed::new((self.f)(object, $($arg),*)))
            }
        }

        impl<T, F, R, $($arg,)*> ErasedInvoke for Invoker<F, fn(&mut T, $($arg),*) -> R>
        where
            T: Any,
            R: Any + Clone,
            $($arg: Any,)*
            F: Fn(&mut T, $($arg),*) -> R + Send + Sync + 'static,
        {
            #[allow(non_snake_case)]
            unsafe fn call(&self, this: This, args: Box<dyn Any>) -> MirrorResult<Boxed> {
                let This::Exclusive(ptr) = this else {
                    return Err(MirrorError::access_denied(
                        std::any::type_name::<F>(),
                        "be invoked through a shared reference",
                    ));
                };
                let ($($arg,)*) = *args
                    .downcast::<($($arg,)*)>()
                    .map_err(|_| argument_mismatch(std::any::type_name::<($($arg,)*)>()))?;
                let object = &mut *(ptr as *mut T);
                Ok(Boxed::new((self.f)(object, $($arg),*)))
            }
        }
    };
}

impl_into_method!();
impl_into_method!(A1);
impl_into_method!(A1, A2);
impl_into_method!(A1, A2, A3);
impl_into_method!(A1, A2, A3, A4);
impl_into_method!(A1, A2, A3, A4, A5);
impl_into_method!(A1, A2, A3, A4, A5, A6);
