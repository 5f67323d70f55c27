//! Heir-to-base pointer adjustment
//!
//! A derived type embeds each of its bases as a field. The upcast from the
//! derived object to a base is a typed projection (`fn(&D) -> &B`) captured at
//! registration; upcasts to indirect ancestors are chains of these steps.
//! Nothing is recomputed per call.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::identity::TypeIdentity;

/// One erased projection step from a derived object to an embedded base
pub(crate) trait UpcastStep: Send + Sync {
    /// Project a shared pointer
    ///
    /// # Safety
    /// `ptr` must point to a live value of the step's source type.
    unsafe fn apply(&self, ptr: *const u8) -> *const u8;

    /// Project an exclusive pointer
    ///
    /// # Safety
    /// `ptr` must point to a live value of the step's source type and must
    /// carry write provenance.
    unsafe fn apply_mut(&self, ptr: *mut u8) -> *mut u8;

    fn source(&self) -> TypeIdentity;

    fn target(&self) -> TypeIdentity;
}

/// Typed field projection `D -> B`
pub(crate) struct Project<D, B> {
    get: fn(&D) -> &B,
    get_mut: fn(&mut D) -> &mut B,
    _marker: PhantomData<fn(D) -> B>,
}

impl<D: 'static, B: 'static> Project<D, B> {
    pub(crate) fn new(get: fn(&D) -> &B, get_mut: fn(&mut D) -> &mut B) -> Self {
        Self {
            get,
            get_mut,
            _marker: PhantomData,
        }
    }
}

impl<D: 'static, B: 'static> UpcastStep for Project<D, B> {
    unsafe fn apply(&self, ptr: *const u8) -> *const u8 {
        let derived = &*(ptr as *const D);
        (self.get)(derived) as *const B as *const u8
    }

    unsafe fn apply_mut(&self, ptr: *mut u8) -> *mut u8 {
        let derived = &mut *(ptr as *mut D);
        (self.get_mut)(derived) as *mut B as *mut u8
    }

    fn source(&self) -> TypeIdentity {
        TypeIdentity::of::<D>()
    }

    fn target(&self) -> TypeIdentity {
        TypeIdentity::of::<B>()
    }
}

/// Precomputed pointer adjustment from an heir to one of its ancestors
///
/// An empty chain is the identity (a class's own members).
#[derive(Clone, Default)]
pub struct Upcast {
    steps: Vec<Arc<dyn UpcastStep>>,
}

impl Upcast {
    /// The identity adjustment
    pub fn identity() -> Self {
        Self::default()
    }

    pub(crate) fn step<D: 'static, B: 'static>(
        get: fn(&D) -> &B,
        get_mut: fn(&mut D) -> &mut B,
    ) -> Self {
        Self {
            steps: vec![Arc::new(Project::new(get, get_mut))],
        }
    }

    /// Compose: apply `self` first, then `next`
    pub fn then(&self, next: &Upcast) -> Upcast {
        let mut steps = Vec::with_capacity(self.steps.len() + next.steps.len());
        steps.extend(self.steps.iter().cloned());
        steps.extend(next.steps.iter().cloned());
        Upcast { steps }
    }

    /// Whether this adjustment is the identity
    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of projection steps in the chain
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// Apply to a shared object pointer
    ///
    /// # Safety
    /// `ptr` must point to a live object of the chain's source type.
    #[inline]
    pub unsafe fn apply(&self, ptr: *const u8) -> *const u8 {
        self.steps.iter().fold(ptr, |p, step| step.apply(p))
    }

    /// Apply to an exclusive object pointer
    ///
    /// # Safety
    /// `ptr` must point to a live object of the chain's source type and carry
    /// write provenance.
    #[inline]
    pub unsafe fn apply_mut(&self, ptr: *mut u8) -> *mut u8 {
        self.steps.iter().fold(ptr, |p, step| step.apply_mut(p))
    }
}

impl fmt::Debug for Upcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("Upcast(identity)");
        }
        f.write_str("Upcast(")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i == 0 {
                write!(f, "{}", step.source())?;
            }
            write!(f, " -> {}", step.target())?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inner {
        value: u32,
    }

    struct Middle {
        _pad: u64,
        inner: Inner,
    }

    struct Outer {
        _tag: u8,
        middle: Middle,
    }

    #[test]
    fn test_identity_is_noop() {
        let value = 7u32;
        let ptr = &value as *const u32 as *const u8;
        let up = Upcast::identity();
        assert!(up.is_identity());
        assert_eq!(unsafe { up.apply(ptr) }, ptr);
    }

    #[test]
    fn test_chain_reaches_nested_field() {
        let outer = Outer {
            _tag: 1,
            middle: Middle {
                _pad: 0,
                inner: Inner { value: 42 },
            },
        };

        let to_middle = Upcast::step::<Outer, Middle>(|o| &o.middle, |o| &mut o.middle);
        let to_inner = Upcast::step::<Middle, Inner>(|m| &m.inner, |m| &mut m.inner);
        let chain = to_middle.then(&to_inner);
        assert_eq!(chain.depth(), 2);

        let ptr = unsafe { chain.apply(&outer as *const Outer as *const u8) };
        assert_eq!(ptr, &outer.middle.inner as *const Inner as *const u8);
        assert_eq!(unsafe { (*(ptr as *const Inner)).value }, 42);
    }

    #[test]
    fn test_chain_mut_writes_through() {
        let mut outer = Outer {
            _tag: 0,
            middle: Middle {
                _pad: 0,
                inner: Inner { value: 1 },
            },
        };
        let chain = Upcast::step::<Outer, Middle>(|o| &o.middle, |o| &mut o.middle)
            .then(&Upcast::step::<Middle, Inner>(|m| &m.inner, |m| &mut m.inner));

        unsafe {
            let ptr = chain.apply_mut(&mut outer as *mut Outer as *mut u8);
            (*(ptr as *mut Inner)).value = 9;
        }
        assert_eq!(outer.middle.inner.value, 9);
    }

    #[test]
    fn test_debug_format() {
        let chain = Upcast::step::<Outer, Middle>(|o| &o.middle, |o| &mut o.middle);
        let text = format!("{:?}", chain);
        assert!(text.contains("Outer"));
        assert!(text.contains("Middle"));
    }
}
