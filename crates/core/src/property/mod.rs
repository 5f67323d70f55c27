//! Property descriptors
//!
//! A [`Property`] describes one data member or computed accessor pair of a
//! registered class, independent of any object. It is built from a
//! [`PropertySpec`] during registration and shared (`Arc`) between the class
//! that declares it and, with an attached upcast, every heir.
//!
//! # Access shapes
//!
//! ```text
//! Field      get -> &storage     set/move -> assign storage     addressable
//! Projected  getter -> &V        set/move -> setter fn          addressable
//! Computed   getter -> V         set/move -> setter fn          value_ptr parks in scratch
//! ```
//!
//! Each of read/write/move/box is independently optional; asking a property
//! for an operation it lacks yields [`MirrorError::AccessDenied`].
//!
//! # Example
//!
//! ```ignore
//! let class = Class::of::<Cat>();
//! let name = class.property("name").unwrap();
//! name.set(&mut cat, String::from("Alice"))?;
//! assert_eq!(name.get::<String, _>(&cat)?, "Alice");
//! ```

mod access;
mod spec;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::class::Class;
use crate::enums::EnumInfo;
use crate::error::{MirrorError, MirrorResult};
use crate::identity::{Scope, TypeIdentity};
use crate::object::Reflected;
use crate::upcast::Upcast;
use crate::value::Boxed;

use access::ErasedAccess;
pub use spec::PropertySpec;

bitflags! {
    /// Capabilities of a property
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u32 {
        /// A getter is present
        const READ = 1 << 0;
        /// Copy-assignment is possible (setter present, type clonable)
        const WRITE = 1 << 1;
        /// Move-assignment is possible
        const MOVE = 1 << 2;
        /// Boxed exchange is enabled
        const BOXED = 1 << 3;
        /// The declared type can be cloned
        const COPY_CONSTRUCTIBLE = 1 << 4;
        /// The declared type can be clone-assigned
        const COPY_ASSIGNABLE = 1 << 5;
        /// Reads yield a stable address
        const ADDRESSABLE = 1 << 6;
    }
}

/// How a property's value is stored and reached
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Direct field storage
    Field,
    /// Getter returning a reference
    Projected,
    /// Getter/setter functions, no stable storage
    Computed,
}

/// Metadata for one property of a registered class
#[derive(Clone)]
pub struct Property {
    name: Arc<str>,
    declared: TypeIdentity,
    owner: Scope,
    holder: Scope,
    upcast: Upcast,
    access: Arc<dyn ErasedAccess>,
    text: Arc<str>,
    flags: PropertyFlags,
    kind: AccessKind,
}

impl Property {
    pub(crate) fn new(
        name: Arc<str>,
        declared: TypeIdentity,
        owner: Scope,
        access: Arc<dyn ErasedAccess>,
        text: Arc<str>,
    ) -> Self {
        let flags = access.flags();
        let kind = access.kind();
        Self {
            name,
            declared,
            owner,
            holder: owner,
            upcast: Upcast::identity(),
            access,
            text,
            flags,
            kind,
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

    // ==================== METADATA ====================

    /// Property name (unique within the declaring class)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type
    pub fn declared_type(&self) -> TypeIdentity {
        self.declared
    }

    /// Name of the declared value type
    pub fn type_name(&self) -> &'static str {
        self.declared.type_name()
    }

    /// Declaring class
    pub fn owner(&self) -> Scope {
        self.owner
    }

    /// Class whose member list holds this descriptor
    pub fn holder(&self) -> Scope {
        self.holder
    }

    /// Whether this descriptor was inherited from a base
    pub fn is_inherited(&self) -> bool {
        self.owner.identity != self.holder.identity
    }

    /// Adjustment applied to holder objects before access
    pub fn upcast(&self) -> &Upcast {
        &self.upcast
    }

    /// Free-form metadata text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Capability flags
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    /// Storage shape
    pub fn kind(&self) -> AccessKind {
        self.kind
    }

    pub fn can_read(&self) -> bool {
        self.flags.contains(PropertyFlags::READ)
    }

    pub fn can_write(&self) -> bool {
        self.flags.contains(PropertyFlags::WRITE)
    }

    pub fn can_move(&self) -> bool {
        self.flags.contains(PropertyFlags::MOVE)
    }

    pub fn can_box(&self) -> bool {
        self.flags.contains(PropertyFlags::BOXED)
    }

    pub fn is_copy_constructible(&self) -> bool {
        self.flags.contains(PropertyFlags::COPY_CONSTRUCTIBLE)
    }

    pub fn is_copy_assignable(&self) -> bool {
        self.flags.contains(PropertyFlags::COPY_ASSIGNABLE)
    }

    /// Whether reads yield a stable address usable for nested traversal
    pub fn is_addressable(&self) -> bool {
        self.flags.contains(PropertyFlags::ADDRESSABLE)
    }

    /// Class of the declared type, if that type is registered
    pub fn nested_class(&self) -> Option<Arc<Class>> {
        crate::registry::find(self.declared)
    }

    /// Enum table of the declared type, if that type is a registered enum
    pub fn enum_info(&self) -> Option<Arc<EnumInfo>> {
        crate::enums::find(self.declared)
    }

    // ==================== CHECKS ====================

    fn qualified(&self) -> String {
        format!("{}.{}", self.holder.name, self.name)
    }

    fn denied(&self, operation: &'static str) -> MirrorError {
        MirrorError::access_denied(&self.qualified(), operation)
    }

    fn check_value<V: Any>(&self) -> MirrorResult<()> {
        if self.declared.is::<V>() {
            Ok(())
        } else {
            Err(MirrorError::type_mismatch(
                &self.qualified(),
                self.declared.type_name(),
                std::any::type_name::<V>(),
            ))
        }
    }

    fn check_boxed(&self, value: &Boxed) -> MirrorResult<()> {
        if value.identity() == self.declared {
            Ok(())
        } else {
            Err(MirrorError::type_mismatch(
                &self.qualified(),
                self.declared.type_name(),
                value.type_name(),
            ))
        }
    }

    fn check_boxable(&self) -> MirrorResult<()> {
        if !self.is_copy_constructible() {
            return Err(MirrorError::NotCopyConstructible(
                self.declared.type_name().to_string(),
            ));
        }
        if !self.can_box() {
            return Err(self.denied("box"));
        }
        Ok(())
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

    // ==================== RAW ACCESS ====================

    /// Address of the value inside a holder object (field storage or
    /// reference getter); `None` for computed properties
    ///
    /// # Safety
    /// `this` must point to a live object of the holder type.
    pub unsafe fn get_ptr(&self, this: *const u8) -> Option<*const u8> {
        self.access.address(self.upcast.apply(this))
    }

    /// Writable address of the value (field storage only)
    ///
    /// The address is returned whatever the write flags say; callers check
    /// [`can_move`](Self::can_move) first.
    ///
    /// # Safety
    /// `this` must point to a live object of the holder type, with write
    /// provenance.
    pub(crate) unsafe fn get_ptr_mut(&self, this: *mut u8) -> Option<*mut u8> {
        self.access.address_mut(self.upcast.apply_mut(this))
    }

    /// Address of the value, materializing by-value getter results in the
    /// per-thread scratch slot
    ///
    /// A scratch address is invalidated by the next computed read on the
    /// same thread.
    ///
    /// # Safety
    /// `this` must point to a live object of the holder type.
    pub unsafe fn value_ptr(&self, this: *const u8) -> MirrorResult<*const u8> {
        if !self.can_read() {
            return Err(self.denied("read"));
        }
        self.access
            .value_ptr(self.upcast.apply(this))
            .ok_or_else(|| self.denied("read"))
    }

    /// Read a copy of the value
    ///
    /// # Safety
    /// `this` must point to a live object of the holder type.
    pub unsafe fn get_at<V: Any + Clone>(&self, this: *const u8) -> MirrorResult<V> {
        self.check_value::<V>()?;
        if !self.can_read() {
            return Err(self.denied("read"));
        }
        let scope = self.upcast.apply(this);
        if let Some(address) = self.access.address(scope) {
            return Ok((*(address as *const V)).clone());
        }
        let mut slot: Option<V> = None;
        self.access.read_into(scope, &mut slot)?;
        slot.ok_or_else(|| self.denied("read"))
    }

    /// Store `value`, moving it when a mover is available and copying
    /// through the setter otherwise
    ///
    /// # Safety
    /// `this` must point to a live object of the holder type, with write
    /// provenance.
    pub unsafe fn set_at<V: Any>(&self, this: *mut u8, value: V) -> MirrorResult<()> {
        self.check_value::<V>()?;
        let scope = self.upcast.apply_mut(this);
        if self.can_move() {
            let mut slot = Some(value);
            self.access.move_from(scope, &mut slot)
        } else if self.can_write() {
            self.access.write_from(scope, &value)
        } else {
            Err(self.denied("write"))
        }
    }

    /// Copy-assign from `value`
    ///
    /// # Safety
    /// Same requirements as [`Property::set_at`].
    pub unsafe fn assign_at<V: Any>(&self, this: *mut u8, value: &V) -> MirrorResult<()> {
        self.check_value::<V>()?;
        self.access.write_from(self.upcast.apply_mut(this), value)
    }

    /// Copy the value into a box
    ///
    /// # Safety
    /// `this` must point to a live object of the holder type.
    pub unsafe fn get_boxed_at(&self, this: *const u8) -> MirrorResult<Boxed> {
        self.check_boxable()?;
        if !self.can_read() {
            return Err(self.denied("read"));
        }
        self.access.read_boxed(self.upcast.apply(this))
    }

    /// Move a boxed value in
    ///
    /// # Safety
    /// `this` must point to a live object of the holder type, with write
    /// provenance.
    pub unsafe fn set_boxed_at(&self, this: *mut u8, value: Boxed) -> MirrorResult<()> {
        self.check_boxable()?;
        self.check_boxed(&value)?;
        if !self.can_move() {
            return Err(self.denied("move"));
        }
        self.access
            .move_boxed(self.upcast.apply_mut(this), value.into_any())
    }

    /// Copy a boxed value in
    ///
    /// # Safety
    /// Same requirements as [`Property::set_boxed_at`].
    pub unsafe fn assign_boxed_at(&self, this: *mut u8, value: &Boxed) -> MirrorResult<()> {
        self.check_boxable()?;
        self.check_boxed(value)?;
        self.access
            .write_from(self.upcast.apply_mut(this), value.as_any())
    }

    // ==================== OBJECT ACCESS ====================

    /// Address of the value inside `obj`; `None` unless addressable
    pub fn pointer<O: Reflected + ?Sized>(&self, obj: &O) -> Option<*const u8> {
        self.check_object(obj.identity()).ok()?;
        // SAFETY: object type checked against the holder
        unsafe { self.get_ptr(obj.this_ptr()) }
    }

    /// Read a copy of the value from `obj`
    pub fn get<V: Any + Clone, O: Reflected + ?Sized>(&self, obj: &O) -> MirrorResult<V> {
        self.check_object(obj.identity())?;
        // SAFETY: object type checked against the holder
        unsafe { self.get_at(obj.this_ptr()) }
    }

    /// Borrow the value inside `obj` (addressable properties only)
    pub fn get_ref<'a, V: Any, O: Reflected + ?Sized>(&self, obj: &'a O) -> MirrorResult<&'a V> {
        self.check_object(obj.identity())?;
        self.check_value::<V>()?;
        // SAFETY: object and value types checked; the address is derived
        // from `obj` and lives as long as the borrow
        unsafe {
            let address = self.get_ptr(obj.this_ptr()).ok_or_else(|| self.denied("borrow"))?;
            Ok(&*(address as *const V))
        }
    }

    /// Mutably borrow the value inside `obj` (field storage only)
    pub fn get_mut<'a, V: Any, O: Reflected + ?Sized>(
        &self,
        obj: &'a mut O,
    ) -> MirrorResult<&'a mut V> {
        self.check_object(obj.identity())?;
        self.check_value::<V>()?;
        if !self.can_move() {
            return Err(self.denied("borrow mutably"));
        }
        // SAFETY: object and value types checked; the address is derived
        // from the exclusive borrow of `obj`
        unsafe {
            let address = self
                .get_ptr_mut(obj.this_ptr_mut())
                .ok_or_else(|| self.denied("borrow mutably"))?;
            Ok(&mut *(address as *mut V))
        }
    }

    /// Store `value` into `obj`
    pub fn set<V: Any, O: Reflected + ?Sized>(&self, obj: &mut O, value: V) -> MirrorResult<()> {
        self.check_object(obj.identity())?;
        // SAFETY: object type checked against the holder
        unsafe { self.set_at(obj.this_ptr_mut(), value) }
    }

    /// Copy-assign `value` into `obj`
    pub fn assign<V: Any, O: Reflected + ?Sized>(&self, obj: &mut O, value: &V) -> MirrorResult<()> {
        self.check_object(obj.identity())?;
        // SAFETY: object type checked against the holder
        unsafe { self.assign_at(obj.this_ptr_mut(), value) }
    }

    /// Copy the value out of `obj` into a box
    pub fn get_boxed<O: Reflected + ?Sized>(&self, obj: &O) -> MirrorResult<Boxed> {
        self.check_object(obj.identity())?;
        // SAFETY: object type checked against the holder
        unsafe { self.get_boxed_at(obj.this_ptr()) }
    }

    /// Move a boxed value into `obj`
    pub fn set_boxed<O: Reflected + ?Sized>(&self, obj: &mut O, value: Boxed) -> MirrorResult<()> {
        self.check_object(obj.identity())?;
        // SAFETY: object type checked against the holder
        unsafe { self.set_boxed_at(obj.this_ptr_mut(), value) }
    }

    /// Copy a boxed value into `obj`
    pub fn assign_boxed<O: Reflected + ?Sized>(&self, obj: &mut O, value: &Boxed) -> MirrorResult<()> {
        self.check_object(obj.identity())?;
        // SAFETY: object type checked against the holder
        unsafe { self.assign_boxed_at(obj.this_ptr_mut(), value) }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("type", &self.declared.type_name())
            .field("owner", &self.owner.name)
            .field("holder", &self.holder.name)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        count: i32,
        label: String,
        hidden: u8,
    }

    impl Sample {
        fn doubled(&self) -> i32 {
            self.count * 2
        }

        fn set_doubled(&mut self, value: i32) {
            self.count = value / 2;
        }

        fn label_ref(&self) -> &String {
            &self.label
        }
    }

    fn scope() -> Scope {
        Scope::of::<Sample>("Sample")
    }

    fn sample() -> Sample {
        Sample {
            count: 3,
            label: String::from("x"),
            hidden: 1,
        }
    }

    fn this(s: &Sample) -> *const u8 {
        s as *const Sample as *const u8
    }

    fn this_mut(s: &mut Sample) -> *mut u8 {
        s as *mut Sample as *mut u8
    }

    #[test]
    fn test_field_roundtrip() {
        let prop = PropertySpec::<Sample, i32>::field("count", |s| &s.count, |s| &mut s.count)
            .build(scope());
        let mut s = sample();

        assert_eq!(prop.kind(), AccessKind::Field);
        assert!(prop.can_read() && prop.can_write() && prop.can_move() && prop.can_box());
        unsafe {
            assert_eq!(prop.get_at::<i32>(this(&s)).unwrap(), 3);
            prop.set_at(this_mut(&mut s), 11i32).unwrap();
            assert_eq!(prop.get_at::<i32>(this(&s)).unwrap(), 11);
            assert_eq!(prop.get_ptr(this(&s)), Some(&s.count as *const i32 as *const u8));
        }
    }

    #[test]
    fn test_value_type_mismatch() {
        let prop = PropertySpec::<Sample, i32>::field("count", |s| &s.count, |s| &mut s.count)
            .build(scope());
        let s = sample();
        let err = unsafe { prop.get_at::<i64>(this(&s)).unwrap_err() };
        match err {
            MirrorError::TypeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, "i32");
                assert_eq!(actual, "i64");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_computed_roundtrip_without_address() {
        let prop = PropertySpec::<Sample, i32>::computed("doubled")
            .getter(Sample::doubled)
            .setter(Sample::set_doubled)
            .build(scope());
        let mut s = sample();

        assert_eq!(prop.kind(), AccessKind::Computed);
        assert!(!prop.is_addressable());
        unsafe {
            assert!(prop.get_ptr(this(&s)).is_none());
            assert_eq!(prop.get_at::<i32>(this(&s)).unwrap(), 6);
            prop.set_at(this_mut(&mut s), 20i32).unwrap();
            assert_eq!(s.count, 10);

            let parked = prop.value_ptr(this(&s)).unwrap();
            assert_eq!(*(parked as *const i32), 20);
        }
        crate::scratch::clear();
    }

    #[test]
    fn test_reference_getter_is_addressable() {
        let prop = PropertySpec::<Sample, String>::computed("label")
            .getter_ref(Sample::label_ref)
            .build(scope());
        let s = sample();

        assert_eq!(prop.kind(), AccessKind::Projected);
        assert!(prop.is_addressable());
        assert!(!prop.can_write());
        unsafe {
            assert_eq!(
                prop.get_ptr(this(&s)),
                Some(&s.label as *const String as *const u8)
            );
        }
    }

    #[test]
    fn test_readonly_denies_write() {
        let prop = PropertySpec::<Sample, u8>::field("hidden", |s| &s.hidden, |s| &mut s.hidden)
            .readonly()
            .build(scope());
        let mut s = sample();

        assert!(prop.can_read());
        assert!(!prop.can_write());
        assert!(!prop.can_move());
        let err = unsafe { prop.set_at(this_mut(&mut s), 4u8).unwrap_err() };
        assert!(matches!(err, MirrorError::AccessDenied { .. }));
        assert_eq!(s.hidden, 1);
    }

    #[test]
    fn test_boxed_exchange() {
        let prop = PropertySpec::<Sample, String>::field("label", |s| &s.label, |s| &mut s.label)
            .build(scope());
        let mut s = sample();

        unsafe {
            let boxed = prop.get_boxed_at(this(&s)).unwrap();
            assert_eq!(boxed.downcast_ref::<String>().map(String::as_str), Some("x"));

            prop.set_boxed_at(this_mut(&mut s), Boxed::new(String::from("moved")))
                .unwrap();
            assert_eq!(s.label, "moved");

            let err = prop
                .set_boxed_at(this_mut(&mut s), Boxed::new(5i32))
                .unwrap_err();
            assert!(matches!(err, MirrorError::TypeMismatch { .. }));
        }
    }

    #[test]
    fn test_boxed_toggle_is_independent() {
        let prop = PropertySpec::<Sample, i32>::field("count", |s| &s.count, |s| &mut s.count)
            .no_boxed()
            .build(scope());
        let s = sample();

        assert!(prop.can_read() && prop.can_write());
        assert!(!prop.can_box());
        let err = unsafe { prop.get_boxed_at(this(&s)).unwrap_err() };
        assert!(matches!(err, MirrorError::AccessDenied { .. }));
    }

    #[test]
    fn test_move_only_field() {
        struct Holder {
            token: std::sync::Mutex<u32>,
        }

        let prop = PropertySpec::<Holder, std::sync::Mutex<u32>>::field_move_only(
            "token",
            |h| &h.token,
            |h| &mut h.token,
        )
        .build(Scope::of::<Holder>("Holder"));
        let mut holder = Holder {
            token: std::sync::Mutex::new(1),
        };

        assert!(!prop.is_copy_constructible());
        assert!(!prop.can_write());
        assert!(prop.can_move());
        unsafe {
            let this = &mut holder as *mut Holder as *mut u8;
            prop.set_at(this, std::sync::Mutex::new(7u32)).unwrap();
            let err = prop.get_boxed_at(this).unwrap_err();
            assert!(matches!(err, MirrorError::NotCopyConstructible(_)));
        }
        assert_eq!(*holder.token.lock().unwrap(), 7);
    }
}
