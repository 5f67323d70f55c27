//! Mirror Proc Macros
//!
//! This crate provides derive macros for the mirror reflection registry:
//!
//! - `#[derive(Reflect)]` - Register a struct's fields, bases and methods
//! - `#[derive(ReflectEnum)]` - Expose an enum's names and values
//!
//! # Reflect Example
//!
//! ```ignore
//! use mirror_core::Reflect;
//!
//! #[derive(Default, Reflect)]
//! #[mirror(default, methods(meow))]
//! pub struct Cat {
//!     #[mirror(base)]
//!     pet: Pet,
//!
//!     #[mirror(text = "remaining lives", readonly)]
//!     lives: u32,
//!
//!     #[mirror(skip)]
//!     cache: Vec<u8>,
//! }
//!
//! impl Cat {
//!     fn meow(&self) -> String {
//!         "meow".into()
//!     }
//! }
//! ```
//!
//! # ReflectEnum Example
//!
//! ```ignore
//! use mirror_core::ReflectEnum;
//!
//! #[derive(ReflectEnum)]
//! pub enum Letter {
//!     A,
//!     B = 5,
//!     C,
//! }
//!
//! // Letter::C reflects as ("C", 6)
//! ```
//!
//! # Attributes
//!
//! ## Struct Attributes (Reflect)
//!
//! - `#[mirror(name = "Name")]` - Registered class name (default: the struct name).
//! - `#[mirror(default)]` - Register a default constructor (needs `Default`).
//! - `#[mirror(reflected)]` - Also allow construction behind `Reflected`.
//! - `#[mirror(methods(a, b))]` - Register `Self::a` and `Self::b` as methods.
//! - `#[mirror(computed(name = "n", ty = "T", getter = "Self::f", setter = "Self::g"))]` -
//!   Property backed by accessor functions; also takes `getter_ref`, `mover`,
//!   `text` and `no_clone`.
//!
//! ## Field Attributes (Reflect)
//!
//! - `#[mirror(base)]` - Field embeds a reflected base class.
//! - `#[mirror(skip)]` - Field is not reflected.
//! - `#[mirror(rename = "n")]` - Property name (default: the field name).
//! - `#[mirror(text = "..")]` - Free-form metadata.
//! - `#[mirror(readonly)]` - No write accessors.
//! - `#[mirror(nested)]` - Register the field's type along with the struct, so
//!   dotted paths can walk into it. A property only has a nested class once
//!   its type is registered. Without this flag a path such as `"inner.value"`
//!   fails with `PathNotFound` until something else registers the field's
//!   type, even when that type derives `Reflect`.
//! - `#[mirror(enumeration)]` - Register the field's enum type and attach its
//!   name/value table to the property.
//! - `#[mirror(no_clone)]` - Field type is move-only.
//! - `#[mirror(getter = "..", setter = "..", mover = "..")]` - Replace field access.
//!
//! ## Variant Attributes (ReflectEnum)
//!
//! - `#[mirror(rename = "n")]` - Enumerator name (default: the variant name).

mod parse;
mod reflect;
mod reflect_enum;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro registering a struct as a reflected class
///
/// # Generated Code
///
/// An `impl mirror_core::Reflect` whose `register` declares, in order:
///
/// - every `base` field through `ClassBuilder::base`
/// - `nested` and `enumeration` field types
/// - one property per remaining field, then each `computed` entry
/// - each listed method
/// - constructors requested with `default` or `reflected`
#[proc_macro_derive(Reflect, attributes(mirror))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    reflect::derive_reflect(input).into()
}

/// Derive macro for fieldless enums
///
/// Generates the declaration text, the names, which enumerators carry an
/// explicit discriminant, and conversions to and from `i64`.
#[proc_macro_derive(ReflectEnum, attributes(mirror))]
pub fn derive_reflect_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    reflect_enum::derive_reflect_enum(input).into()
}
