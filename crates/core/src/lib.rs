//! Mirror - Runtime Reflection Registry
//!
//! This crate keeps one process-wide registry of reflected classes. A class
//! lists the properties and methods of a Rust type, including everything
//! inherited from its bases, and can read, write and invoke them on an
//! object known only through [`Reflected`].
//!
//! # Modules
//!
//! - [`class`] - Class descriptors, inheritance links and the registration builder
//! - [`property`] / [`method`] - Member descriptors and their type-erased access
//! - [`path`] - Dotted property paths and their cache
//! - [`enums`] - Enum name/value tables
//! - [`registry`] - Lookup and lifecycle
//! - [`config`] - TOML settings
//!
//! # Example
//!
//! ```ignore
//! use mirror_core::{Class, Reflect};
//!
//! #[derive(Default, Reflect)]
//! struct Animal {
//!     name: String,
//! }
//!
//! #[derive(Default, Reflect)]
//! struct Cat {
//!     #[mirror(base)]
//!     animal: Animal,
//!     lives: u32,
//! }
//!
//! let class = Class::of::<Cat>();
//! let mut cat = Cat::default();
//! class.property("name").unwrap().set(&mut cat, String::from("Tom"))?;
//! ```

// Allow the crate to refer to itself as `mirror_core` for proc macro compatibility
extern crate self as mirror_core;

pub mod class;
pub mod config;
pub mod enums;
pub mod error;
pub mod identity;
pub mod method;
pub mod object;
pub mod path;
pub mod property;
pub mod registry;
pub mod scratch;
pub mod upcast;
pub mod value;

// Re-export commonly used items
pub use class::{Class, ClassBuilder};
pub use enums::{Enum, EnumInfo, ReflectEnum};
pub use error::{MirrorError, MirrorResult};
pub use identity::{Scope, TypeIdentity};
pub use method::{IntoMethod, Method, MethodBody, Receiver, Signature};
pub use property::{AccessKind, Property, PropertyFlags, PropertySpec};
pub use upcast::Upcast;
pub use value::Boxed;

// Re-export object helpers
pub use object::{
    copy_properties, get_nested, get_value, resolve_in, set_nested, set_value, upcast_mut,
    upcast_ref, Reflect, Reflected,
};

// Re-export lifecycle
pub use registry::{bootstrap, init, is_initialized, teardown};

// Re-export config types
pub use config::{ConfigError, ConfigResult, MirrorConfig};

// Re-export macros
pub use mirror_macros::{Reflect, ReflectEnum};
