//! Attribute parsing for the Reflect and ReflectEnum derive macros

use darling::util::{Flag, PathList};
use darling::{FromDeriveInput, FromField, FromMeta, FromVariant};
use syn::{DeriveInput, Expr, Generics, Ident, Path, Type};

/// Parsed #[mirror(...)] attributes on a struct
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(mirror), supports(struct_named))]
pub struct ReflectArgs {
    /// Struct identifier
    pub ident: Ident,

    pub generics: Generics,

    /// Struct fields
    pub data: darling::ast::Data<(), ReflectFieldArgs>,

    /// Registered class name (defaults to the struct name)
    pub name: Option<String>,

    /// Register a default constructor
    pub default: Flag,

    /// Register a constructor behind the reflection interface
    pub reflected: Flag,

    /// Accessor-pair properties not backed by a field
    #[darling(multiple)]
    pub computed: Vec<ComputedArgs>,

    /// Methods to register, by name
    #[darling(default)]
    pub methods: PathList,
}

impl ReflectArgs {
    pub fn class_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.ident.to_string())
    }
}

/// One `computed(...)` entry
#[derive(Debug, FromMeta)]
pub struct ComputedArgs {
    pub name: String,

    /// Value type
    pub ty: Type,

    /// By-value getter `fn(&Self) -> T`
    pub getter: Option<Path>,

    /// Reference getter `fn(&Self) -> &T`
    pub getter_ref: Option<Path>,

    /// Setter `fn(&mut Self, T)`
    pub setter: Option<Path>,

    pub mover: Option<Path>,

    pub text: Option<String>,

    /// The value type is not `Clone`
    pub no_clone: Flag,
}

/// Parsed #[mirror(...)] attributes on a field
#[derive(Debug, FromField)]
#[darling(attributes(mirror))]
pub struct ReflectFieldArgs {
    /// Field identifier
    pub ident: Option<Ident>,

    /// Field type
    pub ty: Type,

    /// Field embeds a base class
    pub base: Flag,

    /// Not reflected
    pub skip: Flag,

    /// Property name (defaults to the field name)
    pub rename: Option<String>,

    /// Free-form metadata text
    pub text: Option<String>,

    /// No write accessors
    pub readonly: Flag,

    /// Field type is itself a reflected class; registering it here is what
    /// lets paths descend into the field
    pub nested: Flag,

    /// Field type is a reflected enum
    pub enumeration: Flag,

    /// Field type is move-only
    pub no_clone: Flag,

    /// By-value getter replacing field access
    pub getter: Option<Path>,

    /// Setter replacing field assignment
    pub setter: Option<Path>,

    /// Dedicated move-assignment function
    pub mover: Option<Path>,
}

impl ReflectFieldArgs {
    /// Property name, if the field yields a property
    pub fn property_name(&self) -> Option<String> {
        if self.skip.is_present() || self.base.is_present() {
            return None;
        }
        self.rename
            .clone()
            .or_else(|| self.ident.as_ref().map(|i| i.to_string()))
    }
}

/// Parsed #[mirror(...)] attributes on an enum
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(mirror), supports(enum_unit))]
pub struct ReflectEnumArgs {
    pub ident: Ident,

    pub data: darling::ast::Data<ReflectVariantArgs, ()>,

    /// Enum name used in messages (defaults to the enum name)
    pub name: Option<String>,
}

/// Parsed #[mirror(...)] attributes on an enum variant
#[derive(Debug, FromVariant)]
#[darling(attributes(mirror))]
pub struct ReflectVariantArgs {
    pub ident: Ident,

    pub discriminant: Option<Expr>,

    /// Enumerator name (defaults to the variant name)
    pub rename: Option<String>,
}

impl ReflectVariantArgs {
    pub fn enumerator_name(&self) -> String {
        self.rename.clone().unwrap_or_else(|| self.ident.to_string())
    }
}

/// Parse a DeriveInput into ReflectArgs
pub fn parse_reflect(input: &DeriveInput) -> darling::Result<ReflectArgs> {
    ReflectArgs::from_derive_input(input)
}

/// Parse a DeriveInput into ReflectEnumArgs
pub fn parse_reflect_enum(input: &DeriveInput) -> darling::Result<ReflectEnumArgs> {
    ReflectEnumArgs::from_derive_input(input)
}
