//! Reflect derive macro implementation
//!
//! ```text
//! #[derive(Reflect)]                 impl ::mirror_core::Reflect for Cat {
//! #[mirror(methods(meow))]               const NAME = "Cat";
//! struct Cat {                ──►        fn register(class) {
//!     #[mirror(base)]                        class.base::<Pet>(..);
//!     pet: Pet,                              class.property(PropertySpec::field("lives", ..));
//!     lives: u32,                            class.method("meow", Self::meow);
//! }                                      }
//!                                    }
//! ```

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Path};

use crate::parse::{parse_reflect, ComputedArgs, ReflectArgs, ReflectFieldArgs};

/// Generate the Reflect implementation
pub fn derive_reflect(input: DeriveInput) -> TokenStream {
    match parse_reflect(&input) {
        Ok(args) => generate_impl(args),
        Err(e) => e.write_errors(),
    }
}

fn generate_impl(args: ReflectArgs) -> TokenStream {
    let struct_name = &args.ident;
    let class_name = args.class_name();

    if !args.generics.params.is_empty() {
        return syn::Error::new_spanned(&args.generics, "Reflect cannot be derived for generic types")
            .to_compile_error();
    }

    let fields = match &args.data {
        darling::ast::Data::Struct(fields) => &fields.fields,
        _ => {
            return syn::Error::new_spanned(&args.ident, "Reflect can only be derived for structs")
                .to_compile_error()
        }
    };

    let mut errors = darling::Error::accumulator();
    let mut registrations = Vec::new();

    // ========================================================================
    // Bases first, then member types, then own properties
    // ========================================================================

    for field in fields.iter().filter(|f| f.base.is_present() && !f.skip.is_present()) {
        let ident = &field.ident;
        let ty = &field.ty;
        registrations.push(quote! {
            class.base::<#ty>(|this| &this.#ident, |this| &mut this.#ident);
        });
    }

    for field in fields.iter().filter(|f| f.property_name().is_some()) {
        let ty = &field.ty;
        if field.nested.is_present() {
            registrations.push(quote! { class.nested::<#ty>(); });
        }
        if field.enumeration.is_present() {
            registrations.push(quote! { class.enumeration::<#ty>(); });
        }
    }

    for field in fields {
        if let Some(tokens) = errors.handle(field_property(field)) {
            registrations.extend(tokens);
        }
    }

    for computed in &args.computed {
        if let Some(tokens) = errors.handle(computed_property(computed)) {
            registrations.push(tokens);
        }
    }

    for path in args.methods.iter() {
        registrations.push(method_registration(path));
    }

    if args.reflected.is_present() {
        registrations.push(quote! { class.reflected_constructible(); });
    } else if args.default.is_present() {
        registrations.push(quote! { class.default_constructible(); });
    }

    if let Err(e) = errors.finish() {
        return e.write_errors();
    }

    quote! {
        impl ::mirror_core::Reflect for #struct_name {
            const NAME: &'static str = #class_name;

            fn register(class: &mut ::mirror_core::ClassBuilder<Self>) {
                #(#registrations)*
            }
        }
    }
}

/// Property registration for one field, if it yields a property
fn field_property(field: &ReflectFieldArgs) -> darling::Result<Option<TokenStream>> {
    let Some(name) = field.property_name() else {
        return Ok(None);
    };
    let Some(ident) = &field.ident else {
        return Ok(None);
    };
    let ty = &field.ty;

    if field.no_clone.is_present() && field.getter.is_some() {
        return Err(darling::Error::custom("a by-value getter requires a clonable field")
            .with_span(ident));
    }

    let constructor = if field.no_clone.is_present() {
        quote!(field_move_only)
    } else {
        quote!(field)
    };

    let mut spec = quote! {
        ::mirror_core::PropertySpec::<Self, #ty>::#constructor(
            #name,
            |this| &this.#ident,
            |this| &mut this.#ident,
        )
    };
    spec = chain(spec, "getter", field.getter.as_ref());
    spec = chain(spec, "setter", field.setter.as_ref());
    spec = chain(spec, "mover", field.mover.as_ref());
    if let Some(text) = &field.text {
        spec = quote!(#spec.text(#text));
    }
    if field.readonly.is_present() {
        spec = quote!(#spec.readonly());
    }

    Ok(Some(quote! { class.property(#spec); }))
}

fn computed_property(computed: &ComputedArgs) -> darling::Result<TokenStream> {
    let name = &computed.name;
    let ty = &computed.ty;

    if computed.getter.is_none() && computed.getter_ref.is_none() {
        return Err(darling::Error::custom(format!(
            "computed property '{name}' needs a getter or getter_ref"
        )));
    }
    if computed.no_clone.is_present() && computed.getter.is_some() {
        return Err(darling::Error::custom(format!(
            "computed property '{name}' has a by-value getter but is marked no_clone"
        )));
    }

    let mut spec = if computed.no_clone.is_present() {
        quote!(::mirror_core::PropertySpec::<Self, #ty>::computed_move_only(#name))
    } else {
        quote!(::mirror_core::PropertySpec::<Self, #ty>::computed(#name))
    };
    spec = chain(spec, "getter", computed.getter.as_ref());
    spec = chain(spec, "getter_ref", computed.getter_ref.as_ref());
    spec = chain(spec, "setter", computed.setter.as_ref());
    spec = chain(spec, "mover", computed.mover.as_ref());
    if let Some(text) = &computed.text {
        spec = quote!(#spec.text(#text));
    }

    Ok(quote! { class.property(#spec); })
}

fn chain(spec: TokenStream, call: &str, path: Option<&Path>) -> TokenStream {
    match path {
        Some(path) => {
            let call = syn::Ident::new(call, proc_macro2::Span::call_site());
            quote!(#spec.#call(#path))
        }
        None => spec,
    }
}

/// `speak` registers `Self::speak` as "speak"; longer paths are used as written
fn method_registration(path: &Path) -> TokenStream {
    let name = path
        .segments
        .last()
        .map(|segment| segment.ident.to_string())
        .unwrap_or_default();

    let target = match path.get_ident() {
        Some(ident) => quote!(Self::#ident),
        None => quote!(#path),
    };

    quote! { class.method(#name, #target); }
}
