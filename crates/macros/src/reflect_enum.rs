//! ReflectEnum derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::parse::{parse_reflect_enum, ReflectEnumArgs};

/// Generate the ReflectEnum implementation
pub fn derive_reflect_enum(input: DeriveInput) -> TokenStream {
    match parse_reflect_enum(&input) {
        Ok(args) => generate_impl(args),
        Err(e) => e.write_errors(),
    }
}

fn generate_impl(args: ReflectEnumArgs) -> TokenStream {
    let enum_name = &args.ident;
    let display_name = args.name.clone().unwrap_or_else(|| args.ident.to_string());

    let variants = match &args.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&args.ident, "ReflectEnum can only be derived for enums")
                .to_compile_error()
        }
    };

    if variants.is_empty() {
        return syn::Error::new_spanned(&args.ident, "ReflectEnum needs at least one variant")
            .to_compile_error();
    }

    let names: Vec<String> = variants.iter().map(|v| v.enumerator_name()).collect();

    // Declaration text as written in source, e.g. "A, B = 5, C"
    let declaration = variants
        .iter()
        .zip(&names)
        .map(|(variant, name)| match &variant.discriminant {
            Some(expr) => format!("{} = {}", name, quote!(#expr)),
            None => name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");

    let explicit = variants.iter().map(|variant| {
        let ident = &variant.ident;
        if variant.discriminant.is_some() {
            quote!(::core::option::Option::Some(Self::#ident as i64))
        } else {
            quote!(::core::option::Option::None)
        }
    });

    let to_arms = variants.iter().map(|variant| {
        let ident = &variant.ident;
        quote!(Self::#ident => Self::#ident as i64,)
    });

    let from_checks = variants.iter().map(|variant| {
        let ident = &variant.ident;
        quote! {
            if value == Self::#ident as i64 {
                return ::core::option::Option::Some(Self::#ident);
            }
        }
    });

    quote! {
        impl ::mirror_core::ReflectEnum for #enum_name {
            const NAME: &'static str = #display_name;
            const DECLARATION: &'static str = #declaration;
            const NAMES: &'static [&'static str] = &[#(#names),*];
            const EXPLICIT: &'static [::core::option::Option<i64>] = &[#(#explicit),*];

            fn to_i64(&self) -> i64 {
                match self {
                    #(#to_arms)*
                }
            }

            fn from_i64(value: i64) -> ::core::option::Option<Self> {
                #(#from_checks)*
                ::core::option::Option::None
            }
        }
    }
}
