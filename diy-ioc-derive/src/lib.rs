//! Derive macros for diy-ioc
//!
//! `#[derive(Component)]` writes a `diy_ioc::Component` impl from a struct's
//! fields, so the struct can be registered with `component::<T>()` or resolved
//! with `Context::resolve_component` without a hand-written factory.
//!
//! # Example
//!
//! ```rust,ignore
//! use diy_ioc::{Component, Context};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Database {
//!     url: String,
//! }
//!
//! struct Cache;
//!
//! #[derive(Component)]
//! struct UserService {
//!     #[inject]
//!     db: Arc<Database>,
//!     #[inject(optional)]
//!     cache: Option<Arc<Cache>>,
//!     // Non-injected fields use Default
//!     request_count: u64,
//! }
//!
//! let ctx = Context::new();
//! ctx.register_singleton(Database::default);
//!
//! let service = ctx.resolve_component::<UserService>().unwrap();
//! assert!(service.cache.is_none());
//! ```

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, Member, Type, parse_macro_input};

/// Derive `diy_ioc::Component`.
///
/// # Attributes
///
/// - `#[inject]` - the field is a required dependency. Its type must be `Arc<T>`.
/// - `#[inject(optional)]` - the field is an optional dependency. Its type must be `Option<Arc<T>>`.
/// - `#[inject(default)]` - like `#[inject]`, but when nothing provides `T` a
///   singleton of `T::default()` is registered at the root context.
/// - `#[inject(component)]` - like `#[inject]`, but when nothing provides `T` it
///   is wired from its own `Component` impl and registered at the root context.
///
/// Dependencies resolve in field order. Fields without `#[inject]` are
/// initialised with `Default::default()`.
///
/// # Generated Code
///
/// ```rust,ignore
/// impl diy_ioc::Component for UserService {
///     type Dependencies = (Arc<Database>, Option<Arc<Cache>>);
///
///     fn create_instance((db, cache): Self::Dependencies) -> Arc<Self> {
///         Arc::new(Self { db, cache, request_count: Default::default() })
///     }
/// }
/// ```
#[proc_macro_derive(Component, attributes(inject))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_component(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_component(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Component can only be derived for structs",
            ));
        }
    };

    let mut dep_types = Vec::new();
    let mut dep_bindings = Vec::new();
    let mut field_inits = Vec::new();

    let members: Vec<Member> = match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .filter_map(|f| f.ident.clone().map(Member::Named))
            .collect(),
        Fields::Unnamed(unnamed) => (0..unnamed.unnamed.len()).map(Member::from).collect(),
        Fields::Unit => Vec::new(),
    };

    for (index, (field, member)) in fields.iter().zip(&members).enumerate() {
        let Some(kind) = find_inject_attr(&field.attrs)? else {
            field_inits.push(quote! {
                #member: ::std::default::Default::default()
            });
            continue;
        };

        let ty = &field.ty;
        let inner = match kind {
            InjectAttr::Optional => extract_option_arc_inner_type(ty),
            _ => extract_arc_inner_type(ty),
        };
        let Some(inner) = inner else {
            let message = match kind {
                InjectAttr::Required => "fields marked with #[inject] must have type Arc<T>",
                InjectAttr::Optional => {
                    "fields marked with #[inject(optional)] must have type Option<Arc<T>>"
                }
                InjectAttr::Default => "fields marked with #[inject(default)] must have type Arc<T>",
                InjectAttr::Component => {
                    "fields marked with #[inject(component)] must have type Arc<T>"
                }
            };
            return Err(syn::Error::new_spanned(ty, message));
        };

        let binding = Ident::new(&format!("__dep_{index}"), Span::call_site());
        match kind {
            InjectAttr::Required | InjectAttr::Optional => {
                dep_types.push(quote! { #ty });
                field_inits.push(quote! { #member: #binding });
            }
            InjectAttr::Default => {
                dep_types.push(quote! { ::diy_ioc::Auto<#inner> });
                field_inits.push(quote! { #member: #binding.into_inner() });
            }
            InjectAttr::Component => {
                dep_types.push(quote! { ::diy_ioc::Autowired<#inner> });
                field_inits.push(quote! { #member: #binding.into_inner() });
            }
        }
        dep_bindings.push(binding);
    }

    Ok(quote! {
        impl #impl_generics ::diy_ioc::Component for #name #ty_generics #where_clause {
            type Dependencies = (#(#dep_types,)*);

            fn create_instance(
                (#(#dep_bindings,)*): Self::Dependencies,
            ) -> ::std::sync::Arc<Self> {
                ::std::sync::Arc::new(Self {
                    #(#field_inits),*
                })
            }
        }
    })
}

#[derive(Clone, Copy)]
enum InjectAttr {
    Required,
    Optional,
    /// Falls back to a root singleton of `T::default()`
    Default,
    /// Falls back to a root singleton wired from `T`'s own derive
    Component,
}

/// Find and parse the `#[inject]` attribute
fn find_inject_attr(attrs: &[Attribute]) -> syn::Result<Option<InjectAttr>> {
    let Some(attr) = attrs.iter().find(|a| a.path().is_ident("inject")) else {
        return Ok(None);
    };

    if attr.meta.require_path_only().is_ok() {
        return Ok(Some(InjectAttr::Required));
    }

    let mut kind = InjectAttr::Required;
    attr.parse_nested_meta(|meta| {
        kind = if meta.path.is_ident("optional") {
            InjectAttr::Optional
        } else if meta.path.is_ident("default") {
            InjectAttr::Default
        } else if meta.path.is_ident("component") {
            InjectAttr::Component
        } else {
            return Err(meta.error("expected `optional`, `default` or `component`"));
        };
        Ok(())
    })?;
    Ok(Some(kind))
}

/// Extract T from Arc<T>
fn extract_arc_inner_type(ty: &Type) -> Option<&Type> {
    generic_argument_of(ty, "Arc")
}

/// Extract T from Option<Arc<T>>
fn extract_option_arc_inner_type(ty: &Type) -> Option<&Type> {
    generic_argument_of(ty, "Option").and_then(extract_arc_inner_type)
}

fn generic_argument_of<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first()? {
            syn::GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
