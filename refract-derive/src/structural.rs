//! Implementation of the `#[derive(Structural)]` macro.
//!
//! The expansion has three parts: a shape expression handed to the
//! process-wide shape cache, a one-level `into_repr` conversion, and
//! its `from_repr` inverse. Field types are classified at expansion
//! time through the probe in `refract::generic::shape`: method
//! resolution prefers the structural probe when the field type
//! implements `Structural` and falls back to the opaque one otherwise.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Data, DataEnum, DeriveInput, Field, Fields, Ident, parse_macro_input};

/// How a field participates in the shape description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldMode {
    /// Classified by probe: structural leaf when the type implements
    /// `Structural`, opaque leaf otherwise.
    Auto,
    /// Forced opaque leaf.
    Opaque,
    /// The field type's product inlined into the parent.
    Flatten,
}

struct ImplBody {
    shape: TokenStream2,
    into_repr: TokenStream2,
    from_repr: TokenStream2,
}

/// Main implementation of the Structural derive macro.
pub fn derive_structural_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let body = match &input.data {
        Data::Struct(data_struct) => expand_struct(&data_struct.fields),
        Data::Enum(data_enum) => expand_enum(data_enum),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Structural cannot be derived for unions.",
        )),
    };

    let expanded = match body {
        Ok(ImplBody {
            shape,
            into_repr,
            from_repr,
        }) => {
            let mut bounded_generics = input.generics.clone();
            for parameter in bounded_generics.type_params_mut() {
                parameter.bounds.push(syn::parse_quote!(::core::clone::Clone));
                parameter.bounds.push(syn::parse_quote!(::core::any::Any));
            }
            let (impl_generics, _, _) = bounded_generics.split_for_impl();
            let (_, type_generics, where_clause) = input.generics.split_for_impl();

            quote! {
                #[automatically_derived]
                impl #impl_generics ::refract::generic::shape::Structural
                    for #name #type_generics #where_clause
                {
                    fn shape() -> &'static ::refract::generic::shape::Shape {
                        ::refract::generic::shape::interned_shape::<Self>(|| #shape)
                    }

                    fn into_repr(self) -> ::refract::generic::shape::Repr {
                        #into_repr
                    }

                    fn from_repr(
                        repr: ::refract::generic::shape::Repr,
                    ) -> ::core::option::Option<Self> {
                        #from_repr
                    }
                }
            }
        }
        Err(error) => error.to_compile_error(),
    };

    TokenStream::from(expanded)
}

fn field_mode(field: &Field) -> syn::Result<FieldMode> {
    let mut mode = FieldMode::Auto;
    for attribute in &field.attrs {
        if !attribute.path().is_ident("structural") {
            continue;
        }
        attribute.parse_nested_meta(|meta| {
            if meta.path.is_ident("opaque") {
                mode = FieldMode::Opaque;
                Ok(())
            } else if meta.path.is_ident("flatten") {
                mode = FieldMode::Flatten;
                Ok(())
            } else {
                Err(meta.error("unsupported attribute; expected `opaque` or `flatten`"))
            }
        })?;
    }
    Ok(mode)
}

/// Shape expression for one field, by mode.
fn field_shape(field: &Field, mode: FieldMode) -> TokenStream2 {
    let field_type = &field.ty;
    match mode {
        FieldMode::Auto => quote! {
            ::refract::generic::shape::Shape::Leaf({
                #[allow(unused_imports)]
                use ::refract::generic::shape::{OpaqueProbe as _, StructuralProbe as _};
                (&&::refract::generic::shape::Probe::<#field_type>::new()).field_info()
            })
        },
        FieldMode::Opaque => quote! {
            ::refract::generic::shape::Shape::Leaf(
                ::refract::generic::shape::TypeInfo::opaque::<#field_type>(),
            )
        },
        FieldMode::Flatten => quote! {
            ::refract::generic::shape::flatten_shape::<#field_type>()
        },
    }
}

/// Shape expression for a whole field list: a product, or unit when
/// there are no fields. Flattened fields lose their own name so that
/// resolution dissolves them into the parent.
fn fields_shape(fields: &Fields) -> syn::Result<TokenStream2> {
    match fields {
        Fields::Named(named_fields) => {
            let entries = named_fields
                .named
                .iter()
                .map(|field| {
                    let mode = field_mode(field)?;
                    let shape = field_shape(field, mode);
                    if mode == FieldMode::Flatten {
                        Ok(quote! { ::refract::generic::shape::FieldShape::unnamed(#shape) })
                    } else {
                        let field_name = field
                            .ident
                            .as_ref()
                            .expect("named field has an identifier")
                            .to_string();
                        Ok(quote! {
                            ::refract::generic::shape::FieldShape::named(#field_name, #shape)
                        })
                    }
                })
                .collect::<syn::Result<Vec<_>>>()?;
            Ok(quote! { ::refract::generic::shape::Shape::Product(::std::vec![#(#entries),*]) })
        }
        Fields::Unnamed(unnamed_fields) => {
            let entries = unnamed_fields
                .unnamed
                .iter()
                .map(|field| {
                    let shape = field_shape(field, field_mode(field)?);
                    Ok(quote! { ::refract::generic::shape::FieldShape::unnamed(#shape) })
                })
                .collect::<syn::Result<Vec<_>>>()?;
            Ok(quote! { ::refract::generic::shape::Shape::Product(::std::vec![#(#entries),*]) })
        }
        Fields::Unit => Ok(quote! { ::refract::generic::shape::Shape::Unit }),
    }
}

/// Conversion of one already-bound field value into its representation
/// child.
fn field_into_repr(value: &TokenStream2, mode: FieldMode) -> TokenStream2 {
    match mode {
        FieldMode::Auto | FieldMode::Opaque => quote! {
            ::refract::generic::shape::Repr::leaf(#value)
        },
        FieldMode::Flatten => quote! {
            ::refract::generic::shape::flatten_repr(#value)
        },
    }
}

/// Extraction of one field value from the next representation child.
fn field_from_repr(mode: FieldMode) -> TokenStream2 {
    match mode {
        FieldMode::Auto | FieldMode::Opaque => quote! {
            ::refract::generic::shape::take_leaf(children.next()?)?
        },
        FieldMode::Flatten => quote! {
            ::refract::generic::shape::unflatten(children.next()?)?
        },
    }
}

fn expand_struct(fields: &Fields) -> syn::Result<ImplBody> {
    let shape = fields_shape(fields)?;

    let (into_repr, from_repr) = match fields {
        Fields::Named(named_fields) => {
            let modes = named_fields
                .named
                .iter()
                .map(field_mode)
                .collect::<syn::Result<Vec<_>>>()?;
            let idents: Vec<&Ident> = named_fields
                .named
                .iter()
                .map(|field| field.ident.as_ref().expect("named field has an identifier"))
                .collect();

            let conversions = idents.iter().zip(&modes).map(|(ident, mode)| {
                field_into_repr(&quote! { self.#ident }, *mode)
            });
            let extractions = idents.iter().zip(&modes).map(|(ident, mode)| {
                let extraction = field_from_repr(*mode);
                quote! { #ident: #extraction }
            });

            (
                quote! {
                    ::refract::generic::shape::Repr::product(::std::vec![#(#conversions),*])
                },
                quote! {
                    let ::refract::generic::shape::Repr::Product(children) = repr else {
                        return ::core::option::Option::None;
                    };
                    let mut children = children.into_iter();
                    ::core::option::Option::Some(Self { #(#extractions),* })
                },
            )
        }
        Fields::Unnamed(unnamed_fields) => {
            let modes = unnamed_fields
                .unnamed
                .iter()
                .map(field_mode)
                .collect::<syn::Result<Vec<_>>>()?;

            let conversions = modes.iter().enumerate().map(|(position, mode)| {
                let index = syn::Index::from(position);
                field_into_repr(&quote! { self.#index }, *mode)
            });
            let extractions = modes.iter().map(|mode| field_from_repr(*mode));

            (
                quote! {
                    ::refract::generic::shape::Repr::product(::std::vec![#(#conversions),*])
                },
                quote! {
                    let ::refract::generic::shape::Repr::Product(children) = repr else {
                        return ::core::option::Option::None;
                    };
                    let mut children = children.into_iter();
                    ::core::option::Option::Some(Self(#(#extractions),*))
                },
            )
        }
        Fields::Unit => (
            quote! { ::refract::generic::shape::Repr::Unit },
            quote! {
                match repr {
                    ::refract::generic::shape::Repr::Unit => ::core::option::Option::Some(Self),
                    _ => ::core::option::Option::None,
                }
            },
        ),
    };

    Ok(ImplBody {
        shape,
        into_repr,
        from_repr,
    })
}

fn expand_enum(data_enum: &DataEnum) -> syn::Result<ImplBody> {
    let variant_shapes = data_enum
        .variants
        .iter()
        .map(|variant| {
            let variant_name = variant.ident.to_string();
            let fields = fields_shape(&variant.fields)?;
            Ok(quote! {
                ::refract::generic::shape::VariantShape::new(#variant_name, #fields)
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;
    let shape = quote! {
        ::refract::generic::shape::Shape::Sum(::std::vec![#(#variant_shapes),*])
    };

    let mut into_arms = Vec::new();
    let mut from_arms = Vec::new();
    for (tag, variant) in data_enum.variants.iter().enumerate() {
        let variant_ident = &variant.ident;
        match &variant.fields {
            Fields::Named(named_fields) => {
                let modes = named_fields
                    .named
                    .iter()
                    .map(field_mode)
                    .collect::<syn::Result<Vec<_>>>()?;
                let idents: Vec<&Ident> = named_fields
                    .named
                    .iter()
                    .map(|field| field.ident.as_ref().expect("named field has an identifier"))
                    .collect();

                let conversions = idents.iter().zip(&modes).map(|(ident, mode)| {
                    field_into_repr(&quote! { #ident }, *mode)
                });
                into_arms.push(quote! {
                    Self::#variant_ident { #(#idents),* } => {
                        ::refract::generic::shape::Repr::variant(
                            #tag,
                            ::refract::generic::shape::Repr::product(
                                ::std::vec![#(#conversions),*],
                            ),
                        )
                    }
                });

                let extractions = idents.iter().zip(&modes).map(|(ident, mode)| {
                    let extraction = field_from_repr(*mode);
                    quote! { #ident: #extraction }
                });
                from_arms.push(quote! {
                    #tag => {
                        let ::refract::generic::shape::Repr::Product(children) =
                            ::refract::generic::shape::take_repr(fields)
                        else {
                            return ::core::option::Option::None;
                        };
                        let mut children = children.into_iter();
                        ::core::option::Option::Some(Self::#variant_ident { #(#extractions),* })
                    }
                });
            }
            Fields::Unnamed(unnamed_fields) => {
                let modes = unnamed_fields
                    .unnamed
                    .iter()
                    .map(field_mode)
                    .collect::<syn::Result<Vec<_>>>()?;
                let bindings: Vec<Ident> = (0..modes.len())
                    .map(|position| format_ident!("field_{}", position))
                    .collect();

                let conversions = bindings.iter().zip(&modes).map(|(binding, mode)| {
                    field_into_repr(&quote! { #binding }, *mode)
                });
                into_arms.push(quote! {
                    Self::#variant_ident(#(#bindings),*) => {
                        ::refract::generic::shape::Repr::variant(
                            #tag,
                            ::refract::generic::shape::Repr::product(
                                ::std::vec![#(#conversions),*],
                            ),
                        )
                    }
                });

                let extractions = modes.iter().map(|mode| field_from_repr(*mode));
                from_arms.push(quote! {
                    #tag => {
                        let ::refract::generic::shape::Repr::Product(children) =
                            ::refract::generic::shape::take_repr(fields)
                        else {
                            return ::core::option::Option::None;
                        };
                        let mut children = children.into_iter();
                        ::core::option::Option::Some(Self::#variant_ident(#(#extractions),*))
                    }
                });
            }
            Fields::Unit => {
                into_arms.push(quote! {
                    Self::#variant_ident => ::refract::generic::shape::Repr::variant(
                        #tag,
                        ::refract::generic::shape::Repr::Unit,
                    )
                });
                from_arms.push(quote! {
                    #tag => match ::refract::generic::shape::take_repr(fields) {
                        ::refract::generic::shape::Repr::Unit => {
                            ::core::option::Option::Some(Self::#variant_ident)
                        }
                        _ => ::core::option::Option::None,
                    }
                });
            }
        }
    }

    Ok(ImplBody {
        shape,
        into_repr: quote! {
            match self {
                #(#into_arms),*
            }
        },
        from_repr: quote! {
            let ::refract::generic::shape::Repr::Variant { tag, fields } = repr else {
                return ::core::option::Option::None;
            };
            match tag {
                #(#from_arms),*
                _ => ::core::option::Option::None,
            }
        },
    })
}
