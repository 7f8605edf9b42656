//! Model derive macro implementation.

mod attrs;

use crate::common::syn_types::field_type_variant;
use crate::sql_ident::parse_sql_ident;
use attrs::{get_field_attr, get_table_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Result};

struct MappedField {
    position: usize,
    ident: syn::Ident,
    ty: syn::Type,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let table = get_table_name(&input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Model can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Model can only be derived for structs",
            ));
        }
    };

    let mut defs = Vec::with_capacity(fields.len());
    let mut mapped = Vec::new();
    let mut has_primary = false;

    for (position, field) in fields.iter().enumerate() {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let field_name = ident.to_string().trim_start_matches("r#").to_string();
        let attr = get_field_attr(field)?;

        let mut def = quote! { ::daokit::FieldDef::new(#position, #field_name) };
        if let Some(lit) = &attr.column {
            let column = parse_sql_ident(lit, "column name")?;
            def = quote! { #def.column(#column) };
        }

        if attr.omit {
            if attr.primary || attr.auto_increment || attr.column.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "an omitted field cannot also be a key or carry a column name",
                ));
            }
            defs.push(quote! { #def.omit() });
            continue;
        }

        if attr.primary {
            has_primary = true;
            def = quote! { #def.primary() };
        }
        if attr.auto_increment {
            def = quote! { #def.auto_increment() };
        }
        let kind = format_ident!("{}", field_type_variant(&field.ty));
        defs.push(quote! { #def.kind(::daokit::FieldType::#kind) });

        mapped.push(MappedField {
            position,
            ident,
            ty: field.ty.clone(),
        });
    }

    if mapped.is_empty() {
        return Err(syn::Error::new_spanned(
            &input,
            format!("Model `{name_str}` maps no fields"),
        ));
    }
    if !has_primary {
        return Err(syn::Error::new_spanned(
            &input,
            format!("Model `{name_str}` needs at least one #[orm(primary)] field"),
        ));
    }

    let table_tokens = match &table {
        Some(t) => quote! { ::core::option::Option::Some(#t) },
        None => quote! { ::core::option::Option::None },
    };

    let getters = mapped.iter().map(|f| {
        let MappedField { position, ident, ty } = f;
        quote! { #position => <#ty as ::daokit::ToValue>::to_value(&self.#ident), }
    });
    let setters = mapped.iter().map(|f| {
        let MappedField { position, ident, ty } = f;
        quote! { #position => self.#ident = <#ty as ::daokit::FromValue>::from_value(value)?, }
    });

    Ok(quote! {
        impl #impl_generics ::daokit::Model for #name #ty_generics #where_clause {
            const NAME: &'static str = #name_str;
            const TABLE: ::core::option::Option<&'static str> = #table_tokens;

            fn fields() -> ::std::vec::Vec<::daokit::FieldDef> {
                ::std::vec![#(#defs),*]
            }

            fn field_value(&self, position: usize) -> ::daokit::OrmResult<::daokit::Value> {
                match position {
                    #(#getters)*
                    _ => ::core::result::Result::Err(::daokit::OrmError::validation(::std::format!(
                        "{} has no mapped field at position {}",
                        #name_str,
                        position
                    ))),
                }
            }

            fn set_field(
                &mut self,
                position: usize,
                value: ::daokit::Value,
            ) -> ::daokit::OrmResult<()> {
                match position {
                    #(#setters)*
                    _ => {
                        return ::core::result::Result::Err(::daokit::OrmError::validation(::std::format!(
                            "{} has no mapped field at position {}",
                            #name_str,
                            position
                        )));
                    }
                }
                ::core::result::Result::Ok(())
            }
        }
    })
}
