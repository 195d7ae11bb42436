//! Record derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, LitStr, Result};

struct Column {
    field: syn::Ident,
    name: String,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let mut columns = Vec::new();
    let mut seen = HashSet::new();
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let Some(column) = parse_field_attrs(field, &ident)? else {
            continue;
        };
        if !seen.insert(column.clone()) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate record column \"{column}\""),
            ));
        }
        columns.push(Column {
            field: ident,
            name: column,
        });
    }

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let arms = columns.iter().map(|c| {
        let field = &c.field;
        let col = &c.name;
        quote! {
            #col => ::std::option::Option::Some(::pgfrag::Value::from(
                ::std::clone::Clone::clone(&self.#field),
            )),
        }
    });

    Ok(quote! {
        impl #impl_generics ::pgfrag::Record for #name #ty_generics #where_clause {
            fn keys(&self) -> ::std::vec::Vec<::std::string::String> {
                ::std::vec![#(::std::string::String::from(#names)),*]
            }

            fn get(&self, key: &str) -> ::std::option::Option<::pgfrag::Value> {
                match key {
                    #(#arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}

/// Column name for `field`, or `None` when it is skipped.
fn parse_field_attrs(field: &syn::Field, ident: &syn::Ident) -> Result<Option<String>> {
    let mut column = ident.unraw().to_string();
    let mut skip = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                column = lit.value();
                Ok(())
            } else {
                Err(meta.error("expected `rename = \"...\"` or `skip`"))
            }
        })?;
    }

    Ok(if skip { None } else { Some(column) })
}
