//! `sql!` macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Expr, LitStr, Result, Token};

pub struct SqlInput {
    template: LitStr,
    args: Punctuated<Expr, Token![,]>,
}

impl Parse for SqlInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let template: LitStr = input.parse()?;
        let args = if input.is_empty() {
            Punctuated::new()
        } else {
            input.parse::<Token![,]>()?;
            Punctuated::parse_terminated(input)?
        };
        Ok(Self { template, args })
    }
}

pub fn expand(input: SqlInput) -> Result<TokenStream> {
    let parts = split_template(&input.template.value())
        .map_err(|msg| syn::Error::new(input.template.span(), msg))?;

    let slots = parts.len() - 1;
    if slots != input.args.len() {
        return Err(syn::Error::new(
            input.template.span(),
            format!(
                "template has {slots} `{{}}` slot(s) but {} argument(s) were given",
                input.args.len()
            ),
        ));
    }

    let args = input.args.iter();
    Ok(quote! {
        ::pgfrag::compose(
            &[#(#parts),*],
            ::std::vec![#(::pgfrag::IntoArg::into_arg(#args)),*],
        )
    })
}

/// Split at each `{}` slot, unescaping `{{` and `}}`.
///
/// Always returns one more part than there are slots.
fn split_template(template: &str) -> std::result::Result<Vec<String>, String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        match c {
            '{' => match chars.next() {
                Some('{') => current.push('{'),
                Some('}') => parts.push(std::mem::take(&mut current)),
                _ => return Err("unmatched `{` in template; write `{{` for a literal brace".into()),
            },
            '}' => match chars.next() {
                Some('}') => current.push('}'),
                _ => return Err("unmatched `}` in template; write `}}` for a literal brace".into()),
            },
            other => current.push(other),
        }
    }
    parts.push(current);
    Ok(parts)
}
