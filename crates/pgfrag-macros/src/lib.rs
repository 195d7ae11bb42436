//! Procedural macros for pgfrag
//!
//! Provides the `sql!` template macro and `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod record;
mod template;

/// Build a fragment from a template literal.
///
/// Each `{}` is an interpolation slot filled by the next argument; `{{` and
/// `}}` stand for literal braces. Arguments go through `pgfrag::IntoArg`:
/// fragments are spliced, everything else is bound as a parameter.
///
/// Expands to a `pgfrag::Result<pgfrag::Fragment>`.
///
/// # Example
///
/// ```ignore
/// let q = pgfrag::sql!("SELECT * FROM users WHERE id = {} AND name = {}", 123, "Alice")?;
/// assert_eq!(q.to_sql(), "SELECT * FROM users WHERE id = $1 AND name = $2");
/// ```
///
/// A slot/argument count mismatch is a compile error.
#[proc_macro]
pub fn sql(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as template::SqlInput);
    template::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `Record` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use pgfrag::Record;
///
/// #[derive(Record)]
/// struct NewUser {
///     name: String,
///     #[record(rename = "years")]
///     age: i32,
///     #[record(skip)]
///     draft: bool,
/// }
/// ```
///
/// # Attributes
///
/// - `#[record(rename = "col")]` - Use a different column name
/// - `#[record(skip)]` - Leave the field out of the row
///
/// Every included field must be `Clone + Into<pgfrag::Value>`.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
