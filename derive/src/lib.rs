//! Derive macros for Freewheel's record receiver traits.
//!
//! These are re-exported from `freewheel::avec`; depend on them through that
//! crate with the `derive` feature rather than directly.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_record;
mod from_records;

/// Implement `freewheel::avec::FromRecord` from `#[field(..)]` attributes.
#[proc_macro_derive(FromRecord, attributes(field))]
pub fn derive_from_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_record::expand_from_record(&input).unwrap_or_else(|err| err.into_compile_error().into())
}

/// Implement `freewheel::avec::FromRecords` from `#[record(..)]` attributes.
#[proc_macro_derive(FromRecords, attributes(record))]
pub fn derive_from_records(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_records::expand_from_records(&input).unwrap_or_else(|err| err.into_compile_error().into())
}
