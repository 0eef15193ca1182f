use std::collections::BTreeMap;

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, Ident, LitInt, Result, Type, spanned::Spanned,
};

pub(crate) fn expand_from_records(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new_spanned(
            input,
            "`FromRecords` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new_spanned(
            input,
            "`FromRecords` may only be derived on structs with named fields.",
        ))?
    };

    let mut receivers: BTreeMap<u16, (LitInt, Ident, Collection)> = BTreeMap::new();

    for field in &fields.named {
        let Some((number, name, collection)) = parse_field(field)? else {
            continue; // Skip fields without an attribute.
        };

        let message = number.base10_parse::<u16>()?;
        if receivers.insert(message, (number.clone(), name, collection)).is_some() {
            Err(Error::new(
                number.span(),
                "Global message numbers must be unique.",
            ))?
        }
    }

    let cases = receivers.into_values().map(|(number, name, collection)| {
        let receiver = match collection {
            Collection::Latest => quote! {
                Some(self.#name.insert(::core::default::Default::default()))
            },
            Collection::All => quote! {
                self.#name.push(::core::default::Default::default());
                self.#name.last_mut().map(|r| r as _)
            },
        };

        quote! { #number => { #receiver } }
    });

    let name = &input.ident;

    let expanded = quote! {
        impl ::freewheel::avec::FromRecords for #name {
            fn add_record(&mut self, id: u16) -> Option<&mut dyn ::freewheel::avec::FromRecord> {
                match id {
                    #(#cases)*
                    _ => None,
                }
            }
        }
    };

    Ok(expanded.into())
}

/// How the records received for one message number are kept.
#[derive(Debug, Clone, Copy)]
enum Collection {
    /// `Option<T>`: the last record received.
    Latest,
    /// `Vec<T>`: every record, in order.
    All,
}

/// Read the `#[record(N)]` attribute of a struct field, if present.
fn parse_field(field: &Field) -> Result<Option<(LitInt, Ident, Collection)>> {
    let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("record")) else {
        return Ok(None);
    };

    let Some(name) = field.ident.clone() else {
        Err(Error::new_spanned(field, "Field must be named."))?
    };

    let number: LitInt = attr.meta.require_list()?.parse_args()?;

    let collection = match &field.ty {
        Type::Path(path) => match path.path.segments.last() {
            Some(segment) if segment.ident == "Option" => Some(Collection::Latest),
            Some(segment) if segment.ident == "Vec" => Some(Collection::All),
            _ => None,
        },
        _ => None,
    };

    let Some(collection) = collection else {
        Err(Error::new(
            field.ty.span(),
            "Field must have an `Option<T>` or `Vec<T>` type.",
        ))?
    };

    Ok(Some((number, name, collection)))
}
