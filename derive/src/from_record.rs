use std::collections::BTreeMap;

use proc_macro::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{
    Data, DeriveInput, Error, Expr, ExprClosure, Field, Fields, GenericArgument, Ident, LitInt,
    Pat, PathArguments, Result, Token, Type,
    parse::{Parse, ParseStream},
    parse_quote,
    spanned::Spanned,
};

pub(crate) fn expand_from_record(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new(
            input.span(),
            "`FromRecord` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new(
            input.span(),
            "`FromRecord` may only be derived on structs with named fields.",
        ))?
    };

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    let mut field_cases: BTreeMap<u8, (LitInt, Receiver)> = BTreeMap::new();
    let mut time_receiver: Option<Receiver> = None;
    let mut timestamp_receiver: Option<Receiver> = None;

    for field in fields {
        let receiver = Receiver {
            name: field.name,
            element: field.element,
            handler: field.handler,
        };

        let duplicate = match field.identifier {
            FieldIdentifier::Number(number) => {
                let key = number.base10_parse::<u8>()?;
                field_cases.insert(key, (number, receiver)).is_some()
            }
            FieldIdentifier::Time => time_receiver.replace(receiver).is_some(),
            FieldIdentifier::Timestamp => timestamp_receiver.replace(receiver).is_some(),
        };

        if duplicate {
            Err(Error::new(
                field.span.into(),
                "Field identifiers must be unique.",
            ))?
        }
    }

    let field_method = (!field_cases.is_empty()).then(|| {
        let cases = field_cases.into_values().map(|(number, receiver)| {
            let Receiver {
                name,
                element,
                handler,
            } = receiver;

            let assignment = if let Some((field_type, handler)) = handler {
                let (acc, val, body) = handler;

                quote! {
                    for value in value.elements() {
                        if let Some(value) = <#element as ::freewheel::avec::FromValue>::from_value(value) {
                            (|#acc: &mut #field_type, #val| {#body})(&mut self.#name, value)
                        }
                    }
                }
            } else {
                quote! {
                    if let Some(value) = <#element as ::freewheel::avec::FromValue>::from_value(value) {
                        self.#name = Some(value)
                    }
                }
            };

            quote! { #number => { #assignment } }
        });

        quote! {
            fn add_field(&mut self, field: u8, value: &::freewheel::sans::Value) {
                match field {
                    #(#cases)*
                    _ => {}
                };
            }
        }
    });

    let time_method = time_receiver.map(|receiver| {
        let assignment = receiver.assign(format_ident!("offset"));

        quote! {
            fn add_time_offset(&mut self, offset: u8) {
                #assignment;
            }
        }
    });

    let timestamp_method = timestamp_receiver.map(|receiver| {
        let assignment = receiver.assign(format_ident!("timestamp"));

        quote! {
            fn add_timestamp(&mut self, timestamp: u32) {
                #assignment;
            }
        }
    });

    let name = &input.ident;

    let expanded = quote! {
        impl ::freewheel::avec::FromRecord for #name {
            #field_method
            #time_method
            #timestamp_method
        }
    };

    Ok(expanded.into())
}

type Handler = (Type, (Pat, Pat, Expr));

struct Receiver {
    name: Ident,
    element: Type,
    handler: Option<Handler>,
}

impl Receiver {
    /// Assign a scalar received as `value` to the struct field.
    fn assign(self, value: Ident) -> Expr {
        let name = self.name;

        if let Some((field_type, (acc, val, body))) = self.handler {
            parse_quote! {
                (|#acc: &mut #field_type, #val| {#body})(&mut self.#name, #value)
            }
        } else {
            parse_quote! { self.#name = Some(#value) }
        }
    }
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    element: Type,
    identifier: FieldIdentifier,
    handler: Option<Handler>,
    span: Span,
}

#[derive(Debug)]
enum FieldIdentifier {
    Number(LitInt),
    Time,
    Timestamp,
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let Some(name) = field.ident.clone() else {
            Err(Error::new_spanned(field, "Field must be named."))?
        };

        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("field")) else {
            return Ok(None);
        };

        let span = attr.span().unwrap();

        let FieldAttribute {
            identifier,
            handler,
        } = attr.meta.require_list()?.parse_args()?;

        let (element, handler) = if let Some(handler) = handler {
            let mut inputs = handler.inputs.iter();

            let (Some(acc), Some(parameter), None) = (inputs.next(), inputs.next(), inputs.next())
            else {
                Err(Error::new_spanned(
                    &handler,
                    "Handler closure must have two parameters.",
                ))?
            };

            let Pat::Type(pat_type) = parameter else {
                Err(Error::new_spanned(
                    parameter,
                    "Handler closure's second parameter must be annotated with the expected value type.",
                ))?
            };

            let element = (*pat_type.ty).clone();
            let parts = (acc.clone(), parameter.clone(), (*handler.body).clone());

            (element, Some((field.ty.clone(), parts)))
        } else {
            (option_argument(&field.ty)?, None)
        };

        Ok(Some(Self {
            name,
            element,
            identifier,
            handler,
            span,
        }))
    }
}

/// Extract `T` from a field of type `Option<T>`.
fn option_argument(ty: &Type) -> Result<Type> {
    if let Type::Path(path) = ty
        && let Some(segment) = path.path.segments.last()
        && segment.ident == "Option"
        && let PathArguments::AngleBracketed(arguments) = &segment.arguments
        && let Some(GenericArgument::Type(inner)) = arguments.args.first()
    {
        return Ok(inner.clone());
    }

    Err(Error::new(
        ty.span(),
        "Field without a handler must have type `Option<T>`.",
    ))
}

#[derive(Debug)]
struct FieldAttribute {
    identifier: FieldIdentifier,
    handler: Option<ExprClosure>,
}

impl Parse for FieldAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let identifier = if input.peek(Ident) {
            let ident = input.parse::<Ident>()?;
            if ident == "time" {
                FieldIdentifier::Time
            } else if ident == "timestamp" {
                FieldIdentifier::Timestamp
            } else {
                Err(Error::new_spanned(
                    ident,
                    "Field identifier must be an integer literal, `time` or `timestamp`.",
                ))?
            }
        } else {
            FieldIdentifier::Number(input.parse::<LitInt>()?)
        };

        let handler = if !input.is_empty() {
            input.parse::<Token![,]>()?;
            Some(input.parse::<ExprClosure>()?)
        } else {
            None
        };

        Ok(Self {
            identifier,
            handler,
        })
    }
}
