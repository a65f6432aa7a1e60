//! Derive macro for `sql-upsert` records.
//!
//! This crate provides `#[derive(Record)]`, which registers a struct's field
//! annotations at compile time so that no runtime introspection is needed.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Lit, LitStr, parse_macro_input};

/// Derives `sql_upsert::Record` for a struct with named fields.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - Specifies the SQL table name (optional,
///   defaults to the lower-cased struct name)
///
/// # Field Attributes
///
/// - `#[db("column")]` - Maps the field to `column`
/// - `#[db("column,primary")]` - Maps the field to `column`, part of the
///   primary key
///
/// A field without `#[db]` uses its field name as its annotation. Every field
/// type must implement `Clone` and `sql_upsert::ToSqlValue`.
#[proc_macro_derive(Record, attributes(table, db))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_record_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_record_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let type_name = struct_name.to_string();
    let table_name = get_table_name(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record derive only supports structs",
            ));
        }
    };

    let mut annotations: Vec<String> = Vec::new();
    let mut value_exprs: Vec<TokenStream2> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        annotations.push(get_annotation(&field.attrs)?.unwrap_or_else(|| field_name.to_string()));
        value_exprs.push(quote! {
            ::sql_upsert::value::ToSqlValue::to_sql_value(
                ::core::clone::Clone::clone(&self.#field_name)
            )
        });
    }

    let table_name_impl = match table_name {
        Some(name) => quote! {
            const TABLE_NAME: ::core::option::Option<&'static str> =
                ::core::option::Option::Some(#name);
        },
        None => quote! {},
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::sql_upsert::schema::Record
            for #struct_name #ty_generics #where_clause
        {
            const TYPE_NAME: &'static str = #type_name;
            const ANNOTATIONS: &'static [&'static str] = &[#(#annotations),*];
            #table_name_impl

            fn values(&self) -> ::std::vec::Vec<::sql_upsert::value::SqlValue> {
                ::std::vec![#(#value_exprs),*]
            }
        }
    })
}

fn get_table_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut table_name = None;
    for attr in attrs {
        if attr.path().is_ident("table") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: Expr = meta.value()?.parse()?;
                    if let Expr::Lit(lit) = value {
                        if let Lit::Str(s) = lit.lit {
                            table_name = Some(s.value());
                            return Ok(());
                        }
                    }
                    return Err(meta.error("expected a string literal"));
                }
                Err(meta.error("unsupported table attribute"))
            })?;
        }
    }
    Ok(table_name)
}

fn get_annotation(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut annotation = None;
    for attr in attrs {
        if attr.path().is_ident("db") {
            let value: LitStr = attr.parse_args()?;
            annotation = Some(value.value());
        }
    }
    Ok(annotation)
}
