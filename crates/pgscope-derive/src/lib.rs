//! Derive macro for pgscope model metadata.
//!
//! This crate provides `#[derive(Model)]`, which describes a struct's table
//! to the scope builders: table name, primary key and the SQL type of every
//! column. Array scopes rely on those types to cast their literals.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, GenericArgument, Ident, Lit,
    Meta, PathArguments, Type,
};

/// Derives `pgscope::Model` for a struct with named fields.
///
/// # Attributes
///
/// - `#[model(table = "table_name")]` - Specifies the SQL table name
///   (optional, defaults to snake_case of struct name)
///
/// # Field Attributes
///
/// - `#[column(primary_key)]` - Marks the field as primary key
/// - `#[column(name = "column_name")]` - Specifies the SQL column name
///   (optional, defaults to field name)
/// - `#[column(sql_type = "text[]")]` - Specifies the SQL type
/// - `#[column(skip)]` - Leaves the field out of the metadata
///
/// Without `sql_type` the type is inferred from the field type: integers,
/// floats, `bool`, `String` and `Vec<u8>` map to their PostgreSQL types,
/// `Vec<T>` maps to `T`'s type followed by `[]`, and `Option<T>` maps to
/// `T`'s type. Any other field type needs an explicit `sql_type`.
#[proc_macro_derive(Model, attributes(model, column))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_model_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_model_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_name = get_table_name(&input.attrs, struct_name)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Model derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Model derive only supports structs",
            ));
        }
    };

    let mut columns: Vec<(String, String)> = Vec::new();
    let mut primary_key: Option<String> = None;
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_column_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let column_name = attrs.name.unwrap_or_else(|| field_name.to_string());
        let sql_type = match attrs.sql_type {
            Some(sql_type) => sql_type,
            None => infer_sql_type(&field.ty).ok_or_else(|| {
                syn::Error::new_spanned(
                    &field.ty,
                    "cannot infer the SQL type of this field; add #[column(sql_type = \"...\")]",
                )
            })?,
        };

        if attrs.primary_key {
            if primary_key.is_some() {
                return Err(syn::Error::new_spanned(
                    field_name,
                    "only one field can be marked #[column(primary_key)]",
                ));
            }
            primary_key = Some(column_name.clone());
        }
        columns.push((column_name, sql_type));
    }

    let column_calls: Vec<TokenStream2> = columns
        .iter()
        .map(|(name, sql_type)| quote! { .column(#name, #sql_type) })
        .collect();
    let primary_key_call = primary_key.map(|pk| quote! { .primary_key(#pk) });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let expanded = quote! {
        impl #impl_generics ::pgscope::Model for #struct_name #ty_generics #where_clause {
            const TABLE_NAME: &'static str = #table_name;

            fn meta() -> ::pgscope::ModelMeta {
                ::pgscope::ModelMeta::new(#table_name)
                    #primary_key_call
                    #(#column_calls)*
            }
        }
    };

    Ok(expanded)
}

struct ColumnAttrs {
    name: Option<String>,
    sql_type: Option<String>,
    primary_key: bool,
    skip: bool,
}

fn string_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(lit) = &value {
        if let Lit::Str(s) = &lit.lit {
            return Ok(s.value());
        }
    }
    Err(syn::Error::new_spanned(value, "expected a string literal"))
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("model") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    table_name = Some(string_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported model attribute"))
                }
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    // Default to snake_case of struct name
    Ok(to_snake_case(&struct_name.to_string()))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs {
        name: None,
        sql_type: None,
        primary_key: false,
        skip: false,
    };

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("primary_key") {
                    result.primary_key = true;
                } else if meta.path.is_ident("skip") {
                    result.skip = true;
                } else if meta.path.is_ident("name") {
                    result.name = Some(string_value(&meta)?);
                } else if meta.path.is_ident("sql_type") {
                    result.sql_type = Some(string_value(&meta)?);
                } else {
                    return Err(meta.error("unsupported column attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
}

/// Returns the single generic argument of `ty` if its last path segment is
/// `wrapper`, e.g. `T` for `Option<T>`.
fn generic_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

fn infer_sql_type(ty: &Type) -> Option<String> {
    if let Some(inner) = generic_inner(ty, "Option") {
        return infer_sql_type(inner);
    }
    if let Some(inner) = generic_inner(ty, "Vec") {
        if is_ident(inner, "u8") {
            return Some("bytea".to_string());
        }
        return infer_sql_type(inner).map(|element| format!("{element}[]"));
    }
    scalar_sql_type(ty).map(str::to_string)
}

fn is_ident(ty: &Type, name: &str) -> bool {
    matches!(ty, Type::Path(path) if path.path.is_ident(name))
}

fn scalar_sql_type(ty: &Type) -> Option<&'static str> {
    let Type::Path(path) = ty else {
        return None;
    };
    let ident = path.path.segments.last()?.ident.to_string();
    let sql_type = match ident.as_str() {
        "i8" | "u8" | "i16" => "smallint",
        "u16" | "i32" => "integer",
        "u32" | "i64" => "bigint",
        "f32" => "real",
        "f64" => "double precision",
        "bool" => "boolean",
        "String" | "str" => "text",
        _ => return None,
    };
    Some(sql_type)
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(src: &str) -> Type {
        syn::parse_str(src).unwrap()
    }

    #[test]
    fn test_infer_scalars() {
        assert_eq!(infer_sql_type(&ty("i64")).as_deref(), Some("bigint"));
        assert_eq!(infer_sql_type(&ty("i32")).as_deref(), Some("integer"));
        assert_eq!(infer_sql_type(&ty("f64")).as_deref(), Some("double precision"));
        assert_eq!(infer_sql_type(&ty("bool")).as_deref(), Some("boolean"));
        assert_eq!(infer_sql_type(&ty("String")).as_deref(), Some("text"));
        assert_eq!(infer_sql_type(&ty("std::string::String")).as_deref(), Some("text"));
    }

    #[test]
    fn test_infer_wrappers() {
        assert_eq!(infer_sql_type(&ty("Vec<String>")).as_deref(), Some("text[]"));
        assert_eq!(infer_sql_type(&ty("Option<Vec<i32>>")).as_deref(), Some("integer[]"));
        assert_eq!(infer_sql_type(&ty("Vec<u8>")).as_deref(), Some("bytea"));
        assert_eq!(infer_sql_type(&ty("Option<i16>")).as_deref(), Some("smallint"));
    }

    #[test]
    fn test_infer_unknown() {
        assert_eq!(infer_sql_type(&ty("Uuid")), None);
        assert_eq!(infer_sql_type(&ty("Vec<Uuid>")), None);
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("UserGroup"), "user_group");
        assert_eq!(to_snake_case("Post"), "post");
    }
}
