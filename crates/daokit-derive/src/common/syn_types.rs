//! Type helper utilities for syn type analysis.

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_generic(ty, "Option")
}

/// Extract the inner type T from Vec<T>, or return None if not a Vec type.
pub fn vec_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_generic(ty, "Vec")
}

fn single_generic<'a>(ty: &'a syn::Type, name: &str) -> Option<&'a syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != name {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

fn last_ident(ty: &syn::Type) -> Option<String> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    type_path.path.segments.last().map(|seg| seg.ident.to_string())
}

/// Name of the `daokit::FieldType` variant for a field type, looking through `Option`.
pub fn field_type_variant(ty: &syn::Type) -> &'static str {
    let ty = option_inner(ty).unwrap_or(ty);
    if let Some(inner) = vec_inner(ty) {
        return match last_ident(inner).as_deref() {
            Some("u8") => "Bytes",
            _ => "Other",
        };
    }
    match last_ident(ty).as_deref() {
        Some(
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128"
            | "usize",
        ) => "Integer",
        Some("f32" | "f64") => "Float",
        Some("String" | "str") => "Text",
        Some("bool") => "Bool",
        Some("NaiveDate" | "NaiveDateTime" | "DateTime") => "DateTime",
        _ => "Other",
    }
}
