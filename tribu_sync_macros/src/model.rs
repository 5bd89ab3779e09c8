use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Field, Fields, Ident, LitStr};

pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let collection = match collection_attr(&input.attrs)? {
        Some(collection) => collection,
        None => default_collection(name),
    };
    let id = id_field(input)?;

    Ok(quote! {
        impl ::tribu_sync::Model for #name {
            const COLLECTION: &'static str = #collection;

            fn id(&self) -> &str {
                &self.#id
            }
        }
    })
}

/// `#[model(collection = "...")]` on the struct.
fn collection_attr(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut collection = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("model")) {
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("collection") {
                return Err(meta.error("expected `collection = \"...\"`"));
            }
            let value: LitStr = meta.value()?.parse()?;
            collection = Some(value.value());
            Ok(())
        })?;
    }
    Ok(collection)
}

fn is_marked_id(field: &Field) -> syn::Result<bool> {
    let mut marked = false;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("model")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                marked = true;
                Ok(())
            } else {
                Err(meta.error("expected `id`"))
            }
        })?;
    }
    Ok(marked)
}

/// The `#[model(id)]` field, else a field named `id`.
fn id_field(input: &DeriveInput) -> syn::Result<Ident> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Model needs a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Model can only be derived for structs",
            ))
        }
    };

    for field in fields {
        if let Some(ident) = &field.ident {
            if is_marked_id(field)? {
                return Ok(ident.clone());
            }
        }
    }
    fields
        .iter()
        .filter_map(|f| f.ident.clone())
        .find(|ident| ident == "id")
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &input.ident,
                "mark the id field with #[model(id)] or name it `id`",
            )
        })
}

/// `BackfillCursor` -> `backfill_cursors`.
fn default_collection(name: &Ident) -> String {
    let mut out = String::new();
    for (i, ch) in name.to_string().chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(ch.to_lowercase());
    }
    out.push('s');
    out
}
