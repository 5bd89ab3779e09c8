mod model;

use proc_macro::TokenStream;

/// Derive macro implementing `tribu_sync::Model` for a stored record.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Model)]
/// #[model(collection = "contacts")]
/// pub struct Contact {
///     #[model(id)]
///     pub local_id: String,
///     pub display_name: String,
/// }
/// ```
///
/// - `collection` defaults to the snake_case struct name plus `s`.
/// - The id field is the one marked `#[model(id)]`, or a field named `id`.
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    model::derive_model(input)
}
