// Helpers shared by the macros in this crate

/// Builds a spanned compile error.
pub fn format_error_span<T: quote::ToTokens>(item: &T, message: &str) -> syn::Error {
    syn::Error::new_spanned(item, message)
}

/// Convert a syn::Error to a TokenStream that can be returned from a proc_macro function
pub fn to_compile_error(error: syn::Error) -> proc_macro::TokenStream {
    error.to_compile_error().into()
}
