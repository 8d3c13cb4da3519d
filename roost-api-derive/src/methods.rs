use crate::common::{format_error_span, to_compile_error};
use darling::ast::NestedMeta;
use darling::{FromAttributes, FromMeta};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, parse_quote, FnArg, GenericArgument, Ident, ImplItem, ImplItemFn, ItemImpl, PathArguments,
    ReturnType, Type,
};

/// Options on the `#[actor_methods(...)]` attribute itself
#[derive(Debug, Default, FromMeta)]
struct TableOptions {
    /// Name of the generated table function, `method_table` by default
    #[darling(default)]
    table: Option<String>,
}

/// Per-method `#[roost(...)]` options
#[derive(Debug, Default, FromAttributes)]
#[darling(attributes(roost))]
struct MethodOptions {
    /// Register under this name instead of the Rust identifier
    #[darling(default)]
    rename: Option<String>,
    /// Leave the method out of the table
    #[darling(default)]
    skip: bool,
}

enum Slot {
    Context { mutable: bool },
    Arg(usize),
}

struct MethodSpec {
    ident: Ident,
    name: String,
    instance: bool,
    is_async: bool,
    slots: Vec<Slot>,
    args: Vec<Type>,
    output: Type,
    visibility: TokenStream2,
}

impl MethodSpec {
    fn parse(method: &ImplItemFn, rename: Option<String>) -> syn::Result<Self> {
        let sig = &method.sig;
        if !sig.generics.params.is_empty() {
            return Err(format_error_span(
                &sig.generics,
                "actor methods cannot be generic; mark helpers with #[roost(skip)]",
            ));
        }

        let mut instance = false;
        let mut slots = Vec::new();
        let mut args = Vec::new();
        for input in &sig.inputs {
            match input {
                FnArg::Receiver(receiver) => {
                    if receiver.reference.is_none() {
                        return Err(format_error_span(receiver, "actor methods must take &self or &mut self"));
                    }
                    instance = true;
                }
                FnArg::Typed(pat) => match context_param(&pat.ty) {
                    Some(mutable) => {
                        if slots.iter().any(|slot| matches!(slot, Slot::Context { .. })) {
                            return Err(format_error_span(pat, "only one ActorContext parameter is allowed"));
                        }
                        slots.push(Slot::Context { mutable });
                    }
                    None => {
                        slots.push(Slot::Arg(args.len()));
                        args.push((*pat.ty).clone());
                    }
                },
            }
        }

        let output: Type = match &sig.output {
            ReturnType::Default => parse_quote!(()),
            ReturnType::Type(_, ty) => (**ty).clone(),
        };

        let visibility = match &method.vis {
            syn::Visibility::Public(_) => quote!(::roost_api::Visibility::Public),
            syn::Visibility::Restricted(_) => quote!(::roost_api::Visibility::Restricted),
            syn::Visibility::Inherited => quote!(::roost_api::Visibility::Private),
        };

        Ok(Self {
            ident: sig.ident.clone(),
            name: rename.unwrap_or_else(|| sig.ident.to_string()),
            instance,
            is_async: sig.asyncness.is_some(),
            slots,
            args,
            output,
            visibility,
        })
    }

    fn wrapper_ident(&self) -> Ident {
        format_ident!("__roost_invoke_{}", self.ident)
    }

    fn return_shape(&self) -> TokenStream2 {
        if !self.is_async {
            return quote!(::roost_api::ReturnShape::Sync);
        }
        let value = result_ok_type(&self.output).unwrap_or(&self.output);
        if is_unit(value) {
            quote!(::roost_api::ReturnShape::Completion)
        } else {
            quote!(::roost_api::ReturnShape::Value)
        }
    }

    fn descriptor(&self) -> TokenStream2 {
        let name = &self.name;
        let params = self.args.len();
        let returns = self.return_shape();
        let visibility = &self.visibility;
        let receiver = if self.instance {
            quote!(::roost_api::Receiver::Instance)
        } else {
            quote!(::roost_api::Receiver::Static)
        };
        let wrapper = self.wrapper_ident();
        quote! {
            ::roost_api::MethodDescriptor {
                name: #name,
                params: #params,
                returns: #returns,
                visibility: #visibility,
                receiver: #receiver,
                invoke: Self::#wrapper,
            }
        }
    }

    fn wrapper(&self) -> TokenStream2 {
        let wrapper = self.wrapper_ident();
        let ident = &self.ident;
        let arg_names: Vec<Ident> = (0..self.args.len()).map(|i| format_ident!("__arg{}", i)).collect();
        let args = &self.args;

        let decode = match args.len() {
            0 => quote! { let _ = payload; },
            1 if is_bytes(&args[0]) => {
                let name = &arg_names[0];
                quote! { let #name: ::std::vec::Vec<u8> = payload; }
            }
            1 => {
                let name = &arg_names[0];
                let ty = &args[0];
                quote! { let #name: #ty = ::roost_api::__private::serde_json::from_slice(&payload)?; }
            }
            _ => quote! {
                let ( #(#arg_names),* ): ( #(#args),* ) = ::roost_api::__private::serde_json::from_slice(&payload)?;
            },
        };

        let call_args = self.slots.iter().map(|slot| match slot {
            Slot::Context { mutable: true } => quote!(ctx),
            Slot::Context { mutable: false } => quote!(&*ctx),
            Slot::Arg(i) => {
                let name = &arg_names[*i];
                quote!(#name)
            }
        });
        let target = if self.instance {
            quote!(actor.#ident)
        } else {
            quote!(Self::#ident)
        };
        let await_token = if self.is_async { quote!(.await) } else { quote!() };

        let mut unused = TokenStream2::new();
        if !self.instance {
            unused.extend(quote! { let _ = &actor; });
        }
        if !self.slots.iter().any(|slot| matches!(slot, Slot::Context { .. })) {
            unused.extend(quote! { let _ = &ctx; });
        }

        let ok_type = result_ok_type(&self.output);
        let value_type = ok_type.unwrap_or(&self.output);
        let try_token = if ok_type.is_some() { quote!(?) } else { quote!() };
        let body = if is_unit(value_type) {
            quote! {
                #target( #(#call_args),* ) #await_token #try_token;
                Ok(::std::vec::Vec::new())
            }
        } else if is_bytes(value_type) {
            quote! {
                let __value: ::std::vec::Vec<u8> = #target( #(#call_args),* ) #await_token #try_token;
                Ok(__value)
            }
        } else {
            quote! {
                let __value = #target( #(#call_args),* ) #await_token #try_token;
                Ok(::roost_api::__private::serde_json::to_vec(&__value)?)
            }
        };

        quote! {
            #[doc(hidden)]
            #[allow(non_snake_case, clippy::let_unit_value)]
            fn #wrapper<'__roost>(
                actor: &'__roost mut Self,
                ctx: &'__roost mut ::roost_api::ActorContext,
                payload: ::roost_api::Payload,
            ) -> ::roost_api::BoxedFuture<'__roost, ::roost_api::ActorResult<::roost_api::Payload>> {
                ::std::boxed::Box::pin(async move {
                    #unused
                    #decode
                    #body
                })
            }
        }
    }
}

pub(crate) fn actor_methods_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = match NestedMeta::parse_meta_list(attr.into()).map_err(darling::Error::from) {
        Ok(list) => match TableOptions::from_list(&list) {
            Ok(options) => options,
            Err(err) => return err.write_errors().into(),
        },
        Err(err) => return err.write_errors().into(),
    };
    let mut input = parse_macro_input!(item as ItemImpl);
    if input.trait_.is_some() {
        return to_compile_error(syn::Error::new(
            Span::call_site(),
            "#[actor_methods] must be placed on an inherent impl block",
        ));
    }

    let mut specs = Vec::new();
    let mut errors: Option<syn::Error> = None;
    for impl_item in input.items.iter_mut() {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        let method_options = match MethodOptions::from_attributes(&method.attrs) {
            Ok(options) => options,
            Err(err) => return err.write_errors().into(),
        };
        method.attrs.retain(|attr| !attr.path().is_ident("roost"));
        if method_options.skip {
            continue;
        }
        match MethodSpec::parse(method, method_options.rename) {
            Ok(spec) => specs.push(spec),
            Err(err) => match errors.as_mut() {
                Some(existing) => existing.combine(err),
                None => errors = Some(err),
            },
        }
    }
    if let Some(err) = errors {
        return to_compile_error(err);
    }

    let table = format_ident!("{}", options.table.as_deref().unwrap_or("method_table"));
    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();
    let wrappers = specs.iter().map(MethodSpec::wrapper);
    let descriptors = specs.iter().map(MethodSpec::descriptor);

    let expanded = quote! {
        #input

        impl #impl_generics #self_ty #where_clause {
            /// Methods declared in this impl block, callable by name.
            pub fn #table() -> ::roost_api::MethodTable<Self> {
                ::roost_api::MethodTable::new()
                    #( .with(#descriptors) )*
            }

            #(#wrappers)*
        }
    };
    TokenStream::from(expanded)
}

// `Some(mutable)` for `&ActorContext` / `&mut ActorContext` under any path
fn context_param(ty: &Type) -> Option<bool> {
    let Type::Reference(reference) = ty else {
        return None;
    };
    let Type::Path(path) = reference.elem.as_ref() else {
        return None;
    };
    let last = path.path.segments.last()?;
    (last.ident == "ActorContext").then_some(reference.mutability.is_some())
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}

fn is_bytes(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    let Some(last) = path.path.segments.last() else {
        return false;
    };
    if last.ident != "Vec" {
        return false;
    }
    match &last.arguments {
        PathArguments::AngleBracketed(args) => matches!(
            args.args.first(),
            Some(GenericArgument::Type(Type::Path(inner))) if inner.path.is_ident("u8")
        ),
        _ => false,
    }
}

// Success type of `Result<T, _>` / `ActorResult<T>`
fn result_ok_type(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let last = path.path.segments.last()?;
    if last.ident != "Result" && last.ident != "ActorResult" {
        return None;
    }
    match &last.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(GenericArgument::Type(ok)) => Some(ok),
            _ => None,
        },
        _ => None,
    }
}
