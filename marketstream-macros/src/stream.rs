use proc_macro::TokenStream;
use proc_macro2::{Ident, Literal, Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    Expr, ExprLit, ItemFn, Lit, MetaNameValue, Path, Token, parse_macro_input,
    punctuated::Punctuated, spanned::Spanned,
};

use proc_macro_crate::{FoundCrate, crate_name};

const OPTIONS: &[&str] = &[
    "exchange",
    "symbols",
    "timeframe",
    "auto_reconnect",
    "reconnect_delay",
    "max_reconnect_attempts",
    "backoff_factor",
    "max_reconnect_delay",
    "jitter_percent",
    "name",
    "connector",
];

fn resolve_marketstream_path() -> Path {
    // Allow using either dependency or the local crate name
    let found = crate_name("marketstream").unwrap_or(FoundCrate::Itself);
    match found {
        FoundCrate::Itself => syn::parse_quote! { marketstream },
        FoundCrate::Name(name) => {
            let ident = Ident::new(&name, Span::call_site());
            syn::parse_quote! { #ident }
        }
    }
}

// Seconds may be written as integers; the builder takes f64.
fn seconds(value: &Expr) -> syn::Result<TokenStream2> {
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Int(int), ..
        }) => {
            let secs: f64 = int.base10_parse()?;
            let lit = Literal::f64_suffixed(secs);
            Ok(quote! { #lit })
        }
        other => Ok(quote! { #other }),
    }
}

fn setter_for(option: &MetaNameValue) -> syn::Result<(String, TokenStream2)> {
    let key = option
        .path
        .get_ident()
        .map(ToString::to_string)
        .unwrap_or_default();
    let value = &option.value;
    let call = match key.as_str() {
        "exchange" | "symbols" | "timeframe" | "auto_reconnect" | "backoff_factor"
        | "jitter_percent" | "name" | "connector" => {
            let method = format_ident!("{}", key);
            quote! { .#method(#value) }
        }
        "reconnect_delay" => {
            let secs = seconds(value)?;
            quote! { .reconnect_delay_secs(#secs) }
        }
        "max_reconnect_delay" => {
            let secs = seconds(value)?;
            quote! { .max_reconnect_delay_secs(#secs) }
        }
        "max_reconnect_attempts" => match value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(s), ..
            }) if s.value().eq_ignore_ascii_case("unbounded") => {
                quote! { .unbounded_reconnects() }
            }
            Expr::Lit(ExprLit {
                lit: Lit::Str(s), ..
            }) => {
                return Err(syn::Error::new(
                    s.span(),
                    "max_reconnect_attempts expects a count or \"unbounded\"",
                ));
            }
            other => quote! { .max_reconnect_attempts(#other) },
        },
        _ => {
            return Err(syn::Error::new(
                option.path.span(),
                format!(
                    "unknown market_stream option; expected one of: {}",
                    OPTIONS.join(", ")
                ),
            ));
        }
    };
    Ok((key, call))
}

fn expand(options: Punctuated<MetaNameValue, Token![,]>, func: ItemFn) -> syn::Result<TokenStream2> {
    let sig = &func.sig;
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(
            sig.fn_token.span(),
            "#[market_stream] requires an async fn",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            sig.generics.span(),
            "#[market_stream] handlers cannot be generic",
        ));
    }
    if sig.inputs.len() != 1 {
        return Err(syn::Error::new(
            sig.inputs.span(),
            "#[market_stream] handlers take exactly one MarketDataRecord argument",
        ));
    }

    let mut seen: Vec<String> = Vec::new();
    let mut calls = Vec::with_capacity(options.len());
    for option in &options {
        let (key, call) = setter_for(option)?;
        if seen.contains(&key) {
            return Err(syn::Error::new(
                option.path.span(),
                format!("duplicate market_stream option `{key}`"),
            ));
        }
        seen.push(key);
        calls.push(call);
    }

    let ms = resolve_marketstream_path();
    let attrs = &func.attrs;
    let vis = &func.vis;
    let ident = &sig.ident;
    let inputs = &sig.inputs;
    let output = &sig.output;
    let body = &func.block;
    let default_name = ident.to_string();

    Ok(quote! {
        #(#attrs)*
        #vis fn #ident() -> ::core::result::Result<
            #ms::Streamer<impl #ms::RecordHandler>,
            #ms::StreamError,
        > {
            async fn __market_stream_handler(#inputs) #output #body

            #ms::streamer()
                .name(#default_name)
                #(#calls)*
                .build(__market_stream_handler)
        }
    })
}

pub fn market_stream_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options =
        parse_macro_input!(attr with Punctuated::<MetaNameValue, Token![,]>::parse_terminated);
    let func = parse_macro_input!(item as ItemFn);
    expand(options, func)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
