use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Expr, ExprLit, ItemFn, Lit, MetaNameValue, Token};

/// Runs an `async fn` test on a fresh runtime.
///
/// `#[core_async::test]` uses a current-thread runtime;
/// `#[core_async::test(worker_threads = 4)]` uses a multi-threaded one.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Test)
}

#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item, MacroKind::Main)
}

enum MacroKind {
    Test,
    Main,
}

enum Flavor {
    CurrentThread,
    MultiThread(usize),
}

fn parse_flavor(attr: TokenStream) -> syn::Result<Flavor> {
    if attr.is_empty() {
        return Ok(Flavor::CurrentThread);
    }

    let parser = Punctuated::<MetaNameValue, Token![,]>::parse_terminated;
    let args = syn::parse::Parser::parse(parser, attr)?;

    let mut flavor = Flavor::CurrentThread;
    for arg in args {
        if !arg.path.is_ident("worker_threads") {
            return Err(syn::Error::new_spanned(
                &arg.path,
                "unknown argument, expected `worker_threads = <n>`",
            ));
        }
        let workers = match &arg.value {
            Expr::Lit(ExprLit {
                lit: Lit::Int(value),
                ..
            }) => value.base10_parse::<usize>()?,
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "`worker_threads` expects an integer literal",
                ))
            }
        };
        if workers == 0 {
            return Err(syn::Error::new_spanned(
                &arg.value,
                "`worker_threads` must be at least 1",
            ));
        }
        flavor = Flavor::MultiThread(workers);
    }

    Ok(flavor)
}

fn expand(attr: TokenStream, item: TokenStream, kind: MacroKind) -> TokenStream {
    let flavor = match parse_flavor(attr) {
        Ok(flavor) => flavor,
        Err(err) => return err.to_compile_error().into(),
    };

    let input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            input.sig.fn_token,
            "core_async attribute macros require `async fn`",
        )
        .to_compile_error()
        .into();
    }

    let mut sync_sig = input.sig.clone();
    sync_sig.asyncness = None;

    let attrs = input.attrs;
    let vis = input.vis;
    let block = input.block;

    let body: TokenStream2 = match flavor {
        Flavor::CurrentThread => quote! {
            core_async::runtime::block_on(async move #block)
        },
        Flavor::MultiThread(workers) => quote! {
            core_async::runtime::block_on_multi_thread(#workers, async move #block)
        },
    };

    let test_attr = match kind {
        MacroKind::Test => quote!(#[test]),
        MacroKind::Main => quote!(),
    };

    quote! {
        #(#attrs)*
        #test_attr
        #vis #sync_sig {
            #body
        }
    }
    .into()
}
