use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

use proc_macro::TokenStream;

#[proc_macro_derive(ToBytes)]
pub fn derive_to_bytes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;

    let fields: Vec<syn::Member> = match input.data {
        Data::Struct(ref s) => match s.fields {
            Fields::Named(ref nf) => nf
                .named
                .iter()
                .map(|f| f.ident.clone().unwrap().into())
                .collect(),
            Fields::Unnamed(ref uf) => uf
                .unnamed
                .iter()
                .enumerate()
                .map(|(i, _)| syn::Index::from(i).into())
                .collect(),
            Fields::Unit => Vec::new(),
        },
        _ => unreachable!("ToBytes can only be derived for structs"),
    };

    let expanded = quote! {
        impl crate::byteorder::WriteBytesBe for #name {
            fn write_be(&self, dst: &mut Vec<u8>) {
                #( crate::byteorder::WriteBytesBe::write_be(&self.#fields, dst); )*
            }
        }

        impl crate::byteorder::WriteBytesLe for #name {
            fn write_le(&self, dst: &mut Vec<u8>) {
                #( crate::byteorder::WriteBytesLe::write_le(&self.#fields, dst); )*
            }
        }
    };

    TokenStream::from(expanded)
}
