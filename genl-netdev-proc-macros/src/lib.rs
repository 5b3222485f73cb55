//! Procedural macros to be used with the library `genl-netdev`.
//!
//! Generated code refers to the library by its crate name,
//! `genl_netdev`, so the library re-exports itself under that name.

use proc_macro::TokenStream;
use syn::{parse, parse_macro_input, Item, ItemEnum};

mod shared;

mod derive_frombytes;
mod derive_size;
mod derive_tobytes;
mod netdev_enum;

use derive_frombytes::*;
use derive_size::*;
use derive_tobytes::*;
use netdev_enum::*;

/// Turn a field-less enum with explicit discriminants into a
/// netlink constant type with an `UnrecognizedConst` catch-all.
#[proc_macro_attribute]
pub fn netdev_enum(attr: TokenStream, item: TokenStream) -> TokenStream {
    let enm = parse_macro_input!(item as ItemEnum);
    generate_netdev_enum(attr.into(), enm)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

#[proc_macro_derive(Size)]
pub fn proc_macro_size(ts: TokenStream) -> TokenStream {
    let item = parse::<Item>(ts).unwrap();
    TokenStream::from(match item {
        Item::Struct(strct) => impl_size_struct(strct),
        _ => panic!("Size can only be derived for structs"),
    })
}

#[proc_macro_derive(TypeSize)]
pub fn proc_macro_type_size(ts: TokenStream) -> TokenStream {
    let item = parse::<Item>(ts).unwrap();
    TokenStream::from(match item {
        Item::Struct(strct) => impl_type_size_struct(strct),
        _ => panic!("TypeSize can only be derived for structs"),
    })
}

#[proc_macro_derive(ToBytes)]
pub fn proc_macro_tobytes(ts: TokenStream) -> TokenStream {
    let item = parse::<Item>(ts).unwrap();
    TokenStream::from(match item {
        Item::Struct(strct) => impl_tobytes_struct(strct),
        _ => panic!("ToBytes can only be derived for structs"),
    })
}

#[proc_macro_derive(FromBytes)]
pub fn proc_macro_frombytes(ts: TokenStream) -> TokenStream {
    let item = parse::<Item>(ts).unwrap();
    TokenStream::from(match item {
        Item::Struct(strct) => impl_frombytes_struct(strct),
        _ => panic!("FromBytes can only be derived for structs"),
    })
}
