use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ItemStruct;

use crate::shared::StructInfo;

pub fn impl_size_struct(is: ItemStruct) -> TokenStream2 {
    let StructInfo {
        struct_name,
        field_names,
        field_types,
    } = StructInfo::from_item_struct(is, "Size");

    quote! {
        impl genl_netdev::Size for #struct_name {
            fn unpadded_size(&self) -> usize {
                0 #( + <#field_types as genl_netdev::Size>::unpadded_size(&self.#field_names) )*
            }
        }
    }
}

pub fn impl_type_size_struct(is: ItemStruct) -> TokenStream2 {
    let StructInfo {
        struct_name,
        field_types,
        ..
    } = StructInfo::from_item_struct(is, "TypeSize");

    quote! {
        impl genl_netdev::TypeSize for #struct_name {
            fn type_size() -> usize {
                0 #( + <#field_types as genl_netdev::TypeSize>::type_size() )*
            }
        }
    }
}
