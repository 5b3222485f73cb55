use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ItemStruct;

use crate::shared::StructInfo;

pub fn impl_tobytes_struct(is: ItemStruct) -> TokenStream2 {
    let StructInfo {
        struct_name,
        field_names,
        field_types,
    } = StructInfo::from_item_struct(is, "ToBytes");

    quote! {
        impl genl_netdev::ToBytes for #struct_name {
            fn to_bytes(&self, buffer: &mut std::io::Cursor<Vec<u8>>) -> Result<(), genl_netdev::err::SerError> {
                #( <#field_types as genl_netdev::ToBytes>::to_bytes(&self.#field_names, buffer)?; )*
                Ok(())
            }
        }
    }
}
