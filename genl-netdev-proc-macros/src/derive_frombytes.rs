use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ItemStruct;

use crate::shared::StructInfo;

pub fn impl_frombytes_struct(is: ItemStruct) -> TokenStream2 {
    let StructInfo {
        struct_name,
        field_names,
        field_types,
    } = StructInfo::from_item_struct(is, "FromBytes");

    quote! {
        impl<'lt> genl_netdev::FromBytes<'lt> for #struct_name {
            fn from_bytes(buffer: &mut std::io::Cursor<&'lt [u8]>) -> Result<Self, genl_netdev::err::DeError> {
                log::trace!("Deserializing data type {}", stringify!(#struct_name));
                Ok(#struct_name {
                    #(
                        #field_names: {
                            log::trace!(
                                "Deserializing field type {}",
                                std::any::type_name::<#field_types>(),
                            );
                            let ok = <#field_types as genl_netdev::FromBytes>::from_bytes(buffer)?;
                            log::trace!("Field deserialized: {:?}", ok);
                            ok
                        },
                    )*
                })
            }
        }
    }
}
