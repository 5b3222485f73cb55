use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse2, parse_quote, spanned::Spanned, Error, Expr, Fields, Ident, ItemEnum, Lit,
    MetaNameValue, Result, Type,
};

/// Wire representation named by `serialized_type = "..."`.
fn serialized_type(attr: TokenStream2) -> Result<Type> {
    let nv = parse2::<MetaNameValue>(attr.clone()).map_err(|_| {
        Error::new(
            attr.span(),
            "expected #[netdev_enum(serialized_type = \"TYPE\")]",
        )
    })?;
    if !nv.path.is_ident("serialized_type") {
        return Err(Error::new(nv.path.span(), "unknown argument"));
    }
    match nv.lit {
        Lit::Str(ls) => ls.parse::<Type>(),
        lit => Err(Error::new(lit.span(), "type must be given as a string")),
    }
}

/// Strip the discriminants off the variants, returning each variant
/// name with the wire value it stood for.
fn take_values(enm: &mut ItemEnum) -> Result<(Vec<Ident>, Vec<Expr>)> {
    let mut idents = Vec::with_capacity(enm.variants.len());
    let mut values = Vec::with_capacity(enm.variants.len());
    for var in enm.variants.iter_mut() {
        if !matches!(var.fields, Fields::Unit) {
            return Err(Error::new(var.span(), "constant variants cannot carry data"));
        }
        let (_, value) = var
            .discriminant
            .take()
            .ok_or_else(|| Error::new(var.span(), "every variant needs a wire value"))?;
        idents.push(var.ident.clone());
        values.push(value);
    }
    Ok((idents, values))
}

pub fn generate_netdev_enum(attr: TokenStream2, mut enm: ItemEnum) -> Result<TokenStream2> {
    let ty = serialized_type(attr)?;
    let (idents, values) = take_values(&mut enm)?;
    enm.variants.push(parse_quote!(UnrecognizedConst(#ty)));
    let name = &enm.ident;

    Ok(quote! {
        #[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        #[allow(missing_docs)]
        #enm

        impl From<#ty> for #name {
            fn from(value: #ty) -> Self {
                #(
                    if value == (#values) {
                        return #name::#idents;
                    }
                )*
                #name::UnrecognizedConst(value)
            }
        }

        impl From<#name> for #ty {
            fn from(value: #name) -> Self {
                match value {
                    #( #name::#idents => #values, )*
                    #name::UnrecognizedConst(value) => value,
                }
            }
        }

        impl genl_netdev::Size for #name {
            fn unpadded_size(&self) -> usize {
                std::mem::size_of::<#ty>()
            }
        }

        impl genl_netdev::TypeSize for #name {
            fn type_size() -> usize {
                std::mem::size_of::<#ty>()
            }
        }

        impl genl_netdev::ToBytes for #name {
            fn to_bytes(
                &self,
                buffer: &mut std::io::Cursor<Vec<u8>>,
            ) -> Result<(), genl_netdev::err::SerError> {
                genl_netdev::ToBytes::to_bytes(&<#ty>::from(*self), buffer)
            }
        }

        impl<'lt> genl_netdev::FromBytes<'lt> for #name {
            fn from_bytes(
                buffer: &mut std::io::Cursor<&'lt [u8]>,
            ) -> Result<Self, genl_netdev::err::DeError> {
                <#ty as genl_netdev::FromBytes>::from_bytes(buffer).map(#name::from)
            }
        }
    })
}
