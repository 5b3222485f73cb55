use syn::{Fields, Ident, ItemStruct, Type};

/// Necessary information for a fixed-layout header struct to generate
/// trait implementations.
pub struct StructInfo {
    pub struct_name: Ident,
    pub field_names: Vec<Ident>,
    pub field_types: Vec<Type>,
}

impl StructInfo {
    /// Extract field names and types in declaration order. Headers
    /// are serialized in exactly this order so only non-generic
    /// structs with named fields are accepted.
    pub fn from_item_struct(i: ItemStruct, trait_name: &str) -> Self {
        if !i.generics.params.is_empty() {
            panic!("{} can only be derived for non-generic structs", trait_name);
        }
        let (field_names, field_types) = match i.fields {
            Fields::Named(fields) => fields
                .named
                .into_iter()
                .map(|field| (field.ident.expect("Must be named"), field.ty))
                .unzip(),
            Fields::Unit => (Vec::new(), Vec::new()),
            Fields::Unnamed(_) => {
                panic!("{} can only be derived for structs with named fields", trait_name)
            }
        };
        StructInfo {
            struct_name: i.ident,
            field_names,
            field_types,
        }
    }
}
