//! Shared attribute code for netlink attributes.
//!
//! Attributes are looked up by identifier through an [`AttrHandle`].
//! When an identifier occurs more than once in a stream, the last
//! occurrence wins, matching how the kernel attribute parser fills
//! its attribute table.

use std::{io::Cursor, slice::Iter};

use crate::{
    consts::NlAttrType,
    err::DeError,
    genl::Nlattr,
    types::Buffer,
    FromBytes, FromBytesWithInput,
};

/// Trait that defines shared operations for netlink attributes.
pub trait Attribute<T> {
    /// Get the payload of the given attribute.
    ///
    /// Payloads are represented as a byte buffer so that the
    /// attribute stream can be validated against a policy before any
    /// payload is interpreted.
    fn payload(&self) -> &Buffer;

    /// Get an [`Nlattr`][crate::genl::Nlattr] payload as the
    /// provided type parameter, `R`.
    fn get_payload_as<'a, R>(&'a self) -> Result<R, DeError>
    where
        R: FromBytes<'a>,
    {
        R::from_bytes(&mut Cursor::new(self.payload().as_ref()))
    }

    /// Get an [`Nlattr`][crate::genl::Nlattr] payload as the
    /// provided type parameter, `R`, using the payload length as
    /// input.
    fn get_payload_as_with_len<'a, R>(&'a self) -> Result<R, DeError>
    where
        R: FromBytesWithInput<'a, Input = usize>,
    {
        R::from_bytes_with_input(
            &mut Cursor::new(self.payload().as_ref()),
            self.payload().len(),
        )
    }
}

/// Handle for looking up attributes in a parsed attribute stream
pub struct AttrHandle<'a, T> {
    attrs: &'a [Nlattr<T>],
}

impl<'a, T> AttrHandle<'a, T>
where
    T: NlAttrType,
{
    /// Create new [`AttrHandle`]
    pub fn new(attrs: &'a [Nlattr<T>]) -> Self {
        AttrHandle { attrs }
    }

    /// Pass back iterator over attributes
    pub fn iter(&self) -> Iter<'a, Nlattr<T>> {
        self.attrs.iter()
    }

    /// Get the last attribute with the given identifier.
    pub fn get_attribute(&self, t: T) -> Option<&'a Nlattr<T>> {
        self.attrs
            .iter()
            .rev()
            .find(|attr| *attr.nla_type().nla_type() == t)
    }

    /// Parse binary payload as a type that implements [`FromBytes`].
    pub fn get_attr_payload_as<R>(&self, attr: T) -> Result<R, DeError>
    where
        R: FromBytes<'a>,
    {
        match self.get_attribute(attr) {
            Some(a) => a.get_payload_as::<R>(),
            _ => Err(DeError::new(format!("Failed to find attribute {:?}", attr))),
        }
    }

    /// Parse binary payload as a type that implements
    /// [`FromBytesWithInput`] with the payload length as input.
    pub fn get_attr_payload_as_with_len<R>(&self, attr: T) -> Result<R, DeError>
    where
        R: FromBytesWithInput<'a, Input = usize>,
    {
        match self.get_attribute(attr) {
            Some(a) => a.get_payload_as_with_len::<R>(),
            _ => Err(DeError::new(format!("Failed to find attribute {:?}", attr))),
        }
    }
}
