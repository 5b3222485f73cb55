//! Module containing various types used across the various netlink
//! structures used in `genl-netdev`.
//!
//! # Design decisions
//! These structures are new types rather than type aliases in most
//! cases to allow the internal representation to change without
//! resulting in a breaking change.

use std::{
    fmt::{self, Debug},
    io::{Cursor, Read, Write},
    iter::FromIterator,
    slice::Iter,
};

use log::trace;

use crate::{
    attr::AttrHandle,
    consts::NlAttrType,
    err::{DeError, SerError},
    genl::Nlattr,
    remaining, FromBytes, FromBytesWithInput, Size, ToBytes,
};

/// A buffer of bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Buffer(Vec<u8>);

impl Size for Buffer {
    fn unpadded_size(&self) -> usize {
        self.0.len()
    }
}

impl<'lt> FromBytesWithInput<'lt> for Buffer {
    type Input = usize;

    fn from_bytes_with_input(
        buffer: &mut Cursor<&'lt [u8]>,
        input: Self::Input,
    ) -> Result<Self, DeError> {
        if input > remaining(buffer) {
            return Err(DeError::InvalidInput(input));
        }

        let mut vec = vec![0u8; input];

        buffer.read_exact(&mut vec)?;

        Ok(Self::from(vec))
    }
}

impl ToBytes for Buffer {
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        buffer.write_all(self.0.as_slice())?;
        Ok(())
    }
}

impl Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Buffer({} bytes)", self.0.len())
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl AsMut<[u8]> for Buffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self.0.as_mut_slice()
    }
}

impl<'a> From<&'a [u8]> for Buffer {
    fn from(slice: &'a [u8]) -> Self {
        Buffer(Vec::from(slice))
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(vec: Vec<u8>) -> Self {
        Buffer(vec)
    }
}

impl From<Buffer> for Vec<u8> {
    fn from(buf: Buffer) -> Self {
        buf.0
    }
}

impl Buffer {
    /// Create a new general purpose byte buffer.
    pub fn new() -> Self {
        Buffer(Vec::new())
    }

    /// Extend the given buffer with the contents of another slice.
    pub fn extend_from_slice(&mut self, slice: &[u8]) {
        self.0.extend_from_slice(slice)
    }

    /// Get the current length of the buffer.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer of generic netlink attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenlBuffer<T>(Vec<Nlattr<T>>);

impl<T> Size for GenlBuffer<T>
where
    T: NlAttrType,
{
    fn unpadded_size(&self) -> usize {
        self.0.iter().map(|attr| attr.padded_size()).sum()
    }
}

impl<T> ToBytes for GenlBuffer<T>
where
    T: NlAttrType,
{
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        for attr in self.0.iter() {
            attr.to_bytes(buffer)?;
        }
        Ok(())
    }
}

impl<'lt, T> FromBytesWithInput<'lt> for GenlBuffer<T>
where
    T: NlAttrType,
{
    type Input = usize;

    /// Parse exactly `input` bytes of attributes. An attribute that
    /// does not fit in those bytes is an error.
    fn from_bytes_with_input(
        buffer: &mut Cursor<&'lt [u8]>,
        input: Self::Input,
    ) -> Result<Self, DeError> {
        if input > remaining(buffer) {
            return Err(DeError::InvalidInput(input));
        }
        let start = buffer.position() as usize;
        let bytes: &'lt [u8] = *buffer.get_ref();
        let mut attr_buffer = Cursor::new(&bytes[start..start + input]);

        let mut attrs = GenlBuffer::new();
        while remaining(&attr_buffer) > 0 {
            let attr = Nlattr::<T>::from_bytes(&mut attr_buffer)?;
            trace!("Attribute parsed: {:?}", attr);
            attrs.push(attr);
        }
        buffer.set_position((start + input) as u64);
        Ok(attrs)
    }
}

impl<T> GenlBuffer<T> {
    /// Create a new buffer of generic netlink attributes.
    pub fn new() -> Self {
        GenlBuffer(Vec::new())
    }

    /// Add a new generic netlink attribute to the end of the buffer.
    pub fn push(&mut self, attr: Nlattr<T>) {
        self.0.push(attr)
    }

    /// Return an iterator over immutable references to the elements
    /// in the buffer.
    pub fn iter(&self) -> Iter<'_, Nlattr<T>> {
        self.0.iter()
    }

    /// Returns the number of elements in the buffer.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the number of elements in the buffer is 0.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get a data structure with an immutable reference to the
    /// underlying [`Nlattr`]s.
    pub fn get_attr_handle(&self) -> AttrHandle<'_, T>
    where
        T: NlAttrType,
    {
        AttrHandle::new(self.0.as_slice())
    }
}

impl<T> AsRef<[Nlattr<T>]> for GenlBuffer<T> {
    fn as_ref(&self) -> &[Nlattr<T>] {
        self.0.as_slice()
    }
}

impl<T> FromIterator<Nlattr<T>> for GenlBuffer<T> {
    fn from_iter<I>(i: I) -> Self
    where
        I: IntoIterator<Item = Nlattr<T>>,
    {
        GenlBuffer(Vec::from_iter(i))
    }
}

impl<T> IntoIterator for GenlBuffer<T> {
    type Item = Nlattr<T>;
    type IntoIter = <Vec<Nlattr<T>> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T> Default for GenlBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
