//! # Type safe generic netlink netdev queries
//!
//! ## Rationale
//!
//! A datapath driver exposes the network devices it owns through a
//! generic netlink family. This crate speaks that family: it encodes
//! a typed "get device" request, validates the reply against a
//! declarative attribute policy, and caches the resulting device
//! attributes behind per-field validity flags so that nothing that was
//! not actually fetched can ever be read back.
//!
//! ## Layout
//!
//! * [`consts`] - wire constants wrapped in enums and bitflags.
//! * [`nl`], [`genl`], [`attr`], [`types`] - message headers,
//!   attributes and buffers.
//! * [`policy`] - attribute policy tables and validation.
//! * [`transport`], [`socket`], [`family`] - the request/response
//!   transport, the netlink socket implementation, and the one-time
//!   family binding.
//! * [`netdev`] - the query protocol and the device attribute cache.
//!
//! ## Features
//! The `sync` feature (on by default) provides the blocking netlink
//! socket transport and the process-wide family binding built on it.

#![deny(missing_docs)]

extern crate self as genl_netdev;

pub mod attr;
pub mod consts;
pub mod err;
pub mod family;
pub mod genl;
pub mod netdev;
pub mod nl;
pub mod policy;
#[cfg(feature = "sync")]
pub mod socket;
pub mod transport;
pub mod types;

use std::{
    ffi::CString,
    fmt::Debug,
    io::{Cursor, Read, Write},
};

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
#[doc(hidden)]
pub use bitflags as __bitflags;
pub use genl_netdev_proc_macros::{netdev_enum, FromBytes, Size, ToBytes, TypeSize};

use crate::{
    consts::alignto,
    err::{DeError, SerError},
};

/// Max supported message length for netlink messages supported by
/// the kernel.
pub const MAX_NL_LENGTH: usize = 32768;

/// A trait defining methods that apply to all netlink data
/// structures related to sizing of data types.
pub trait Size {
    /// Size of the unpadded data structure. This will usually
    /// only be unaligned for variable length types like
    /// strings or byte buffers.
    fn unpadded_size(&self) -> usize;

    /// Get the size of the payload and align it to
    /// the required netlink byte alignment.
    fn padded_size(&self) -> usize {
        alignto(self.unpadded_size())
    }
}

/// A trait defining methods that apply to constant-sized
/// data types related to size.
pub trait TypeSize {
    /// Get the size of a constant-sized data type.
    fn type_size() -> usize;
}

/// A trait defining a netlink data structure's conversion to
/// a byte buffer.
pub trait ToBytes {
    /// Takes a byte buffer and serializes the data structure into
    /// it.
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError>;

    /// Pad a netlink message to the appropriate alignment.
    fn pad(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError>
    where
        Self: Size,
    {
        let num_pad_bytes = self.padded_size() - self.unpadded_size();
        buffer.write_all(&[0; libc::NLA_ALIGNTO as usize][..num_pad_bytes])?;
        Ok(())
    }
}

/// A trait defining how to convert from a byte buffer to a netlink
/// data structure.
pub trait FromBytes<'lt>: Sized {
    /// Takes a byte buffer and returns the deserialized data
    /// structure.
    fn from_bytes(buffer: &mut Cursor<&'lt [u8]>) -> Result<Self, DeError>;

    /// Strip padding from a netlink message. Padding that was cut off
    /// by the end of the buffer is not an error.
    fn strip(buffer: &mut Cursor<&'lt [u8]>, unpadded_size: usize) -> Result<(), DeError> {
        let num_strip = (alignto(unpadded_size) - unpadded_size).min(remaining(buffer));
        buffer.set_position(buffer.position() + num_strip as u64);
        Ok(())
    }
}

/// Takes an arbitrary input which serves as additional information
/// for guiding the conversion from a byte buffer to a data
/// structure. A common workflow is a data structure that has a size
/// to determine how much more of the data in the byte buffer is
/// part of a given data structure.
pub trait FromBytesWithInput<'lt>: Sized {
    /// The type of the additional input.
    type Input: Debug;

    /// Takes a byte buffer and an additional input and returns
    /// the deserialized data structure.
    fn from_bytes_with_input(
        buffer: &mut Cursor<&'lt [u8]>,
        input: Self::Input,
    ) -> Result<Self, DeError>;
}

/// Number of bytes left to read in the buffer.
pub(crate) fn remaining(buffer: &Cursor<&[u8]>) -> usize {
    buffer
        .get_ref()
        .len()
        .saturating_sub(buffer.position() as usize)
}

macro_rules! impl_int {
    ($ty:ty, $read:ident, $write:ident) => {
        impl Size for $ty {
            fn unpadded_size(&self) -> usize {
                std::mem::size_of::<$ty>()
            }
        }

        impl TypeSize for $ty {
            fn type_size() -> usize {
                std::mem::size_of::<$ty>()
            }
        }

        impl ToBytes for $ty {
            fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
                buffer.$write::<NativeEndian>(*self)?;
                Ok(())
            }
        }

        impl<'lt> FromBytes<'lt> for $ty {
            fn from_bytes(buffer: &mut Cursor<&'lt [u8]>) -> Result<Self, DeError> {
                Ok(buffer.$read::<NativeEndian>()?)
            }
        }
    };
}

impl Size for u8 {
    fn unpadded_size(&self) -> usize {
        std::mem::size_of::<u8>()
    }
}

impl TypeSize for u8 {
    fn type_size() -> usize {
        std::mem::size_of::<u8>()
    }
}

impl ToBytes for u8 {
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        buffer.write_u8(*self)?;
        Ok(())
    }
}

impl<'lt> FromBytes<'lt> for u8 {
    fn from_bytes(buffer: &mut Cursor<&'lt [u8]>) -> Result<Self, DeError> {
        Ok(buffer.read_u8()?)
    }
}

impl_int!(u16, read_u16, write_u16);
impl_int!(u32, read_u32, write_u32);
impl_int!(u64, read_u64, write_u64);
impl_int!(i32, read_i32, write_i32);

impl Size for () {
    fn unpadded_size(&self) -> usize {
        0
    }
}

impl ToBytes for () {
    fn to_bytes(&self, _: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        Ok(())
    }
}

fn nul_terminated(s: &str) -> Result<CString, SerError> {
    CString::new(s.as_bytes())
        .map_err(|_| SerError::new("Unable to serialize string containing null byte"))
}

impl Size for &str {
    fn unpadded_size(&self) -> usize {
        self.len() + 1
    }
}

impl ToBytes for &str {
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        buffer.write_all(nul_terminated(self)?.as_bytes_with_nul())?;
        Ok(())
    }
}

impl Size for String {
    fn unpadded_size(&self) -> usize {
        self.as_str().unpadded_size()
    }
}

impl ToBytes for String {
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        self.as_str().to_bytes(buffer)
    }
}

impl<'lt> FromBytesWithInput<'lt> for String {
    type Input = usize;

    fn from_bytes_with_input(
        buffer: &mut Cursor<&'lt [u8]>,
        input: usize,
    ) -> Result<Self, DeError> {
        if input > remaining(buffer) {
            return Err(DeError::InvalidInput(input));
        }
        let mut bytes = vec![0; input];
        buffer.read_exact(&mut bytes)?;
        if bytes.last() != Some(&0) {
            return Err(DeError::NoNullError);
        }
        if let Some(idx) = bytes.iter().position(|b| *b == 0) {
            bytes.truncate(idx);
        }
        Ok(String::from_utf8(bytes)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    pub(crate) fn setup() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_nl_u8() {
        let mut buffer = Cursor::new(Vec::new());
        5u8.to_bytes(&mut buffer).unwrap();
        assert_eq!(buffer.get_ref().as_slice(), &[5]);

        let v = u8::from_bytes(&mut Cursor::new(&[5u8] as &[u8])).unwrap();
        assert_eq!(v, 5)
    }

    #[test]
    fn test_nl_u16() {
        let mut expected = Cursor::new(Vec::new());
        expected.write_u16::<NativeEndian>(6000).unwrap();

        let mut buffer = Cursor::new(Vec::new());
        6000u16.to_bytes(&mut buffer).unwrap();
        assert_eq!(buffer.get_ref(), expected.get_ref());

        let v = u16::from_bytes(&mut Cursor::new(expected.get_ref().as_slice())).unwrap();
        assert_eq!(v, 6000)
    }

    #[test]
    fn test_nl_u32() {
        let mut expected = Cursor::new(Vec::new());
        expected.write_u32::<NativeEndian>(600000).unwrap();

        let mut buffer = Cursor::new(Vec::new());
        600000u32.to_bytes(&mut buffer).unwrap();
        assert_eq!(buffer.get_ref(), expected.get_ref());
        assert_eq!(u32::type_size(), 4);

        let v = u32::from_bytes(&mut Cursor::new(expected.get_ref().as_slice())).unwrap();
        assert_eq!(v, 600000)
    }

    #[test]
    fn test_nl_i32_negative() {
        let mut buffer = Cursor::new(Vec::new());
        (-95i32).to_bytes(&mut buffer).unwrap();
        let v = i32::from_bytes(&mut Cursor::new(buffer.get_ref().as_slice())).unwrap();
        assert_eq!(v, -95)
    }

    #[test]
    fn test_nl_int_short_buffer() {
        let bytes: &[u8] = &[1, 2, 3];
        let err = u32::from_bytes(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, DeError::UnexpectedEOB));
    }

    #[test]
    fn test_nl_string() {
        let s = "AAAAA".to_string();
        let mut buffer = Cursor::new(Vec::new());
        s.to_bytes(&mut buffer).unwrap();
        assert_eq!(&[65, 65, 65, 65, 65, 0], buffer.get_ref().as_slice());
        assert_eq!(s.unpadded_size(), 6);
        assert_eq!(s.padded_size(), 8);

        let bytes: &[u8] = &[65, 65, 65, 65, 65, 65, 65, 0];
        let string = String::from_bytes_with_input(&mut Cursor::new(bytes), 8).unwrap();
        assert_eq!(string, "AAAAAAA".to_string());

        let bytes: &[u8] = &[65, 65, 65, 65, 65, 65, 0, 0];
        let string = String::from_bytes_with_input(&mut Cursor::new(bytes), 8).unwrap();
        assert_eq!(string, "AAAAAA".to_string())
    }

    #[test]
    fn test_nl_string_errors() {
        let mut buffer = Cursor::new(Vec::new());
        assert!("a\0b".to_bytes(&mut buffer).is_err());

        let bytes: &[u8] = &[65, 65, 65];
        assert!(matches!(
            String::from_bytes_with_input(&mut Cursor::new(bytes), 3),
            Err(DeError::NoNullError)
        ));
        assert!(matches!(
            String::from_bytes_with_input(&mut Cursor::new(bytes), 4),
            Err(DeError::InvalidInput(4))
        ));
    }

    #[test]
    fn test_strip_truncated_padding() {
        let bytes: &[u8] = &[1, 2, 3, 4, 5, 6];
        let mut buffer = Cursor::new(bytes);
        buffer.set_position(5);
        u8::strip(&mut buffer, 5).unwrap();
        assert_eq!(buffer.position(), 6);
    }
}
