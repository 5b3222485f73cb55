//! This module contains generic netlink parsing data structures.
//! This is all handled by the [`Genlmsghdr`] header struct which
//! contains all of the information needed for the generic netlink
//! layer, the [`Nlattr`] attribute type, and [`DpHeader`], the family
//! specific header datapath families place in front of their
//! attributes.
//!
//! # Design decisions
//!
//! Attribute payloads are kept as byte buffers. They are only parsed
//! into a typed value through [`Attribute`] once the attribute policy
//! has accepted the stream, so a payload is never interpreted with a
//! representation other than the one declared for its identifier.
//!
//! Padding expectations are as follows:
//! * `nla_len` reports the unpadded length of the header and payload.
//! * Serialization always pads an attribute to `libc::NLA_ALIGNTO`.
//! * Deserialization strips the padding following the payload.

use std::io::Cursor;

use derive_builder::Builder;
use getset::Getters;
use log::trace;

use crate::{
    attr::Attribute,
    consts::{nl::NlmF, Cmd, NlAttrType},
    err::{BuilderError, DeError, SerError},
    nl::{Nlmsghdr, NlmsghdrBuilder},
    remaining,
    types::{Buffer, GenlBuffer},
    FromBytes, FromBytesWithInput, Size, ToBytes, TypeSize,
};

/// Struct representing generic netlink header
#[derive(Builder, Getters, Clone, Debug, PartialEq, Eq)]
#[builder(pattern = "owned", build_fn(error = "BuilderError"))]
pub struct Genlmsghdr<C> {
    /// Generic netlink message command
    #[getset(get = "pub")]
    cmd: C,
    /// Version of generic netlink family protocol
    #[getset(get = "pub")]
    version: u8,
    #[builder(setter(skip), default = "0")]
    reserved: u16,
}

impl<C> Size for Genlmsghdr<C>
where
    C: Cmd,
{
    fn unpadded_size(&self) -> usize {
        Self::type_size()
    }
}

impl<C> TypeSize for Genlmsghdr<C>
where
    C: Cmd,
{
    fn type_size() -> usize {
        C::type_size() + u8::type_size() + u16::type_size()
    }
}

impl<C> ToBytes for Genlmsghdr<C>
where
    C: Cmd,
{
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        self.cmd.to_bytes(buffer)?;
        self.version.to_bytes(buffer)?;
        self.reserved.to_bytes(buffer)?;
        Ok(())
    }
}

impl<'lt, C> FromBytes<'lt> for Genlmsghdr<C>
where
    C: Cmd,
{
    fn from_bytes(buffer: &mut Cursor<&'lt [u8]>) -> Result<Self, DeError> {
        Ok(Genlmsghdr {
            cmd: C::from_bytes(buffer)?,
            version: u8::from_bytes(buffer)?,
            reserved: u16::from_bytes(buffer)?,
        })
    }
}

/// Header that datapath families place between the generic netlink
/// header and the attributes.
#[derive(Builder, Getters, Clone, Debug, PartialEq, Eq, Size, TypeSize, ToBytes, FromBytes)]
#[builder(pattern = "owned", build_fn(error = "BuilderError"))]
pub struct DpHeader {
    /// Interface index of the owning datapath
    #[builder(default)]
    #[getset(get = "pub")]
    dp_ifindex: i32,
}

/// The infomation packed into `nla_type` field of `nlattr`
/// for the C data structure.
#[derive(Builder, Getters, Debug, PartialEq, Eq, Clone, Copy)]
#[builder(pattern = "owned", build_fn(error = "BuilderError"))]
pub struct AttrType<T> {
    /// If true, the payload contains nested attributes.
    #[builder(default = "false")]
    #[getset(get = "pub")]
    nla_nested: bool,
    /// If true, the payload is in net work byte order.
    #[builder(default = "false")]
    #[getset(get = "pub")]
    nla_network_order: bool,
    /// Enum representing the type of the attribute payload
    #[getset(get = "pub")]
    nla_type: T,
}

impl<T> Size for AttrType<T>
where
    T: NlAttrType,
{
    fn unpadded_size(&self) -> usize {
        self.nla_type.unpadded_size()
    }
}

impl<T> TypeSize for AttrType<T>
where
    T: NlAttrType,
{
    fn type_size() -> usize {
        T::type_size()
    }
}

impl<T> ToBytes for AttrType<T>
where
    T: NlAttrType,
{
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        let int: u16 = self.into();
        int.to_bytes(buffer)
    }
}

impl<'lt, T> FromBytes<'lt> for AttrType<T>
where
    T: NlAttrType,
{
    fn from_bytes(buffer: &mut Cursor<&'lt [u8]>) -> Result<Self, DeError> {
        Ok(AttrType::from(u16::from_bytes(buffer)?))
    }
}

impl<T> From<AttrType<T>> for u16
where
    T: NlAttrType,
{
    fn from(v: AttrType<T>) -> Self {
        u16::from(&v)
    }
}

impl<T> From<&AttrType<T>> for u16
where
    T: NlAttrType,
{
    fn from(v: &AttrType<T>) -> Self {
        let mut int: u16 = v.nla_type.into();
        if v.nla_nested {
            int |= libc::NLA_F_NESTED as u16;
        }
        if v.nla_network_order {
            int |= libc::NLA_F_NET_BYTEORDER as u16;
        }
        int
    }
}

impl<T> From<u16> for AttrType<T>
where
    T: NlAttrType,
{
    fn from(int: u16) -> Self {
        AttrType {
            nla_nested: (int & libc::NLA_F_NESTED as u16) == libc::NLA_F_NESTED as u16,
            nla_network_order: (int & libc::NLA_F_NET_BYTEORDER as u16)
                == libc::NLA_F_NET_BYTEORDER as u16,
            nla_type: T::from(int & libc::NLA_TYPE_MASK as u16),
        }
    }
}

/// Struct representing netlink attributes and payloads
#[derive(Getters, Debug, PartialEq, Eq, Clone)]
pub struct Nlattr<T> {
    /// Length of the attribute header and payload together
    #[getset(get = "pub")]
    nla_len: u16,
    /// Type information for the attribute payload
    #[getset(get = "pub")]
    nla_type: AttrType<T>,
    /// Payload of the attribute as a binary buffer
    #[getset(get = "pub")]
    nla_payload: Buffer,
}

impl<T> Nlattr<T>
where
    T: NlAttrType,
{
    /// Create a new [`Nlattr`] with parameters for setting nesting
    /// and byte order flags. The payload is serialized immediately.
    pub fn new<P>(
        nla_nested: bool,
        nla_network_order: bool,
        nla_type: T,
        nla_payload: P,
    ) -> Result<Self, SerError>
    where
        P: Size + ToBytes,
    {
        let mut attr = Nlattr {
            nla_len: 0,
            nla_type: AttrTypeBuilder::default()
                .nla_nested(nla_nested)
                .nla_network_order(nla_network_order)
                .nla_type(nla_type)
                .build()?,
            nla_payload: Buffer::new(),
        };
        attr.set_payload(&nla_payload)?;
        Ok(attr)
    }

    /// Header size of every attribute.
    pub fn header_size() -> usize {
        u16::type_size() + AttrType::<T>::type_size()
    }

    /// Set the payload to a data type that implements [`ToBytes`],
    /// overwriting the current payload and updating `nla_len`.
    pub fn set_payload<P>(&mut self, payload: &P) -> Result<(), SerError>
    where
        P: Size + ToBytes,
    {
        let mut buffer = Cursor::new(Vec::with_capacity(payload.unpadded_size()));
        payload.to_bytes(&mut buffer)?;
        let len = Self::header_size() + buffer.get_ref().len();
        self.nla_len = u16::try_from(len)
            .map_err(|_| SerError::new(format!("Attribute length {} overflows u16", len)))?;
        self.nla_payload = Buffer::from(buffer.into_inner());
        Ok(())
    }
}

impl<T> Attribute<T> for Nlattr<T>
where
    T: NlAttrType,
{
    fn payload(&self) -> &Buffer {
        &self.nla_payload
    }
}

impl<T> Size for Nlattr<T>
where
    T: NlAttrType,
{
    fn unpadded_size(&self) -> usize {
        Self::header_size() + self.nla_payload.unpadded_size()
    }
}

impl<T> ToBytes for Nlattr<T>
where
    T: NlAttrType,
{
    fn to_bytes(&self, buffer: &mut Cursor<Vec<u8>>) -> Result<(), SerError> {
        self.nla_len.to_bytes(buffer)?;
        self.nla_type.to_bytes(buffer)?;
        self.nla_payload.to_bytes(buffer)?;
        self.pad(buffer)?;
        Ok(())
    }
}

impl<'lt, T> FromBytes<'lt> for Nlattr<T>
where
    T: NlAttrType,
{
    fn from_bytes(buffer: &mut Cursor<&'lt [u8]>) -> Result<Self, DeError> {
        let nla_len = u16::from_bytes(buffer)?;
        let nla_type = AttrType::<T>::from_bytes(buffer)?;
        let payload_len = (nla_len as usize)
            .checked_sub(Self::header_size())
            .ok_or_else(|| DeError::new(format!("Attribute length {} is too short", nla_len)))?;
        if payload_len > remaining(buffer) {
            return Err(DeError::InvalidInput(payload_len));
        }
        let nla_payload = Buffer::from_bytes_with_input(buffer, payload_len)?;
        Self::strip(buffer, nla_len as usize)?;
        Ok(Nlattr {
            nla_len,
            nla_type,
            nla_payload,
        })
    }
}

/// Serialize a complete generic netlink message into one buffer:
/// netlink header, generic netlink header, family header and
/// attributes, in that order. `nl_len` covers the whole message;
/// sequence number and port ID are left zero for the transport.
pub fn encode_message<C, H, T>(
    nl_type: u16,
    nl_flags: NlmF,
    genl: &Genlmsghdr<C>,
    family_header: &H,
    attrs: &GenlBuffer<T>,
) -> Result<Buffer, SerError>
where
    C: Cmd,
    H: Size + ToBytes,
    T: NlAttrType,
{
    let len = Nlmsghdr::header_size()
        + genl.padded_size()
        + family_header.padded_size()
        + attrs.padded_size();
    let nl = NlmsghdrBuilder::default()
        .nl_len(
            u32::try_from(len)
                .map_err(|_| SerError::new(format!("Message length {} overflows u32", len)))?,
        )
        .nl_type(nl_type)
        .nl_flags(nl_flags)
        .build()?;
    trace!("Encoding message with header {:?}", nl);

    let mut buffer = Cursor::new(Vec::with_capacity(len));
    nl.to_bytes(&mut buffer)?;
    genl.to_bytes(&mut buffer)?;
    family_header.to_bytes(&mut buffer)?;
    family_header.pad(&mut buffer)?;
    attrs.to_bytes(&mut buffer)?;
    Ok(Buffer::from(buffer.into_inner()))
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Write;

    use byteorder::{NativeEndian, WriteBytesExt};

    use crate::consts::{CtrlAttr, CtrlCmd, NetdevAttr};

    #[test]
    fn test_padding_size_calculation() {
        let nlattr = Nlattr::new(false, false, CtrlAttr::Unspec, 4u16).unwrap();
        assert_eq!(nlattr.unpadded_size(), 6);
        assert_eq!(nlattr.padded_size(), 8);
        assert_eq!(*nlattr.nla_len(), 6);
    }

    #[test]
    fn test_serialize() {
        let genl = GenlmsghdrBuilder::default()
            .cmd(CtrlCmd::Getfamily)
            .version(2)
            .build()
            .unwrap();
        let attr = Nlattr::new(false, false, CtrlAttr::FamilyName, "AAAAAAA").unwrap();
        let mut buffer = Cursor::new(Vec::new());
        genl.to_bytes(&mut buffer).unwrap();
        attr.to_bytes(&mut buffer).unwrap();

        let v_final = {
            let mut c = Cursor::new(Vec::new());
            c.write_u8(CtrlCmd::Getfamily.into()).unwrap();
            c.write_u8(2).unwrap();
            c.write_u16::<NativeEndian>(0).unwrap();
            c.write_u16::<NativeEndian>(12).unwrap();
            c.write_u16::<NativeEndian>(CtrlAttr::FamilyName.into())
                .unwrap();
            c.write_all(&[65, 65, 65, 65, 65, 65, 65, 0]).unwrap();
            c.into_inner()
        };
        assert_eq!(buffer.get_ref(), &v_final)
    }

    #[test]
    fn test_deserialize() {
        let v_final = {
            let mut c = Cursor::new(Vec::new());
            c.write_u8(CtrlCmd::Getfamily.into()).unwrap();
            c.write_u8(2).unwrap();
            c.write_u16::<NativeEndian>(0).unwrap();
            c.write_u16::<NativeEndian>(9).unwrap();
            c.write_u16::<NativeEndian>(CtrlAttr::FamilyName.into())
                .unwrap();
            c.write_all(&[65, 65, 65, 65, 0, 0, 0, 0]).unwrap();
            c.into_inner()
        };
        let mut buffer = Cursor::new(v_final.as_slice());
        let genl = Genlmsghdr::<CtrlCmd>::from_bytes(&mut buffer).unwrap();
        assert_eq!(*genl.cmd(), CtrlCmd::Getfamily);
        assert_eq!(*genl.version(), 2);

        let attr = Nlattr::<CtrlAttr>::from_bytes(&mut buffer).unwrap();
        assert_eq!(*attr.nla_len(), 9);
        assert_eq!(*attr.nla_type().nla_type(), CtrlAttr::FamilyName);
        assert_eq!(attr.get_payload_as_with_len::<String>().unwrap(), "AAAA");
        assert_eq!(buffer.position() as usize, v_final.len());
    }

    #[test]
    fn test_attr_type_flags() {
        let attr_type = AttrType::<NetdevAttr>::from(u16::from(NetdevAttr::Mtu));
        assert!(!*attr_type.nla_nested());
        let raw = libc::NLA_F_NESTED as u16 | u16::from(NetdevAttr::Name);
        let attr_type = AttrType::<NetdevAttr>::from(raw);
        assert!(*attr_type.nla_nested());
        assert!(!*attr_type.nla_network_order());
        assert_eq!(*attr_type.nla_type(), NetdevAttr::Name);
        assert_eq!(u16::from(attr_type), raw);
    }

    #[test]
    fn test_attr_too_short() {
        let mut c = Cursor::new(Vec::new());
        c.write_u16::<NativeEndian>(2).unwrap();
        c.write_u16::<NativeEndian>(CtrlAttr::FamilyId.into())
            .unwrap();
        let bytes = c.into_inner();
        assert!(Nlattr::<CtrlAttr>::from_bytes(&mut Cursor::new(bytes.as_slice())).is_err());
    }

    #[test]
    fn test_dp_header() {
        let dp = DpHeaderBuilder::default().dp_ifindex(-3).build().unwrap();
        let mut buffer = Cursor::new(Vec::new());
        dp.to_bytes(&mut buffer).unwrap();
        assert_eq!(buffer.get_ref().len(), DpHeader::type_size());
        let parsed = DpHeader::from_bytes(&mut Cursor::new(buffer.get_ref().as_slice())).unwrap();
        assert_eq!(*parsed.dp_ifindex(), -3);
    }
}
