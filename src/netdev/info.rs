//! Request and response codec of the netdev family.
//!
//! A request is a "get" command for one device name. The reply
//! carries the same headers followed by the device attributes, which
//! are accepted only if the whole attribute stream satisfies
//! [`NETDEV_POLICY`].

use std::{
    fmt::{self, Display},
    io::Cursor,
};

use derive_builder::Builder;
use getset::Getters;
use log::trace;

use crate::{
    attr::Attribute,
    consts::{
        netdev::{IfFlags, NetdevAttr, NetdevCmd, VportType, ETH_ADDR_LEN, IFNAMSIZ, NETDEV_VERSION},
        nl::NlmF,
    },
    err::{BuilderError, DecodeError, PolicyError, QueryError, SerError},
    genl::{encode_message, DpHeader, DpHeaderBuilder, Genlmsghdr, GenlmsghdrBuilder, Nlattr},
    nl::Nlmsghdr,
    policy::{Policy, PolicyEntry, PolicyType},
    types::{Buffer, GenlBuffer},
    FromBytes, FromBytesWithInput, TypeSize,
};

static NETDEV_POLICY_ENTRIES: [PolicyEntry<NetdevAttr>; 6] = [
    PolicyEntry::new(NetdevAttr::PortNo, PolicyType::U32),
    PolicyEntry::new(NetdevAttr::Type, PolicyType::U32),
    PolicyEntry::new(NetdevAttr::Name, PolicyType::String).with_max_len(IFNAMSIZ),
    PolicyEntry::new(NetdevAttr::MacAddr, PolicyType::Unspec).with_len(ETH_ADDR_LEN),
    PolicyEntry::new(NetdevAttr::Mtu, PolicyType::U32),
    PolicyEntry::new(NetdevAttr::IfFlags, PolicyType::U32),
];

/// Attribute policy every netdev reply must satisfy.
pub static NETDEV_POLICY: Policy<NetdevAttr> = Policy::new(&NETDEV_POLICY_ENTRIES);

/// Ethernet hardware address.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EtherAddr([u8; ETH_ADDR_LEN]);

impl EtherAddr {
    /// Create an address from its bytes.
    pub const fn new(bytes: [u8; ETH_ADDR_LEN]) -> Self {
        EtherAddr(bytes)
    }

    /// Bytes of the address.
    pub fn as_bytes(&self) -> &[u8; ETH_ADDR_LEN] {
        &self.0
    }
}

impl From<[u8; ETH_ADDR_LEN]> for EtherAddr {
    fn from(bytes: [u8; ETH_ADDR_LEN]) -> Self {
        EtherAddr(bytes)
    }
}

impl Display for EtherAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

/// Device information exchanged with the netdev family.
///
/// A request only uses `cmd`, `dp_ifindex` and `name`. A decoded
/// reply has every field set.
#[derive(Builder, Getters, Clone, Debug, PartialEq, Eq)]
#[builder(pattern = "owned", build_fn(error = "BuilderError"))]
pub struct NetdevInfo {
    /// Command of the message
    #[builder(default = "NetdevCmd::Unspec")]
    #[getset(get = "pub")]
    cmd: NetdevCmd,
    /// Interface index of the owning datapath
    #[builder(default)]
    #[getset(get = "pub")]
    dp_ifindex: i32,
    /// Port number of the device within its datapath
    #[builder(default)]
    #[getset(get = "pub")]
    port_no: u32,
    /// Kind of port backing the device
    #[builder(default = "VportType::Unspec")]
    #[getset(get = "pub")]
    vport_type: VportType,
    /// Device name
    #[builder(setter(into), default)]
    #[getset(get = "pub")]
    name: String,
    /// Hardware address
    #[builder(default)]
    #[getset(get = "pub")]
    mac_address: EtherAddr,
    /// Maximum transmission unit
    #[builder(default)]
    #[getset(get = "pub")]
    mtu: u32,
    /// Runtime interface flags
    #[builder(default)]
    #[getset(get = "pub")]
    ifi_flags: IfFlags,
}

impl Default for NetdevInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl NetdevInfo {
    /// Create a record with every field zeroed.
    pub fn new() -> Self {
        NetdevInfo {
            cmd: NetdevCmd::Unspec,
            dp_ifindex: 0,
            port_no: 0,
            vport_type: VportType::Unspec,
            name: String::new(),
            mac_address: EtherAddr::default(),
            mtu: 0,
            ifi_flags: IfFlags::empty(),
        }
    }

    /// Create a "get" request for the device `name`.
    pub fn get_request<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        NetdevInfo {
            cmd: NetdevCmd::Get,
            name: name.into(),
            ..NetdevInfo::new()
        }
    }

    /// Encode the record as a request to the family `family_id`.
    ///
    /// The name is the only attribute sent. An empty name or one
    /// containing a null byte cannot be sent and no bytes are
    /// produced.
    pub fn to_request(&self, family_id: u16) -> Result<Buffer, QueryError> {
        if self.name.is_empty() {
            return Err(QueryError::InvalidRequest(
                "device name is empty".to_string(),
            ));
        }
        if self.name.contains('\0') {
            return Err(QueryError::InvalidRequest(format!(
                "device name {:?} contains a null byte",
                self.name
            )));
        }
        let mut attrs = GenlBuffer::new();
        attrs.push(
            Nlattr::new(false, false, NetdevAttr::Name, self.name.as_str())
                .map_err(|e| QueryError::InvalidRequest(e.to_string()))?,
        );
        self.encode(family_id, NlmF::REQUEST | NlmF::ECHO, &attrs)
            .map_err(|e| QueryError::InvalidRequest(e.to_string()))
    }

    /// Encode the record as a reply from the family `family_id`,
    /// carrying every netdev attribute. This is what a driver sends in
    /// answer to a request.
    pub fn to_response(&self, family_id: u16) -> Result<Buffer, SerError> {
        let mut attrs = GenlBuffer::new();
        attrs.push(Nlattr::new(false, false, NetdevAttr::PortNo, self.port_no)?);
        attrs.push(Nlattr::new(
            false,
            false,
            NetdevAttr::Type,
            u32::from(self.vport_type),
        )?);
        attrs.push(Nlattr::new(false, false, NetdevAttr::Name, self.name.as_str())?);
        attrs.push(Nlattr::new(
            false,
            false,
            NetdevAttr::MacAddr,
            Buffer::from(&self.mac_address.as_bytes()[..]),
        )?);
        attrs.push(Nlattr::new(false, false, NetdevAttr::Mtu, self.mtu)?);
        attrs.push(Nlattr::new(false, false, NetdevAttr::IfFlags, self.ifi_flags)?);
        self.encode(family_id, NlmF::empty(), &attrs)
    }

    fn encode(
        &self,
        family_id: u16,
        flags: NlmF,
        attrs: &GenlBuffer<NetdevAttr>,
    ) -> Result<Buffer, SerError> {
        let genl = GenlmsghdrBuilder::default()
            .cmd(self.cmd)
            .version(NETDEV_VERSION)
            .build()?;
        let dp_header = DpHeaderBuilder::default()
            .dp_ifindex(self.dp_ifindex)
            .build()?;
        encode_message(family_id, flags, &genl, &dp_header, attrs)
    }

    /// Decode a reply from the family `family_id`.
    ///
    /// Every check is a hard gate: no record is produced unless the
    /// headers are complete, the message belongs to the family and the
    /// attributes satisfy [`NETDEV_POLICY`].
    pub fn from_response(bytes: &[u8], family_id: u16) -> Result<Self, DecodeError> {
        let (nl, genl, dp_header, attrs) = parse_message(bytes, family_id, &NETDEV_POLICY)?;
        trace!("Decoded netdev reply header {:?}", nl);

        let handle = attrs.get_attr_handle();
        let attr = |t: NetdevAttr| {
            handle
                .get_attribute(t)
                .ok_or(DecodeError::PolicyViolation(PolicyError::MissingAttribute(
                    t.into(),
                )))
        };
        let mut mac_address = [0; ETH_ADDR_LEN];
        mac_address.copy_from_slice(attr(NetdevAttr::MacAddr)?.payload().as_ref());

        Ok(NetdevInfo {
            cmd: *genl.cmd(),
            dp_ifindex: *dp_header.dp_ifindex(),
            port_no: attr(NetdevAttr::PortNo)?.get_payload_as::<u32>()?,
            vport_type: attr(NetdevAttr::Type)?.get_payload_as::<VportType>()?,
            name: attr(NetdevAttr::Name)?.get_payload_as_with_len::<String>()?,
            mac_address: EtherAddr(mac_address),
            mtu: attr(NetdevAttr::Mtu)?.get_payload_as::<u32>()?,
            ifi_flags: attr(NetdevAttr::IfFlags)?.get_payload_as::<IfFlags>()?,
        })
    }
}

/// Split a netdev family message into its headers and a policy
/// checked attribute stream.
///
/// The attribute stream is bounded by `nl_len`; a header claiming more
/// bytes than the buffer holds makes the stream malformed.
pub fn parse_message(
    bytes: &[u8],
    family_id: u16,
    policy: &Policy<NetdevAttr>,
) -> Result<
    (
        Nlmsghdr,
        Genlmsghdr<NetdevCmd>,
        DpHeader,
        GenlBuffer<NetdevAttr>,
    ),
    DecodeError,
> {
    let headers_len =
        Nlmsghdr::type_size() + Genlmsghdr::<NetdevCmd>::type_size() + DpHeader::type_size();
    let mut buffer = Cursor::new(bytes);
    let nl = Nlmsghdr::from_bytes(&mut buffer).map_err(|_| DecodeError::TruncatedHeader)?;
    let genl =
        Genlmsghdr::<NetdevCmd>::from_bytes(&mut buffer).map_err(|_| DecodeError::TruncatedHeader)?;
    let dp_header = DpHeader::from_bytes(&mut buffer).map_err(|_| DecodeError::TruncatedHeader)?;
    let msg_len = *nl.nl_len() as usize;
    if msg_len < headers_len {
        return Err(DecodeError::TruncatedHeader);
    }

    if *nl.nl_type() != family_id {
        return Err(DecodeError::FamilyMismatch {
            expected: family_id,
            found: *nl.nl_type(),
        });
    }

    let attrs = GenlBuffer::<NetdevAttr>::from_bytes_with_input(&mut buffer, msg_len - headers_len)
        .map_err(PolicyError::from)?;
    policy.validate(&attrs)?;
    Ok((nl, genl, dp_header, attrs))
}
