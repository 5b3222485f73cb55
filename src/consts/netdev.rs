use crate::netdev_enum;

/// Name of the generic netlink family exposed by the datapath driver
pub const NETDEV_FAMILY: &str = "ovs_win_netdev";

/// Protocol version carried in every netdev family request
pub const NETDEV_VERSION: u8 = 1;

/// Interface name buffer size, including the terminating null byte
pub const IFNAMSIZ: usize = 16;

/// Length of an Ethernet hardware address
pub const ETH_ADDR_LEN: usize = 6;

/// Values for `cmd` in [`Genlmsghdr`][crate::genl::Genlmsghdr] for
/// the netdev family.
#[netdev_enum(serialized_type = "u8")]
pub enum NetdevCmd {
    Unspec = 0,
    Get = 1,
}

/// Attribute identifiers of the netdev family.
#[netdev_enum(serialized_type = "u16")]
pub enum NetdevAttr {
    Unspec = 0,
    PortNo = 1,
    Type = 2,
    Name = 3,
    MacAddr = 4,
    Mtu = 5,
    IfFlags = 6,
}

/// Kind of virtual port backing a device, carried in the
/// [`NetdevAttr::Type`] attribute.
#[netdev_enum(serialized_type = "u32")]
pub enum VportType {
    Unspec = 0,
    Netdev = 1,
    Internal = 2,
    Gre = 3,
    Vxlan = 4,
    Geneve = 5,
}

impl_flags!(
    /// Runtime interface flags carried in the [`NetdevAttr::IfFlags`]
    /// attribute
    pub IfFlags: u32 {
        /// The interface is administratively up
        UP = 1 << 0;
        /// The interface receives all packets
        PROMISC = 1 << 1;
    }
);
