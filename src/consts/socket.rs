use crate::netdev_enum;

/// General address families for sockets
#[netdev_enum(serialized_type = "libc::c_int")]
pub enum AddrFamily {
    Netlink = libc::AF_NETLINK,
}

/// Netlink protocols supported by the socket transport
#[netdev_enum(serialized_type = "libc::c_int")]
pub enum NlFamily {
    Route = libc::NETLINK_ROUTE,
    Generic = libc::NETLINK_GENERIC,
}
