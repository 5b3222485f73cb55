use crate::{
    consts::netdev::{NetdevAttr, NetdevCmd},
    netdev_enum,
};

impl_trait!(
    /// Trait marking constants valid for use in
    /// [`Genlmsghdr`][crate::genl::Genlmsghdr] field, `cmd`.
    pub Cmd,
    u8,
    CtrlCmd,
    NetdevCmd
);

/// Values for `cmd` in [`Genlmsghdr`][crate::genl::Genlmsghdr].
#[netdev_enum(serialized_type = "u8")]
pub enum CtrlCmd {
    Unspec = libc::CTRL_CMD_UNSPEC as u8,
    Newfamily = libc::CTRL_CMD_NEWFAMILY as u8,
    Delfamily = libc::CTRL_CMD_DELFAMILY as u8,
    Getfamily = libc::CTRL_CMD_GETFAMILY as u8,
}

impl_trait!(
    /// Marker trait for types usable in the
    /// [`Nlattr`][crate::genl::Nlattr] field, `nla_type`
    pub NlAttrType,
    u16,
    CtrlAttr,
    NetdevAttr
);

/// Field type for [`Nlattr`][crate::genl::Nlattr] in controller
/// messages.
#[netdev_enum(serialized_type = "u16")]
pub enum CtrlAttr {
    Unspec = libc::CTRL_ATTR_UNSPEC as u16,
    FamilyId = libc::CTRL_ATTR_FAMILY_ID as u16,
    FamilyName = libc::CTRL_ATTR_FAMILY_NAME as u16,
    Version = libc::CTRL_ATTR_VERSION as u16,
    Hdrsize = libc::CTRL_ATTR_HDRSIZE as u16,
    Maxattr = libc::CTRL_ATTR_MAXATTR as u16,
    Ops = libc::CTRL_ATTR_OPS as u16,
    McastGroups = libc::CTRL_ATTR_MCAST_GROUPS as u16,
}
