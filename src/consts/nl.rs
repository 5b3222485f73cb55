use crate::netdev_enum;

impl_trait!(
    /// Trait marking constants valid for use in
    /// [`Nlmsghdr`][crate::nl::Nlmsghdr] field, `nl_type`.
    pub NlType,
    u16,
    Nlmsg,
    GenlId
);

/// Values for `nl_type` in [`Nlmsghdr`][crate::nl::Nlmsghdr]
#[netdev_enum(serialized_type = "u16")]
pub enum Nlmsg {
    Noop = libc::NLMSG_NOOP as u16,
    Error = libc::NLMSG_ERROR as u16,
    Done = libc::NLMSG_DONE as u16,
    Overrun = libc::NLMSG_OVERRUN as u16,
}

/// Values for `nl_type` in [`Nlmsghdr`][crate::nl::Nlmsghdr]
#[netdev_enum(serialized_type = "u16")]
pub enum GenlId {
    Ctrl = libc::GENL_ID_CTRL as u16,
}

impl_flags!(
    /// Values for `nl_flags` in [`Nlmsghdr`][crate::nl::Nlmsghdr]
    pub NlmF: u16 {
        /// This flag is required for all kernel requests
        REQUEST = libc::NLM_F_REQUEST as u16;
        /// Multipart message
        MULTI = libc::NLM_F_MULTI as u16;
        /// Request an acknowledgement
        ACK = libc::NLM_F_ACK as u16;
        /// Echo the request back
        ECHO = libc::NLM_F_ECHO as u16;
        /// The dump was interrupted by a change
        DUMP_INTR = libc::NLM_F_DUMP_INTR as u16;
        /// The dump was filtered
        DUMP_FILTERED = libc::NLM_F_DUMP_FILTERED as u16;
        /// Return the complete table
        ROOT = libc::NLM_F_ROOT as u16;
        /// Return all matching entries
        MATCH = libc::NLM_F_MATCH as u16;
        /// Atomic snapshot of the table
        ATOMIC = libc::NLM_F_ATOMIC as u16;
        /// Combination of `ROOT` and `MATCH`
        DUMP = libc::NLM_F_DUMP as u16;
    }
);
