//! This module contains the top level netlink header code. Every
//! netlink message will be encapsulated in a top level `Nlmsghdr`.
//!
//! [`Nlmsghdr`] is the structure representing a header that all
//! netlink protocols require to be passed to the correct destination.
//!
//! # Design decisions
//!
//! The header is kept separate from its payload. Requests and replies
//! of this crate carry exactly one message, and the payload layout is
//! decided by the code that owns the family, so the header is written
//! and read on its own and the rest of the message follows it in the
//! same buffer.

use derive_builder::Builder;
use getset::Getters;

use crate::{
    consts::nl::NlmF, err::BuilderError, FromBytes, Size, ToBytes, TypeSize,
};

/// Top level netlink header.
#[derive(Builder, Getters, Clone, Debug, PartialEq, Eq, Size, TypeSize, ToBytes, FromBytes)]
#[builder(pattern = "owned", build_fn(error = "BuilderError"))]
pub struct Nlmsghdr {
    /// Length of the netlink message, headers included
    #[getset(get = "pub")]
    nl_len: u32,
    /// Type of the netlink message
    #[getset(get = "pub")]
    nl_type: u16,
    /// Flags indicating properties of the request or response
    #[builder(default = "NlmF::empty()")]
    #[getset(get = "pub")]
    nl_flags: NlmF,
    /// Sequence number for use in tracking
    #[builder(default)]
    #[getset(get = "pub")]
    nl_seq: u32,
    /// ID of the netlink destination for requests and source for
    /// responses.
    #[builder(default)]
    #[getset(get = "pub")]
    nl_pid: u32,
}

impl Nlmsghdr {
    /// Size of the header on the wire.
    pub fn header_size() -> usize {
        Self::type_size()
    }
}
