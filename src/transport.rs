//! Collaborator traits at the edges of the query protocol.
//!
//! The protocol code never touches a socket directly. It hands a
//! fully encoded request to a [`Transport`] and gets back exactly one
//! response buffer, and it resolves family names through a
//! [`FamilyResolver`]. [`NlSocketHandle`][crate::socket::NlSocketHandle]
//! implements both over a netlink socket; tests substitute fakes.

use crate::{
    err::{ResolveError, TransportError},
    types::Buffer,
};

/// A blocking, one-shot request/response exchange.
pub trait Transport {
    /// Send `request` and wait for the matching response. The
    /// request is consumed; the returned buffer is owned by the
    /// caller.
    fn transact(&self, request: Buffer) -> Result<Buffer, TransportError>;
}

/// Resolution of a generic netlink family name to its numeric ID.
pub trait FamilyResolver {
    /// Look up the ID of the family registered under `name`.
    fn resolve_genl_family(&self, name: &str) -> Result<u16, ResolveError>;
}
