//! Queries against the netdev generic netlink family and the device
//! records populated from them.
//!
//! [`info`] holds the message codec, [`query`] the request/response
//! exchange and [`device`] the cached device records built on top.
//!
//! ```no_run
//! use genl_netdev::netdev::{Netdev, NetdevClass};
//!
//! let netdev = Netdev::open("eth0", NetdevClass::System).unwrap();
//! println!("{} mtu {}", netdev.name(), netdev.mtu().unwrap());
//! ```

pub mod device;
pub mod info;
pub mod query;

pub use self::{
    device::{CacheValid, CachedField, Netdev, NetdevClass},
    info::{EtherAddr, NetdevInfo, NetdevInfoBuilder, NETDEV_POLICY},
    query::query_netdev,
};

#[cfg(test)]
pub(crate) mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use crate::{
        consts::netdev::{IfFlags, NetdevCmd, VportType},
        err::{ResolveError, TransportError},
        netdev::info::{EtherAddr, NetdevInfo, NetdevInfoBuilder},
        transport::{FamilyResolver, Transport},
        types::Buffer,
    };

    pub const FAMILY_ID: u16 = 0x1c;

    type Reply = Box<dyn Fn(&[u8]) -> Result<Vec<u8>, TransportError> + Send + Sync>;

    /// Transport answering every request with a canned reply.
    pub struct FakeTransport {
        reply: Reply,
        calls: AtomicUsize,
        last_request: Mutex<Vec<u8>>,
    }

    impl FakeTransport {
        pub fn replying<F>(reply: F) -> Self
        where
            F: Fn(&[u8]) -> Result<Vec<u8>, TransportError> + Send + Sync + 'static,
        {
            FakeTransport {
                reply: Box::new(reply),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Vec<u8> {
            self.last_request.lock().unwrap().clone()
        }
    }

    impl Transport for FakeTransport {
        fn transact(&self, request: Buffer) -> Result<Buffer, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = (self.reply)(request.as_ref());
            *self.last_request.lock().unwrap() = request.into();
            reply.map(Buffer::from)
        }
    }

    /// Resolver knowing at most one family ID.
    pub struct FakeResolver(pub Option<u16>);

    impl FamilyResolver for FakeResolver {
        fn resolve_genl_family(&self, name: &str) -> Result<u16, ResolveError> {
            self.0.ok_or_else(|| ResolveError::NotFound(name.to_string()))
        }
    }

    pub fn eth0_info() -> NetdevInfo {
        NetdevInfoBuilder::default()
            .cmd(NetdevCmd::Get)
            .port_no(2)
            .vport_type(VportType::Netdev)
            .name("eth0")
            .mac_address(EtherAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]))
            .mtu(1500)
            .ifi_flags(IfFlags::from_bits_retain(0x1003))
            .build()
            .unwrap()
    }
}
