//! Device records with a cache of their queried attributes.
//!
//! A [`Netdev`] is allocated by name, then constructed by querying the
//! netdev family. Construction either populates every cached attribute
//! at once or leaves the record untouched. Reading an attribute whose
//! cache bit is not set is an error rather than a stale value.

use getset::Getters;
use log::debug;

use crate::{
    consts::netdev::{IfFlags, VportType},
    err::NetdevError,
    family::FamilyBinder,
    netdev::{info::EtherAddr, query::query_netdev},
    transport::Transport,
};
#[cfg(feature = "sync")]
use crate::family::netdev_family;

/// Class of a device, selecting how it is provided.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NetdevClass {
    /// A device backed by a system interface
    System,
    /// A device internal to the datapath
    Internal,
}

impl NetdevClass {
    /// Name under which the class is registered with the device layer.
    pub fn type_name(self) -> &'static str {
        match self {
            NetdevClass::System => "system",
            NetdevClass::Internal => "internal",
        }
    }

    /// Look up a class by its registered name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "system" => Some(NetdevClass::System),
            "internal" => Some(NetdevClass::Internal),
            _ => None,
        }
    }
}

crate::impl_flags!(
    /// Cached attributes of a [`Netdev`] that hold a queried value.
    pub CacheValid: u32 {
        /// The hardware address is cached
        ETHERADDR = 1 << 0;
        /// The MTU is cached
        MTU = 1 << 1;
        /// The interface flags are cached
        IFFLAGS = 1 << 5;
    }
);

/// Cached device attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CachedField {
    /// Hardware address
    EtherAddr,
    /// Maximum transmission unit
    Mtu,
    /// Interface flags
    IfFlags,
}

impl CachedField {
    fn cache_bit(self) -> CacheValid {
        match self {
            CachedField::EtherAddr => CacheValid::ETHERADDR,
            CachedField::Mtu => CacheValid::MTU,
            CachedField::IfFlags => CacheValid::IFFLAGS,
        }
    }
}

/// A network device and its cached attributes.
#[derive(Getters, Clone, Debug, PartialEq, Eq)]
pub struct Netdev {
    /// Device name
    #[getset(get = "pub")]
    name: String,
    /// Device class
    #[getset(get = "pub")]
    class: NetdevClass,
    /// Kind of datapath port backing the device
    #[getset(get = "pub")]
    dev_type: VportType,
    /// Port number within the datapath
    #[getset(get = "pub")]
    port_no: u32,
    /// Change sequence, bumped when the device is constructed
    #[getset(get = "pub")]
    change_seq: u64,
    /// Which cached attributes are populated
    #[getset(get = "pub")]
    cache_valid: CacheValid,
    /// Interface index, or a negated errno if it cannot be determined
    #[getset(get = "pub")]
    ifindex: i32,
    mac: EtherAddr,
    mtu: u32,
    ifi_flags: IfFlags,
}

impl Netdev {
    /// Allocate an empty record for `name`. Nothing is cached.
    pub fn alloc<S>(name: S, class: NetdevClass) -> Self
    where
        S: Into<String>,
    {
        Netdev {
            name: name.into(),
            class,
            dev_type: VportType::Unspec,
            port_no: 0,
            change_seq: 0,
            cache_valid: CacheValid::empty(),
            ifindex: 0,
            mac: EtherAddr::default(),
            mtu: 0,
            ifi_flags: IfFlags::empty(),
        }
    }

    /// Query the device through `binder` and populate the cache.
    ///
    /// On failure the record is left exactly as it was.
    pub fn construct<T>(&mut self, binder: &FamilyBinder<T>) -> Result<(), NetdevError>
    where
        T: Transport,
    {
        let (info, _) = query_netdev(binder, &self.name)?;

        self.change_seq = 1;
        self.dev_type = *info.vport_type();
        self.port_no = *info.port_no();
        self.mac = *info.mac_address();
        // Interface indexes are not reported by the family.
        self.ifindex = -libc::EOPNOTSUPP;
        self.mtu = *info.mtu();
        self.ifi_flags = *info.ifi_flags();
        self.cache_valid = CacheValid::ETHERADDR | CacheValid::MTU | CacheValid::IFFLAGS;

        debug!(
            "construct device {}, vport type: {:?}",
            self.name, self.dev_type
        );
        Ok(())
    }

    /// Allocate and construct a device through `binder`.
    pub fn open_with<S, T>(
        name: S,
        class: NetdevClass,
        binder: &FamilyBinder<T>,
    ) -> Result<Self, NetdevError>
    where
        S: Into<String>,
        T: Transport,
    {
        let mut netdev = Netdev::alloc(name, class);
        netdev.construct(binder)?;
        Ok(netdev)
    }

    /// Allocate and construct a device through the process-wide
    /// netdev family binding.
    #[cfg(feature = "sync")]
    pub fn open<S>(name: S, class: NetdevClass) -> Result<Self, NetdevError>
    where
        S: Into<String>,
    {
        Netdev::open_with(name, class, netdev_family())
    }

    /// Release the record.
    pub fn destruct(self) {
        debug!("destruct device {}", self.name);
    }

    fn check_cached(&self, field: CachedField) -> Result<(), NetdevError> {
        if self.cache_valid.contains(field.cache_bit()) {
            Ok(())
        } else {
            Err(NetdevError::InvalidState(field))
        }
    }

    /// Cached hardware address.
    pub fn etheraddr(&self) -> Result<EtherAddr, NetdevError> {
        self.check_cached(CachedField::EtherAddr)?;
        Ok(self.mac)
    }

    /// Cached MTU.
    pub fn mtu(&self) -> Result<u32, NetdevError> {
        self.check_cached(CachedField::Mtu)?;
        Ok(self.mtu)
    }

    /// Cached interface flags.
    pub fn ifi_flags(&self) -> Result<IfFlags, NetdevError> {
        self.check_cached(CachedField::IfFlags)?;
        Ok(self.ifi_flags)
    }
}
