//! One-time binding of a generic netlink family.
//!
//! Before any request can be sent, the family name has to be resolved
//! to the numeric ID the kernel assigned to it, and a transport has to
//! be created. [`FamilyBinder`] performs that step at most once per
//! process: the first caller runs it, concurrent callers block until
//! it finishes, and every later caller gets the stored outcome. A
//! failed binding is never retried.
//!
//! # Design decisions
//!
//! The binder stores a plain function pointer rather than a closure so
//! that it can be built by a `const fn` and live in a `static`, which
//! is how [`netdev_family`] provides the process-wide binding.

use std::sync::OnceLock;

use getset::Getters;
use log::{debug, error};

use crate::{
    err::{BindingError, ResolveError},
    transport::FamilyResolver,
};
#[cfg(feature = "sync")]
use crate::{
    consts::{netdev::NETDEV_FAMILY, socket::NlFamily},
    socket::NlSocketHandle,
};

/// Outcome of a successful binding: the resolved family ID and the
/// transport requests are sent over.
#[derive(Getters, Debug)]
pub struct Binding<T> {
    /// Resolved family ID
    #[getset(get = "pub")]
    family_id: u16,
    /// Transport bound to the family
    #[getset(get = "pub")]
    transport: T,
}

impl<T> Binding<T> {
    /// Create a new binding.
    pub fn new(family_id: u16, transport: T) -> Self {
        Binding {
            family_id,
            transport,
        }
    }
}

/// Function performing the binding for a family name.
pub type ConnectFn<T> = fn(&'static str) -> Result<Binding<T>, BindingError>;

/// Lazily initialized, process-wide binding of one family.
pub struct FamilyBinder<T> {
    family_name: &'static str,
    connect: ConnectFn<T>,
    binding: OnceLock<Result<Binding<T>, BindingError>>,
}

impl<T> FamilyBinder<T> {
    /// Create a binder that runs `connect` on first use.
    pub const fn new(family_name: &'static str, connect: ConnectFn<T>) -> Self {
        FamilyBinder {
            family_name,
            connect,
            binding: OnceLock::new(),
        }
    }

    /// Name of the bound family.
    pub fn family_name(&self) -> &'static str {
        self.family_name
    }

    /// Get the binding, running the connect function if no caller has
    /// yet. Every caller observes the same outcome.
    pub fn binding(&self) -> Result<&Binding<T>, BindingError> {
        self.binding
            .get_or_init(|| (self.connect)(self.family_name))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Get the outcome of the binding without triggering it. Returns
    /// [`None`] if the binding has not been attempted yet.
    pub fn try_get(&self) -> Option<Result<&Binding<T>, BindingError>> {
        self.binding
            .get()
            .map(|result| result.as_ref().map_err(Clone::clone))
    }
}

/// Resolve `family_name` through `resolver` and create the transport
/// with `connect`.
///
/// Resolution failure is logged here, once, since a binder never runs
/// this twice.
pub fn bind_family<R, T, F>(
    family_name: &str,
    resolver: &R,
    connect: F,
) -> Result<Binding<T>, BindingError>
where
    R: FamilyResolver,
    F: FnOnce() -> Result<T, BindingError>,
{
    let family_id = match resolver.resolve_genl_family(family_name) {
        Ok(id) => id,
        Err(e) => {
            match e {
                ResolveError::NotFound(_) => error!(
                    "Generic netlink family {} does not exist; the kernel module is probably not loaded",
                    family_name
                ),
                _ => error!(
                    "Failed to resolve generic netlink family {}: {}",
                    family_name, e
                ),
            }
            return Err(BindingError::Unresolved {
                family: family_name.to_string(),
                errno: e.errno(),
                reason: e.to_string(),
            });
        }
    };
    let transport = connect()?;
    debug!(
        "Bound generic netlink family {} with ID {}",
        family_name, family_id
    );
    Ok(Binding::new(family_id, transport))
}

#[cfg(feature = "sync")]
fn transport_error(family_name: &str, e: std::io::Error) -> BindingError {
    error!(
        "Failed to create netlink socket for family {}: {}",
        family_name, e
    );
    BindingError::Transport {
        family: family_name.to_string(),
        errno: e.raw_os_error(),
        reason: e.to_string(),
    }
}

/// Resolve `family_name` over a generic netlink socket and bind a
/// second socket for requests to the family.
#[cfg(feature = "sync")]
pub fn connect_genl_family(
    family_name: &'static str,
) -> Result<Binding<NlSocketHandle>, BindingError> {
    let resolver = NlSocketHandle::connect(NlFamily::Generic)
        .map_err(|e| transport_error(family_name, e))?;
    bind_family(family_name, &resolver, || {
        NlSocketHandle::connect(NlFamily::Generic)
            .map_err(|e| transport_error(family_name, e))
    })
}

#[cfg(feature = "sync")]
static NETDEV_FAMILY_BINDER: FamilyBinder<NlSocketHandle> =
    FamilyBinder::new(NETDEV_FAMILY, connect_genl_family);

/// Process-wide binding of the netdev family.
#[cfg(feature = "sync")]
pub fn netdev_family() -> &'static FamilyBinder<NlSocketHandle> {
    &NETDEV_FAMILY_BINDER
}

#[cfg(test)]
mod test {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{err::TransportError, test::setup};

    struct StaticResolver(Result<u16, i32>);

    impl FamilyResolver for StaticResolver {
        fn resolve_genl_family(&self, name: &str) -> Result<u16, ResolveError> {
            match self.0 {
                Ok(id) => Ok(id),
                Err(libc::ENOENT) => Err(ResolveError::NotFound(name.to_string())),
                Err(errno) => Err(ResolveError::Transport(TransportError::Nlmsgerr(errno))),
            }
        }
    }

    static CONNECT_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn connect_counted(family_name: &'static str) -> Result<Binding<()>, BindingError> {
        CONNECT_CALLS.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(20));
        bind_family(family_name, &StaticResolver(Ok(42)), || Ok(()))
    }

    static FAILED_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn connect_missing(family_name: &'static str) -> Result<Binding<()>, BindingError> {
        FAILED_CALLS.fetch_add(1, Ordering::SeqCst);
        bind_family(family_name, &StaticResolver(Err(libc::ENOENT)), || Ok(()))
    }

    #[test]
    fn test_concurrent_binding_runs_once() {
        setup();

        let binder: FamilyBinder<()> = FamilyBinder::new("test_family", connect_counted);
        assert!(binder.try_get().is_none());

        let ids = std::thread::scope(|s| {
            let handles = (0..8)
                .map(|_| s.spawn(|| *binder.binding().unwrap().family_id()))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect::<Vec<_>>()
        });
        assert!(ids.iter().all(|id| *id == 42));
        assert_eq!(CONNECT_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(*binder.try_get().unwrap().unwrap().family_id(), 42);
        assert_eq!(binder.family_name(), "test_family");
    }

    #[test]
    fn test_failed_binding_is_terminal() {
        setup();

        let binder: FamilyBinder<()> = FamilyBinder::new("missing_family", connect_missing);
        let first = binder.binding().unwrap_err();
        let second = binder.binding().unwrap_err();
        assert_eq!(first, second);
        assert_eq!(first.errno(), libc::ENOENT);
        assert!(matches!(first, BindingError::Unresolved { .. }));
        assert_eq!(FAILED_CALLS.load(Ordering::SeqCst), 1);
        assert!(binder.try_get().unwrap().is_err());
    }

    #[test]
    fn test_bind_family_transport_failure() {
        let result = bind_family("fam", &StaticResolver(Ok(3)), || -> Result<(), _> {
            Err(BindingError::Transport {
                family: "fam".to_string(),
                errno: Some(libc::EMFILE),
                reason: "too many files".to_string(),
            })
        });
        assert_eq!(result.unwrap_err().errno(), libc::EMFILE);

        let err = bind_family("fam", &StaticResolver(Err(libc::EACCES)), || Ok(())).unwrap_err();
        assert_eq!(err.errno(), libc::EACCES);
    }
}
