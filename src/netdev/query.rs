//! Synchronous request/response exchange with the netdev family.

use log::{debug, warn};

use crate::{
    err::QueryError,
    family::FamilyBinder,
    netdev::info::NetdevInfo,
    transport::Transport,
    types::Buffer,
};

/// Query the attributes of the device `devname`.
///
/// The family is bound on first use. If the binding failed, no request
/// is sent. On success the decoded record is returned together with
/// the raw reply it was decoded from.
pub fn query_netdev<T>(
    binder: &FamilyBinder<T>,
    devname: &str,
) -> Result<(NetdevInfo, Buffer), QueryError>
where
    T: Transport,
{
    let binding = binder.binding()?;
    let request = NetdevInfo::get_request(devname).to_request(*binding.family_id())?;
    debug!("Querying netdev {} ({} byte request)", devname, request.len());

    let reply = binding.transport().transact(request)?;
    match NetdevInfo::from_response(reply.as_ref(), *binding.family_id()) {
        Ok(info) => Ok((info, reply)),
        Err(e) => {
            warn!("Failed to decode netdev reply for {}: {}", devname, e);
            Err(QueryError::Decode(e))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{
        consts::netdev::{IfFlags, VportType},
        err::{BindingError, DecodeError, TransportError},
        family::{bind_family, Binding},
        netdev::test::{eth0_info, FakeTransport, FakeResolver, FAMILY_ID},
        test::setup,
    };

    fn connect_eth0(family_name: &'static str) -> Result<Binding<FakeTransport>, BindingError> {
        bind_family(family_name, &FakeResolver(Some(FAMILY_ID)), || {
            Ok(FakeTransport::replying(|_| {
                Ok(Vec::from(eth0_info().to_response(FAMILY_ID).unwrap()))
            }))
        })
    }

    fn connect_garbage(family_name: &'static str) -> Result<Binding<FakeTransport>, BindingError> {
        bind_family(family_name, &FakeResolver(Some(FAMILY_ID)), || {
            Ok(FakeTransport::replying(|_| Ok(vec![0; 10])))
        })
    }

    fn connect_failing(family_name: &'static str) -> Result<Binding<FakeTransport>, BindingError> {
        bind_family(family_name, &FakeResolver(Some(FAMILY_ID)), || {
            Ok(FakeTransport::replying(|_| {
                Err(TransportError::Nlmsgerr(libc::ENODEV))
            }))
        })
    }

    fn connect_unresolved(
        family_name: &'static str,
    ) -> Result<Binding<FakeTransport>, BindingError> {
        bind_family(family_name, &FakeResolver(None), || {
            Ok(FakeTransport::replying(|_| Ok(Vec::new())))
        })
    }

    #[test]
    fn test_query_eth0() {
        setup();

        let binder: FamilyBinder<FakeTransport> =
            FamilyBinder::new("ovs_win_netdev", connect_eth0);
        let (info, reply) = query_netdev(&binder, "eth0").unwrap();
        assert_eq!(*info.mtu(), 1500);
        assert_eq!(info.mac_address().to_string(), "00:11:22:33:44:55");
        assert_eq!(*info.ifi_flags(), IfFlags::from_bits_retain(0x1003));
        assert_eq!(*info.port_no(), 2);
        assert_eq!(*info.vport_type(), VportType::Netdev);
        assert_eq!(info.name(), "eth0");
        assert_eq!(
            NetdevInfo::from_response(reply.as_ref(), FAMILY_ID).unwrap(),
            info
        );

        let transport = binder.binding().unwrap().transport();
        assert_eq!(transport.calls(), 1);
        let request = transport.last_request();
        assert_eq!(&request[4..6], &FAMILY_ID.to_ne_bytes());
    }

    #[test]
    fn test_query_invalid_name_sends_nothing() {
        let binder: FamilyBinder<FakeTransport> =
            FamilyBinder::new("ovs_win_netdev", connect_eth0);
        assert!(matches!(
            query_netdev(&binder, ""),
            Err(QueryError::InvalidRequest(_))
        ));
        assert_eq!(binder.binding().unwrap().transport().calls(), 0);
    }

    #[test]
    fn test_query_decode_failure() {
        setup();

        let binder: FamilyBinder<FakeTransport> =
            FamilyBinder::new("ovs_win_netdev", connect_garbage);
        assert!(matches!(
            query_netdev(&binder, "eth0"),
            Err(QueryError::Decode(DecodeError::TruncatedHeader))
        ));
    }

    #[test]
    fn test_query_transport_failure() {
        let binder: FamilyBinder<FakeTransport> =
            FamilyBinder::new("ovs_win_netdev", connect_failing);
        let err = query_netdev(&binder, "eth0").unwrap_err();
        assert!(matches!(err, QueryError::Transport(_)));
        assert_eq!(err.errno(), libc::ENODEV);
    }

    #[test]
    fn test_query_unbound_family() {
        setup();

        let binder: FamilyBinder<FakeTransport> =
            FamilyBinder::new("ovs_win_netdev", connect_unresolved);
        let err = query_netdev(&binder, "eth0").unwrap_err();
        assert!(matches!(err, QueryError::Binding(_)));
        assert_eq!(err.errno(), libc::ENOENT);
        assert!(query_netdev(&binder, "eth1").is_err());
    }
}
