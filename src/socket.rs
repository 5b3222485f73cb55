//! This module provides the netlink socket transport.
//!
//! [`NlSocket`] is a thin wrapper around the netlink socket system
//! calls. [`NlSocketHandle`] layers the request/response discipline
//! used by the rest of the crate on top of it: every request gets a
//! fresh sequence number and the socket's port ID, and only the reply
//! carrying that sequence number is handed back.
//!
//! # Design decisions
//!
//! The handle is shared between threads once a family is bound, so
//! the sequence counter lives behind a [`parking_lot::Mutex`] that is
//! held for the whole exchange. That keeps one transaction in flight
//! per handle and guarantees a reply is read by the thread that sent
//! the request.

use std::{
    io::{self, Cursor},
    mem::{size_of, zeroed, MaybeUninit},
    os::unix::io::{AsRawFd, RawFd},
};

use libc::{c_int, c_void};
use log::{debug, trace};
use parking_lot::Mutex;

use crate::{
    consts::{
        genl::{CtrlAttr, CtrlCmd},
        nl::{GenlId, NlmF, Nlmsg},
        socket::{AddrFamily, NlFamily},
    },
    err::{DeError, ResolveError, SerError, TransportError},
    genl::{encode_message, Genlmsghdr, GenlmsghdrBuilder, Nlattr},
    nl::Nlmsghdr,
    transport::{FamilyResolver, Transport},
    types::{Buffer, GenlBuffer},
    FromBytes, FromBytesWithInput, TypeSize, MAX_NL_LENGTH,
};

const NL_SEQ_OFFSET: usize = 8;
const NL_PID_OFFSET: usize = 12;

/// Low level access to a netlink socket.
pub struct NlSocket {
    fd: c_int,
}

impl NlSocket {
    /// Wrapper around `socket()` syscall filling in the
    /// netlink-specific information.
    pub fn new(proto: NlFamily) -> Result<Self, io::Error> {
        let fd = match unsafe {
            libc::socket(
                AddrFamily::Netlink.into(),
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                proto.into(),
            )
        } {
            i if i >= 0 => Ok(i),
            _ => Err(io::Error::last_os_error()),
        }?;
        Ok(NlSocket { fd })
    }

    /// Equivalent of `socket` and `bind` calls. The kernel assigns
    /// the port ID.
    pub fn connect(proto: NlFamily) -> Result<Self, io::Error> {
        let s = NlSocket::new(proto)?;
        s.bind()?;
        Ok(s)
    }

    /// Set underlying socket file descriptor to be blocking.
    pub fn block(&self) -> Result<(), io::Error> {
        match unsafe {
            libc::fcntl(
                self.fd,
                libc::F_SETFL,
                libc::fcntl(self.fd, libc::F_GETFL, 0) & !libc::O_NONBLOCK,
            )
        } {
            i if i < 0 => Err(io::Error::last_os_error()),
            _ => Ok(()),
        }
    }

    /// Bind to a port ID chosen by the kernel, without joining any
    /// multicast group. See netlink(7).
    pub fn bind(&self) -> Result<(), io::Error> {
        let mut nladdr = unsafe { zeroed::<libc::sockaddr_nl>() };
        nladdr.nl_family = c_int::from(AddrFamily::Netlink) as u16;
        match unsafe {
            libc::bind(
                self.fd,
                &nladdr as *const _ as *const libc::sockaddr,
                size_of::<libc::sockaddr_nl>() as u32,
            )
        } {
            i if i >= 0 => (),
            _ => return Err(io::Error::last_os_error()),
        };
        Ok(())
    }

    /// Send message encoded as byte slice to the netlink ID
    /// specified in the netlink header
    /// [`Nlmsghdr`][crate::nl::Nlmsghdr]
    pub fn send<B>(&self, buf: B) -> Result<libc::size_t, io::Error>
    where
        B: AsRef<[u8]>,
    {
        match unsafe {
            libc::send(
                self.fd,
                buf.as_ref() as *const _ as *const c_void,
                buf.as_ref().len(),
                0,
            )
        } {
            i if i >= 0 => Ok(i as libc::size_t),
            _ => Err(io::Error::last_os_error()),
        }
    }

    /// Receive one datagram from the netlink socket.
    ///
    /// The returned length is the full length of the datagram, which
    /// is larger than `buf` if the datagram was truncated.
    pub fn recv<B>(&self, mut buf: B) -> Result<libc::size_t, io::Error>
    where
        B: AsMut<[u8]>,
    {
        match unsafe {
            libc::recv(
                self.fd,
                buf.as_mut() as *mut _ as *mut c_void,
                buf.as_mut().len(),
                libc::MSG_TRUNC,
            )
        } {
            i if i >= 0 => Ok(i as libc::size_t),
            _ => Err(io::Error::last_os_error()),
        }
    }

    /// Get the PID for this socket.
    pub fn pid(&self) -> Result<u32, io::Error> {
        let mut sock_len = size_of::<libc::sockaddr_nl>() as u32;
        let mut sock_addr: MaybeUninit<libc::sockaddr_nl> = MaybeUninit::uninit();
        match unsafe {
            libc::getsockname(
                self.fd,
                sock_addr.as_mut_ptr() as *mut _,
                &mut sock_len as *mut _,
            )
        } {
            i if i >= 0 => Ok(unsafe { sock_addr.assume_init() }.nl_pid),
            _ => Err(io::Error::last_os_error()),
        }
    }
}

impl AsRawFd for NlSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for NlSocket {
    /// Closes underlying file descriptor to avoid file descriptor
    /// leaks.
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

/// Higher level handle for request/response exchanges.
pub struct NlSocketHandle {
    socket: NlSocket,
    pid: u32,
    seq: Mutex<u32>,
}

impl NlSocketHandle {
    /// Equivalent of `socket` and `bind` calls.
    pub fn connect(proto: NlFamily) -> Result<Self, io::Error> {
        let socket = NlSocket::connect(proto)?;
        socket.block()?;
        let pid = socket.pid()?;
        debug!("Netlink socket connected with port ID {}", pid);
        Ok(NlSocketHandle {
            socket,
            pid,
            seq: Mutex::new(0),
        })
    }

    /// Get the PID for the current socket.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Send an encoded message.
    pub fn send(&self, buf: &[u8]) -> Result<(), io::Error> {
        trace!("Buffer sent: {:?}", buf);
        self.socket.send(buf)?;
        Ok(())
    }

    /// Receive one datagram. A datagram that does not fit in
    /// [`MAX_NL_LENGTH`] bytes is an error.
    pub fn recv(&self) -> Result<Buffer, TransportError> {
        let mut buf = vec![0; MAX_NL_LENGTH];
        let len = check_received_len(self.socket.recv(&mut buf)?, buf.len())?;
        buf.truncate(len);
        trace!("Buffer received: {:?}", buf);
        Ok(Buffer::from(buf))
    }
}

impl AsRawFd for NlSocketHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

impl Transport for NlSocketHandle {
    fn transact(&self, mut request: Buffer) -> Result<Buffer, TransportError> {
        if request.len() < Nlmsghdr::header_size() {
            return Err(TransportError::Ser(SerError::UnexpectedEOB));
        }

        let mut seq = self.seq.lock();
        *seq = seq.wrapping_add(1);
        stamp_header(&mut request, *seq, self.pid);
        self.send(request.as_ref())?;

        loop {
            let response = self.recv()?;
            let nl = Nlmsghdr::from_bytes(&mut Cursor::new(response.as_ref()))?;
            if *nl.nl_seq() != *seq {
                trace!(
                    "Discarding reply with sequence number {}, expected {}",
                    nl.nl_seq(),
                    *seq
                );
                continue;
            }
            return check_reply(&nl, response);
        }
    }
}

fn check_received_len(len: usize, capacity: usize) -> Result<usize, TransportError> {
    if len > capacity {
        return Err(TransportError::Truncated(len));
    }
    Ok(len)
}

fn stamp_header(request: &mut Buffer, seq: u32, pid: u32) {
    let bytes = request.as_mut();
    bytes[NL_SEQ_OFFSET..NL_SEQ_OFFSET + 4].copy_from_slice(&seq.to_ne_bytes());
    bytes[NL_PID_OFFSET..NL_PID_OFFSET + 4].copy_from_slice(&pid.to_ne_bytes());
}

/// Turn an `NLMSG_ERROR` reply into an error. An error code of zero
/// is a bare acknowledgement with no reply payload.
fn check_reply(nl: &Nlmsghdr, response: Buffer) -> Result<Buffer, TransportError> {
    if Nlmsg::from(*nl.nl_type()) != Nlmsg::Error {
        return Ok(response);
    }
    let mut buffer = Cursor::new(response.as_ref());
    buffer.set_position(Nlmsghdr::header_size() as u64);
    match i32::from_bytes(&mut buffer)? {
        0 => Err(TransportError::NoResponse),
        errno => Err(TransportError::Nlmsgerr(errno.saturating_abs())),
    }
}

fn family_request(name: &str) -> Result<Buffer, SerError> {
    let genl = GenlmsghdrBuilder::default()
        .cmd(CtrlCmd::Getfamily)
        .version(2)
        .build()?;
    let mut attrs = GenlBuffer::new();
    attrs.push(Nlattr::new(false, false, CtrlAttr::FamilyName, name)?);
    encode_message(GenlId::Ctrl.into(), NlmF::REQUEST, &genl, &(), &attrs)
}

fn family_id_from_reply(response: &Buffer) -> Result<u16, DeError> {
    let mut buffer = Cursor::new(response.as_ref());
    let nl = Nlmsghdr::from_bytes(&mut buffer)?;
    Genlmsghdr::<CtrlCmd>::from_bytes(&mut buffer)?;
    let attrs_len = (*nl.nl_len() as usize)
        .checked_sub(Nlmsghdr::header_size() + Genlmsghdr::<CtrlCmd>::type_size())
        .ok_or(DeError::UnexpectedEOB)?;
    let attrs = GenlBuffer::<CtrlAttr>::from_bytes_with_input(&mut buffer, attrs_len)?;
    attrs
        .get_attr_handle()
        .get_attr_payload_as::<u16>(CtrlAttr::FamilyId)
}

impl FamilyResolver for NlSocketHandle {
    fn resolve_genl_family(&self, name: &str) -> Result<u16, ResolveError> {
        let request = family_request(name).map_err(TransportError::from)?;
        let response = match self.transact(request) {
            Ok(r) => r,
            Err(TransportError::Nlmsgerr(libc::ENOENT)) => {
                return Err(ResolveError::NotFound(name.to_string()))
            }
            Err(e) => return Err(ResolveError::from(e)),
        };
        let id = family_id_from_reply(&response)?;
        debug!("Resolved generic netlink family {} to ID {}", name, id);
        Ok(id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Write;

    use byteorder::{NativeEndian, WriteBytesExt};

    use crate::{test::setup, Size};

    #[test]
    fn test_family_request_layout() {
        let request = family_request("nlctrl").unwrap();
        let mut c = Cursor::new(Vec::new());
        c.write_u32::<NativeEndian>(32).unwrap();
        c.write_u16::<NativeEndian>(libc::GENL_ID_CTRL as u16)
            .unwrap();
        c.write_u16::<NativeEndian>(libc::NLM_F_REQUEST as u16)
            .unwrap();
        c.write_u32::<NativeEndian>(0).unwrap();
        c.write_u32::<NativeEndian>(0).unwrap();
        c.write_u8(libc::CTRL_CMD_GETFAMILY as u8).unwrap();
        c.write_u8(2).unwrap();
        c.write_u16::<NativeEndian>(0).unwrap();
        c.write_u16::<NativeEndian>(11).unwrap();
        c.write_u16::<NativeEndian>(libc::CTRL_ATTR_FAMILY_NAME as u16)
            .unwrap();
        c.write_all(b"nlctrl\0\0").unwrap();
        assert_eq!(request.as_ref(), c.get_ref().as_slice());
    }

    #[test]
    fn test_stamp_header() {
        let mut request = family_request("nlctrl").unwrap();
        stamp_header(&mut request, 7, 4242);
        let nl = Nlmsghdr::from_bytes(&mut Cursor::new(request.as_ref())).unwrap();
        assert_eq!(*nl.nl_seq(), 7);
        assert_eq!(*nl.nl_pid(), 4242);
        assert_eq!(*nl.nl_len() as usize, request.len());
    }

    #[test]
    fn test_oversized_datagram_is_an_error() {
        assert_eq!(check_received_len(36, MAX_NL_LENGTH).unwrap(), 36);
        assert_eq!(
            check_received_len(MAX_NL_LENGTH, MAX_NL_LENGTH).unwrap(),
            MAX_NL_LENGTH
        );
        let err = check_received_len(MAX_NL_LENGTH + 1, MAX_NL_LENGTH).unwrap_err();
        assert!(matches!(err, TransportError::Truncated(len) if len == MAX_NL_LENGTH + 1));
        assert_eq!(err.errno(), libc::EMSGSIZE);
    }

    #[test]
    fn test_check_reply() {
        let error_reply = |errno: i32| {
            let mut c = Cursor::new(Vec::new());
            c.write_u32::<NativeEndian>(36).unwrap();
            c.write_u16::<NativeEndian>(libc::NLMSG_ERROR as u16)
                .unwrap();
            c.write_u16::<NativeEndian>(0).unwrap();
            c.write_u32::<NativeEndian>(1).unwrap();
            c.write_u32::<NativeEndian>(0).unwrap();
            c.write_i32::<NativeEndian>(errno).unwrap();
            c.write_all(&[0; 16]).unwrap();
            Buffer::from(c.into_inner())
        };

        let reply = error_reply(-libc::ENODEV);
        let nl = Nlmsghdr::from_bytes(&mut Cursor::new(reply.as_ref())).unwrap();
        assert!(matches!(
            check_reply(&nl, reply),
            Err(TransportError::Nlmsgerr(libc::ENODEV))
        ));

        let reply = error_reply(0);
        let nl = Nlmsghdr::from_bytes(&mut Cursor::new(reply.as_ref())).unwrap();
        assert!(matches!(
            check_reply(&nl, reply),
            Err(TransportError::NoResponse)
        ));
    }

    #[test]
    fn test_family_id_from_reply() {
        let genl = GenlmsghdrBuilder::default()
            .cmd(CtrlCmd::Newfamily)
            .version(2)
            .build()
            .unwrap();
        let mut attrs = GenlBuffer::new();
        attrs.push(Nlattr::new(false, false, CtrlAttr::FamilyName, "nlctrl").unwrap());
        attrs.push(Nlattr::new(false, false, CtrlAttr::FamilyId, 0x10u16).unwrap());
        let reply = encode_message(GenlId::Ctrl.into(), NlmF::empty(), &genl, &(), &attrs).unwrap();
        assert_eq!(reply.len(), 16 + genl.padded_size() + attrs.padded_size());
        assert_eq!(family_id_from_reply(&reply).unwrap(), 0x10);
    }

    #[test]
    #[ignore]
    fn real_test_kernel_assigns_port_id() {
        setup();

        let s = NlSocketHandle::connect(NlFamily::Generic).unwrap();
        assert_ne!(s.pid(), 0);
        assert_eq!(s.socket.pid().unwrap(), s.pid());
    }

    #[test]
    #[ignore]
    fn real_test_resolve_genl_family() {
        setup();

        let s = NlSocketHandle::connect(NlFamily::Generic).unwrap();
        let id = s.resolve_genl_family("nlctrl").unwrap();
        assert_eq!(id, libc::GENL_ID_CTRL as u16);
    }

    #[test]
    #[ignore]
    fn real_test_resolve_missing_family() {
        setup();

        let s = NlSocketHandle::connect(NlFamily::Generic).unwrap();
        assert!(matches!(
            s.resolve_genl_family("no_such_family"),
            Err(ResolveError::NotFound(_))
        ));
    }
}
