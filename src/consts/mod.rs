//! # High level notes
//!
//! The items in this module are created by macros, which give them the
//! traits necessary to be serialized into netlink compatible types.
//!
//! Most netlink constants come from the Linux kernel headers and are
//! taken from `libc` where it exports them. The netdev family
//! constants are defined by the datapath driver and live in
//! [`netdev`].
//!
//! # Design decisions
//!
//! * Enums are used so that values can be checked against a finite set
//!   of inputs and so that only the constants valid in a given position
//!   of a message can be used there.
//! * `UnrecognizedConst` is included in each enum because completeness
//!   cannot be guaranteed for every constant a peer may send. This
//!   allows the integer value to be inspected and written back.
//! * Flag sets are [`bitflags`] types that keep unknown bits.

#[macro_use]
mod macros;

/// Constants related to generic netlink
pub mod genl;
pub use crate::consts::genl::*;
/// Constants related to the netdev generic netlink family
pub mod netdev;
pub use crate::consts::netdev::*;
/// Constants related to netlink top level headers
pub mod nl;
pub use crate::consts::nl::*;
/// Constants related to netlink socket operations
pub mod socket;
pub use crate::consts::socket::*;

/// Reimplementation of alignto macro in C
pub fn alignto(len: usize) -> usize {
    (len + libc::NLA_ALIGNTO as usize - 1) & !(libc::NLA_ALIGNTO as usize - 1)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_documented_conversions() {
        let unspec: u8 = CtrlCmd::Unspec.into();
        assert_eq!(unspec, libc::CTRL_CMD_UNSPEC as u8);

        let unspec_variant = CtrlCmd::from(libc::CTRL_CMD_UNSPEC as u8);
        assert_eq!(unspec_variant, CtrlCmd::Unspec);

        let unknown = NetdevAttr::from(42u16);
        assert_eq!(unknown, NetdevAttr::UnrecognizedConst(42));
        assert_eq!(u16::from(unknown), 42);
    }

    crate::impl_flags!(
        /// Flags used only by the tests below
        TestFlags: u16 {
            /// First documented flag
            #[allow(dead_code)]
            FIRST = 1 << 0;
            /// Second documented flag
            SECOND = 1 << 3;
        }
    );

    #[test]
    fn test_flags_with_attributes() {
        use std::io::Cursor;

        use crate::{FromBytes, Size, ToBytes};

        let flags = TestFlags::FIRST | TestFlags::SECOND;
        assert_eq!(flags.unpadded_size(), 2);

        let mut buffer = Cursor::new(Vec::new());
        flags.to_bytes(&mut buffer).unwrap();
        let bytes = buffer.into_inner();
        assert_eq!(bytes, 9u16.to_ne_bytes());
        assert_eq!(
            TestFlags::from_bytes(&mut Cursor::new(bytes.as_slice())).unwrap(),
            flags
        );
        assert_eq!(TestFlags::default(), TestFlags::empty());

        let flags = NlmF::REQUEST | NlmF::ECHO;
        assert_eq!(
            flags.bits(),
            (libc::NLM_F_REQUEST | libc::NLM_F_ECHO) as u16
        );
    }

    #[test]
    fn test_alignto() {
        assert_eq!(alignto(0), 0);
        assert_eq!(alignto(1), 4);
        assert_eq!(alignto(4), 4);
        assert_eq!(alignto(6), 8);
    }
}
