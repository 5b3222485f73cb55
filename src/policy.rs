//! Declarative attribute policies.
//!
//! A [`Policy`] is an immutable table that maps an attribute
//! identifier to the representation its payload must have. Decoders
//! run [`Policy::validate`] over a parsed attribute stream before any
//! payload is interpreted, so typed accessors used afterwards can rely
//! on the payload having the expected shape.
//!
//! Policies are built with `const fn`s so they can live in a `static`:
//!
//! ```
//! use genl_netdev::{
//!     consts::NetdevAttr,
//!     policy::{Policy, PolicyEntry, PolicyType},
//! };
//!
//! static ENTRIES: [PolicyEntry<NetdevAttr>; 2] = [
//!     PolicyEntry::new(NetdevAttr::PortNo, PolicyType::U32),
//!     PolicyEntry::new(NetdevAttr::Name, PolicyType::String).with_max_len(16),
//! ];
//! static POLICY: Policy<NetdevAttr> = Policy::new(&ENTRIES);
//! ```

use log::trace;

use crate::{
    attr::Attribute, consts::NlAttrType, err::PolicyError, genl::Nlattr, types::GenlBuffer,
};

/// Representation an attribute payload must have.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PolicyType {
    /// Any payload; lengths are only bounded by the entry
    Unspec,
    /// Unsigned 8 bit integer
    U8,
    /// Unsigned 16 bit integer
    U16,
    /// Unsigned 32 bit integer
    U32,
    /// Unsigned 64 bit integer
    U64,
    /// Null terminated string
    String,
    /// Presence only, empty payload
    Flag,
}

impl PolicyType {
    /// Minimum payload length implied by the type.
    pub const fn min_len(self) -> usize {
        match self {
            PolicyType::Unspec | PolicyType::Flag => 0,
            PolicyType::U8 | PolicyType::String => 1,
            PolicyType::U16 => 2,
            PolicyType::U32 => 4,
            PolicyType::U64 => 8,
        }
    }

    /// Maximum payload length implied by the type.
    pub const fn max_len(self) -> Option<usize> {
        match self {
            PolicyType::Unspec | PolicyType::String => None,
            PolicyType::Flag => Some(0),
            PolicyType::U8 => Some(1),
            PolicyType::U16 => Some(2),
            PolicyType::U32 => Some(4),
            PolicyType::U64 => Some(8),
        }
    }
}

/// Expected type and length of one attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PolicyEntry<T> {
    attr: T,
    policy_type: PolicyType,
    min_len: Option<usize>,
    max_len: Option<usize>,
}

impl<T> PolicyEntry<T>
where
    T: Copy,
{
    /// Entry whose length bounds are implied by `policy_type`.
    pub const fn new(attr: T, policy_type: PolicyType) -> Self {
        PolicyEntry {
            attr,
            policy_type,
            min_len: None,
            max_len: None,
        }
    }

    /// Set the maximum payload length. For strings the null byte is
    /// counted.
    pub const fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Require an exact payload length.
    pub const fn with_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self.max_len = Some(len);
        self
    }

    /// Attribute identifier
    pub fn attr(&self) -> T {
        self.attr
    }

    /// Expected payload representation
    pub fn policy_type(&self) -> PolicyType {
        self.policy_type
    }

    /// Effective minimum payload length
    pub fn min_len(&self) -> usize {
        self.min_len.unwrap_or_else(|| self.policy_type.min_len())
    }

    /// Effective maximum payload length, if bounded
    pub fn max_len(&self) -> Option<usize> {
        self.max_len.or_else(|| self.policy_type.max_len())
    }
}

/// An ordered, immutable table of [`PolicyEntry`]s.
#[derive(Copy, Clone, Debug)]
pub struct Policy<'a, T> {
    entries: &'a [PolicyEntry<T>],
}

impl<'a, T> Policy<'a, T>
where
    T: NlAttrType,
{
    /// Create a policy over the given entries.
    pub const fn new(entries: &'a [PolicyEntry<T>]) -> Self {
        Policy { entries }
    }

    /// Iterate over the entries in table order.
    pub fn entries(&self) -> impl Iterator<Item = &'a PolicyEntry<T>> {
        self.entries.iter()
    }

    /// Look up the entry for an attribute identifier.
    pub fn get(&self, attr: T) -> Option<&'a PolicyEntry<T>> {
        self.entries.iter().find(|entry| entry.attr == attr)
    }

    /// Check every attribute of the stream against the policy and
    /// require every attribute of the policy to be present.
    pub fn validate(&self, attrs: &GenlBuffer<T>) -> Result<(), PolicyError> {
        for attr in attrs.iter() {
            self.validate_attr(attr)?;
        }
        for entry in self.entries.iter() {
            if !attrs
                .iter()
                .any(|attr| *attr.nla_type().nla_type() == entry.attr)
            {
                return Err(PolicyError::MissingAttribute(entry.attr.into()));
            }
        }
        Ok(())
    }

    fn validate_attr(&self, attr: &Nlattr<T>) -> Result<(), PolicyError> {
        let attr_type = *attr.nla_type().nla_type();
        let id: u16 = attr_type.into();
        let entry = self
            .get(attr_type)
            .ok_or(PolicyError::UnknownAttribute(id))?;
        trace!("Validating attribute {:?} against {:?}", attr_type, entry);

        if *attr.nla_type().nla_nested() {
            return Err(PolicyError::TypeMismatch {
                attr: id,
                expected: entry.policy_type,
            });
        }

        let payload = attr.payload().as_ref();
        let len = payload.len();
        let (min, max) = (entry.min_len(), entry.max_len());
        if len < min || max.map(|max| len > max).unwrap_or(false) {
            return Err(PolicyError::InvalidLength {
                attr: id,
                len,
                min,
                max,
            });
        }

        if entry.policy_type == PolicyType::String {
            match payload.split_last() {
                Some((&0, body)) if body.contains(&0) => {
                    return Err(PolicyError::EmbeddedNull(id))
                }
                Some((&0, _)) => (),
                _ => return Err(PolicyError::NotTerminated(id)),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{consts::NetdevAttr, types::Buffer};

    static ENTRIES: [PolicyEntry<NetdevAttr>; 3] = [
        PolicyEntry::new(NetdevAttr::Mtu, PolicyType::U32),
        PolicyEntry::new(NetdevAttr::Name, PolicyType::String).with_max_len(4),
        PolicyEntry::new(NetdevAttr::MacAddr, PolicyType::Unspec).with_len(6),
    ];
    static POLICY: Policy<NetdevAttr> = Policy::new(&ENTRIES);

    fn valid_attrs() -> GenlBuffer<NetdevAttr> {
        let mut attrs = GenlBuffer::new();
        attrs.push(Nlattr::new(false, false, NetdevAttr::Mtu, 1500u32).unwrap());
        attrs.push(Nlattr::new(false, false, NetdevAttr::Name, "eth").unwrap());
        attrs.push(
            Nlattr::new(
                false,
                false,
                NetdevAttr::MacAddr,
                Buffer::from(vec![0, 1, 2, 3, 4, 5]),
            )
            .unwrap(),
        );
        attrs
    }

    #[test]
    fn test_policy_accepts_conformant_stream() {
        POLICY.validate(&valid_attrs()).unwrap();
        assert_eq!(POLICY.get(NetdevAttr::Name).unwrap().max_len(), Some(4));
        assert_eq!(POLICY.get(NetdevAttr::Mtu).unwrap().min_len(), 4);
        assert!(POLICY.get(NetdevAttr::PortNo).is_none());
    }

    #[test]
    fn test_policy_unknown_attribute() {
        let mut attrs = valid_attrs();
        attrs.push(Nlattr::new(false, false, NetdevAttr::PortNo, 1u32).unwrap());
        assert!(matches!(
            POLICY.validate(&attrs),
            Err(PolicyError::UnknownAttribute(1))
        ));
    }

    #[test]
    fn test_policy_length_violations() {
        let mut attrs = GenlBuffer::new();
        attrs.push(Nlattr::new(false, false, NetdevAttr::Mtu, 1500u16).unwrap());
        assert!(matches!(
            POLICY.validate(&attrs),
            Err(PolicyError::InvalidLength {
                attr: 5,
                len: 2,
                min: 4,
                max: Some(4)
            })
        ));

        let mut attrs = GenlBuffer::new();
        attrs.push(Nlattr::new(false, false, NetdevAttr::Name, "eth0").unwrap());
        assert!(matches!(
            POLICY.validate(&attrs),
            Err(PolicyError::InvalidLength { attr: 3, len: 5, .. })
        ));

        let mut attrs = GenlBuffer::new();
        attrs.push(
            Nlattr::new(
                false,
                false,
                NetdevAttr::MacAddr,
                Buffer::from(vec![0, 1, 2, 3, 4]),
            )
            .unwrap(),
        );
        assert!(matches!(
            POLICY.validate(&attrs),
            Err(PolicyError::InvalidLength { attr: 4, len: 5, .. })
        ));
    }

    #[test]
    fn test_policy_string_not_terminated() {
        let mut attrs = GenlBuffer::new();
        attrs.push(
            Nlattr::new(false, false, NetdevAttr::Name, Buffer::from(&b"eth"[..])).unwrap(),
        );
        assert!(matches!(
            POLICY.validate(&attrs),
            Err(PolicyError::NotTerminated(3))
        ));
    }

    #[test]
    fn test_policy_string_embedded_null() {
        let mut attrs = GenlBuffer::new();
        attrs.push(
            Nlattr::new(false, false, NetdevAttr::Name, Buffer::from(&b"e\0h\0"[..])).unwrap(),
        );
        assert!(matches!(
            POLICY.validate(&attrs),
            Err(PolicyError::EmbeddedNull(3))
        ));

        let mut attrs = GenlBuffer::new();
        attrs.push(Nlattr::new(false, false, NetdevAttr::Name, Buffer::from(&b"\0"[..])).unwrap());
        assert!(matches!(
            POLICY.validate(&attrs),
            Err(PolicyError::MissingAttribute(_))
        ));
    }

    #[test]
    fn test_policy_nested_flag_rejected() {
        let mut attrs = GenlBuffer::new();
        attrs.push(Nlattr::new(true, false, NetdevAttr::Mtu, 1500u32).unwrap());
        assert!(matches!(
            POLICY.validate(&attrs),
            Err(PolicyError::TypeMismatch {
                attr: 5,
                expected: PolicyType::U32
            })
        ));
    }

    #[test]
    fn test_policy_missing_attribute() {
        let mut attrs = valid_attrs().into_iter().collect::<Vec<_>>();
        attrs.remove(1);
        let attrs = attrs.into_iter().collect::<GenlBuffer<_>>();
        assert!(matches!(
            POLICY.validate(&attrs),
            Err(PolicyError::MissingAttribute(3))
        ));
    }
}
