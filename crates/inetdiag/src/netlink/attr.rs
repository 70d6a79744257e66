//! Netlink attribute (rtattr) handling.
//!
//! inet_diag replies may carry extension attributes after the fixed
//! `inet_diag_msg` block. They are optional, so iteration stops quietly at
//! the first malformed attribute instead of failing the record.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4;

/// Attribute header (`struct rtattr`, same layout as `struct nlattr`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Header plus payload, without trailing padding.
    pub nla_len: u16,
    /// Type, possibly carrying the flag bits below.
    pub nla_type: u16,
}

pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

impl NlAttr {
    /// Header for a payload of `data_len` bytes.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Attribute type with the flag bits stripped.
    pub fn kind(&self) -> u16 {
        self.nla_type & NLA_TYPE_MASK
    }

    /// Header bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }
}

/// Walks `(kind, payload)` pairs of a run of attributes.
pub struct AttrIter<'a> {
    rest: &'a [u8],
}

impl<'a> AttrIter<'a> {
    /// Iterate over the attributes packed in `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = std::mem::take(&mut self.rest);
        let (attr, _) = NlAttr::read_from_prefix(rest).ok()?;

        let len = usize::from(attr.nla_len);
        if !(NLA_HDRLEN..=rest.len()).contains(&len) {
            return None;
        }

        // the final attribute may omit its padding
        self.rest = rest.get(nla_align(len)..).unwrap_or_default();
        Some((attr.kind(), &rest[NLA_HDRLEN..len]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::attr;

    #[test]
    fn test_iterates_padded_attributes() {
        let mut buf = attr(4, b"cubic\0");
        buf.extend(attr(5, &[0x10]));

        let attrs: Vec<_> = AttrIter::new(&buf).collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0], (4, &b"cubic\0"[..]));
        assert_eq!(attrs[1], (5, &[0x10][..]));
    }

    #[test]
    fn test_strips_flags_from_kind() {
        let buf = attr(NLA_F_NESTED | 3, &[1, 2, 3, 4]);
        let (kind, _) = AttrIter::new(&buf).next().unwrap();
        assert_eq!(kind, 3);
    }

    #[test]
    fn test_stops_on_overlong_attribute() {
        let mut buf = attr(4, b"reno\0");
        // Declares 64 bytes but only carries 4.
        buf.extend_from_slice(&64u16.to_ne_bytes());
        buf.extend_from_slice(&5u16.to_ne_bytes());

        let kinds: Vec<_> = AttrIter::new(&buf).map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![4]);
    }

    #[test]
    fn test_ignores_trailing_garbage() {
        let buf = [0x01, 0x00];
        assert_eq!(AttrIter::new(&buf).count(), 0);
    }
}
