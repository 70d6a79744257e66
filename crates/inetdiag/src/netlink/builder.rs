//! Framing of outgoing netlink requests.

use zerocopy::{Immutable, IntoBytes};

use super::message::{NLMSG_HDRLEN, NlMsgHdr, nlmsg_align};

/// Assembles one request: a header followed by 4-byte aligned body parts.
///
/// `nlmsg_len` is filled in by [`finish`](Self::finish), so the declared
/// length always matches the serialized size.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    header: NlMsgHdr,
    body: Vec<u8>,
}

impl MessageBuilder {
    /// Start a message of the given type and flags.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            header: NlMsgHdr::new(msg_type, flags),
            body: Vec::new(),
        }
    }

    /// Serialized length so far, header included.
    pub fn len(&self) -> usize {
        NLMSG_HDRLEN + self.body.len()
    }

    /// Check if nothing follows the header yet.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Append raw bytes, padded to the next boundary.
    pub fn append_bytes(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
        self.body.resize(nlmsg_align(self.body.len()), 0);
    }

    /// Append a `#[repr(C)]` request body.
    pub fn append<T: IntoBytes + Immutable>(&mut self, data: &T) {
        self.append_bytes(data.as_bytes());
    }

    /// Set the sequence number.
    pub fn set_seq(&mut self, seq: u32) {
        self.header.nlmsg_seq = seq;
    }

    /// Produce the wire bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.header.nlmsg_len = self.len() as u32;

        let mut msg = Vec::with_capacity(self.len());
        msg.extend_from_slice(self.header.as_bytes());
        msg.resize(NLMSG_HDRLEN, 0);
        msg.extend_from_slice(&self.body);
        msg
    }
}
