//! inet_diag reply fixtures for testing.
//!
//! Record payloads are written out byte by byte so the parser is checked
//! against the wire layout rather than against its own structs. Host-order
//! fields are little-endian, as captured on x86_64.

use zerocopy::IntoBytes;

use crate::netlink::attr::{NlAttr, nla_align};
use crate::netlink::{NLM_F_MULTI, NlMsgHdr, NlMsgType, nlmsg_align};
use crate::sockdiag::record::InetDiagMsg;
use crate::sockdiag::request::InetDiagSockId;
use crate::sockdiag::{AddressFamily, TcpState};

/// ESTAB 127.0.0.1:80 <- 127.0.0.1:54321, uid 1000, inode 555.
pub fn record_loopback_v4() -> Vec<u8> {
    vec![
        0x02, // family = AF_INET
        0x01, // state = TCP_ESTABLISHED
        0x00, // timer = off
        0x00, // retrans
        0x00, 0x50, // sport = 80 (big endian)
        0xd4, 0x31, // dport = 54321 (big endian)
        0x7f, 0x00, 0x00, 0x01, // src = 127.0.0.1
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // src tail
        0x7f, 0x00, 0x00, 0x01, // dst = 127.0.0.1
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // dst tail
        0x01, 0x00, 0x00, 0x00, // interface = 1
        0x2a, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // cookie = 42
        0x00, 0x00, 0x00, 0x00, // expires = 0
        0x05, 0x00, 0x00, 0x00, // rqueue = 5
        0x00, 0x04, 0x00, 0x00, // wqueue = 1024
        0xe8, 0x03, 0x00, 0x00, // uid = 1000
        0x2b, 0x02, 0x00, 0x00, // inode = 555
    ]
}

/// ESTAB [::1]:443 <- [2001:db8::2]:50000, uid 0, inode 4242.
pub fn record_loopback_v6() -> Vec<u8> {
    vec![
        0x0a, // family = AF_INET6
        0x01, // state = TCP_ESTABLISHED
        0x00, // timer = off
        0x00, // retrans
        0x01, 0xbb, // sport = 443
        0xc3, 0x50, // dport = 50000
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // src = ::1
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, //
        0x20, 0x01, 0x0d, 0xb8, 0x00, 0x00, 0x00, 0x00, // dst = 2001:db8::2
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, //
        0x00, 0x00, 0x00, 0x00, // interface = 0
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // cookie = 0
        0x00, 0x00, 0x00, 0x00, // expires = 0
        0x00, 0x00, 0x00, 0x00, // rqueue = 0
        0x00, 0x00, 0x00, 0x00, // wqueue = 0
        0x00, 0x00, 0x00, 0x00, // uid = 0
        0x92, 0x10, 0x00, 0x00, // inode = 4242
    ]
}

/// Build a record payload from parts.
#[allow(clippy::too_many_arguments)]
pub fn inet_diag_msg(
    family: AddressFamily,
    state: TcpState,
    src: &[u8],
    sport: u16,
    dst: &[u8],
    dport: u16,
    inode: u32,
    uid: u32,
) -> Vec<u8> {
    let mut id = InetDiagSockId {
        sport: sport.to_be_bytes(),
        dport: dport.to_be_bytes(),
        ..Default::default()
    };
    id.src[..src.len()].copy_from_slice(src);
    id.dst[..dst.len()].copy_from_slice(dst);

    let msg = InetDiagMsg {
        family: family as u8,
        state: state as u8,
        id,
        uid,
        inode,
        ..Default::default()
    };
    msg.as_bytes().to_vec()
}

/// A v4 LISTEN record on 0.0.0.0:`port` with the given inode.
pub fn listener_v4(port: u16, inode: u32) -> Vec<u8> {
    inet_diag_msg(
        AddressFamily::Inet,
        TcpState::Listen,
        &[0, 0, 0, 0],
        port,
        &[0, 0, 0, 0],
        0,
        inode,
        0,
    )
}

/// One padded rtattr.
pub fn attr(kind: u16, data: &[u8]) -> Vec<u8> {
    let mut buf = NlAttr::new(kind, data.len()).as_bytes().to_vec();
    buf.extend_from_slice(data);
    buf.resize(nla_align(buf.len()), 0);
    buf
}

/// One netlink envelope, padded to the 4-byte boundary.
pub fn envelope(msg_type: u16, flags: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
    let mut header = NlMsgHdr::new(msg_type, flags);
    header.nlmsg_len = (std::mem::size_of::<NlMsgHdr>() + payload.len()) as u32;
    header.nlmsg_seq = seq;

    let mut buf = header.as_bytes().to_vec();
    buf.extend_from_slice(payload);
    buf.resize(nlmsg_align(buf.len()), 0);
    buf
}

/// A SOCK_DIAG_BY_FAMILY dump entry.
pub fn diag_envelope(seq: u32, record: &[u8]) -> Vec<u8> {
    envelope(NlMsgType::SOCK_DIAG_BY_FAMILY, NLM_F_MULTI, seq, record)
}

/// NLMSG_DONE terminator (payload is the dump's final status word).
pub fn done(seq: u32) -> Vec<u8> {
    envelope(NlMsgType::DONE, NLM_F_MULTI, seq, &0i32.to_ne_bytes())
}

/// NLMSG_ERROR carrying `code` followed by the echoed request header.
pub fn error(seq: u32, code: i32) -> Vec<u8> {
    let mut payload = code.to_ne_bytes().to_vec();
    payload.extend_from_slice(NlMsgHdr::new(NlMsgType::SOCK_DIAG_BY_FAMILY, 0).as_bytes());
    envelope(NlMsgType::ERROR, 0, seq, &payload)
}
