//! Reply decoder for inet_diag dumps.
//!
//! A [`Decoder`] walks the envelopes of one reply datagram at a time and
//! turns diagnostic payloads into [`SocketRecord`]s. It keeps no buffer of
//! its own: netlink never splits an envelope across datagrams, so a datagram
//! that ends inside an envelope is an error, and a datagram that ends
//! cleanly without `NLMSG_DONE` means more datagrams follow.

use tracing::{trace, warn};

use super::error::{Error, Result};
use super::message::{NLMSG_HDRLEN, NlMsgHdr, NlMsgType, error_code, nlmsg_align};
use crate::sockdiag::record::{SocketRecord, parse_record, record_family};
use crate::sockdiag::types::AddressFamily;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectHeader,
    ExpectPayload,
    Done,
    Error,
}

/// Whether the dump has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// `NLMSG_DONE` was seen; anything after it was ignored.
    Done,
    /// The buffer ran out cleanly; the next datagram continues the dump.
    Incomplete,
}

/// Result of decoding one buffer.
#[derive(Debug)]
pub struct DecodeOutcome {
    /// Records in the order the kernel sent them.
    pub records: Vec<SocketRecord>,
    /// Bytes of the buffer that were examined.
    pub consumed: usize,
    /// Whether the dump is complete.
    pub state: DecodeState,
}

impl DecodeOutcome {
    /// Check if the dump terminated in this buffer.
    pub fn is_done(&self) -> bool {
        self.state == DecodeState::Done
    }
}

/// Incremental decoder for the reply to one diagnostic request.
#[derive(Debug)]
pub struct Decoder {
    family: Option<AddressFamily>,
    seq: Option<u32>,
    state: State,
    interrupted: bool,
}

impl Decoder {
    /// Create a decoder.
    ///
    /// `family` fixes the address width of every record; `None` reads it
    /// from each record's own family byte, as needed for legacy dumps that
    /// mix IPv4 and IPv6. When `seq` is set, envelopes carrying another
    /// sequence number are skipped.
    pub fn new(family: Option<AddressFamily>, seq: Option<u32>) -> Self {
        Self {
            family,
            seq,
            state: State::ExpectHeader,
            interrupted: false,
        }
    }

    /// Check if `NLMSG_DONE` has been seen.
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Check if the kernel flagged the dump as inconsistent.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Decode every envelope in `buf`.
    ///
    /// On error no records are returned, and the decoder refuses further
    /// input.
    pub fn decode(&mut self, buf: &[u8]) -> Result<DecodeOutcome> {
        match self.state {
            State::Done => {
                return Ok(DecodeOutcome {
                    records: Vec::new(),
                    consumed: 0,
                    state: DecodeState::Done,
                });
            }
            State::Error => return Err(Error::malformed("decoder already failed")),
            State::ExpectHeader | State::ExpectPayload => {}
        }

        let result = self.decode_envelopes(buf);
        if result.is_err() {
            self.state = State::Error;
        }
        result
    }

    fn decode_envelopes(&mut self, buf: &[u8]) -> Result<DecodeOutcome> {
        let mut records = Vec::new();
        let mut cursor = 0;

        while cursor < buf.len() {
            self.state = State::ExpectHeader;
            let rest = &buf[cursor..];

            let header = NlMsgHdr::from_bytes(rest)?;
            let len = header.nlmsg_len as usize;
            if len < NLMSG_HDRLEN {
                return Err(Error::malformed(format!(
                    "envelope length {} is shorter than its header",
                    len
                )));
            }
            if len > rest.len() {
                return Err(Error::TruncatedMessage {
                    expected: len,
                    actual: rest.len(),
                });
            }

            self.state = State::ExpectPayload;
            let payload = &rest[NLMSG_HDRLEN..len];
            let next = cursor.saturating_add(nlmsg_align(len)).min(buf.len());

            if header.is_dump_interrupted() && !self.interrupted {
                warn!("sock_diag dump interrupted, results may be inconsistent");
                self.interrupted = true;
            }

            if let Some(seq) = self.seq
                && header.nlmsg_seq != seq
            {
                trace!(
                    seq = header.nlmsg_seq,
                    expected = seq,
                    "skipping envelope with foreign sequence number"
                );
                cursor = next;
                continue;
            }

            match header.nlmsg_type {
                NlMsgType::DONE => {
                    self.state = State::Done;
                    trace!(records = records.len(), "dump done");
                    return Ok(DecodeOutcome {
                        records,
                        consumed: next,
                        state: DecodeState::Done,
                    });
                }
                NlMsgType::ERROR => {
                    let code = error_code(payload)?;
                    if code != 0 {
                        return Err(Error::from_code(code));
                    }
                    trace!("skipping acknowledgement");
                }
                NlMsgType::OVERRUN => return Err(Error::Overrun),
                NlMsgType::SOCK_DIAG_BY_FAMILY | NlMsgType::TCPDIAG_GETSOCK => {
                    let family = match self.family {
                        Some(family) => family,
                        None => record_family(payload)?,
                    };
                    records.push(parse_record(payload, family)?);
                }
                other => {
                    trace!(msg_type = other, len, "skipping envelope");
                }
            }

            cursor = next;
        }

        self.state = State::ExpectHeader;
        Ok(DecodeOutcome {
            records,
            consumed: cursor,
            state: DecodeState::Incomplete,
        })
    }
}
