use std::fmt::{Debug, Formatter};
use std::ops::Deref;

/// A fully serialized frame, from the Ethernet header to the end of the payload.
///
/// A frame is only built by the functions of [`crate::builder`] and cannot be
/// modified afterwards; it can only be inspected or written to a link.
///
/// ```
/// use std::net::Ipv4Addr;
/// use ipvsping::builder::build_arp_request;
///
/// let mac = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];
/// let frame = build_arp_request(
///     &mac,
///     Ipv4Addr::new(10, 0, 0, 2).into(),
///     Ipv4Addr::new(10, 0, 0, 5).into(),
/// )
/// .unwrap();
///
/// assert_eq!(frame.len(), 42);
/// assert_eq!(&frame[..6], &[0xff; 6]);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    buffer: Vec<u8>,
}

impl Frame {
    pub(crate) fn new(buffer: Vec<u8>) -> Self {
        Frame { buffer }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Deref for Frame {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buffer
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.buffer
    }
}

impl Debug for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame({})", hex::encode(&self.buffer))
    }
}
