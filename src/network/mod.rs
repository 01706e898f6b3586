pub mod packet;

pub use packet::{PacketReader, PacketWriter, MAX_STRING_LENGTH};

use bytes::{Buf, BytesMut};

use crate::{DecodeError, Result};

/// A message with a fixed field order on the wire.
///
/// Some messages only travel one way; their `to_bytes` returns
/// [`ScreenError::UnsupportedOperation`](crate::ScreenError::UnsupportedOperation).
pub trait PacketSerializable: Sized {
    fn from_bytes<B: Buf>(buf: &mut B) -> std::result::Result<Self, DecodeError>;

    fn to_bytes(&self, buf: &mut BytesMut) -> Result<()>;
}
