//! `tokio_util::codec` adapter for async transports.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame};
use crate::error::{FrameError, Result};

/// Frame codec for `FramedRead`/`FramedWrite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VbusCodec;

impl Decoder for VbusCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        let len = src.len();
        decode_frame(src, len)
    }
}

impl Encoder<Frame> for VbusCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        encode_frame(&item, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::codec::encode;

    #[tokio::test]
    async fn framed_read_yields_frames_in_order() {
        let wire = encode(&[Frame::new(1, "ping"), Frame::new(2, "data")]).unwrap();
        let mut framed = FramedRead::new(wire.as_slice(), VbusCodec);

        let first = framed.next().await.unwrap().unwrap();
        let second = framed.next().await.unwrap().unwrap();

        assert_eq!(first, Frame::new(1, "ping"));
        assert_eq!(second, Frame::new(2, "data"));
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_read_reports_trailing_bytes_at_eof() {
        let wire = vec![0x01, 0x00, 0x08, b'p', b'a'];
        let mut framed = FramedRead::new(wire.as_slice(), VbusCodec);

        let err = framed.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::Io(_)));
    }

    #[tokio::test]
    async fn framed_write_encodes_frames() {
        let mut framed = FramedWrite::new(Vec::<u8>::new(), VbusCodec);

        framed.send(Frame::new(5, "ABC")).await.unwrap();

        assert_eq!(framed.get_ref(), &vec![5, 0, 3, b'A', b'B', b'C']);
    }

    #[test]
    fn decoder_waits_for_complete_frame() {
        let mut codec = VbusCodec;
        let mut buf = BytesMut::from(&[0x03, 0x00, 0x02, b'h'][..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 4);

        buf.extend_from_slice(b"i");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, Frame::new(3, "hi"));
        assert!(buf.is_empty());
    }
}
