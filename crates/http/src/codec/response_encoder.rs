use bytes::BytesMut;
use tokio_util::codec::Encoder;

use crate::protocol::{HeadResponse, Response, SendError};

/// Writes whole [`Response`]s, see [`Response::encode_into`] for the wire layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Response> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode_into(dst);
        Ok(())
    }
}

impl Encoder<HeadResponse> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: HeadResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.0.encode_without_body_into(dst);
        Ok(())
    }
}
