//! The schema interpreter: encoder, decoder, and streaming adapters.

pub(crate) mod decoder;
pub(crate) mod encoder;
mod stream;

pub use decoder::decode;
pub use encoder::encode;
pub use stream::{StreamDecoder, StreamEncoder};
