//! Wire encoding for buffered responses.

mod head_encoder;

pub use head_encoder::HeadStyle;
pub use head_encoder::encode_head;
