// Byte-level primitives: varints, the position-tracking writer and the
// seekable reader.

pub mod input;
pub mod output;
pub mod varint;

pub use input::{InputStream, ReadError};
pub use output::OutputStream;
