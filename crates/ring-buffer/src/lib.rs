//! Bounded Ring Buffer
//!
//! Fixed-capacity sample history used by the attention processor.
//! Pushing into a full buffer evicts the oldest sample.

mod buffer;

pub use buffer::RingBuffer;
