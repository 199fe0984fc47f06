/// One timed chunk of encoded audio produced by a capture session.
///
/// Immutable once produced; ownership transfers to the transport gate
/// on delivery.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Position within the owning capture session (0-indexed)
    pub sequence: u64,
    /// Raw little-endian 16-bit PCM
    pub data: Vec<u8>,
    /// Window start in milliseconds since the session started
    pub start_ms: u64,
    /// Window end in milliseconds since the session started
    pub end_ms: u64,
}

impl Segment {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}
