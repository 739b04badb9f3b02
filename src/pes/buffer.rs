/// Growable byte buffer that accumulates the fragments of a PES unit.
#[derive(Debug, Default, Clone)]
pub struct PacketBuffer {
    bytes: Vec<u8>,
}
impl PacketBuffer {
    /// Makes a new empty `PacketBuffer` instance.
    pub fn new() -> Self {
        PacketBuffer::default()
    }

    /// Appends `data` to the end of the buffer.
    pub fn append(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Removes the first `n` bytes (or all of them if fewer are buffered).
    pub fn consume(&mut self, n: usize) {
        let n = std::cmp::min(n, self.bytes.len());
        self.bytes.drain(..n);
    }

    /// Removes all bytes, keeping the allocation.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Returns the buffered bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
