use crate::sample::{IqSample, IQ_SIZE};

/// Rebuilds whole IQ records from a byte stream whose chunk boundaries do
/// not respect record boundaries (UDP datagrams of arbitrary length).
///
/// Between calls it carries at most `IQ_SIZE - 1` bytes of an incomplete
/// record. The state is owned by a single receive thread and needs no lock.
pub struct Reassembler {
    remainder: [u8; IQ_SIZE],
    len: usize,
}

impl Reassembler {
    pub fn new() -> Self {
        Self {
            remainder: [0; IQ_SIZE],
            len: 0,
        }
    }

    /// Number of carried bytes waiting for the next chunk.
    pub fn pending(&self) -> usize {
        self.len
    }

    /// Splits `chunk` into whole records, emitting them in byte arrival
    /// order. Any trailing partial record is carried to the next call; no
    /// byte is ever emitted twice or dropped.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<IqSample> {
        // Still not enough for a single record.
        if self.len + chunk.len() < IQ_SIZE {
            self.remainder[self.len..self.len + chunk.len()].copy_from_slice(chunk);
            self.len += chunk.len();
            return Vec::new();
        }

        let mut records = Vec::with_capacity((self.len + chunk.len()) / IQ_SIZE);
        let mut cursor = 0;

        // Complete the record started by the previous chunk.
        if self.len > 0 {
            let missing = IQ_SIZE - self.len;
            self.remainder[self.len..].copy_from_slice(&chunk[..missing]);
            records.push(IqSample::from_bytes(&self.remainder));
            self.len = 0;
            cursor = missing;
        }

        let body = &chunk[cursor..];
        let tail = body.len() % IQ_SIZE;
        for piece in body[..body.len() - tail].chunks_exact(IQ_SIZE) {
            let mut bytes = [0u8; IQ_SIZE];
            bytes.copy_from_slice(piece);
            records.push(IqSample::from_bytes(&bytes));
        }

        if tail > 0 {
            self.remainder[..tail].copy_from_slice(&body[body.len() - tail..]);
            self.len = tail;
        }
        records
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}
