use std::fmt;

/// Size in bytes of one IQ record on the wire: two packed little-endian f32
/// components, no padding, no header.
pub const IQ_SIZE: usize = 8;

/// One complex sample from a radio front end. Immutable once formed; wire
/// framing is always a whole multiple of [`IQ_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IqSample {
    pub i: f32,
    pub q: f32,
}

impl IqSample {
    pub fn new(i: f32, q: f32) -> Self {
        Self { i, q }
    }

    /// Decode one record from exactly [`IQ_SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8; IQ_SIZE]) -> Self {
        let i = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let q = f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Self { i, q }
    }

    pub fn to_bytes(&self) -> [u8; IQ_SIZE] {
        let mut out = [0u8; IQ_SIZE];
        out[..4].copy_from_slice(&self.i.to_le_bytes());
        out[4..].copy_from_slice(&self.q.to_le_bytes());
        out
    }
}

/// A payload whose length is not a whole number of records. The payload is
/// discarded as a unit; it is never partially interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct FramingError {
    pub len: usize,
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "payload of {} bytes is not a multiple of the {}-byte record size",
            self.len, IQ_SIZE
        )
    }
}

impl std::error::Error for FramingError {}

/// Decode a record-aligned payload into samples, in arrival order.
pub fn decode_records(payload: &[u8]) -> Result<Vec<IqSample>, FramingError> {
    if payload.len() % IQ_SIZE != 0 {
        return Err(FramingError { len: payload.len() });
    }
    Ok(payload
        .chunks_exact(IQ_SIZE)
        .map(|chunk| {
            let mut bytes = [0u8; IQ_SIZE];
            bytes.copy_from_slice(chunk);
            IqSample::from_bytes(&bytes)
        })
        .collect())
}

/// Serialize records into one contiguous record-aligned payload.
pub fn encode_records(records: &[IqSample]) -> Vec<u8> {
    let mut out = Vec::with_capacity(records.len() * IQ_SIZE);
    for record in records {
        out.extend_from_slice(&record.to_bytes());
    }
    out
}
