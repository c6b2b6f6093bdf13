use crate::records::record::{Record, RecordError};

/// A group of serialized records uploaded in one request.
///
/// The payload holds the comma-joined JSON objects without the surrounding
/// brackets; [`Batch::to_json_array`] produces the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    seq: u64,
    payload: String,
    row_count: usize,
}

impl Batch {
    pub fn new(seq: u64) -> Self {
        Batch {
            seq,
            payload: String::new(),
            row_count: 0,
        }
    }

    pub fn push_record(&mut self, record: &Record<'_>) -> Result<(), RecordError> {
        let json = record.to_json()?;
        if self.row_count > 0 {
            self.payload.push(',');
        }
        self.payload.push_str(&json);
        self.row_count += 1;
        Ok(())
    }

    /// Sequence number assigned by the producer, starting at 1.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn size_bytes(&self) -> usize {
        self.payload.len() + 2
    }

    pub fn to_json_array(&self) -> String {
        let mut body = String::with_capacity(self.size_bytes());
        body.push('[');
        body.push_str(&self.payload);
        body.push(']');
        body
    }
}
