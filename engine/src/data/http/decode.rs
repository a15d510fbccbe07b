//! Incremental record splitting for streamed response bodies
//!
//! Response bodies arrive in arbitrary chunks. These buffers hold the
//! incomplete tail between chunks and hand out only complete records, so a
//! result set is never held in memory as a whole.

/// Splits a byte stream into `\n`-terminated lines (JSON Lines)
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            lines.push(decode_line(&self.pending[start..end]));
            start = end + 1;
        }
        self.pending.drain(..start);
        lines
    }

    /// Flush the unterminated tail, if any
    pub fn finish(self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(decode_line(&self.pending))
        }
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Splits a byte stream into CSV records
///
/// Newlines inside quoted cells do not end a record. A doubled quote inside a
/// quoted cell toggles the quote state twice, so scanning stays byte-wise.
#[derive(Debug, Default)]
pub struct CsvRecordBuffer {
    pending: Vec<u8>,
    scanned: usize,
    in_quotes: bool,
}

impl CsvRecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every record it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<String>> {
        self.pending.extend_from_slice(chunk);
        let mut records = Vec::new();
        let mut start = 0;
        let mut index = self.scanned;
        while index < self.pending.len() {
            match self.pending[index] {
                b'"' => self.in_quotes = !self.in_quotes,
                b'\n' if !self.in_quotes => {
                    records.push(split_record(&self.pending[start..index]));
                    start = index + 1;
                }
                _ => {}
            }
            index += 1;
        }
        self.pending.drain(..start);
        self.scanned = self.pending.len();
        records
    }

    /// Flush the unterminated tail, if any
    pub fn finish(self) -> Option<Vec<String>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(split_record(&self.pending))
        }
    }
}

/// Split one CSV record into unquoted cells
pub fn split_record(bytes: &[u8]) -> Vec<String> {
    let line = decode_line(bytes);
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}
