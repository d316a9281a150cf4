//! Size-bounded line output.

/// Destination of report lines.
pub trait LineSink {
    fn push_line(&mut self, line: &str);
}

impl LineSink for String {
    fn push_line(&mut self, line: &str) {
        self.push_str(line);
        self.push('\n');
    }
}

/// Forwards lines to a sink until a line or byte limit is reached, then
/// counts the rest. When dropped, reports how many lines were removed.
///
/// A limit of `0` means unlimited. Buffers nest: an inner buffer may write
/// into an outer one, in which case both limits apply.
pub struct TruncatingBuffer<'a> {
    sink: &'a mut dyn LineSink,
    max_lines: usize,
    max_bytes: usize,
    lines: usize,
    bytes: usize,
    removed: usize,
}

impl<'a> TruncatingBuffer<'a> {
    pub fn new(max_lines: usize, max_bytes: usize, sink: &'a mut dyn LineSink) -> Self {
        Self {
            sink,
            max_lines,
            max_bytes,
            lines: 0,
            bytes: 0,
            removed: 0,
        }
    }

    pub fn println(&mut self, line: &str) {
        let line_limit_hit = self.max_lines > 0 && self.lines >= self.max_lines;
        let byte_limit_hit = self.max_bytes > 0 && self.bytes + line.len() + 1 > self.max_bytes;
        if self.removed > 0 || line_limit_hit || byte_limit_hit {
            self.removed += 1;
            return;
        }
        self.lines += 1;
        self.bytes += line.len() + 1;
        self.sink.push_line(line);
    }

    /// Number of lines dropped so far.
    pub fn removed(&self) -> usize {
        self.removed
    }
}

impl LineSink for TruncatingBuffer<'_> {
    fn push_line(&mut self, line: &str) {
        self.println(line);
    }
}

impl Drop for TruncatingBuffer<'_> {
    fn drop(&mut self) {
        if self.removed > 0 {
            let trailer = format!("[...removed {} lines...]", self.removed);
            self.sink.push_line(&trailer);
        }
    }
}
