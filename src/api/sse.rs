//! Incremental server-sent-event decoding.
//!
//! Bytes arrive in arbitrary network chunks. Complete events (terminated by a
//! blank line) are decoded into their joined `data:` payloads; partial events
//! and split UTF-8 sequences stay buffered until the rest arrives.

/// Payload that terminates an OpenAI-compatible stream.
pub(super) const DONE_PAYLOAD: &str = "[DONE]";

#[derive(Debug, Default)]
pub(super) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed raw bytes and return payloads of every event completed by them.
    pub(super) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        while let Some((end, separator_len)) = event_boundary(&self.buffer) {
            let event: Vec<u8> = self.buffer.drain(..end + separator_len).collect();
            payloads.extend(parse_sse_event_payloads(&String::from_utf8_lossy(
                &event[..end],
            )));
        }
        payloads
    }

    /// Decode whatever is left after the stream closed.
    pub(super) fn finish(&mut self) -> Vec<String> {
        let rest = std::mem::take(&mut self.buffer);
        parse_sse_event_payloads(&String::from_utf8_lossy(&rest))
    }
}

/// Position and length of the first blank-line separator.
fn event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buffer, b"\n\n").map(|pos| (pos, 2));
    let crlf = find(buffer, b"\r\n\r\n").map(|pos| (pos, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Collect the `data:` payload of each event in `stream`, joining multi-line
/// data with `\n` and skipping comments and other fields.
fn parse_sse_event_payloads(stream: &str) -> Vec<String> {
    let mut payloads = Vec::new();
    let mut data_lines = Vec::<String>::new();

    let mut flush_event = |lines: &mut Vec<String>| {
        if lines.is_empty() {
            return;
        }
        payloads.push(lines.join("\n"));
        lines.clear();
    };

    for raw_line in stream.lines() {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.is_empty() {
            flush_event(&mut data_lines);
            continue;
        }
        if line.starts_with(':') {
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            data_lines.push(value.to_string());
        }
    }
    flush_event(&mut data_lines);
    payloads
}
