//! Incremental decoder for `text/event-stream` bodies

/// Longest line accepted before the body is treated as broken
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

/// A line grew past the decoder's limit without a terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTooLong {
    pub limit: usize,
}

impl std::fmt::Display for LineTooLong {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SSE line exceeds {} bytes", self.limit)
    }
}

impl std::error::Error for LineTooLong {}

/// Turns arbitrary body chunks into complete events.
///
/// Bytes are buffered until a full line is available, so chunk boundaries
/// may fall anywhere, including inside a multi-byte character.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
    event: Option<String>,
    id: Option<String>,
    max_line: usize,
    // A chunk ended on '\r'; a '\n' opening the next chunk belongs to it
    pending_cr: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::with_line_limit(DEFAULT_MAX_LINE_BYTES)
    }

    pub fn with_line_limit(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            data: Vec::new(),
            event: None,
            id: None,
            max_line,
            pending_cr: false,
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, LineTooLong> {
        let mut events = Vec::new();
        if chunk.is_empty() {
            return Ok(events);
        }
        let mut bytes = chunk;

        if self.pending_cr {
            self.pending_cr = false;
            if let Some(rest) = bytes.strip_prefix(b"\n") {
                bytes = rest;
            }
        }

        let mut start = 0;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' | b'\r' => {
                    self.buffer_segment(&bytes[start..i])?;
                    let line = std::mem::take(&mut self.buffer);
                    if let Some(event) = self.process_line(&line) {
                        events.push(event);
                    }

                    if bytes[i] == b'\r' {
                        match bytes.get(i + 1) {
                            Some(b'\n') => i += 1,
                            None => self.pending_cr = true,
                            Some(_) => {}
                        }
                    }
                    i += 1;
                    start = i;
                }
                _ => i += 1,
            }
        }
        self.buffer_segment(&bytes[start..])?;

        Ok(events)
    }

    fn buffer_segment(&mut self, segment: &[u8]) -> Result<(), LineTooLong> {
        if self.buffer.len() + segment.len() > self.max_line {
            self.buffer.clear();
            return Err(LineTooLong {
                limit: self.max_line,
            });
        }
        self.buffer.extend_from_slice(segment);
        Ok(())
    }

    fn process_line(&mut self, line: &[u8]) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }

        let line = String::from_utf8_lossy(line);
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(idx) => {
                let value = &line[idx + 1..];
                (&line[..idx], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (&line[..], ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }

        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }

        Some(SseEvent {
            event,
            data: std::mem::take(&mut self.data).join("\n"),
            id: self.id.clone(),
        })
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();

        let events = decoder.feed(b"data: {\"temperature\":\"21.00\"}\n\n").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{\"temperature\":\"21.00\"}");
        assert_eq!(events[0].event, None);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.feed(b"da").unwrap().is_empty());
        assert!(decoder.feed(b"ta: {\"a\":").unwrap().is_empty());
        assert!(decoder.feed(b"1}\n").unwrap().is_empty());
        let events = decoder.feed(b"\ndata: 2\n\n").unwrap();

        let data: Vec<&str> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, vec!["{\"a\":1}", "2"]);
    }

    #[test]
    fn test_multibyte_character_split() {
        let mut decoder = SseDecoder::new();
        let payload = "data: 21°C\n\n".as_bytes();
        let split = payload.iter().position(|b| *b == 0xC2).unwrap() + 1;

        assert!(decoder.feed(&payload[..split]).unwrap().is_empty());
        let events = decoder.feed(&payload[split..]).unwrap();

        assert_eq!(events[0].data, "21°C");
    }

    #[test]
    fn test_crlf_and_cr_line_endings() {
        let mut decoder = SseDecoder::new();

        let mut events = decoder.feed(b"data: one\r\n\r\n").unwrap();
        events.extend(decoder.feed(b"data: two\r").unwrap());
        events.extend(decoder.feed(b"\n\r\n").unwrap());
        events.extend(decoder.feed(b"data: three\r\r").unwrap());

        let data: Vec<&str> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_multiline_data_and_fields() {
        let mut decoder = SseDecoder::new();

        let events = decoder.feed(b": keep-alive\nevent: reading\nid: 42\ndata: a\ndata:b\nretry: 1000\n\n").unwrap();

        assert_eq!(
            events,
            vec![SseEvent {
                event: Some("reading".to_string()),
                data: "a\nb".to_string(),
                id: Some("42".to_string()),
            }]
        );
    }

    #[test]
    fn test_blank_lines_without_data_dispatch_nothing() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.feed(b"\n\n: ping\n\nevent: noop\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_empty_chunk_keeps_pending_cr() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.feed(b"data: a\r").unwrap().is_empty());
        assert!(decoder.feed(b"").unwrap().is_empty());
        let events = decoder.feed(b"\ndata: b\n\n").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a\nb");
    }

    #[test]
    fn test_unterminated_line_over_limit_is_rejected() {
        let mut decoder = SseDecoder::with_line_limit(16);

        assert!(decoder.feed(b"data: 0123456789").unwrap().is_empty());
        assert_eq!(
            decoder.feed(b"abcdef"),
            Err(LineTooLong { limit: 16 })
        );
    }

    #[test]
    fn test_line_at_limit_is_accepted() {
        let mut decoder = SseDecoder::with_line_limit(8);

        let events = decoder.feed(b"data: ab\n\n").unwrap();

        assert_eq!(events[0].data, "ab");
    }
}
