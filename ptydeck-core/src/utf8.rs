//! Incremental UTF-8 decoding for byte streams that split characters
//! across reads (PTY output, raw keyboard input).

/// Decodes a byte stream into text, holding back a trailing incomplete
/// UTF-8 sequence until the next chunk completes it. Invalid bytes become
/// U+FFFD without disturbing a partial sequence that follows them.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;

        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                    break;
                }
                Err(err) => {
                    let valid_end = start + err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));
                    match err.error_len() {
                        Some(invalid) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + invalid;
                        }
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        out
    }

    /// Flush whatever is still held back, replacing it lossily.
    pub fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn holds_back_split_sequences() {
        let mut decoder = Utf8Decoder::default();
        let bytes = "héllo".as_bytes();
        assert_eq!(decoder.push(&bytes[..2]), "h");
        assert_eq!(decoder.push(&bytes[2..]), "éllo");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.push(b"a\xffb"), "a\u{fffd}b");
    }

    #[test]
    fn invalid_byte_does_not_swallow_following_partial_sequence() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.push(&[0xff, 0xc3]), "\u{fffd}");
        assert_eq!(decoder.push(&[0xa9]), "é");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn flushes_dangling_tail_lossily() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.push(&[b'x', 0xe2, 0x82]), "x");
        assert_eq!(decoder.finish(), "\u{fffd}");
    }
}
