use std::time::Duration;

use ptydeck_config::LineEnding;

pub const BRACKETED_PASTE_START: &str = "\x1b[200~";
pub const BRACKETED_PASTE_END: &str = "\x1b[201~";

/// Per-call overrides; unset fields fall back to the `[paste]` config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteOptions {
    pub auto_submit: Option<bool>,
    pub submit_key: Option<LineEnding>,
    pub submit_delay: Option<Duration>,
    pub native: Option<bool>,
}

impl PasteOptions {
    pub fn with_auto_submit(mut self, auto_submit: bool) -> Self {
        self.auto_submit = Some(auto_submit);
        self
    }

    pub fn with_submit_key(mut self, key: LineEnding) -> Self {
        self.submit_key = Some(key);
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    pub fn with_native(mut self, native: bool) -> Self {
        self.native = Some(native);
        self
    }
}

/// Paste as the render state would: newlines become `\r`, and the text is
/// framed only when the shell turned bracketed paste on.
pub fn native_paste_payload(text: &str, bracketed_mode: bool) -> String {
    let normalized = text.replace("\r\n", "\r").replace('\n', "\r");
    if bracketed_mode {
        bracket(&normalized)
    } else {
        normalized
    }
}

/// Unconditional bracketed-paste framing.
pub fn bracket(text: &str) -> String {
    let capacity = text.len() + BRACKETED_PASTE_START.len() + BRACKETED_PASTE_END.len();
    let mut framed = String::with_capacity(capacity);
    framed.push_str(BRACKETED_PASTE_START);
    framed.push_str(text);
    framed.push_str(BRACKETED_PASTE_END);
    framed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn native_payload_normalizes_newlines() {
        assert_eq!(native_paste_payload("a\nb\r\nc", false), "a\rb\rc");
    }

    #[test]
    fn native_payload_wraps_only_in_bracketed_mode() {
        assert_eq!(native_paste_payload("ls\n", true), "\x1b[200~ls\r\x1b[201~");
    }

    #[test]
    fn fallback_keeps_text_verbatim() {
        assert_eq!(bracket("x\ny"), "\x1b[200~x\ny\x1b[201~");
    }
}
