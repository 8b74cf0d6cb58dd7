//! One-line diagnostic rendering of envelopes for logs.
//!
//! ```text
//! Message: HUMAN_PLAYER_CHAT 3 --> -1(server/unknown).CORE "hello"
//! ```

use std::fmt;

use crate::config::DEFAULT_PREVIEW_LEN;
use crate::envelope::Envelope;

/// Renders `envelope` with at most `preview_len` bytes of payload text.
///
/// Binary payloads are shown lossily. When the payload is cut, the total
/// size is appended so the log still says how big the message was.
pub fn render(envelope: &Envelope, preview_len: usize) -> String {
    let text = envelope.text();
    let preview = if text.len() > preview_len {
        let cut = (0..=preview_len)
            .rev()
            .find(|&i| text.is_char_boundary(i))
            .unwrap_or(0);
        format!("{}...({} bytes)", &text[..cut], envelope.payload_len())
    } else {
        text.into_owned()
    };

    format!(
        "Message: {} {} --> {}.{} \"{}\"",
        envelope.kind(),
        envelope.sender(),
        envelope.receiver(),
        envelope.module(),
        preview
    )
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self, DEFAULT_PREVIEW_LEN))
    }
}
