use crate::framer::Frame;

/// Payload that marks the end of the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Event classified from a single frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental reply text. May be empty.
    Delta { text: String },
    /// Heartbeat, SSE bookkeeping line, or an event type with no text.
    Keepalive,
    /// Terminal marker.
    Done,
    /// Payload that is not valid JSON.
    Malformed { raw: String },
    /// Error record sent in-band by the endpoint.
    Upstream { message: String },
}

/// Stateless frame classifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameDecoder;

impl FrameDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, frame: &Frame) -> StreamEvent {
        let line = frame.text.trim();
        let payload = match line.strip_prefix("data:") {
            Some(rest) => rest.strip_prefix(' ').unwrap_or(rest).trim(),
            None if is_sse_field_line(line) => return StreamEvent::Keepalive,
            None => line,
        };

        if payload == DONE_SENTINEL {
            return StreamEvent::Done;
        }
        if payload.is_empty() {
            return StreamEvent::Keepalive;
        }

        let value: serde_json::Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(_) => {
                return StreamEvent::Malformed {
                    raw: frame.text.clone(),
                };
            }
        };

        if let Some(text) = extract_delta_text(&value) {
            return StreamEvent::Delta {
                text: text.to_string(),
            };
        }
        if let Some(message) = extract_error_message(&value) {
            return StreamEvent::Upstream { message };
        }
        StreamEvent::Keepalive
    }
}

fn is_sse_field_line(line: &str) -> bool {
    line.starts_with(':')
        || ["event:", "id:", "retry:"]
            .iter()
            .any(|field| line.starts_with(field))
}

fn extract_delta_text(value: &serde_json::Value) -> Option<&str> {
    if let Some(delta) = value.get("delta") {
        if let Some(text) = delta.as_str() {
            return Some(text);
        }
        if let Some(text) =
            string_field(delta, "content").or_else(|| string_field(delta, "text"))
        {
            return Some(text);
        }
    }
    if let Some(text) = value
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(|v| v.as_str())
    {
        return Some(text);
    }
    string_field(value, "content").or_else(|| string_field(value, "text"))
}

fn string_field<'a>(value: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(|v| v.as_str())
}

fn extract_error_message(value: &serde_json::Value) -> Option<String> {
    let error = value.get("error")?;
    if error.is_null() {
        return None;
    }
    let message = error
        .get("message")
        .and_then(|v| v.as_str())
        .or_else(|| error.as_str())
        .unwrap_or("completion stream error");
    Some(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> StreamEvent {
        FrameDecoder::new().decode(&Frame::new(text))
    }

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::Delta { text: text.into() }
    }

    #[test]
    fn recognizes_done_with_and_without_prefix() {
        assert_eq!(decode("data: [DONE]"), StreamEvent::Done);
        assert_eq!(decode("data:[DONE]"), StreamEvent::Done);
        assert_eq!(decode("[DONE]"), StreamEvent::Done);
    }

    #[test]
    fn decodes_supported_delta_shapes() {
        assert_eq!(decode(r#"data: {"delta":"Hel"}"#), delta("Hel"));
        assert_eq!(
            decode(r#"data: {"type":"content_block_delta","delta":{"text":"a"}}"#),
            delta("a")
        );
        assert_eq!(
            decode(r#"data: {"choices":[{"index":0,"delta":{"content":"b"}}]}"#),
            delta("b")
        );
        assert_eq!(
            decode(r#"data: {"type":"response.output_text.delta","delta":"c"}"#),
            delta("c")
        );
        assert_eq!(decode(r#"{"content":"d"}"#), delta("d"));
    }

    #[test]
    fn null_content_falls_through_to_text() {
        assert_eq!(
            decode(r#"data: {"delta":{"content":null,"text":"x"}}"#),
            delta("x")
        );
        assert_eq!(decode(r#"{"content":null,"text":"y"}"#), delta("y"));
    }

    #[test]
    fn empty_delta_is_still_a_delta() {
        assert_eq!(decode(r#"data: {"delta":""}"#), delta(""));
    }

    #[test]
    fn json_without_text_is_keepalive() {
        assert_eq!(decode(r#"data: {"type":"ping"}"#), StreamEvent::Keepalive);
        assert_eq!(
            decode(r#"data: {"choices":[{"delta":{"role":"assistant","content":null}}]}"#),
            StreamEvent::Keepalive
        );
        assert_eq!(
            decode(r#"data: {"type":"response.created","response":{}}"#),
            StreamEvent::Keepalive
        );
    }

    #[test]
    fn sse_bookkeeping_lines_are_keepalive() {
        assert_eq!(decode(": keep-alive"), StreamEvent::Keepalive);
        assert_eq!(decode("event: message"), StreamEvent::Keepalive);
        assert_eq!(decode("id: 42"), StreamEvent::Keepalive);
        assert_eq!(decode("data:"), StreamEvent::Keepalive);
    }

    #[test]
    fn unparseable_payload_is_malformed_with_raw_frame() {
        assert_eq!(
            decode(r#"data: {"delta":"unterminated"#),
            StreamEvent::Malformed {
                raw: r#"data: {"delta":"unterminated"#.into()
            }
        );
    }

    #[test]
    fn error_record_is_upstream() {
        assert_eq!(
            decode(r#"data: {"error":{"message":"rate limited"}}"#),
            StreamEvent::Upstream {
                message: "rate limited".into()
            }
        );
        assert_eq!(decode(r#"data: {"error":null}"#), StreamEvent::Keepalive);
    }
}
