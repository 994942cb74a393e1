use crate::errors::ChatError;

use super::message::ChatMessage;

/// An image the user attached to the question.
///
/// Only the file name travels to the endpoint, as a marker in the user
/// message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAttachment {
    pub name: String,
}

impl ImageAttachment {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// JSON body POSTed to the completion endpoint.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CompletionBody {
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

/// Builder for one outgoing prompt.
#[derive(Clone, Debug, Default)]
pub struct ChatRequest {
    system_prompt: Option<String>,
    history: Vec<ChatMessage>,
    question: String,
    image: Option<ImageAttachment>,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    /// Sets the system instruction placed first in `messages`.
    pub fn system_prompt(mut self, text: impl Into<String>) -> Self {
        self.system_prompt = Some(text.into());
        self
    }

    /// Prior turns sent between the system instruction and the new question.
    pub fn history(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.history = messages.into_iter().collect();
        self
    }

    pub fn image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    /// The user message this request appends to the history.
    pub fn user_message(&self) -> Result<ChatMessage, ChatError> {
        let question = self.question.trim();
        match &self.image {
            None if question.is_empty() => Err(ChatError::Validation(
                "enter a question or attach an image".into(),
            )),
            None => Ok(ChatMessage::user(question)),
            Some(image) => Ok(ChatMessage::user(format!(
                "[Image uploaded: {}]\n{}",
                image.name, question
            ))),
        }
    }

    /// Builds the streamed completion body.
    pub fn body(&self) -> Result<CompletionBody, ChatError> {
        let user = self.user_message()?;
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if let Some(system_prompt) = self
            .system_prompt
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            messages.push(ChatMessage::system(system_prompt));
        }
        messages.extend(self.history.iter().cloned());
        messages.push(user);
        Ok(CompletionBody {
            messages,
            stream: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_orders_system_history_then_user_and_requests_stream() {
        let body = ChatRequest::new("  and now?  ")
            .system_prompt("Be brief.")
            .history([ChatMessage::user("hi"), ChatMessage::assistant("hello")])
            .body()
            .expect("body");

        assert_eq!(
            serde_json::to_value(&body).expect("serialize"),
            serde_json::json!({
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"},
                    {"role": "user", "content": "and now?"}
                ],
                "stream": true
            })
        );
    }

    #[test]
    fn image_marker_prefixes_question() {
        let message = ChatRequest::new("what is this?")
            .image(ImageAttachment::new("chart.png"))
            .user_message()
            .expect("message");
        assert_eq!(message.content, "[Image uploaded: chart.png]\nwhat is this?");
    }

    #[test]
    fn image_without_question_is_accepted() {
        let message = ChatRequest::new("")
            .image(ImageAttachment::new("a.jpg"))
            .user_message()
            .expect("message");
        assert_eq!(message.content, "[Image uploaded: a.jpg]\n");
    }

    #[test]
    fn blank_question_without_image_is_rejected() {
        let err = ChatRequest::new("   ").body().expect_err("should fail");
        assert!(matches!(err, ChatError::Validation(msg) if msg.contains("question")));
    }

    #[test]
    fn blank_system_prompt_is_omitted() {
        let body = ChatRequest::new("q").system_prompt(" ").body().expect("body");
        assert_eq!(body.messages, vec![ChatMessage::user("q")]);
    }
}
