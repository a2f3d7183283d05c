use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Severity of a message returned to the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Info,
    Success,
    Error,
    Warning,
}

impl MessageType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
        }
    }
}

impl Display for MessageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebServiceMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub text: String,
}

impl WebServiceMessage {
    pub fn new(message_type: MessageType, text: impl Into<String>) -> Self {
        Self {
            message_type,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(MessageType::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(MessageType::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageType::Error, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(MessageType::Warning, text)
    }
}

/// Result data paired with the messages produced while computing it.
///
/// Messages keep insertion order and are never merged or deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebServiceResult<T> {
    #[serde(default)]
    messages: Vec<WebServiceMessage>,
    data: Option<T>,
}

impl<T> Default for WebServiceResult<T> {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            data: None,
        }
    }
}

impl<T> WebServiceResult<T> {
    pub fn new(data: Option<T>) -> Self {
        Self {
            messages: Vec::new(),
            data,
        }
    }

    pub fn with_data(data: T) -> Self {
        Self::new(Some(data))
    }

    pub fn empty() -> Self {
        Self::new(None)
    }

    pub fn add_message(&mut self, message: WebServiceMessage) {
        self.messages.push(message);
    }

    pub fn add_messages(&mut self, messages: impl IntoIterator<Item = WebServiceMessage>) {
        self.messages.extend(messages);
    }

    pub fn messages(&self) -> &[WebServiceMessage] {
        &self.messages
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: T) {
        self.data = Some(data);
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn has(&self, message_type: MessageType) -> bool {
        self.messages
            .iter()
            .any(|message| message.message_type == message_type)
    }

    pub fn has_errors(&self) -> bool {
        self.has(MessageType::Error)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WebServiceResult<U> {
        WebServiceResult {
            messages: self.messages,
            data: self.data.map(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_messages_in_insertion_order() {
        let mut result = WebServiceResult::with_data(5_u32);
        result.add_message(WebServiceMessage::warning("first"));
        result.add_messages([
            WebServiceMessage::info("second"),
            WebServiceMessage::warning("first"),
        ]);
        result.add_message(WebServiceMessage::success("third"));

        let texts: Vec<_> = result.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "first", "third"]);
        assert_eq!(result.data(), Some(&5));
        assert!(!result.has_errors());
    }

    #[test]
    fn serializes_type_field() {
        let mut result: WebServiceResult<()> = WebServiceResult::empty();
        result.add_message(WebServiceMessage::error("broken"));
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["messages"][0]["type"], "ERROR");
        assert_eq!(json["messages"][0]["text"], "broken");
        assert!(json["data"].is_null());
        assert!(result.has_errors());
    }
}
