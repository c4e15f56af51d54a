//! Robot message types and their WXWork wire format

use serde::Serialize;

/// Mobile placeholder WXWork uses to mention every member of the group
pub const MENTION_ALL: &str = "@all";

/// A message a robot can post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(TextMessage),
    Markdown(MarkdownMessage),
}

/// Plain text message with optional mentions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMessage {
    pub content: String,
    pub mention_all: bool,
    /// Mobile numbers of users to @mention
    pub mentioned_mobiles: Vec<String>,
}

/// Markdown message; WXWork does not support mentions in this variant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownMessage {
    pub content: String,
}

impl TextMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn mention_all(mut self, mention_all: bool) -> Self {
        self.mention_all = mention_all;
        self
    }

    pub fn mention(mut self, mobile: impl Into<String>) -> Self {
        self.mentioned_mobiles.push(mobile.into());
        self
    }

    fn to_wire(&self) -> WireMessage<'_> {
        let mut mentioned_mobile_list: Vec<&str> =
            self.mentioned_mobiles.iter().map(String::as_str).collect();
        if self.mention_all {
            mentioned_mobile_list.push(MENTION_ALL);
        }
        WireMessage::Text {
            text: WireText {
                content: &self.content,
                mentioned_mobile_list,
            },
        }
    }
}

impl MarkdownMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    fn to_wire(&self) -> WireMessage<'_> {
        WireMessage::Markdown {
            markdown: WireMarkdown {
                content: &self.content,
            },
        }
    }
}

impl From<TextMessage> for Message {
    fn from(message: TextMessage) -> Self {
        Message::Text(message)
    }
}

impl From<MarkdownMessage> for Message {
    fn from(message: MarkdownMessage) -> Self {
        Message::Markdown(message)
    }
}

impl Message {
    /// WXWork `msgtype` of this message
    pub fn msgtype(&self) -> &'static str {
        match self {
            Message::Text(_) => "text",
            Message::Markdown(_) => "markdown",
        }
    }

    /// Serialize to the JSON body a WXWork robot webhook expects
    pub fn to_json(&self) -> serde_json::Value {
        let wire = match self {
            Message::Text(text) => text.to_wire(),
            Message::Markdown(markdown) => markdown.to_wire(),
        };
        // Serializing borrowed strings into a Value cannot fail
        serde_json::to_value(wire).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "msgtype", rename_all = "lowercase")]
enum WireMessage<'a> {
    Text { text: WireText<'a> },
    Markdown { markdown: WireMarkdown<'a> },
}

#[derive(Debug, Serialize)]
struct WireText<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    mentioned_mobile_list: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct WireMarkdown<'a> {
    content: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_with_mention_all() {
        let message: Message = TextMessage::new("ping").mention_all(true).into();
        assert_eq!(message.msgtype(), "text");
        assert_eq!(
            message.to_json(),
            json!({
                "msgtype": "text",
                "text": {"content": "ping", "mentioned_mobile_list": ["@all"]}
            })
        );
    }

    #[test]
    fn test_text_mentions_user_before_all() {
        let message: Message = TextMessage::new("build failed")
            .mention("13800000000")
            .mention_all(true)
            .into();
        assert_eq!(
            message.to_json()["text"]["mentioned_mobile_list"],
            json!(["13800000000", "@all"])
        );
    }

    #[test]
    fn test_text_without_mentions() {
        let message: Message = TextMessage::new("quiet").into();
        assert_eq!(
            message.to_json(),
            json!({"msgtype": "text", "text": {"content": "quiet"}})
        );
    }

    #[test]
    fn test_markdown() {
        let message: Message = MarkdownMessage::new("**done**").into();
        assert_eq!(
            message.to_json(),
            json!({"msgtype": "markdown", "markdown": {"content": "**done**"}})
        );
    }
}
