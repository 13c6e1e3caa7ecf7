//! Message types exchanged between agents, tools and providers.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// One agent turn: the reply plus any tool responses and multimodal
/// follow-ups it triggered.
pub type Fragment = Vec<Message>;

/// Concatenate a path of fragments into one linear transcript.
pub fn flatten<F: AsRef<[Message]>>(path: &[F]) -> Vec<Message> {
    path.iter()
        .flat_map(|fragment| fragment.as_ref().iter().cloned())
        .collect()
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Message {
    pub role: Role,
    pub content: Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn new(role: Role, content: Content) -> Self {
        Self {
            role,
            content,
            name: None,
        }
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, Content::text(text))
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, Content::text(text))
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, Content::text(text))
    }

    /// Create an assistant message requesting tool calls.
    pub fn tool_call_request(calls: Vec<ToolCall>) -> Self {
        Self::new(
            Role::Assistant,
            Content {
                tool_calls: Some(calls),
                ..Default::default()
            },
        )
    }

    /// Create a tool-role message answering the call `id`.
    pub fn tool_response(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let tool_name = tool_name.into();
        Self {
            role: Role::Tool,
            content: Content {
                tool_response: Some(ToolResponse {
                    id: id.into(),
                    name: tool_name.clone(),
                    content: content.into(),
                }),
                ..Default::default()
            },
            name: Some(tool_name),
        }
    }

    /// Create a user message carrying files and/or URLs.
    pub fn user_multimodal(files: Option<Vec<File>>, urls: Option<Vec<String>>) -> Self {
        Self::new(
            Role::User,
            Content {
                files,
                urls,
                ..Default::default()
            },
        )
    }

    /// Attribute the message to a participant.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.content.text.as_deref()
    }

    /// Requested tool calls (empty when none).
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.content.tool_calls.as_deref().unwrap_or(&[])
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }
}

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    #[serde(alias = "model")]
    Assistant,
    Tool,
}

/// Message content. Only populated fields carry meaning; `text` may
/// co-occur with `files`/`urls` for a multimodal prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<File>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_response: Option<ToolResponse>,
}

/// What a [`Content`] value represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Empty,
    Text,
    Multimodal,
    ToolCallRequest,
    ToolCallResult,
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn kind(&self) -> ContentKind {
        let has_media = self.files.as_ref().is_some_and(|f| !f.is_empty())
            || self.urls.as_ref().is_some_and(|u| !u.is_empty());
        if self.tool_response.is_some() {
            ContentKind::ToolCallResult
        } else if self.tool_calls.as_ref().is_some_and(|c| !c.is_empty()) {
            ContentKind::ToolCallRequest
        } else if has_media {
            ContentKind::Multimodal
        } else if self.text.is_some() {
            ContentKind::Text
        } else {
            ContentKind::Empty
        }
    }
}

/// A base64-encoded blob with its mime type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct File {
    pub mime_type: String,
    #[serde(alias = "base64Str", alias = "base64_str")]
    pub data: String,
}

impl File {
    /// Encode raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// `data:` URL form used by chat-completion image parts.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Kind of a tool call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallKind {
    Function,
}

/// Function name plus its JSON-encoded arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// A tool call requested by the model. `id` correlates it with its
/// eventual [`ToolResponse`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ToolCallKind,
    pub function_call: FunctionCall,
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: ToolCallKind::Function,
            function_call: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function_call.name
    }
}

/// The result of one tool call. `content` is JSON text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ToolResponse {
    pub id: String,
    pub name: String,
    pub content: String,
}
