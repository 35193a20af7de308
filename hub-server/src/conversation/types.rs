//! Conversation turn and content types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded image held in memory.
///
/// The bytes are shared, so cloning a turn never copies image data.
/// Serialization exposes metadata only.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRef {
    pub id: String,
    pub media_type: String,
    pub size_bytes: usize,
    #[serde(skip)]
    data: Arc<[u8]>,
}

impl ImageRef {
    pub fn new(media_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        let data = data.into();
        Self {
            id: Uuid::new_v4().to_string(),
            media_type: media_type.into(),
            size_bytes: data.len(),
            data,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl PartialEq for ImageRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Smallest unit of turn content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
    Image { data: ImageRef },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn image(image: ImageRef) -> Self {
        ContentBlock::Image { data: image }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ContentBlock::Image { .. })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Image { .. } => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageRef> {
        match self {
            ContentBlock::Image { data } => Some(data),
            ContentBlock::Text { .. } => None,
        }
    }
}

/// One message in a session history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: Vec<ContentBlock>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn has_image(&self) -> bool {
        self.content.iter().any(ContentBlock::is_image)
    }

    /// All text blocks joined with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageRef> {
        self.content.iter().filter_map(ContentBlock::as_image)
    }
}

/// Per-session summary for listings.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub message_count: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_block_serialization() {
        let text = serde_json::to_value(ContentBlock::text("hi")).unwrap();
        assert_eq!(text, serde_json::json!({"type": "text", "text": "hi"}));

        let image = ImageRef::new("image/png", vec![1u8, 2, 3]);
        let value = serde_json::to_value(ContentBlock::image(image.clone())).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["data"]["media_type"], "image/png");
        assert_eq!(value["data"]["size_bytes"], 3);
        assert_eq!(value["data"]["id"], image.id.as_str());
    }

    #[test]
    fn test_turn_helpers() {
        let image = ImageRef::new("image/jpeg", vec![0u8; 16]);
        let turn = Turn::new(
            Role::User,
            vec![
                ContentBlock::image(image),
                ContentBlock::text("what is this?"),
                ContentBlock::text("be brief"),
            ],
        );

        assert!(turn.has_image());
        assert_eq!(turn.images().count(), 1);
        assert_eq!(turn.text(), "what is this?\nbe brief");

        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_image_ref_shares_bytes() {
        let image = ImageRef::new("image/png", vec![7u8; 1024]);
        let copy = image.clone();
        assert_eq!(image, copy);
        assert_eq!(copy.data().len(), 1024);
        assert!(std::ptr::eq(image.data().as_ptr(), copy.data().as_ptr()));
    }
}
