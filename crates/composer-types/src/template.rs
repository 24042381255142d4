use serde::{Deserialize, Serialize};
use crate::generation::ContentType;

/// Content templates offered in the panel picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKey {
    CoverLetter,
    Email,
    PostContent,
    CommentReply,
    Rewriter,
    CustomPrompt,
}

impl TemplateKey {
    pub fn all() -> &'static [TemplateKey] {
        &[
            TemplateKey::PostContent,
            TemplateKey::CommentReply,
            TemplateKey::Email,
            TemplateKey::CoverLetter,
            TemplateKey::Rewriter,
            TemplateKey::CustomPrompt,
        ]
    }

    /// Storage / lookup key
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKey::CoverLetter => "cover_letter",
            TemplateKey::Email => "email",
            TemplateKey::PostContent => "post_content",
            TemplateKey::CommentReply => "comment_reply",
            TemplateKey::Rewriter => "rewriter",
            TemplateKey::CustomPrompt => "custom_prompt",
        }
    }

    /// Resolve a picker key. Unknown keys map to the custom prompt template.
    pub fn from_key(key: &str) -> Self {
        let normalized = key.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .unwrap_or(TemplateKey::CustomPrompt)
    }

    pub fn label(&self) -> &str {
        match self {
            TemplateKey::CoverLetter => "Cover Letter",
            TemplateKey::Email => "Email Reply",
            TemplateKey::PostContent => "Post",
            TemplateKey::CommentReply => "Comment Reply",
            TemplateKey::Rewriter => "Rewrite",
            TemplateKey::CustomPrompt => "Custom Prompt",
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            TemplateKey::CoverLetter => ContentType::CoverLetter,
            TemplateKey::Email => ContentType::Email,
            TemplateKey::PostContent => ContentType::Post,
            TemplateKey::CommentReply => ContentType::Comment,
            TemplateKey::Rewriter => ContentType::Rewrite,
            TemplateKey::CustomPrompt => ContentType::Custom,
        }
    }
}

impl std::fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
