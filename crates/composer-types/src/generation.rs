use serde::{Deserialize, Serialize};

/// Kind of content requested from the generation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Post,
    Comment,
    Email,
    CoverLetter,
    Rewrite,
    Custom,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Comment => "comment",
            ContentType::Email => "email",
            ContentType::CoverLetter => "cover_letter",
            ContentType::Rewrite => "rewrite",
            ContentType::Custom => "custom",
        }
    }
}

/// Body sent to the generation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    pub tone: String,
    pub content_type: ContentType,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, tone: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            prompt: prompt.into(),
            tone: tone.into(),
            content_type,
        }
    }
}

/// One alternative in a multi-variant result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub text: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub length: Option<String>,
}

impl Variant {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
            length: None,
        }
    }
}

/// Subject lines plus body alternatives for an email reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailPackage {
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub body_formal: String,
    #[serde(default)]
    pub body_standard: String,
    #[serde(default)]
    pub body_short: String,
    #[serde(default)]
    pub follow_up: String,
}

impl EmailPackage {
    /// The body a user most likely wants: standard, then formal, then short.
    pub fn preferred_body(&self) -> &str {
        [&self.body_standard, &self.body_formal, &self.body_short]
            .into_iter()
            .find(|b| !b.trim().is_empty())
            .map(|b| b.as_str())
            .unwrap_or("")
    }
}

/// Normalized result of a generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratedContent {
    Text { text: String },
    Variants { variants: Vec<Variant> },
    EmailPackage { package: EmailPackage },
}

impl GeneratedContent {
    pub fn text(text: impl Into<String>) -> Self {
        GeneratedContent::Text { text: text.into() }
    }

    /// The single piece of text copied, inserted or saved for this result.
    pub fn primary_text(&self) -> String {
        match self {
            GeneratedContent::Text { text } => text.clone(),
            GeneratedContent::Variants { variants } => variants
                .first()
                .map(|v| v.text.clone())
                .unwrap_or_default(),
            GeneratedContent::EmailPackage { package } => {
                let body = package.preferred_body();
                match package.subjects.first() {
                    Some(subject) if !subject.is_empty() => {
                        format!("Subject: {}\n\n{}", subject, body)
                    }
                    _ => body.to_string(),
                }
            }
        }
    }

    /// Human-readable rendering of the whole result for the transcript.
    pub fn display_text(&self) -> String {
        match self {
            GeneratedContent::Text { text } => text.clone(),
            GeneratedContent::Variants { variants } => variants
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let mut header = format!("Option {}", i + 1);
                    let tags: Vec<&str> = [v.kind.as_deref(), v.length.as_deref()]
                        .into_iter()
                        .flatten()
                        .collect();
                    if !tags.is_empty() {
                        header.push_str(&format!(" ({})", tags.join(", ")));
                    }
                    format!("{}:\n{}", header, v.text)
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
            GeneratedContent::EmailPackage { package } => {
                let mut sections = Vec::new();
                if !package.subjects.is_empty() {
                    let subjects: Vec<String> =
                        package.subjects.iter().map(|s| format!("- {}", s)).collect();
                    sections.push(format!("Subjects:\n{}", subjects.join("\n")));
                }
                for (label, body) in [
                    ("Standard", &package.body_standard),
                    ("Formal", &package.body_formal),
                    ("Short", &package.body_short),
                    ("Follow-up", &package.follow_up),
                ] {
                    if !body.trim().is_empty() {
                        sections.push(format!("{}:\n{}", label, body));
                    }
                }
                sections.join("\n\n")
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary_text().trim().is_empty()
    }
}
