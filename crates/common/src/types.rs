use serde::{Deserialize, Serialize};

/// GitHub webhook event categories the relay knows how to format.
///
/// Anything else lands in [`EventCategory::Other`] and is ignored downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Status,
    Issues,
    IssueComment,
    PullRequestReviewComment,
    CommitComment,
    Other(String),
}

impl EventCategory {
    /// Parse the value of the `X-GitHub-Event` header.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "status" => EventCategory::Status,
            "issues" => EventCategory::Issues,
            "issue_comment" => EventCategory::IssueComment,
            "pull_request_review_comment" => EventCategory::PullRequestReviewComment,
            "commit_comment" => EventCategory::CommitComment,
            other => EventCategory::Other(other.to_string()),
        }
    }

    /// The wire name, exactly as GitHub sends it.
    pub fn as_str(&self) -> &str {
        match self {
            EventCategory::Status => "status",
            EventCategory::Issues => "issues",
            EventCategory::IssueComment => "issue_comment",
            EventCategory::PullRequestReviewComment => "pull_request_review_comment",
            EventCategory::CommitComment => "commit_comment",
            EventCategory::Other(name) => name,
        }
    }

    /// Human-readable label shown as the attachment author.
    pub fn display_name(&self) -> &str {
        match self {
            EventCategory::Status => "Build status",
            EventCategory::IssueComment => "Issue comment",
            EventCategory::PullRequestReviewComment => "Pull request comment",
            EventCategory::CommitComment => "Commit comment",
            EventCategory::Other(name) if name == "pull_request_review" => "Pull request review",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sub-classification of an event (`action` in the payload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Opened,
    Created,
    Edited,
    Other(String),
}

impl Action {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "opened" => Action::Opened,
            "created" => Action::Created,
            "edited" => Action::Edited,
            other => Action::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Opened => write!(f, "opened"),
            Action::Created => write!(f, "created"),
            Action::Edited => write!(f, "edited"),
            Action::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Attachment color. Slack accepts the named palette or any hex code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Good,
    Warning,
    Danger,
    Neutral,
}

impl Color {
    /// Map a commit status state onto the Slack palette.
    pub fn for_state(state: &str) -> Self {
        match state {
            "success" => Color::Good,
            "error" | "failure" => Color::Danger,
            "pending" => Color::Warning,
            _ => Color::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Good => "good",
            Color::Warning => "warning",
            Color::Danger => "danger",
            Color::Neutral => "#000000",
        }
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "good" => Color::Good,
            "warning" => Color::Warning,
            "danger" => Color::Danger,
            _ => Color::Neutral,
        })
    }
}

/// A short key/value pair rendered in a grid under the attachment body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

/// A rich sub-block of a Slack message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Plain-text rendering for clients without rich formatting support
    pub fallback: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// Attachment members Slack should parse as mrkdwn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mrkdwn_in: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AttachmentField>,
}

impl Attachment {
    /// A bare attachment whose `text` is rendered as mrkdwn.
    pub fn new(title: impl Into<String>, text: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
            title: title.into(),
            title_link: None,
            color: None,
            text: text.into(),
            author_name: None,
            mrkdwn_in: vec!["text".to_string()],
            fields: Vec::new(),
        }
    }

    pub fn with_link(mut self, link: Option<impl Into<String>>) -> Self {
        self.title_link = link.map(Into::into);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author_name = Some(author.into());
        self
    }

    pub fn with_field(mut self, title: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(AttachmentField {
            title: title.into(),
            value: value.into(),
            short: true,
        });
        self
    }
}

/// A Slack incoming-webhook message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub channel: String,
    /// Summary line (`To: @a, @b`) or a diagnostic message
    pub text: String,
    pub as_user: bool,
    pub parse: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Notification {
    pub fn new(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            text: text.into(),
            as_user: true,
            parse: "full".to_string(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Result of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    /// Slack answered with a non-200 status
    Rejected { status: u16 },
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Rejected { status } => write!(f, "rejected ({})", status),
        }
    }
}
