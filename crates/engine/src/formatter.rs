//! Per-category notification formatting.
//!
//! Each formatter reads what it needs from the [`Payload`] and returns the
//! GitHub handles to notify plus the attachments to render. Mapping handles
//! to Slack names and wrapping everything in a [`Notification`] is the
//! dispatcher's job.
//!
//! [`Notification`]: herald_common::types::Notification

use herald_common::error::RelayError;
use herald_common::types::{Attachment, Color, EventCategory};

use crate::payload::Payload;
use crate::recipients::{extract_mentions, mention};

/// Raw formatter output, before username mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Formatted {
    /// GitHub handles (`@login`) in the order they were collected
    pub recipients: Vec<String>,
    pub attachments: Vec<Attachment>,
}

/// Commit status update (CI result).
pub fn status(payload: &Payload) -> Result<Formatted, RelayError> {
    let repo = payload.require_str("repository.name")?;
    let author = payload.require_str("commit.author.login")?;
    let state = payload.require_str("state")?;
    let context = payload.str("context").unwrap_or_default();
    let description = payload.str("description").unwrap_or_default();
    let target_url = payload.str("target_url");

    let branches: Vec<&str> = payload
        .items("branches")
        .iter()
        .filter_map(|b| b.get("name").and_then(|n| n.as_str()))
        .collect();

    let title = format!("{} - {}", repo, branches.join(", "));
    let text = format!("`{}`: {} - {}", context, state, description);
    let fallback = format!(
        "*Build status*\n{}\n{}\nSee More: {}",
        title,
        text,
        target_url.unwrap_or_default()
    );

    let attachment = Attachment::new(title, text, fallback)
        .with_link(target_url)
        .with_color(Color::for_state(state))
        .with_author(EventCategory::Status.display_name());

    Ok(Formatted {
        recipients: vec![mention(author)],
        attachments: vec![attachment],
    })
}

/// Newly opened issue.
pub fn issue(category: &EventCategory, payload: &Payload) -> Result<Formatted, RelayError> {
    let repo = payload.require_str("repository.name")?;
    let sender = payload.require_str("sender.login")?;
    let thread = Thread::from_payload(payload)?;
    let body = thread.body.as_deref().unwrap_or_default();

    let mut recipients = extract_mentions(body);
    if sender != thread.owner {
        recipients.push(mention(&thread.owner));
    }

    let title = thread.title_line(repo);
    let text = format!("*{}:* {}", sender, body);
    let fallback = format!(
        "*Issue*\n*{}*\n{}\nSee More: {}",
        title,
        text,
        thread.html_url.as_deref().unwrap_or_default()
    );

    let attachment = Attachment::new(title, text, fallback)
        .with_link(thread.html_url.clone())
        .with_author(category.display_name())
        .with_field("Issue Creator/Owner", thread.owner.as_str());

    Ok(Formatted {
        recipients,
        attachments: vec![attachment],
    })
}

/// Comment on an issue, or a review comment on a pull request diff.
pub fn issue_comment(
    category: &EventCategory,
    payload: &Payload,
    hide_diffs: bool,
) -> Result<Formatted, RelayError> {
    let repo = payload.require_str("repository.name")?;
    let sender = payload.require_str("sender.login")?;
    let thread = Thread::from_payload(payload)?;
    let comment = Comment::from_payload(payload)?;

    let mut recipients = extract_mentions(&comment.body);
    if sender != thread.owner {
        recipients.push(mention(&thread.owner));
    }

    let mut title = thread.title_line(repo);
    let text = format!("*{}:* {}", sender, comment.body);
    let fallback = format!(
        "*Issue/PR Comment*\n*{}*\n{}\nSee More: {}",
        title,
        text,
        comment.html_url.as_deref().unwrap_or_default()
    );
    if let Some(location) = comment.location() {
        title = format!("{} - {}", title, location);
    }

    let mut attachments = vec![
        Attachment::new(title, text, fallback)
            .with_link(comment.html_url.clone())
            .with_author(category.display_name())
            .with_field("Issue/PR Owner", thread.owner.as_str()),
    ];

    if !hide_diffs && let Some(hunk) = comment.diff_hunk.as_deref() {
        attachments.push(diff_attachment(&comment, hunk));
    }

    Ok(Formatted {
        recipients,
        attachments,
    })
}

/// Comment on a commit. Commits carry no owner we trust, so only mentions
/// are notified.
pub fn commit_comment(category: &EventCategory, payload: &Payload) -> Result<Formatted, RelayError> {
    let repo = payload.require_str("repository.name")?;
    let sender = payload.require_str("sender.login")?;
    let comment = Comment::from_payload(payload)?;

    let text = format!("*{}:* {}", sender, comment.body);
    let fallback = format!(
        "*Commit Comment on {}*\n{}\nSee More: {}",
        repo,
        text,
        comment.html_url.as_deref().unwrap_or_default()
    );
    let title = match comment.location() {
        Some(location) => format!("{} - {}", repo, location),
        None => repo.to_string(),
    };

    let attachment = Attachment::new(title, text, fallback)
        .with_link(comment.html_url.clone())
        .with_author(category.display_name());

    Ok(Formatted {
        recipients: extract_mentions(&comment.body),
        attachments: vec![attachment],
    })
}

/// Drop the first line of a diff hunk. The `@@ -a,b +c,d @@` header repeats
/// what the title already says.
pub fn strip_hunk_header(hunk: &str) -> &str {
    match hunk.split_once('\n') {
        Some((_, rest)) => rest,
        None => hunk,
    }
}

fn diff_attachment(comment: &Comment, hunk: &str) -> Attachment {
    let excerpt = strip_hunk_header(hunk);
    let title = comment.location().unwrap_or_default();
    let fallback = format!("{}\n{}", title, excerpt);
    Attachment::new(title, format!("```\n{}\n```", excerpt), fallback)
}

/// The issue or pull request an event refers to.
struct Thread {
    number: String,
    title: String,
    body: Option<String>,
    owner: String,
    html_url: Option<String>,
}

impl Thread {
    fn from_payload(payload: &Payload) -> Result<Self, RelayError> {
        let root = if payload.get("issue").is_some() {
            "issue"
        } else if payload.get("pull_request").is_some() {
            "pull_request"
        } else {
            return Err(RelayError::field_missing("issue"));
        };
        let field = |name: &str| format!("{}.{}", root, name);

        let owner = match payload.str(&field("owner.login")) {
            Some(owner) => owner.to_string(),
            None => payload.require_str(&field("user.login"))?.to_string(),
        };

        Ok(Self {
            number: payload.require_display(&field("number"))?,
            title: payload.require_str(&field("title"))?.to_string(),
            body: payload.str(&field("body")).map(str::to_string),
            owner,
            html_url: payload.str(&field("html_url")).map(str::to_string),
        })
    }

    fn title_line(&self, repo: &str) -> String {
        format!("{} - #{}: {}", repo, self.number, self.title)
    }
}

struct Comment {
    body: String,
    html_url: Option<String>,
    path: Option<String>,
    line: Option<String>,
    diff_hunk: Option<String>,
}

impl Comment {
    fn from_payload(payload: &Payload) -> Result<Self, RelayError> {
        Ok(Self {
            body: payload.require_str("comment.body")?.to_string(),
            html_url: payload.str("comment.html_url").map(str::to_string),
            path: payload.str("comment.path").map(str::to_string),
            line: payload
                .display("comment.line")
                .or_else(|| payload.display("comment.original_line")),
            diff_hunk: payload.str("comment.diff_hunk").map(str::to_string),
        })
    }

    /// `path:line` for comments anchored to a file.
    fn location(&self) -> Option<String> {
        let path = self.path.as_deref()?;
        Some(match self.line.as_deref() {
            Some(line) => format!("{}:{}", path, line),
            None => path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status_payload(state: &str) -> Payload {
        Payload::new(json!({
            "state": state,
            "context": "ci/build",
            "description": "The build passed",
            "target_url": "https://ci.example.com/builds/7",
            "commit": { "author": { "login": "alice" } },
            "branches": [{ "name": "main" }, { "name": "feature/x" }],
            "repository": { "name": "herald" },
        }))
    }

    fn comment_payload(diff_hunk: Option<&str>) -> Payload {
        Payload::new(json!({
            "action": "created",
            "sender": { "login": "alice" },
            "repository": { "name": "herald" },
            "pull_request": {
                "number": 12,
                "title": "Add relay",
                "user": { "login": "bob" },
                "html_url": "https://github.com/o/herald/pull/12",
            },
            "comment": {
                "body": "@carol does this look right?",
                "html_url": "https://github.com/o/herald/pull/12#discussion_r1",
                "path": "src/lib.rs",
                "line": 30,
                "diff_hunk": diff_hunk,
            },
        }))
    }

    #[test]
    fn test_status_formatting() {
        let formatted = status(&status_payload("success")).unwrap();
        assert_eq!(formatted.recipients, vec!["@alice"]);

        let attachment = &formatted.attachments[0];
        assert_eq!(attachment.title, "herald - main, feature/x");
        assert_eq!(attachment.text, "`ci/build`: success - The build passed");
        assert_eq!(attachment.color, Some(Color::Good));
        assert_eq!(
            attachment.title_link.as_deref(),
            Some("https://ci.example.com/builds/7")
        );
        assert_eq!(attachment.author_name.as_deref(), Some("Build status"));
        assert!(attachment.fallback.contains("See More: https://ci.example.com/builds/7"));
    }

    #[test]
    fn test_status_colors() {
        let color = |state| status(&status_payload(state)).unwrap().attachments[0].color;
        assert_eq!(color("failure"), Some(Color::Danger));
        assert_eq!(color("error"), Some(Color::Danger));
        assert_eq!(color("pending"), Some(Color::Warning));
        assert_eq!(color("weird"), Some(Color::Neutral));
    }

    #[test]
    fn test_status_requires_commit_author() {
        let payload = Payload::new(json!({
            "state": "success",
            "repository": { "name": "herald" },
            "commit": {},
        }));
        let err = status(&payload).unwrap_err();
        assert!(matches!(err, RelayError::FieldMissing { ref path } if path == "commit.author.login"));
    }

    #[test]
    fn test_issue_owner_added_when_not_sender() {
        let payload = Payload::new(json!({
            "action": "opened",
            "sender": { "login": "alice" },
            "repository": { "name": "herald" },
            "issue": {
                "number": 3,
                "title": "Crash on start",
                "body": "ping @carol",
                "user": { "login": "bob" },
                "html_url": "https://github.com/o/herald/issues/3",
            },
        }));

        let formatted = issue(&EventCategory::Issues, &payload).unwrap();
        assert_eq!(formatted.recipients, vec!["@carol", "@bob"]);

        let attachment = &formatted.attachments[0];
        assert_eq!(attachment.title, "herald - #3: Crash on start");
        assert_eq!(attachment.text, "*alice:* ping @carol");
        assert_eq!(attachment.fields[0].title, "Issue Creator/Owner");
        assert_eq!(attachment.fields[0].value, "bob");
        assert!(attachment.fields[0].short);
    }

    #[test]
    fn test_issue_owner_skipped_when_sender() {
        let payload = Payload::new(json!({
            "sender": { "login": "bob" },
            "repository": { "name": "herald" },
            "issue": { "number": 3, "title": "t", "body": null, "user": { "login": "bob" } },
        }));
        let formatted = issue(&EventCategory::Issues, &payload).unwrap();
        assert!(formatted.recipients.is_empty());
    }

    #[test]
    fn test_owner_comparison_is_case_sensitive() {
        let payload = Payload::new(json!({
            "sender": { "login": "Bob" },
            "repository": { "name": "herald" },
            "issue": { "number": 3, "title": "t", "user": { "login": "bob" } },
        }));
        let formatted = issue(&EventCategory::Issues, &payload).unwrap();
        assert_eq!(formatted.recipients, vec!["@bob"]);
    }

    #[test]
    fn test_explicit_owner_wins_over_user() {
        let payload = Payload::new(json!({
            "sender": { "login": "alice" },
            "repository": { "name": "herald" },
            "issue": {
                "number": 3,
                "title": "t",
                "owner": { "login": "dana" },
                "user": { "login": "bob" },
            },
        }));
        let formatted = issue(&EventCategory::Issues, &payload).unwrap();
        assert_eq!(formatted.recipients, vec!["@dana"]);
    }

    #[test]
    fn test_issue_without_owner_is_field_missing() {
        let payload = Payload::new(json!({
            "sender": { "login": "alice" },
            "repository": { "name": "herald" },
            "issue": { "number": 3, "title": "t" },
        }));
        let err = issue(&EventCategory::Issues, &payload).unwrap_err();
        assert!(matches!(err, RelayError::FieldMissing { ref path } if path == "issue.user.login"));
    }

    #[test]
    fn test_review_comment_with_diff() {
        let payload = comment_payload(Some("@@ -1,2 +1,3 @@\nfoo\nbar"));
        let formatted =
            issue_comment(&EventCategory::PullRequestReviewComment, &payload, false).unwrap();

        assert_eq!(formatted.recipients, vec!["@carol", "@bob"]);
        assert_eq!(formatted.attachments.len(), 2);

        let main = &formatted.attachments[0];
        assert_eq!(main.title, "herald - #12: Add relay - src/lib.rs:30");
        assert_eq!(main.author_name.as_deref(), Some("Pull request comment"));
        assert_eq!(main.fields[0].title, "Issue/PR Owner");

        let diff = &formatted.attachments[1];
        assert_eq!(diff.title, "src/lib.rs:30");
        assert_eq!(diff.text, "```\nfoo\nbar\n```");
        assert!(!diff.fallback.contains("@@"));
    }

    #[test]
    fn test_review_comment_diff_hidden() {
        let payload = comment_payload(Some("@@ -1,2 +1,3 @@\nfoo\nbar"));
        let formatted =
            issue_comment(&EventCategory::PullRequestReviewComment, &payload, true).unwrap();
        assert_eq!(formatted.attachments.len(), 1);
    }

    #[test]
    fn test_plain_issue_comment_has_no_location() {
        let payload = Payload::new(json!({
            "sender": { "login": "alice" },
            "repository": { "name": "herald" },
            "issue": { "number": 5, "title": "Docs", "user": { "login": "alice" } },
            "comment": { "body": "done", "html_url": "https://github.com/o/herald/issues/5#c" },
        }));
        let formatted = issue_comment(&EventCategory::IssueComment, &payload, false).unwrap();
        assert_eq!(formatted.attachments.len(), 1);
        assert_eq!(formatted.attachments[0].title, "herald - #5: Docs");
        assert!(formatted.recipients.is_empty());
    }

    #[test]
    fn test_commit_comment_mentions_only() {
        let payload = Payload::new(json!({
            "sender": { "login": "alice" },
            "repository": { "name": "herald" },
            "comment": {
                "body": "nice one @bob",
                "html_url": "https://github.com/o/herald/commit/abc#c",
                "path": "README.md",
                "line": null,
            },
        }));
        let formatted = commit_comment(&EventCategory::CommitComment, &payload).unwrap();
        assert_eq!(formatted.recipients, vec!["@bob"]);
        assert_eq!(formatted.attachments[0].title, "herald - README.md");
        assert_eq!(formatted.attachments[0].author_name.as_deref(), Some("Commit comment"));
    }

    #[test]
    fn test_strip_hunk_header() {
        assert_eq!(strip_hunk_header("@@ -1,2 +1,3 @@\nfoo\nbar"), "foo\nbar");
        assert_eq!(strip_hunk_header("no newline"), "no newline");
    }
}
