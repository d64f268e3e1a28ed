//! Typed GitLab webhook payloads.
//!
//! Decoding happens in two steps: the `object_kind` discriminator is read
//! first, then the body is decoded into the struct for that kind. Required
//! fields (title, author, project) are plain `String`s so their absence is a
//! decode error rather than a lookup failure later on.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Kind tag for issue events.
pub const ISSUES: &str = "issues";

/// Kind tag for merge request events.
pub const MERGE_REQUEST: &str = "merge_request";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing field {0}")]
    MissingField(&'static str),
}

/// Author of the change that triggered the hook.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueAttributes {
    pub title: String,
    /// GitLab verb: `open`, `reopen`, `close`, `update`
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Payload of an `issues` hook.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueEvent {
    pub object_attributes: IssueAttributes,
    pub user: User,
    pub project: Project,
}

impl IssueEvent {
    /// Action in past tense, taken from `object_attributes.action` and
    /// falling back to `object_attributes.state`.
    pub fn action(&self) -> &str {
        match self.object_attributes.action.as_deref() {
            Some("open") => "opened",
            Some("reopen") => "reopened",
            Some("close") => "closed",
            Some(other) => other,
            None => self.object_attributes.state.as_deref().unwrap_or(""),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequestAttributes {
    pub title: String,
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MergeStatus {
    #[serde(default)]
    pub merged: Option<bool>,
}

/// Payload of a `merge_request` hook.
#[derive(Debug, Clone, Deserialize)]
pub struct MergeRequestEvent {
    pub object_attributes: MergeRequestAttributes,
    pub user: User,
    pub project: Project,
    #[serde(default)]
    pub merge_request: Option<MergeStatus>,
}

impl MergeRequestEvent {
    pub fn action(&self) -> &str {
        &self.object_attributes.state
    }

    /// Value of `merge_request.merged`, if the payload carries it.
    pub fn merged(&self) -> Option<bool> {
        self.merge_request.as_ref().and_then(|m| m.merged)
    }
}

/// A decoded webhook event.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    Issue(IssueEvent),
    MergeRequest(MergeRequestEvent),
    /// Any kind without a typed payload; only its kind and state are kept.
    Other { kind: String, action: String },
}

impl WebhookEvent {
    /// Decode a raw request body.
    pub fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(body)?;

        let kind = value
            .get("object_kind")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(DecodeError::MissingField("object_kind"))?;

        let event = match kind.as_str() {
            // GitLab sends `issue`; the interest set uses the hook name.
            "issue" | ISSUES => WebhookEvent::Issue(serde_json::from_value(value)?),
            MERGE_REQUEST => WebhookEvent::MergeRequest(serde_json::from_value(value)?),
            other => WebhookEvent::Other {
                kind: other.to_string(),
                action: value
                    .pointer("/object_attributes/state")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string(),
            },
        };

        Ok(event)
    }

    pub fn kind(&self) -> &str {
        match self {
            WebhookEvent::Issue(_) => ISSUES,
            WebhookEvent::MergeRequest(_) => MERGE_REQUEST,
            WebhookEvent::Other { kind, .. } => kind,
        }
    }

    pub fn action(&self) -> &str {
        match self {
            WebhookEvent::Issue(e) => e.action(),
            WebhookEvent::MergeRequest(e) => e.action(),
            WebhookEvent::Other { action, .. } => action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Result<WebhookEvent, DecodeError> {
        WebhookEvent::decode(value.to_string().as_bytes())
    }

    #[test]
    fn test_decode_issue_event() {
        let event = decode(json!({
            "object_kind": "issue",
            "user": { "name": "Alice", "username": "alice" },
            "project": { "name": "proj", "id": 7 },
            "object_attributes": { "title": "Bug", "action": "open", "state": "opened" }
        }))
        .unwrap();

        assert_eq!(event.kind(), "issues");
        assert_eq!(event.action(), "opened");
        match event {
            WebhookEvent::Issue(issue) => {
                assert_eq!(issue.object_attributes.title, "Bug");
                assert_eq!(issue.user.name, "Alice");
                assert_eq!(issue.project.name, "proj");
            }
            other => panic!("Expected Issue variant, got {:?}", other),
        }
    }

    #[test]
    fn test_issue_action_normalisation() {
        for (verb, expected) in [("reopen", "reopened"), ("close", "closed"), ("update", "update")] {
            let event = decode(json!({
                "object_kind": "issues",
                "user": { "name": "Alice" },
                "project": { "name": "proj" },
                "object_attributes": { "title": "Bug", "action": verb }
            }))
            .unwrap();
            assert_eq!(event.action(), expected);
        }
    }

    #[test]
    fn test_issue_action_falls_back_to_state() {
        let event = decode(json!({
            "object_kind": "issues",
            "user": { "name": "Alice" },
            "project": { "name": "proj" },
            "object_attributes": { "title": "Bug", "state": "closed" }
        }))
        .unwrap();

        assert_eq!(event.action(), "closed");
    }

    #[test]
    fn test_decode_merge_request_event() {
        let event = decode(json!({
            "object_kind": "merge_request",
            "user": { "name": "Bob" },
            "project": { "name": "proj" },
            "object_attributes": { "title": "Fix", "state": "closed" },
            "merge_request": { "merged": true }
        }))
        .unwrap();

        assert_eq!(event.kind(), "merge_request");
        assert_eq!(event.action(), "closed");
        match event {
            WebhookEvent::MergeRequest(mr) => assert_eq!(mr.merged(), Some(true)),
            other => panic!("Expected MergeRequest variant, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_request_without_merge_status() {
        let event = decode(json!({
            "object_kind": "merge_request",
            "user": { "name": "Bob" },
            "project": { "name": "proj" },
            "object_attributes": { "title": "Fix", "state": "opened" }
        }))
        .unwrap();

        match event {
            WebhookEvent::MergeRequest(mr) => assert_eq!(mr.merged(), None),
            other => panic!("Expected MergeRequest variant, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_other_kind() {
        let event = decode(json!({ "object_kind": "push", "ref": "refs/heads/main" })).unwrap();

        assert_eq!(event.kind(), "push");
        assert_eq!(event.action(), "");
    }

    #[test]
    fn test_decode_missing_required_field() {
        let result = decode(json!({
            "object_kind": "issues",
            "user": { "name": "Alice" },
            "object_attributes": { "title": "Bug", "action": "open" }
        }));

        assert!(matches!(result, Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_decode_missing_object_kind() {
        let result = decode(json!({ "object_attributes": { "state": "opened" } }));

        assert!(matches!(result, Err(DecodeError::MissingField("object_kind"))));
    }

    #[test]
    fn test_decode_invalid_json() {
        assert!(matches!(
            WebhookEvent::decode(b"{not json"),
            Err(DecodeError::Json(_))
        ));
    }
}
