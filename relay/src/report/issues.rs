//! Issue event reports.

use crate::error::RenderError;
use crate::event::IssueEvent;

/// Render an issue event, or `None` when the action has no template.
pub fn render_issue(event: &IssueEvent) -> Result<Option<String>, RenderError> {
    let title = &event.object_attributes.title;
    let user = &event.user.name;
    let repo = &event.project.name;

    let report = match event.action() {
        "opened" => format!(r#"New issue "{}" opened by {} in {}."#, title, user, repo),
        "reopened" => format!(r#"Issue "{}" reopened by {} in {}."#, title, user, repo),
        "closed" => format!(r#"Issue "{}" closed by {} in {}."#, title, user, repo),
        _ => return Ok(None),
    };

    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{IssueAttributes, Project, User};

    fn issue(action: &str) -> IssueEvent {
        IssueEvent {
            object_attributes: IssueAttributes {
                title: "Bug".to_string(),
                action: Some(action.to_string()),
                state: None,
            },
            user: User {
                name: "Alice".to_string(),
            },
            project: Project {
                name: "proj".to_string(),
            },
        }
    }

    #[test]
    fn test_issue_templates() {
        assert_eq!(
            render_issue(&issue("opened")).unwrap().as_deref(),
            Some(r#"New issue "Bug" opened by Alice in proj."#)
        );
        assert_eq!(
            render_issue(&issue("reopened")).unwrap().as_deref(),
            Some(r#"Issue "Bug" reopened by Alice in proj."#)
        );
        assert_eq!(
            render_issue(&issue("closed")).unwrap().as_deref(),
            Some(r#"Issue "Bug" closed by Alice in proj."#)
        );
    }

    #[test]
    fn test_issue_gitlab_verbs() {
        assert_eq!(
            render_issue(&issue("reopen")).unwrap().as_deref(),
            Some(r#"Issue "Bug" reopened by Alice in proj."#)
        );
    }

    #[test]
    fn test_issue_other_actions() {
        assert_eq!(render_issue(&issue("merged")).unwrap(), None);
        assert_eq!(render_issue(&issue("update")).unwrap(), None);
        assert_eq!(render_issue(&issue("")).unwrap(), None);
    }
}
