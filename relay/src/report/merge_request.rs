//! Merge request event reports.
//!
//! GitLab merge requests are reported as pull requests so the wording matches
//! the rest of the chat traffic.

use crate::error::RenderError;
use crate::event::MergeRequestEvent;

/// Render a merge request event, or `None` when the action has no template.
///
/// A `closed` event must carry `merge_request.merged`.
pub fn render_merge_request(event: &MergeRequestEvent) -> Result<Option<String>, RenderError> {
    let title = &event.object_attributes.title;
    let user = &event.user.name;
    let repo = &event.project.name;

    let report = match event.action() {
        "opened" => format!(r#"Pull request "{}" opened by {} in {}."#, title, user, repo),
        "reopened" => format!(r#"Pull request "{}" reopened by {} in {}."#, title, user, repo),
        "closed" => {
            let merged = event
                .merged()
                .ok_or(RenderError::MissingField("merge_request.merged"))?;
            let merged = if merged { "" } else { "not " };
            format!(
                r#"Pull request "{}" closed and {}merged by {} in {}."#,
                title, merged, user, repo
            )
        }
        _ => return Ok(None),
    };

    Ok(Some(report))
}
