//! Email rendering
//!
//! Pure functions from portal rows to subject, HTML and plain-text bodies.
//! Both bodies are produced from the same section list so they never drift
//! apart. Summary entries are grouped by screen title in first-seen order.

use crate::mailer::{MailSettings, OutgoingEmail};
use crate::updates::ChangeCheck;
use indexmap::IndexMap;
use portal_changes::ChangesSummary;
use portal_model::{Milestone, MilestoneRecord, Project, UserProfile};
use portal_store::ProjectTree;
use pulldown_cmark::{html, Parser};
use std::fmt::Write as _;

/// Rendered subject and bodies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
    /// Plain-text body
    pub text: String,
}

impl RenderedEmail {
    /// Address the email
    #[must_use]
    pub fn into_outgoing(self, settings: &MailSettings, to: impl Into<String>) -> OutgoingEmail {
        OutgoingEmail {
            from: settings.from.clone(),
            to: to.into(),
            reply_to: settings.reply_to.clone(),
            subject: self.subject,
            html: self.html,
            text: self.text,
        }
    }
}

/// Subject used when the admin does not type one
#[must_use]
pub fn default_subject(project: &Project) -> String {
    format!("Project update: {}", project.name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Group {
    label: Option<String>,
    lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    heading: String,
    groups: Vec<Group>,
}

fn by_screen<'a, T>(
    items: &'a [T],
    screen: impl Fn(&'a T) -> &'a str,
    line: impl Fn(&'a T) -> String,
) -> Vec<Group> {
    let mut groups: IndexMap<&str, Vec<String>> = IndexMap::new();
    for item in items {
        groups.entry(screen(item)).or_default().push(line(item));
    }
    groups
        .into_iter()
        .map(|(label, lines)| Group {
            label: Some(label.to_string()),
            lines,
        })
        .collect()
}

fn flat(lines: Vec<String>) -> Vec<Group> {
    vec![Group { label: None, lines }]
}

fn push_section(sections: &mut Vec<Section>, heading: &str, groups: Vec<Group>) {
    if groups.iter().any(|g| !g.lines.is_empty()) {
        sections.push(Section {
            heading: heading.to_string(),
            groups,
        });
    }
}

fn summary_sections(summary: &ChangesSummary) -> Vec<Section> {
    let mut sections = Vec::new();
    push_section(
        &mut sections,
        "Ready for your review",
        by_screen(&summary.review_tasks, |r| r.screen_title.as_str(), |r| r.title.clone()),
    );
    push_section(
        &mut sections,
        "Approved after review",
        by_screen(&summary.review_to_done, |r| r.screen_title.as_str(), |r| r.title.clone()),
    );
    push_section(
        &mut sections,
        "Back in progress after review",
        by_screen(&summary.review_to_progress, |r| r.screen_title.as_str(), |r| r.title.clone()),
    );
    push_section(
        &mut sections,
        "Completed",
        by_screen(
            &summary.completed_tasks,
            |c| c.screen_title.as_str(),
            |c| format!("{} (done {})", c.title, c.edited_at.format("%Y-%m-%d")),
        ),
    );
    push_section(
        &mut sections,
        "New screens",
        flat(summary.new_screens.iter().map(|s| s.title.clone()).collect()),
    );
    push_section(
        &mut sections,
        "Updated screens",
        flat(
            summary
                .updated_screens
                .iter()
                .map(|u| match &u.description {
                    Some(description) => format!("{}: {}", u.title, description),
                    None => u.title.clone(),
                })
                .collect(),
        ),
    );
    push_section(
        &mut sections,
        "New tasks",
        by_screen(&summary.new_tasks, |t| t.screen_title.as_str(), |t| t.title.clone()),
    );
    sections
}

fn overview_sections(tree: &ProjectTree) -> Vec<Section> {
    let groups = tree
        .screens
        .iter()
        .map(|screen| {
            let mut lines: Vec<String> = tree
                .tasks_of(screen.id)
                .map(|t| format!("{} - {}", t.title, t.status.label()))
                .collect();
            if lines.is_empty() {
                lines.push("No tasks yet".to_string());
            }
            Group {
                label: Some(screen.title.clone()),
                lines,
            }
        })
        .collect();
    let mut sections = Vec::new();
    push_section(&mut sections, "Project overview", groups);
    sections
}

/// Minimal HTML escaping for text placed in element content or attributes
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn markdown_to_html(markdown: &str) -> String {
    let mut out = String::new();
    html::push_html(&mut out, Parser::new(markdown));
    out
}

/// Shared layout: title, greeting, intro paragraphs, sections, portal link
struct Layout<'a> {
    title: &'a str,
    greeting: Option<&'a str>,
    message: Option<&'a str>,
    paragraphs: Vec<String>,
    sections: Vec<Section>,
    portal_url: Option<&'a str>,
}

impl Layout<'_> {
    fn html(&self) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n");
        out.push_str("<html><body style=\"font-family: sans-serif; line-height: 1.5;\">\n");
        let _ = writeln!(out, "<h1>{}</h1>", escape_html(self.title));
        if let Some(name) = self.greeting {
            let _ = writeln!(out, "<p>Hi {},</p>", escape_html(name));
        }
        if let Some(message) = self.message {
            out.push_str(&markdown_to_html(message));
        }
        for paragraph in &self.paragraphs {
            let _ = writeln!(out, "<p>{}</p>", escape_html(paragraph));
        }
        for section in &self.sections {
            let _ = writeln!(out, "<h2>{}</h2>", escape_html(&section.heading));
            for group in &section.groups {
                if let Some(label) = &group.label {
                    let _ = writeln!(out, "<h3>{}</h3>", escape_html(label));
                }
                out.push_str("<ul>\n");
                for line in &group.lines {
                    let _ = writeln!(out, "<li>{}</li>", escape_html(line));
                }
                out.push_str("</ul>\n");
            }
        }
        if let Some(url) = self.portal_url {
            let _ = writeln!(
                out,
                "<p><a href=\"{}\">Open the project portal</a></p>",
                escape_html(url)
            );
        }
        out.push_str("</body></html>\n");
        out
    }

    fn text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}\n", self.title);
        if let Some(name) = self.greeting {
            let _ = writeln!(out, "Hi {name},\n");
        }
        if let Some(message) = self.message {
            let _ = writeln!(out, "{}\n", message.trim());
        }
        for paragraph in &self.paragraphs {
            let _ = writeln!(out, "{paragraph}\n");
        }
        for section in &self.sections {
            let _ = writeln!(out, "{}", section.heading);
            for group in &section.groups {
                let indent = match &group.label {
                    Some(label) => {
                        let _ = writeln!(out, "  {label}");
                        "    "
                    }
                    None => "  ",
                };
                for line in &group.lines {
                    let _ = writeln!(out, "{indent}- {line}");
                }
            }
            out.push('\n');
        }
        if let Some(url) = self.portal_url {
            let _ = writeln!(out, "Open the project portal: {url}");
        }
        out
    }
}

/// Inputs of a status-update email
#[derive(Debug, Clone, Copy)]
pub struct StatusEmail<'a> {
    /// Result of "check changes"
    pub check: &'a ChangeCheck,
    /// Name used in the greeting
    pub recipient_name: Option<&'a str>,
    /// Markdown message from the admin
    pub personal_message: Option<&'a str>,
    /// Subject override
    pub subject: Option<&'a str>,
}

impl<'a> StatusEmail<'a> {
    /// Email for a check with no extras
    #[must_use]
    pub fn new(check: &'a ChangeCheck) -> Self {
        Self {
            check,
            recipient_name: None,
            personal_message: None,
            subject: None,
        }
    }

    /// Render subject and bodies
    #[must_use]
    pub fn render(&self, settings: &MailSettings) -> RenderedEmail {
        let project = self.check.project();
        let (paragraphs, sections) = match self.check {
            ChangeCheck::FirstUpdate { tree, .. } => (
                vec![format!(
                    "This is the first progress update for {}. \
                     Here is where every screen stands today.",
                    project.name
                )],
                overview_sections(tree),
            ),
            ChangeCheck::Changes { summary, since, .. } => {
                let sections = summary_sections(summary);
                let day = since.format("%Y-%m-%d");
                let intro = if sections.is_empty() {
                    format!("Nothing has changed since the last update on {day}.")
                } else {
                    format!("Here is what happened since the last update on {day}.")
                };
                (vec![intro], sections)
            }
        };

        let layout = Layout {
            title: &project.name,
            greeting: self.recipient_name,
            message: self.personal_message.filter(|m| !m.trim().is_empty()),
            paragraphs,
            sections,
            portal_url: settings.portal_url.as_deref(),
        };

        RenderedEmail {
            subject: self
                .subject
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map_or_else(|| default_subject(project), str::to_string),
            html: layout.html(),
            text: layout.text(),
        }
    }
}

/// Notice sent to the client when a milestone changes
#[must_use]
pub fn render_milestone_notice(
    project: &Project,
    record: &MilestoneRecord,
    recipient: &UserProfile,
    settings: &MailSettings,
) -> RenderedEmail {
    let kind = record.milestone.kind();
    let mut lines = vec![record.milestone.describe()];
    match &record.milestone {
        Milestone::Discovery(m) => {
            if let Some(notes) = &m.notes {
                lines.push(format!("Notes: {notes}"));
            }
        }
        Milestone::Proposal(m) => {
            if let Some(url) = &m.document_url {
                lines.push(format!("Proposal document: {url}"));
            }
        }
        Milestone::Invoice(m) => {
            if let Some(url) = &m.invoice_url {
                lines.push(format!("Invoice: {url}"));
            }
        }
    }

    let layout = Layout {
        title: &project.name,
        greeting: Some(recipient.display_name.as_str()),
        message: None,
        paragraphs: vec![format!(
            "The {} milestone of your project was updated.",
            kind.label().to_lowercase()
        )],
        sections: vec![Section {
            heading: kind.label().to_string(),
            groups: flat(lines),
        }],
        portal_url: settings.portal_url.as_deref(),
    };

    RenderedEmail {
        subject: format!(
            "{}: {} {}",
            project.name,
            kind.label(),
            record.milestone.status_label().to_lowercase()
        ),
        html: layout.html(),
        text: layout.text(),
    }
}

/// Welcome email for a newly created portal user
#[must_use]
pub fn render_welcome(user: &UserProfile, settings: &MailSettings) -> RenderedEmail {
    let layout = Layout {
        title: "Welcome to the project portal",
        greeting: Some(user.display_name.as_str()),
        message: None,
        paragraphs: vec![format!(
            "An account was created for {}. Sign in to follow the progress of your project.",
            user.email
        )],
        sections: Vec::new(),
        portal_url: settings.portal_url.as_deref(),
    };
    RenderedEmail {
        subject: "Welcome to the project portal".to_string(),
        html: layout.html(),
        text: layout.text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use portal_changes::{CompletedTask, NewTask, ReviewItem};
    use portal_model::{
        Invoice, InvoiceStatus, MilestoneKind, ProjectId, Screen, Task, TaskId, TaskStatus,
        UpdateId,
    };
    use pretty_assertions::assert_eq;

    fn project() -> Project {
        Project::new("Pantry <beta>", "Lists", Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
    }

    fn review(title: &str, screen: &str) -> ReviewItem {
        ReviewItem {
            task_id: TaskId::new(),
            title: title.into(),
            screen_title: screen.into(),
        }
    }

    fn changes(summary: ChangesSummary) -> ChangeCheck {
        ChangeCheck::Changes {
            project: project(),
            baseline: UpdateId::new(),
            since: Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap(),
            summary,
        }
    }

    #[test]
    fn groups_follow_first_seen_screen_order() {
        let items = vec![review("a", "Lists"), review("b", "Settings"), review("c", "Lists")];
        let groups = by_screen(&items, |r| r.screen_title.as_str(), |r| r.title.clone());
        assert_eq!(
            groups,
            vec![
                Group {
                    label: Some("Lists".into()),
                    lines: vec!["a".into(), "c".into()],
                },
                Group {
                    label: Some("Settings".into()),
                    lines: vec!["b".into()],
                },
            ]
        );
    }

    #[test]
    fn status_email_lists_buckets_and_escapes() {
        let summary = ChangesSummary {
            review_tasks: vec![review("Share <list>", "Lists")],
            completed_tasks: vec![CompletedTask {
                title: "Create list".into(),
                screen_title: "Lists".into(),
                edited_at: Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0).unwrap(),
            }],
            new_tasks: vec![NewTask {
                title: "Invite".into(),
                screen_title: "Settings".into(),
                created_at: Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0).unwrap(),
            }],
            ..ChangesSummary::default()
        };
        let check = changes(summary);
        let email = StatusEmail {
            recipient_name: Some("Ana"),
            personal_message: Some("Thanks for the **quick** feedback!"),
            ..StatusEmail::new(&check)
        }
        .render(&MailSettings::default());

        assert_eq!(email.subject, "Project update: Pantry <beta>");
        assert!(email.html.contains("<h1>Pantry &lt;beta&gt;</h1>"));
        assert!(email.html.contains("<strong>quick</strong>"));
        assert!(email.html.contains("<li>Share &lt;list&gt;</li>"));
        assert!(email.html.contains("<li>Create list (done 2026-04-02)</li>"));
        assert!(email.text.contains("Ready for your review\n  Lists\n    - Share <list>\n"));
        assert!(email.text.contains("New tasks\n  Settings\n    - Invite\n"));
        assert!(!email.text.contains("Approved after review"));
    }

    #[test]
    fn empty_summary_says_nothing_changed() {
        let check = changes(ChangesSummary::default());
        let email = StatusEmail::new(&check).render(&MailSettings::default());
        assert!(email.text.contains("Nothing has changed since the last update on 2026-04-01."));
        assert!(!email.html.contains("<h2>"));
    }

    #[test]
    fn first_update_lists_every_screen() {
        let project = project();
        let lists = Screen::new(project.id, "Lists", 0, project.created_at);
        let empty = Screen::new(project.id, "Empty", 1, project.created_at);
        let tree = ProjectTree {
            tasks: vec![
                Task::new(lists.id, "Create list", 0, project.created_at)
                    .with_status(TaskStatus::Review),
            ],
            screens: vec![lists, empty],
        };
        let check = ChangeCheck::FirstUpdate { project, tree };

        let email = StatusEmail {
            subject: Some("  Kickoff  "),
            ..StatusEmail::new(&check)
        }
        .render(&MailSettings {
            portal_url: Some("https://portal.example".into()),
            ..MailSettings::default()
        });

        assert_eq!(email.subject, "Kickoff");
        assert!(email.text.contains(
            "Project overview\n  Lists\n    - Create list - Ready for review\n  Empty\n    - No tasks yet\n"
        ));
        assert!(email.html.contains("<a href=\"https://portal.example\">"));
    }

    #[test]
    fn milestone_notice_mentions_status_and_link() {
        let project = project();
        let record = MilestoneRecord {
            project_id: ProjectId::new(),
            milestone: Milestone::Invoice(Invoice {
                status: InvoiceStatus::Sent,
                amount_cents: 9_900,
                due_on: None,
                invoice_url: Some("https://pay.example/inv/7".into()),
            }),
            updated_at: Utc::now(),
        };
        let user = UserProfile::client("ana@example.com", "Ana", Utc::now());

        let email = render_milestone_notice(&project, &record, &user, &MailSettings::default());

        assert_eq!(email.subject, "Pantry <beta>: Invoice sent");
        assert!(email.text.contains("Invoice: Sent (99.00)"));
        assert!(email.text.contains("https://pay.example/inv/7"));
        assert_eq!(record.milestone.kind(), MilestoneKind::Invoice);
    }

    #[test]
    fn welcome_greets_by_name() {
        let user = UserProfile::client("ana@example.com", "Ana", Utc::now());
        let email = render_welcome(&user, &MailSettings::default());
        assert!(email.text.contains("Hi Ana,"));
        assert!(email.html.contains("ana@example.com"));
    }
}
