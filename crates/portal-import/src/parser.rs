//! Markdown project outline parser
//!
//! Accepts a deliberately small grammar, one construct per line:
//!
//! ```text
//! # Project name          project name (last one wins)
//! > Tagline               tagline (last one wins)
//! Free text               project description until the first screen,
//!                         then the first line under a screen describes it
//! ## Screen title         opens a screen
//! - [ ] Task title        task of the open screen ([x] is accepted, ignored)
//! ```
//!
//! No other markdown is recognised. Lines are trimmed before they are
//! classified. Parsing is pure and either yields a whole tree or fails.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};

/// Description used when the outline has no description text
pub const DEFAULT_DESCRIPTION: &str = "No description provided.";

/// Parsed project outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedProject {
    /// Project name
    pub name: String,
    /// One-line tagline
    pub tagline: Option<String>,
    /// Description, or the placeholder
    pub description: String,
    /// Screens in document order
    pub screens: Vec<ParsedScreen>,
}

impl ParsedProject {
    /// Number of tasks across all screens
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.screens.iter().map(|s| s.tasks.len()).sum()
    }
}

/// Parsed screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedScreen {
    /// Heading text after `## `
    pub title: String,
    /// First text line under the heading
    pub description: Option<String>,
    /// Tasks in document order
    pub tasks: Vec<ParsedTask>,
}

/// Parsed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTask {
    /// Checkbox text
    pub title: String,
    /// Never filled by the parser
    pub description: Option<String>,
}

/// Classified outline line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    ProjectName(&'a str),
    Tagline(&'a str),
    Screen(&'a str),
    Task(&'a str),
    Text(&'a str),
    Ignored,
}

impl<'a> Line<'a> {
    fn classify(raw: &'a str) -> Self {
        let line = raw.trim();
        if line.is_empty() {
            return Line::Blank;
        }
        if let Some(rest) = line.strip_prefix("## ") {
            return non_empty(rest).map_or(Line::Ignored, Line::Screen);
        }
        if let Some(rest) = line.strip_prefix("# ") {
            return non_empty(rest).map_or(Line::Ignored, Line::ProjectName);
        }
        if line.starts_with('#') {
            return Line::Ignored;
        }
        if let Some(rest) = line.strip_prefix("> ") {
            return non_empty(rest).map_or(Line::Ignored, Line::Tagline);
        }
        if let Some(title) = checkbox(line) {
            return non_empty(title).map_or(Line::Ignored, Line::Task);
        }
        Line::Text(line)
    }
}

fn non_empty(text: &str) -> Option<&str> {
    let text = text.trim();
    (!text.is_empty()).then_some(text)
}

/// Title of a `- [ ] title` / `- [x] title` line
fn checkbox(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("- [")?;
    let rest = rest
        .strip_prefix(' ')
        .or_else(|| rest.strip_prefix('x'))
        .or_else(|| rest.strip_prefix('X'))?;
    let rest = rest.strip_prefix(']')?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

/// Markdown outline parser
#[derive(Debug, Clone)]
pub struct MarkdownProjectParser {
    placeholder: String,
}

impl Default for MarkdownProjectParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownProjectParser {
    /// Create parser with the default description placeholder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            placeholder: DEFAULT_DESCRIPTION.to_string(),
        }
    }

    /// With a custom description placeholder
    #[inline]
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Supported file extensions (without dot)
    #[must_use]
    pub fn extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    /// Parse an outline into a project tree
    ///
    /// # Errors
    /// `ParseError::MissingProjectName` if no `# ` line names the project.
    pub fn parse(&self, content: &str) -> Result<ParsedProject, ParseError> {
        let mut name: Option<&str> = None;
        let mut tagline: Option<&str> = None;
        let mut description: Vec<&str> = Vec::new();
        let mut in_description = false;
        let mut screens: Vec<ParsedScreen> = Vec::new();
        let mut current: Option<ParsedScreen> = None;
        let mut dropped_tasks = 0usize;

        for raw in content.lines() {
            match Line::classify(raw) {
                Line::Blank | Line::Ignored => {}
                Line::ProjectName(text) => {
                    name = Some(text);
                    in_description = true;
                }
                Line::Tagline(text) => tagline = Some(text),
                Line::Screen(title) => {
                    if let Some(screen) = current.take() {
                        screens.push(screen);
                    }
                    current = Some(ParsedScreen {
                        title: title.to_string(),
                        description: None,
                        tasks: Vec::new(),
                    });
                    in_description = false;
                }
                Line::Task(title) => match current.as_mut() {
                    Some(screen) => screen.tasks.push(ParsedTask {
                        title: title.to_string(),
                        description: None,
                    }),
                    None => dropped_tasks += 1,
                },
                Line::Text(text) => {
                    if in_description && current.is_none() {
                        description.push(text);
                    } else if let Some(screen) = current.as_mut() {
                        if screen.description.is_none() {
                            screen.description = Some(text.to_string());
                        }
                    }
                }
            }
        }

        if let Some(screen) = current.take() {
            screens.push(screen);
        }

        let name = name.ok_or(ParseError::MissingProjectName)?;
        if dropped_tasks > 0 {
            tracing::debug!(dropped_tasks, "dropped checkbox lines outside any screen");
        }

        let description = if description.is_empty() {
            self.placeholder.clone()
        } else {
            description.join(" ")
        };

        let project = ParsedProject {
            name: name.to_string(),
            tagline: tagline.map(str::to_string),
            description,
            screens,
        };
        tracing::debug!(
            project = %project.name,
            screens = project.screens.len(),
            tasks = project.task_count(),
            "parsed project outline"
        );
        Ok(project)
    }
}
