//! Page parsing and plain-text rendering

use rand::seq::SliceRandom;

use crate::error::{Result, TldrError};

/// How a page is turned into output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Parsed and formatted for the terminal
    #[default]
    Formatted,
    /// Raw markdown, unprocessed
    Markdown,
    /// Formatted, keeping one example chosen at random
    RandomExample,
}

impl RenderMode {
    /// Build the mode from the `markdown` / `random example` switches
    pub fn from_flags(markdown: bool, random_example: bool) -> Result<Self> {
        match (markdown, random_example) {
            (true, true) => Err(TldrError::InvalidOptions(
                "markdown output cannot be combined with a random example".to_string(),
            )),
            (true, false) => Ok(RenderMode::Markdown),
            (false, true) => Ok(RenderMode::RandomExample),
            (false, false) => Ok(RenderMode::Formatted),
        }
    }
}

/// A parsed page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub name: String,
    pub description: Vec<String>,
    pub examples: Vec<Example>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub description: String,
    pub code: String,
}

/// Parse page markdown. Unknown lines are ignored.
pub fn parse(content: &str) -> Page {
    let mut page = Page::default();
    let mut pending: Option<String> = None;

    for line in content.lines().map(str::trim) {
        if let Some(title) = line.strip_prefix("# ") {
            page.name = title.trim().to_string();
        } else if let Some(text) = line.strip_prefix('>') {
            page.description.push(text.trim().to_string());
        } else if let Some(text) = line.strip_prefix("- ") {
            pending = Some(text.trim().to_string());
        } else if line.len() >= 2 && line.starts_with('`') && line.ends_with('`') {
            let code = line[1..line.len() - 1].to_string();
            page.examples.push(Example {
                description: pending.take().unwrap_or_default(),
                code,
            });
        }
    }

    page
}

/// Render page content according to `mode`
pub fn render(content: &str, mode: RenderMode) -> String {
    match mode {
        RenderMode::Markdown => content.to_string(),
        RenderMode::Formatted => format_page(&parse(content)),
        RenderMode::RandomExample => {
            let mut page = parse(content);
            if let Some(example) = page.examples.choose(&mut rand::thread_rng()).cloned() {
                page.examples = vec![example];
            }
            format_page(&page)
        }
    }
}

fn format_page(page: &Page) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("  {}\n\n", page.name));

    for line in &page.description {
        out.push_str(&format!("  {}\n", strip_markup(line)));
    }
    if !page.description.is_empty() {
        out.push('\n');
    }

    for example in &page.examples {
        out.push_str(&format!("  - {}\n", strip_markup(&example.description)));
        out.push_str(&format!("    {}\n\n", strip_placeholders(&example.code)));
    }

    out
}

/// `<https://x>` -> `https://x`, `` `ls` `` -> `ls`
fn strip_markup(text: &str) -> String {
    text.replace(['<', '>', '`'], "")
}

/// `tar cf {{target.tar}}` -> `tar cf target.tar`
fn strip_placeholders(code: &str) -> String {
    code.replace("{{", "").replace("}}", "")
}
