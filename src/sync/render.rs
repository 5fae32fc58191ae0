//! Text collaborators: changelog rendering and readme parsing

#[cfg(test)]
use mockall::automock;

use indexmap::IndexMap;
use regex::Regex;

use crate::package::types::{PackageIdentity, ReadmeInfo};
use crate::sync::error::SyncError;

/// Renders changelog markdown to HTML
#[cfg_attr(test, automock)]
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, text: &str) -> String;
}

/// Parses a readme into its structured form
#[cfg_attr(test, automock)]
pub trait ReadmeParser: Send + Sync {
    fn parse(&self, text: &str, identity: &PackageIdentity) -> Result<ReadmeInfo, SyncError>;
}

/// CommonMark renderer backed by the `markdown` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownHtmlRenderer;

impl MarkdownRenderer for MarkdownHtmlRenderer {
    fn render(&self, text: &str) -> String {
        markdown::to_html(text)
    }
}

/// Parser for `readme.txt` files
///
/// ```text
/// === Widget ===
/// Requires at least: 6.0
/// Stable tag: 1.2.0
///
/// Short description.
///
/// == Changelog ==
/// ...
/// ```
pub struct TxtReadmeParser {
    /// Regex for the title line: `=== Name ===`
    title_re: Regex,
    /// Regex for a section heading: `== Section ==`
    section_re: Regex,
    /// Regex for a header line: `Key: value`
    header_re: Regex,
}

impl TxtReadmeParser {
    pub fn new() -> Self {
        Self {
            title_re: Regex::new(r"^===\s*(.+?)\s*===$").unwrap(),
            section_re: Regex::new(r"^==\s*(.+?)\s*==$").unwrap(),
            header_re: Regex::new(r"^([A-Za-z][A-Za-z ]*?)\s*:\s*(.+)$").unwrap(),
        }
    }
}

impl Default for TxtReadmeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadmeParser for TxtReadmeParser {
    fn parse(&self, text: &str, identity: &PackageIdentity) -> Result<ReadmeInfo, SyncError> {
        let mut lines = text.lines().map(str::trim).skip_while(|line| line.is_empty());

        let name = lines
            .next()
            .and_then(|line| self.title_re.captures(line))
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| {
                SyncError::Parse(format!("readme.txt of {}: missing title line", identity.repo))
            })?;

        let mut info = ReadmeInfo {
            name: Some(name),
            ..ReadmeInfo::default()
        };

        let mut headers_done = false;
        let mut intro: Vec<&str> = Vec::new();
        let mut sections: IndexMap<String, Vec<&str>> = IndexMap::new();
        let mut current: Option<String> = None;

        for line in lines {
            if let Some(caps) = self.section_re.captures(line) {
                let title = caps[1].to_lowercase();
                sections.entry(title.clone()).or_default();
                current = Some(title);
                continue;
            }

            if let Some(title) = &current {
                sections.entry(title.clone()).or_default().push(line);
                continue;
            }

            if !headers_done {
                if line.is_empty() {
                    headers_done = true;
                    continue;
                }
                if let Some(caps) = self.header_re.captures(line) {
                    let value = Some(caps[2].trim().to_string());
                    match caps[1].to_lowercase().as_str() {
                        "requires at least" => info.requires = value,
                        "tested up to" => info.tested = value,
                        "requires php" => info.requires_php = value,
                        "stable tag" => info.stable_tag = value,
                        _ => {}
                    }
                    continue;
                }
                headers_done = true;
            }

            intro.push(line);
        }

        let short_description = intro.join(" ").trim().to_string();
        if !short_description.is_empty() {
            info.short_description = Some(short_description);
        }

        info.sections = sections
            .into_iter()
            .map(|(title, body)| (title, body.join("\n").trim().to_string()))
            .collect();

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::types::PackageKind;

    const README: &str = "=== Widget ===
Contributors: acme
Requires at least: 6.0
Tested up to: 6.5
Requires PHP: 8.0
Stable tag: 1.2.0

Adds widgets to your site.

== Description ==
Widget does things.

== Changelog ==
= 1.2.0 =
* Fixed a bug
";

    fn identity() -> PackageIdentity {
        PackageIdentity::new(PackageKind::Plugin, "acme", "widget", "master")
    }

    #[test]
    fn parse_reads_title_and_headers() {
        let info = TxtReadmeParser::new().parse(README, &identity()).unwrap();

        assert_eq!(info.name.as_deref(), Some("Widget"));
        assert_eq!(info.requires.as_deref(), Some("6.0"));
        assert_eq!(info.tested.as_deref(), Some("6.5"));
        assert_eq!(info.requires_php.as_deref(), Some("8.0"));
        assert_eq!(info.stable_tag.as_deref(), Some("1.2.0"));
        assert_eq!(
            info.short_description.as_deref(),
            Some("Adds widgets to your site.")
        );
    }

    #[test]
    fn parse_collects_sections_in_document_order() {
        let info = TxtReadmeParser::new().parse(README, &identity()).unwrap();

        let titles: Vec<_> = info.sections.keys().cloned().collect();
        assert_eq!(titles, vec!["description", "changelog"]);
        assert_eq!(info.sections["description"], "Widget does things.");
        assert_eq!(info.sections["changelog"], "= 1.2.0 =\n* Fixed a bug");
    }

    #[test]
    fn parse_rejects_text_without_title() {
        let result = TxtReadmeParser::new().parse("Just some text", &identity());
        assert!(matches!(result, Err(SyncError::Parse(_))));
    }

    #[test]
    fn markdown_renderer_produces_html() {
        let html = MarkdownHtmlRenderer.render("# 1.0.0\n\n* first release");
        assert!(html.contains("<h1>1.0.0</h1>"));
        assert!(html.contains("<li>first release</li>"));
    }
}
