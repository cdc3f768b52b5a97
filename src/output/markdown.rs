//! Markdown document rendering
//!
//! Every extracted page becomes one Markdown file with a small YAML front
//! matter block carrying its source URL and title.

use crate::extract::ExtractedDocument;

/// Renders a document as front matter followed by its content
///
/// Front matter values are double-quoted YAML scalars; backslashes, quotes
/// and line breaks are escaped. A missing title is written as an empty
/// string.
///
/// # Arguments
///
/// * `doc` - The extracted document; documents without content render an
///   empty body
///
/// # Returns
///
/// The complete file contents, ending with a newline
///
/// # Example
///
/// ```
/// use sitescribe::extract::ExtractedDocument;
/// use sitescribe::output::render_document;
///
/// let doc = ExtractedDocument::new(
///     "https://example.com/about",
///     "example.com",
///     Some("About".to_string()),
///     Some("We make things.".to_string()),
/// );
/// assert_eq!(
///     render_document(&doc),
///     "---\nsite_url: \"https://example.com/about\"\ntitle: \"About\"\n---\n\nWe make things.\n"
/// );
/// ```
pub fn render_document(doc: &ExtractedDocument) -> String {
    let mut md = String::new();

    md.push_str("---\n");
    md.push_str(&format!("site_url: \"{}\"\n", escape_scalar(&doc.url)));
    md.push_str(&format!(
        "title: \"{}\"\n",
        escape_scalar(doc.title.as_deref().unwrap_or(""))
    ));
    md.push_str("---\n\n");

    if let Some(content) = &doc.content {
        md.push_str(content.trim_end());
    }
    md.push('\n');

    md
}

fn escape_scalar(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}
