//! Main-content extraction
//!
//! Turns a full HTML page into the Markdown of its readable content:
//!
//! 1. Pick the best candidate container (`article`, `main`, ...) by score
//! 2. Serialize it back to HTML, dropping navigation, ads, hidden elements and
//!    link-heavy blocks
//! 3. Convert the filtered HTML to Markdown with htmd
//! 4. Clean up whitespace and drop repeated paragraphs
//!
//! The heuristic leans towards keeping text in [`ExtractionFavor::Recall`]
//! mode and towards dropping it in [`ExtractionFavor::Precision`] mode.

use crate::config::{ExtractionConfig, ExtractionFavor};
use htmd::HtmlToMarkdown;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Selectors tried for the main content container, strongest first
const CANDIDATE_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=main]",
    "#content",
    "#main-content",
    "#main",
    ".post-content",
    ".entry-content",
    ".article-body",
    ".content",
];

/// Elements that never carry readable content
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "svg", "canvas", "object", "embed",
    "nav", "aside", "form", "button", "input", "select", "textarea", "dialog", "ins",
];

/// Media elements, kept only when images are enabled
const MEDIA_TAGS: &[&str] = &["img", "picture", "video", "audio", "source", "map"];

/// Containers checked for link density
const BLOCK_TAGS: &[&str] = &["div", "section", "ul", "ol", "dl", "p", "table", "span"];

const VOID_TAGS: &[&str] = &["br", "hr", "img", "source", "wbr"];

/// Class/id fragments that mark boilerplate in every mode
const BOILERPLATE_MARKERS: &[&str] = &[
    "sidebar",
    "breadcrumb",
    "navbar",
    "menu",
    "share",
    "social",
    "cookie",
    "consent",
    "advert",
    "sponsor",
    "popup",
    "modal",
    "skip-link",
    "author-box",
];

/// Class/id fragments only dropped in precision mode
const PRECISION_MARKERS: &[&str] = &[
    "related",
    "promo",
    "newsletter",
    "subscribe",
    "banner",
    "pagination",
    "widget",
    "meta",
    "tags",
];

const COMMENT_MARKERS: &[&str] = &["comment", "disqus", "respond"];

/// Blocks longer than this many characters are never pruned for link density
const LINK_DENSITY_MAX_TEXT: usize = 1000;

/// Elements nested deeper than this below the content root are unwrapped to text
const MAX_NESTING_DEPTH: usize = 64;

/// Repeated paragraphs shorter than this are kept (separators, short labels)
const DEDUP_MIN_CHARS: usize = 10;

/// Extracts the main content of a page as Markdown
///
/// Returns `Ok(None)` when nothing readable remains or the result is shorter
/// than `min_content_chars`. Errors only come from the Markdown converter.
///
/// # Arguments
///
/// * `html` - The raw page markup, possibly malformed
/// * `config` - Extraction options (favor mode, tables, images, links, ...)
///
/// # Example
///
/// ```
/// use sitescribe::config::ExtractionConfig;
/// use sitescribe::extract::extract_main_content;
///
/// let html = r#"<html><body>
///     <nav><a href="/">Home</a></nav>
///     <article><h1>Hello</h1><p>This is the body of the article.</p></article>
/// </body></html>"#;
/// let markdown = extract_main_content(html, &ExtractionConfig::default())
///     .unwrap()
///     .unwrap();
/// assert!(markdown.contains("Hello"));
/// assert!(!markdown.contains("Home"));
/// ```
pub fn extract_main_content(
    html: &str,
    config: &ExtractionConfig,
) -> std::io::Result<Option<String>> {
    let document = Html::parse_document(html);
    let root = select_content_root(&document, config.favor);

    let filter = ContentFilter {
        config,
        link_density_limit: match config.favor {
            ExtractionFavor::Recall => 0.85,
            ExtractionFavor::Precision => 0.5,
        },
    };

    let mut filtered = String::new();
    let inside_article = matches!(root.value().name(), "article" | "main");
    filter.push_children(root, inside_article, 0, &mut filtered);

    if filtered.trim().is_empty() {
        return Ok(None);
    }

    let converter = HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript", "iframe", "svg"])
        .build();
    let markdown = converter.convert(&filtered)?;

    let mut content = clean_whitespace(&markdown);
    if config.deduplicate {
        content = deduplicate_paragraphs(&content);
    }

    if content.is_empty() || content.chars().count() < config.min_content_chars {
        return Ok(None);
    }
    Ok(Some(content))
}

fn candidate_selectors() -> &'static [Selector] {
    static SELECTORS: OnceLock<Vec<Selector>> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        CANDIDATE_SELECTORS
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .collect()
    })
}

fn body_selector() -> Option<&'static Selector> {
    static SELECTOR: OnceLock<Option<Selector>> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("body").ok()).as_ref()
}

/// Chooses the element whose children become the document content
///
/// The best-scoring candidate container wins. In recall mode a candidate
/// holding less than half of the body text is discarded in favour of the whole
/// body; in precision mode any candidate beats the body.
fn select_content_root(document: &Html, favor: ExtractionFavor) -> ElementRef<'_> {
    let body = body_selector()
        .and_then(|selector| document.select(selector).next())
        .unwrap_or_else(|| document.root_element());

    let best = candidate_selectors()
        .iter()
        .flat_map(|selector| document.select(selector))
        .map(|element| (score_content_node(element), element))
        .filter(|(score, _)| *score > 0.0)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, element)| element);

    let Some(candidate) = best else {
        return body;
    };

    match favor {
        ExtractionFavor::Precision => candidate,
        ExtractionFavor::Recall => {
            let candidate_text = text_stats(candidate).text;
            let body_text = text_stats(body).text;
            if candidate_text * 2 >= body_text {
                candidate
            } else {
                tracing::trace!(
                    candidate_text,
                    body_text,
                    "Candidate too small, falling back to body"
                );
                body
            }
        }
    }
}

/// Scores a candidate container by how much it looks like prose
fn score_content_node(element: ElementRef<'_>) -> f64 {
    let stats = text_stats(element);
    if stats.text == 0 {
        return 0.0;
    }

    let mut score = stats.text as f64;
    score += stats.paragraphs as f64 * 200.0;
    score += stats.headings as f64 * 100.0;
    score += stats.long_paragraphs as f64 * 300.0;
    score -= stats.links as f64 * 50.0;

    if stats.link_density() > 0.5 {
        score *= 0.5;
    }
    score
}

/// Character and element counts of a subtree, ignoring non-content tags
#[derive(Debug, Default, Clone, Copy)]
struct TextStats {
    text: usize,
    link_text: usize,
    links: usize,
    paragraphs: usize,
    long_paragraphs: usize,
    headings: usize,
}

impl TextStats {
    fn link_density(&self) -> f64 {
        if self.text == 0 {
            0.0
        } else {
            self.link_text as f64 / self.text as f64
        }
    }
}

fn text_stats(element: ElementRef<'_>) -> TextStats {
    let mut stats = TextStats::default();
    // Explicit stack: page nesting depth is attacker controlled
    let mut pending: Vec<_> = element.children().map(|child| (child, false)).collect();

    while let Some((node, in_link)) = pending.pop() {
        match node.value() {
            Node::Text(text) => {
                let len = text.trim().chars().count();
                stats.text += len;
                if in_link {
                    stats.link_text += len;
                }
            }
            Node::Element(el) => {
                let name = el.name();
                if matches!(name, "script" | "style" | "noscript" | "template") {
                    continue;
                }
                match name {
                    "a" => stats.links += 1,
                    "p" => {
                        stats.paragraphs += 1;
                        let len: usize = ElementRef::wrap(node)
                            .map(|p| p.text().map(|t| t.trim().chars().count()).sum())
                            .unwrap_or(0);
                        if len >= 100 {
                            stats.long_paragraphs += 1;
                        }
                    }
                    "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => stats.headings += 1,
                    _ => {}
                }
                let in_link = in_link || name == "a";
                pending.extend(node.children().map(|child| (child, in_link)));
            }
            _ => {}
        }
    }
    stats
}

/// Serializes the readable part of a subtree back to minimal HTML
struct ContentFilter<'c> {
    config: &'c ExtractionConfig,
    link_density_limit: f64,
}

impl ContentFilter<'_> {
    fn push_children(
        &self,
        element: ElementRef<'_>,
        inside_article: bool,
        depth: usize,
        out: &mut String,
    ) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => {
                    out.push_str(&html_escape::encode_text(&**text));
                }
                Node::Element(_) => {
                    if let Some(child_ref) = ElementRef::wrap(child) {
                        self.push_element(child_ref, inside_article, depth + 1, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn push_element(
        &self,
        element: ElementRef<'_>,
        inside_article: bool,
        depth: usize,
        out: &mut String,
    ) {
        let value = element.value();
        let name = value.name();

        if self.should_skip(element, inside_article) {
            return;
        }

        // Keeps both this serializer and the Markdown converter off deep recursion
        if depth > MAX_NESTING_DEPTH {
            push_text_only(element, out);
            return;
        }

        let inside_article = inside_article || matches!(name, "article" | "main");

        match name {
            "a" => {
                let href = value.attr("href").filter(|h| !h.trim().is_empty());
                match href {
                    Some(href) if self.config.include_links => {
                        out.push_str("<a href=\"");
                        out.push_str(&html_escape::encode_double_quoted_attribute(href));
                        out.push_str("\">");
                        self.push_children(element, inside_article, depth, out);
                        out.push_str("</a>");
                    }
                    _ => self.push_children(element, inside_article, depth, out),
                }
            }
            "img" => {
                let Some(src) = value.attr("src") else {
                    return;
                };
                out.push_str("<img src=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(src));
                out.push('"');
                if let Some(alt) = value.attr("alt") {
                    out.push_str(" alt=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(alt));
                    out.push('"');
                }
                out.push('>');
            }
            _ if VOID_TAGS.contains(&name) => {
                out.push('<');
                out.push_str(name);
                out.push('>');
            }
            _ => {
                out.push('<');
                out.push_str(name);
                out.push('>');
                self.push_children(element, inside_article, depth, out);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }

    fn should_skip(&self, element: ElementRef<'_>, inside_article: bool) -> bool {
        let value = element.value();
        let name = value.name();

        if SKIP_TAGS.contains(&name) {
            return true;
        }
        if MEDIA_TAGS.contains(&name) && !self.config.include_images {
            return true;
        }
        if name == "table" && !self.config.include_tables {
            return true;
        }
        if !inside_article {
            match name {
                "footer" => return true,
                "header" if self.config.favor == ExtractionFavor::Precision => return true,
                _ => {}
            }
        }
        if is_hidden(element) {
            return true;
        }
        if self.is_boilerplate(element) {
            return true;
        }

        if BLOCK_TAGS.contains(&name) {
            let stats = text_stats(element);
            if stats.links > 0
                && stats.text < LINK_DENSITY_MAX_TEXT
                && stats.link_density() > self.link_density_limit
            {
                tracing::trace!(
                    tag = name,
                    density = stats.link_density(),
                    "Pruning link-heavy block"
                );
                return true;
            }
        }

        false
    }

    fn is_boilerplate(&self, element: ElementRef<'_>) -> bool {
        let value = element.value();
        let names = value
            .attr("class")
            .into_iter()
            .chain(value.attr("id"))
            .flat_map(|attr| attr.split_whitespace())
            .map(|token| token.to_ascii_lowercase());

        for token in names {
            // Hyphen/underscore separated words are matched individually so
            // "shared-content" does not hit "share".
            let is_marker = |markers: &[&str]| {
                markers.iter().any(|marker| {
                    token == *marker
                        || token.starts_with(&format!("{marker}-"))
                        || token.starts_with(&format!("{marker}_"))
                        || token.ends_with(&format!("-{marker}"))
                        || token.ends_with(&format!("_{marker}"))
                        || token.contains(&format!("-{marker}-"))
                })
            };

            if is_marker(BOILERPLATE_MARKERS) || token == "ad" || token.starts_with("ad-") {
                return true;
            }
            if !self.config.include_comments
                && (is_marker(COMMENT_MARKERS) || token == "comments")
            {
                return true;
            }
            if self.config.favor == ExtractionFavor::Precision && is_marker(PRECISION_MARKERS) {
                return true;
            }
        }
        false
    }
}

/// Emits the text of a subtree without its markup, skipping non-content tags
fn push_text_only(element: ElementRef<'_>, out: &mut String) {
    let mut pending: Vec<_> = element.children().rev().collect();

    while let Some(node) = pending.pop() {
        match node.value() {
            Node::Text(text) => out.push_str(&html_escape::encode_text(&**text)),
            Node::Element(el) => {
                let name = el.name();
                if SKIP_TAGS.contains(&name) {
                    continue;
                }
                if BLOCK_TAGS.contains(&name) || name == "br" {
                    out.push(' ');
                }
                pending.extend(node.children().rev());
            }
            _ => {}
        }
    }
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("hidden").is_some() {
        return true;
    }
    if value
        .attr("aria-hidden")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        return true;
    }
    value.attr("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.contains("display:none") || compact.contains("visibility:hidden")
    })
}

/// Normalizes line endings, trims trailing spaces and collapses blank runs
fn clean_whitespace(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut blank_run = 0;

    for line in markdown.replace("\r\n", "\n").lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}

/// Removes paragraphs that repeat an earlier one verbatim
fn deduplicate_paragraphs(markdown: &str) -> String {
    let mut seen = HashSet::new();
    let mut kept: Vec<&str> = Vec::new();

    for block in markdown.split("\n\n") {
        let key = block.trim();
        if key.is_empty() {
            continue;
        }
        if key.chars().count() >= DEDUP_MIN_CHARS && !seen.insert(key) {
            continue;
        }
        kept.push(block);
    }

    kept.join("\n\n")
}
