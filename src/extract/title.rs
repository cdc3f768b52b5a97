use scraper::{Html, Selector};

/// Extracts the document title from `<title>`
///
/// Surrounding whitespace is stripped. A missing or blank title yields None,
/// which is not an error.
///
/// # Example
///
/// ```
/// use sitescribe::extract::extract_title;
///
/// let html = "<html><head><title>  Getting Started </title></head></html>";
/// assert_eq!(extract_title(html), Some("Getting Started".to_string()));
/// assert_eq!(extract_title("<p>no head</p>"), None);
/// ```
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
