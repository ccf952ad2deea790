use scraper::{Html, Selector};

use crate::markdown::collapse_blank_lines;

/// Elements dropped together with their content before conversion.
const DROPPED_ELEMENTS: &str = "head, script, style, meta, link";

/// Parse `html` and serialize it again without the dropped elements.
fn strip_non_content(html: &str) -> String {
    let mut document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(DROPPED_ELEMENTS) else {
        return html.to_string();
    };
    let dropped: Vec<_> = document.select(&selector).map(|element| element.id()).collect();
    for id in dropped {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    document.html()
}

/// Convert HTML emitted by an external tool to Markdown.
///
/// `image_mapping` rewrites image paths (`bindata/x.png` -> `images/x.png`)
/// before conversion.
pub fn to_markdown(html: &str, image_mapping: &[(String, String)]) -> String {
    let mut cleaned = strip_non_content(html);
    for (from, to) in image_mapping {
        cleaned = cleaned.replace(from.as_str(), to);
    }

    let markdown = html2md::parse_html(&cleaned);
    let mut markdown = collapse_blank_lines(&markdown);
    if !markdown.is_empty() {
        markdown.push('\n');
    }
    markdown
}
