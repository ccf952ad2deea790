use std::collections::HashMap;

use crate::error::Error;
use crate::model::RunStyle;

use super::{hwpml, is_hwpml, num_attr};

/// Markdown has six heading levels; deeper outline levels clamp to the last.
const MAX_HEADING_LEVEL: u8 = 6;

/// Style-name prefixes (English and Korean) that carry an outline level.
const HEADING_NAME_PREFIXES: &[&str] = &["Outline ", "개요 ", "Heading ", "제목 "];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleDef {
    pub name: String,
    pub eng_name: String,
    pub para_pr: Option<String>,
    pub char_pr: Option<String>,
    /// 0 for body text.
    pub heading_level: u8,
}

/// Lookup tables built once from `Contents/header.xml`.
#[derive(Clone, Debug, Default)]
pub struct StyleTable {
    pub styles: HashMap<String, StyleDef>,
    /// Paragraph property ID -> outline heading level (only non-zero levels).
    pub para_headings: HashMap<String, u8>,
    pub char_styles: HashMap<String, RunStyle>,
}

impl StyleTable {
    /// The paragraph's own outline level wins over the level implied by its style.
    pub fn heading_level(&self, style_id: Option<&str>, para_pr: Option<&str>) -> u8 {
        if let Some(level) = para_pr.and_then(|id| self.para_headings.get(id)) {
            return *level;
        }
        style_id
            .and_then(|id| self.styles.get(id))
            .map(|s| s.heading_level)
            .unwrap_or(0)
    }

    pub fn run_style(&self, char_pr: Option<&str>) -> RunStyle {
        char_pr
            .and_then(|id| self.char_styles.get(id))
            .copied()
            .unwrap_or_default()
    }
}

fn clamp_level(level: u8) -> u8 {
    level.min(MAX_HEADING_LEVEL)
}

fn level_from_name(name: &str) -> Option<u8> {
    HEADING_NAME_PREFIXES.iter().find_map(|prefix| {
        let level = name.strip_prefix(prefix)?.trim().parse::<u8>().ok()?;
        (level >= 1).then(|| clamp_level(level))
    })
}

fn parse_char_pr(node: roxmltree::Node) -> RunStyle {
    let underline = hwpml(node, "underline")
        .and_then(|n| n.attribute("type"))
        .is_some_and(|t| !t.eq_ignore_ascii_case("NONE"));
    let strikeout = hwpml(node, "strikeout")
        .and_then(|n| n.attribute("shape"))
        .is_some_and(|s| !s.eq_ignore_ascii_case("NONE"));
    RunStyle {
        bold: hwpml(node, "bold").is_some(),
        italic: hwpml(node, "italic").is_some(),
        underline,
        strikeout,
        superscript: hwpml(node, "supscript").is_some(),
        subscript: hwpml(node, "subscript").is_some(),
    }
}

/// `hh:heading type="OUTLINE" level="L"` marks outline level L+1.
fn parse_para_heading(node: roxmltree::Node) -> Option<u8> {
    let heading = hwpml(node, "heading")?;
    if heading.attribute("type") != Some("OUTLINE") {
        return None;
    }
    let level = num_attr::<u8>(heading, "level").unwrap_or(0);
    Some(clamp_level(level.saturating_add(1)))
}

pub fn parse_header(xml: &str) -> Result<StyleTable, Error> {
    let doc =
        roxmltree::Document::parse(xml).map_err(|e| Error::MalformedHeader(e.to_string()))?;

    let mut table = StyleTable::default();

    for node in doc.descendants() {
        if is_hwpml(node, "charPr") {
            if let Some(id) = node.attribute("id") {
                table.char_styles.insert(id.to_string(), parse_char_pr(node));
            }
        } else if is_hwpml(node, "paraPr") {
            if let (Some(id), Some(level)) = (node.attribute("id"), parse_para_heading(node)) {
                table.para_headings.insert(id.to_string(), level);
            }
        }
    }

    for node in doc.descendants().filter(|n| is_hwpml(*n, "style")) {
        let Some(id) = node.attribute("id") else {
            continue;
        };
        if node.attribute("type").is_some_and(|t| t != "PARA") {
            continue;
        }
        let name = node.attribute("name").unwrap_or("").to_string();
        let eng_name = node.attribute("engName").unwrap_or("").to_string();
        let para_pr = node.attribute("paraPrIDRef").map(|s| s.to_string());
        let char_pr = node.attribute("charPrIDRef").map(|s| s.to_string());

        let heading_level = level_from_name(&eng_name)
            .or_else(|| level_from_name(&name))
            .or_else(|| {
                para_pr
                    .as_deref()
                    .and_then(|id| table.para_headings.get(id))
                    .copied()
            })
            .unwrap_or(0);

        table.styles.insert(
            id.to_string(),
            StyleDef {
                name,
                eng_name,
                para_pr,
                char_pr,
                heading_level,
            },
        );
    }

    Ok(table)
}
