mod container;
mod header;
mod section;

use std::io::{Read, Seek};
use std::path::Path;

use crate::error::Error;
use crate::model::{Document, Section, Warning};

pub use container::{Container, Version, is_hwpx, is_hwpx_bytes};
pub use header::{StyleDef, StyleTable, parse_header};
pub use section::{MAX_NESTING_DEPTH, parse_section};

/// Every HWPML namespace (2011 paragraph/section/core/head, 2016 paragraph, ...)
/// shares this prefix; element matching is done on local name within it.
pub(crate) const HWPML_NS_PREFIX: &str = "http://www.hancom.co.kr/hwpml/";

pub(crate) const HEADER_PART: &str = "Contents/header.xml";

pub(crate) fn is_hwpml(node: roxmltree::Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node
            .tag_name()
            .namespace()
            .is_some_and(|ns| ns.starts_with(HWPML_NS_PREFIX))
}

pub(crate) fn hwpml<'a>(
    node: roxmltree::Node<'a, 'a>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_hwpml(*n, name))
}

pub(crate) fn num_attr<T: std::str::FromStr>(node: roxmltree::Node, name: &str) -> Option<T> {
    node.attribute(name).and_then(|v| v.trim().parse::<T>().ok())
}

/// Parts are UTF-8, occasionally with a byte order mark.
pub(crate) fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Document tree plus everything that was recovered from along the way.
pub struct Parsed {
    pub document: Document,
    pub warnings: Vec<Warning>,
}

pub fn parse(path: &Path) -> Result<Parsed, Error> {
    let mut container = Container::open_path(path)?;
    parse_container(&mut container)
}

pub fn parse_bytes(bytes: &[u8]) -> Result<Parsed, Error> {
    let mut container = Container::open(std::io::Cursor::new(bytes))?;
    parse_container(&mut container)
}

pub fn parse_container<R: Read + Seek>(container: &mut Container<R>) -> Result<Parsed, Error> {
    let mut warnings = container.take_warnings();

    let styles = match container.read_text(HEADER_PART) {
        Some(xml) => match parse_header(strip_bom(&xml)) {
            Ok(styles) => styles,
            Err(e) => {
                warnings.push(Warning::new(
                    HEADER_PART,
                    format!("{e}; paragraphs fall back to body text"),
                ));
                StyleTable::default()
            }
        },
        None => {
            warnings.push(Warning::new(HEADER_PART, "missing header part"));
            StyleTable::default()
        }
    };
    log::debug!(
        "Style table: {} styles, {} paragraph properties, {} character properties",
        styles.styles.len(),
        styles.para_headings.len(),
        styles.char_styles.len()
    );

    let parts = container.sections().to_vec();
    let mut sections = Vec::with_capacity(parts.len());
    for (index, part) in parts {
        let bytes = container.read_part(&part)?;
        let xml = String::from_utf8(bytes).map_err(|e| Error::SectionParseError {
            part: part.clone(),
            message: format!("not valid UTF-8: {e}"),
        })?;
        let blocks = parse_section(&part, strip_bom(&xml), &styles, &mut warnings)?;
        log::debug!("{part}: {} blocks", blocks.len());
        sections.push(Section { index, blocks });
    }

    for w in &warnings {
        log::warn!("{w}");
    }

    Ok(Parsed {
        document: Document {
            sections,
            bin_data: container.bin_data().clone(),
        },
        warnings,
    })
}
