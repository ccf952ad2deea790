use crate::error::Error;
use crate::model::{
    Block, ImageRef, Paragraph, Run, RunContent, RunStyle, Table, TableCell, TableRow, Warning,
};

use super::header::StyleTable;
use super::{hwpml, is_hwpml, num_attr};

/// Tables nested deeper than this abort the section instead of recursing further.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Upper bound for `rowSpan`/`colSpan`; larger values are clamped.
const MAX_SPAN: usize = 1024;

/// Elements that may appear between blocks or runs but never carry body text.
const SILENT_ELEMENTS: &[&str] = &[
    "secPr",
    "ctrl",
    "linesegarray",
    "fieldBegin",
    "fieldEnd",
    "bookmark",
    "markpenBegin",
    "markpenEnd",
    "titleMark",
    "indexmark",
    "insertBegin",
    "insertEnd",
    "deleteBegin",
    "deleteEnd",
    "rect",
    "ellipse",
    "arc",
    "polygon",
    "curve",
    "line",
    "connectLine",
    "textart",
    "ole",
    "equation",
    "video",
    "compose",
    "dutmal",
    "footNote",
    "endNote",
];

struct Walker<'a> {
    part: &'a str,
    styles: &'a StyleTable,
    warnings: &'a mut Vec<Warning>,
}

impl Walker<'_> {
    fn warn(&mut self, message: String) {
        self.warnings.push(Warning::new(self.part, message));
    }

    fn skip_unknown(&mut self, node: roxmltree::Node, context: &str) {
        let name = node.tag_name().name();
        if SILENT_ELEMENTS.contains(&name) {
            return;
        }
        self.warn(format!("skipped unsupported element <{name}> in {context}"));
    }

    /// Block-level children of a section root or a cell's sub-list.
    fn collect_blocks(
        &mut self,
        parent: roxmltree::Node,
        depth: usize,
        out: &mut Vec<Block>,
    ) -> Result<(), Error> {
        for child in parent.children().filter(|n| n.is_element()) {
            if is_hwpml(child, "p") {
                self.paragraph(child, depth, out)?;
            } else if is_hwpml(child, "tbl") {
                out.push(Block::Table(self.table(child, depth)?));
            } else if is_hwpml(child, "pic") {
                if let Some(img) = self.image(child) {
                    out.push(Block::Image(img));
                }
            } else {
                self.skip_unknown(child, "section body");
            }
        }
        Ok(())
    }

    fn paragraph(
        &mut self,
        p: roxmltree::Node,
        depth: usize,
        out: &mut Vec<Block>,
    ) -> Result<(), Error> {
        let style_id = p.attribute("styleIDRef");
        let heading_level = self
            .styles
            .heading_level(style_id, p.attribute("paraPrIDRef"));
        let fresh = || Paragraph {
            runs: Vec::new(),
            heading_level,
            style_id: style_id.map(|s| s.to_string()),
        };

        let start = out.len();
        let mut current = fresh();

        for child in p.children().filter(|n| n.is_element()) {
            if !is_hwpml(child, "run") {
                self.skip_unknown(child, "paragraph");
                continue;
            }
            let style = self.styles.run_style(child.attribute("charPrIDRef"));
            for item in child.children().filter(|n| n.is_element()) {
                if is_hwpml(item, "t") {
                    push_text_runs(item, style, &mut current.runs);
                } else if is_hwpml(item, "tbl") {
                    // A table splits the paragraph: text before, the table, text after.
                    flush_paragraph(&mut current, out, fresh);
                    out.push(Block::Table(self.table(item, depth)?));
                } else if is_hwpml(item, "pic") {
                    if let Some(img) = self.image(item) {
                        current.runs.push(Run {
                            content: RunContent::Image(img),
                            style,
                        });
                    }
                } else if is_hwpml(item, "container") {
                    // Grouped objects: only the pictures inside are kept.
                    for pic in item.descendants().filter(|n| is_hwpml(*n, "pic")) {
                        if let Some(img) = self.image(pic) {
                            current.runs.push(Run {
                                content: RunContent::Image(img),
                                style,
                            });
                        }
                    }
                } else {
                    self.skip_unknown(item, "run");
                }
            }
        }

        if !current.runs.is_empty() || out.len() == start {
            flush_paragraph(&mut current, out, fresh);
            if out.len() == start {
                out.push(Block::Paragraph(current));
            }
        }
        Ok(())
    }

    fn table(&mut self, tbl: roxmltree::Node, depth: usize) -> Result<Table, Error> {
        if depth >= MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep {
                part: self.part.to_string(),
                limit: MAX_NESTING_DEPTH,
            });
        }

        let mut rows = Vec::new();
        for tr in tbl.children().filter(|n| is_hwpml(*n, "tr")) {
            let mut cells = Vec::new();
            for tc in tr.children().filter(|n| is_hwpml(*n, "tc")) {
                let mut blocks = Vec::new();
                match hwpml(tc, "subList") {
                    Some(sub_list) => self.collect_blocks(sub_list, depth + 1, &mut blocks)?,
                    None => self.warn("table cell without sub-list".into()),
                }
                let span = hwpml(tc, "cellSpan");
                let address = hwpml(tc, "cellAddr").and_then(|a| {
                    Some((num_attr::<usize>(a, "rowAddr")?, num_attr::<usize>(a, "colAddr")?))
                });
                cells.push(TableCell {
                    blocks,
                    row_span: span
                        .and_then(|s| num_attr::<usize>(s, "rowSpan"))
                        .unwrap_or(1)
                        .clamp(1, MAX_SPAN),
                    col_span: span
                        .and_then(|s| num_attr::<usize>(s, "colSpan"))
                        .unwrap_or(1)
                        .clamp(1, MAX_SPAN),
                    address,
                });
            }
            rows.push(TableRow { cells });
        }

        Ok(Table {
            rows,
            row_count: num_attr(tbl, "rowCnt"),
            col_count: num_attr(tbl, "colCnt"),
        })
    }

    fn image(&mut self, pic: roxmltree::Node) -> Option<ImageRef> {
        let Some(bin_id) = pic
            .descendants()
            .find(|n| is_hwpml(*n, "img"))
            .and_then(|n| n.attribute("binaryItemIDRef"))
        else {
            self.warn("picture without binary item reference".into());
            return None;
        };

        let size = hwpml(pic, "orgSz")
            .or_else(|| hwpml(pic, "curSz"))
            .map(|n| (num_attr::<u32>(n, "width"), num_attr::<u32>(n, "height")))
            .filter(|(w, h)| w.unwrap_or(0) > 0 && h.unwrap_or(0) > 0);

        let alt = hwpml(pic, "shapeComment")
            .and_then(|n| n.text())
            .and_then(|t| t.trim().lines().next())
            .map(|line| line.trim().to_string())
            .filter(|t| !t.is_empty());

        Some(ImageRef {
            bin_id: bin_id.to_string(),
            width: size.and_then(|(w, _)| w),
            height: size.and_then(|(_, h)| h),
            alt,
        })
    }
}

fn push_text(runs: &mut Vec<Run>, text: &str, style: RunStyle) {
    if text.is_empty() {
        return;
    }
    if let Some(Run {
        content: RunContent::Text(prev),
        style: prev_style,
    }) = runs.last_mut()
        && *prev_style == style
    {
        prev.push_str(text);
        return;
    }
    runs.push(Run {
        content: RunContent::Text(text.to_string()),
        style,
    });
}

/// `hp:t` mixes text nodes with inline markers (`hp:lineBreak`, `hp:tab`, ...).
fn push_text_runs(t: roxmltree::Node, style: RunStyle, runs: &mut Vec<Run>) {
    for node in t.children() {
        if node.is_text() {
            if let Some(text) = node.text() {
                push_text(runs, text, style);
            }
            continue;
        }
        if !node.is_element() {
            continue;
        }
        match node.tag_name().name() {
            "lineBreak" => runs.push(Run {
                content: RunContent::LineBreak,
                style,
            }),
            "tab" | "nbSpace" | "fwSpace" => push_text(runs, " ", style),
            "hyphen" => push_text(runs, "-", style),
            _ => {}
        }
    }
}

/// Emit the paragraph collected so far. A paragraph made only of pictures
/// becomes standalone image blocks.
fn flush_paragraph(current: &mut Paragraph, out: &mut Vec<Block>, fresh: impl Fn() -> Paragraph) {
    if current.runs.is_empty() {
        return;
    }
    let para = std::mem::replace(current, fresh());
    let image_only = para.runs.iter().all(|r| match &r.content {
        RunContent::Image(_) => true,
        RunContent::Text(t) => t.trim().is_empty(),
        RunContent::LineBreak => true,
    });
    if image_only {
        for run in para.runs {
            if let RunContent::Image(img) = run.content {
                out.push(Block::Image(img));
            }
        }
    } else {
        out.push(Block::Paragraph(para));
    }
}

/// Translate one `sectionN.xml` body into blocks in document order.
///
/// Only an unparsable section root is an error; unknown elements are skipped
/// and reported through `warnings`.
pub fn parse_section(
    part: &str,
    xml: &str,
    styles: &StyleTable,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Block>, Error> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| Error::SectionParseError {
        part: part.to_string(),
        message: e.to_string(),
    })?;
    let mut walker = Walker {
        part,
        styles,
        warnings,
    };
    let mut blocks = Vec::new();
    walker.collect_blocks(doc.root_element(), 0, &mut blocks)?;
    Ok(blocks)
}
