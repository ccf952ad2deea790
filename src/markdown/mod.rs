mod table;

use std::collections::HashSet;

use crate::model::{Block, Document, ImageRef, Paragraph, RunContent, RunStyle};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeadingStyle {
    /// `#`..`######` prefixes.
    #[default]
    Atx,
    /// Underlined levels 1 and 2, ATX beyond.
    Setext,
}

impl std::str::FromStr for HeadingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ATX" => Ok(HeadingStyle::Atx),
            "SETEXT" => Ok(HeadingStyle::Setext),
            other => Err(format!("unknown heading style '{other}'")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Directory prefix of image links, relative to the Markdown file.
    pub image_dir: String,
    pub heading_style: HeadingStyle,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_dir: "images".into(),
            heading_style: HeadingStyle::Atx,
        }
    }
}

/// An image the Markdown links to; the bytes stay in the container until
/// the caller asks for them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferencedImage {
    pub id: String,
    pub file_name: String,
    pub archive_path: String,
}

pub struct Rendered {
    pub markdown: String,
    pub images: Vec<ReferencedImage>,
}

/// Where inline content ends up; decides how breaks and pipes are written.
#[derive(Clone, Copy, PartialEq)]
enum Context {
    Body,
    Heading,
    Cell,
}

pub(crate) struct Renderer<'a> {
    doc: &'a Document,
    options: &'a RenderOptions,
    images: Vec<ReferencedImage>,
    seen: HashSet<String>,
}

pub fn render(doc: &Document, options: &RenderOptions) -> Rendered {
    let mut renderer = Renderer {
        doc,
        options,
        images: Vec::new(),
        seen: HashSet::new(),
    };

    let mut chunks: Vec<String> = Vec::new();
    for section in &doc.sections {
        for block in &section.blocks {
            let chunk = renderer.block(block);
            if !chunk.trim().is_empty() {
                chunks.push(chunk);
            }
        }
    }

    let mut markdown = collapse_blank_lines(&chunks.join("\n\n"));
    if !markdown.is_empty() {
        markdown.push('\n');
    }

    Rendered {
        markdown,
        images: renderer.images,
    }
}

impl Renderer<'_> {
    fn block(&mut self, block: &Block) -> String {
        match block {
            Block::Paragraph(p) => self.paragraph(p),
            Block::Table(t) => self.table(t),
            Block::Image(img) => self.image(img, Context::Body),
        }
    }

    fn paragraph(&mut self, para: &Paragraph) -> String {
        if para.is_empty() {
            return String::new();
        }
        let level = para.heading_level.min(6) as usize;
        if level == 0 {
            let text = self.inline(para, Context::Body);
            return text
                .split('\n')
                .map(escape_line_start)
                .collect::<Vec<_>>()
                .join("\n");
        }

        let text = self.inline(para, Context::Heading);
        let text = text.trim();
        match self.options.heading_style {
            HeadingStyle::Setext if level <= 2 => {
                let marker = if level == 1 { "=" } else { "-" };
                format!("{text}\n{}", marker.repeat(text.chars().count().max(3)))
            }
            _ => format!("{} {text}", "#".repeat(level)),
        }
    }

    /// Render runs, merging neighbours that share emphasis before wrapping.
    fn inline(&mut self, para: &Paragraph, ctx: Context) -> String {
        let mut out = String::new();
        let mut pending = String::new();
        let mut pending_style = RunStyle::default();

        for run in &para.runs {
            match &run.content {
                RunContent::Text(text) => {
                    if !pending.is_empty() && !same_emphasis(pending_style, run.style) {
                        out.push_str(&emphasize(&pending, pending_style));
                        pending.clear();
                    }
                    pending_style = run.style;
                    pending.push_str(&escape_text(text, ctx == Context::Cell));
                }
                RunContent::LineBreak => {
                    out.push_str(&emphasize(&std::mem::take(&mut pending), pending_style));
                    out.push_str(match ctx {
                        Context::Body => "  \n",
                        Context::Heading => " ",
                        Context::Cell => "<br>",
                    });
                }
                RunContent::Image(img) => {
                    out.push_str(&emphasize(&std::mem::take(&mut pending), pending_style));
                    out.push_str(&self.image(img, ctx));
                }
            }
        }
        out.push_str(&emphasize(&pending, pending_style));

        if ctx == Context::Body {
            out.trim_end_matches(['\n', ' ']).trim_start().to_string()
        } else {
            out.trim().to_string()
        }
    }

    fn image(&mut self, img: &ImageRef, ctx: Context) -> String {
        let file_name = match self.doc.bin_data.get(&img.bin_id) {
            Some(item) => {
                let file_name = item.file_name().to_string();
                if self.seen.insert(img.bin_id.clone()) {
                    self.images.push(ReferencedImage {
                        id: img.bin_id.clone(),
                        file_name: file_name.clone(),
                        archive_path: item.path.clone(),
                    });
                }
                file_name
            }
            None => {
                log::warn!("Image '{}' has no BinData entry", img.bin_id);
                img.bin_id.clone()
            }
        };

        let path = if self.options.image_dir.is_empty() {
            file_name
        } else {
            format!("{}/{}", self.options.image_dir.trim_end_matches('/'), file_name)
        };
        let alt = img.alt.as_deref().unwrap_or(&img.bin_id);
        let mut alt = alt
            .replace(['\n', '\r'], " ")
            .replace('[', "\\[")
            .replace(']', "\\]");
        if ctx == Context::Cell {
            alt = alt.replace('|', "\\|");
        }
        format!("![{alt}]({})", path.replace(' ', "%20"))
    }

    /// Single-line text of nested blocks, for places that cannot hold blocks.
    pub(crate) fn flat_text(&mut self, blocks: &[Block]) -> String {
        let mut parts = Vec::new();
        for block in blocks {
            let text = match block {
                Block::Paragraph(p) if !p.is_empty() => self.inline(p, Context::Cell),
                Block::Paragraph(_) => continue,
                Block::Image(img) => self.image(img, Context::Cell),
                Block::Table(t) => self.table_as_text(t),
            };
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join("<br>")
    }
}

fn same_emphasis(a: RunStyle, b: RunStyle) -> bool {
    a.bold == b.bold
        && a.italic == b.italic
        && a.strikeout == b.strikeout
        && a.superscript == b.superscript
        && a.subscript == b.subscript
}

/// Wrap text in emphasis markers, keeping surrounding whitespace outside.
fn emphasize(text: &str, style: RunStyle) -> String {
    let inner = text.trim();
    if inner.is_empty() {
        return text.to_string();
    }
    let start = text.len() - text.trim_start().len();
    let lead = &text[..start];
    let trail = &text[start + inner.len()..];

    let mut s = inner.to_string();
    if style.superscript {
        s = format!("<sup>{s}</sup>");
    } else if style.subscript {
        s = format!("<sub>{s}</sub>");
    }
    let marker = match (style.bold, style.italic) {
        (true, true) => "***",
        (true, false) => "**",
        (false, true) => "*",
        (false, false) => "",
    };
    if !marker.is_empty() {
        s = format!("{marker}{s}{marker}");
    }
    if style.strikeout {
        s = format!("~~{s}~~");
    }
    format!("{lead}{s}{trail}")
}

fn escape_text(text: &str, in_cell: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '*' | '_' | '`' => {
                out.push('\\');
                out.push(c);
            }
            '|' if in_cell => out.push_str("\\|"),
            '\n' | '\r' | '\t' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a body line whose first characters would otherwise start a
/// heading, quote, list item or thematic break.
fn escape_line_start(line: &str) -> String {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];

    let needs_prefix = trimmed.starts_with('#')
        || trimmed.starts_with('>')
        || trimmed.starts_with("- ")
        || trimmed.starts_with("+ ")
        || trimmed == "-"
        || trimmed == "+"
        || (trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-' || c == '='));
    if needs_prefix {
        return format!("{indent}\\{trimmed}");
    }

    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 && digits <= 9 {
        let rest = &trimmed[digits..];
        if rest.starts_with(". ") || rest.starts_with(") ") || rest == "." || rest == ")" {
            return format!("{indent}{}\\{rest}", &trimmed[..digits]);
        }
    }
    format!("{indent}{trimmed}")
}

pub(crate) fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.trim().lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
            out.push('\n');
        } else {
            blank_run = 0;
            out.push_str(line.trim_end_matches([' ', '\t']).trim_end_matches('\u{a0}'));
            if line.ends_with("  ") {
                out.push_str("  ");
            }
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}
