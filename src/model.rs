use std::collections::BTreeMap;

pub struct Document {
    pub sections: Vec<Section>,
    /// Binary item ID -> entry in `BinData/`.
    pub bin_data: BTreeMap<String, BinItem>,
}

impl Document {
    pub fn block_count(&self) -> usize {
        self.sections.iter().map(|s| s.blocks.len()).sum()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BinItem {
    pub path: String,
    pub media_type: Option<String>,
}

impl BinItem {
    /// File name used when the item is written next to the Markdown.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

pub struct Section {
    /// Numeric suffix of the `Contents/sectionN.xml` part.
    pub index: usize,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Image(ImageRef),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    /// 0 for body text, 1..=6 for headings.
    pub heading_level: u8,
    pub style_id: Option<String>,
}

impl Paragraph {
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| match &r.content {
            RunContent::Text(t) => t.trim().is_empty(),
            RunContent::LineBreak => true,
            RunContent::Image(_) => false,
        })
    }

    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            match &run.content {
                RunContent::Text(t) => out.push_str(t),
                RunContent::LineBreak => out.push('\n'),
                RunContent::Image(_) => {}
            }
        }
        out
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub superscript: bool,
    pub subscript: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub content: RunContent,
    pub style: RunStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunContent {
    Text(String),
    LineBreak,
    Image(ImageRef),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageRef {
    pub bin_id: String,
    /// Intrinsic size in HWPUNIT (1/7200 inch), when the picture declares one.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub alt: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<TableRow>,
    pub row_count: Option<usize>,
    pub col_count: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableCell {
    pub blocks: Vec<Block>,
    pub row_span: usize,
    pub col_span: usize,
    /// `(row, col)` from `hp:cellAddr`.
    pub address: Option<(usize, usize)>,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            row_span: 1,
            col_span: 1,
            address: None,
        }
    }
}

/// A problem that was recovered from locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    pub part: String,
    pub message: String,
}

impl Warning {
    pub fn new(part: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.part, self.message)
    }
}
