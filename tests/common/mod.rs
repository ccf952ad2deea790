#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;

pub const NS_SECTION: &str = "http://www.hancom.co.kr/hwpml/2011/section";
pub const NS_PARA: &str = "http://www.hancom.co.kr/hwpml/2011/paragraph";
pub const NS_CORE: &str = "http://www.hancom.co.kr/hwpml/2011/core";
pub const NS_HEAD: &str = "http://www.hancom.co.kr/hwpml/2011/head";

/// Style IDs of the default header.
pub const STYLE_BODY: u32 = 0;
pub const STYLE_OUTLINE_1: u32 = 1;
pub const STYLE_OUTLINE_2: u32 = 2;
/// Character property IDs of the default header.
pub const CHAR_PLAIN: u32 = 0;
pub const CHAR_BOLD: u32 = 1;
pub const CHAR_ITALIC: u32 = 2;

/// Header with body text, two outline styles and plain/bold/italic runs.
pub fn default_header() -> String {
    format!(
        r##"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<hh:head xmlns:hh="{NS_HEAD}" xmlns:hc="{NS_CORE}" version="1.4" secCnt="1">
  <hh:refList>
    <hh:charProperties itemCnt="3">
      <hh:charPr id="0" height="1000" textColor="#000000"/>
      <hh:charPr id="1" height="1000" textColor="#000000"><hh:bold/></hh:charPr>
      <hh:charPr id="2" height="1000" textColor="#000000"><hh:italic/><hh:underline type="NONE" shape="SOLID" color="#000000"/></hh:charPr>
    </hh:charProperties>
    <hh:paraProperties itemCnt="3">
      <hh:paraPr id="0"><hh:heading type="NONE" idRef="0" level="0"/></hh:paraPr>
      <hh:paraPr id="1"><hh:heading type="OUTLINE" idRef="0" level="0"/></hh:paraPr>
      <hh:paraPr id="2"><hh:heading type="OUTLINE" idRef="0" level="1"/></hh:paraPr>
    </hh:paraProperties>
    <hh:styles itemCnt="3">
      <hh:style id="0" type="PARA" name="바탕글" engName="Normal" paraPrIDRef="0" charPrIDRef="0" nextStyleIDRef="0" langID="1042"/>
      <hh:style id="1" type="PARA" name="개요 1" engName="Outline 1" paraPrIDRef="1" charPrIDRef="0" nextStyleIDRef="1" langID="1042"/>
      <hh:style id="2" type="PARA" name="개요 2" engName="Outline 2" paraPrIDRef="2" charPrIDRef="0" nextStyleIDRef="2" langID="1042"/>
    </hh:styles>
  </hh:refList>
</hh:head>"##
    )
}

/// Wrap block-level markup in a section root.
pub fn section_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<hs:sec xmlns:hs="{NS_SECTION}" xmlns:hp="{NS_PARA}" xmlns:hc="{NS_CORE}">{body}</hs:sec>"#
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn run(char_pr: u32, text: &str) -> String {
    format!(
        r#"<hp:run charPrIDRef="{char_pr}"><hp:t>{}</hp:t></hp:run>"#,
        escape(text)
    )
}

/// Paragraph in the given style; its paragraph properties follow the style.
pub fn styled_para(style: u32, runs: &str) -> String {
    format!(r#"<hp:p id="0" paraPrIDRef="{style}" styleIDRef="{style}" pageBreak="0" columnBreak="0" merged="0">{runs}<hp:linesegarray><hp:lineseg textpos="0" vertpos="0"/></hp:linesegarray></hp:p>"#)
}

pub fn para(text: &str) -> String {
    styled_para(STYLE_BODY, &run(CHAR_PLAIN, text))
}

pub fn heading(level: u32, text: &str) -> String {
    let style = match level {
        1 => STYLE_OUTLINE_1,
        _ => STYLE_OUTLINE_2,
    };
    styled_para(style, &run(CHAR_PLAIN, text))
}

/// One table cell; `content` is block-level markup for its sub-list.
pub fn cell(row: usize, col: usize, row_span: usize, col_span: usize, content: &str) -> String {
    format!(
        r#"<hp:tc name="" header="0" hasMargin="0" protect="0" editable="0" dirty="0" borderFillIDRef="1"><hp:subList id="" textDirection="HORIZONTAL" lineWrap="BREAK" vertAlign="CENTER">{content}</hp:subList><hp:cellAddr colAddr="{col}" rowAddr="{row}"/><hp:cellSpan colSpan="{col_span}" rowSpan="{row_span}"/><hp:cellSz width="7000" height="1000"/></hp:tc>"#
    )
}

/// Table from pre-built rows of `cell` markup, wrapped in its own paragraph
/// the way Hangul stores it.
pub fn table_of_cells(rows: &[Vec<String>]) -> String {
    let col_cnt = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let trs: String = rows
        .iter()
        .map(|cells| format!("<hp:tr>{}</hp:tr>", cells.concat()))
        .collect();
    let tbl = format!(
        r#"<hp:tbl id="1" rowCnt="{}" colCnt="{col_cnt}" cellSpacing="0" borderFillIDRef="1"><hp:sz width="42000" height="3000"/>{trs}</hp:tbl>"#,
        rows.len()
    );
    styled_para(STYLE_BODY, &format!(r#"<hp:run charPrIDRef="0">{tbl}<hp:t/></hp:run>"#))
}

/// Plain-text table without spans.
pub fn table(rows: &[&[&str]]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(r, cells)| {
            cells
                .iter()
                .enumerate()
                .map(|(c, text)| cell(r, c, 1, 1, &para(text)))
                .collect()
        })
        .collect();
    table_of_cells(&rows)
}

/// Picture referencing a binary item, inside a run.
pub fn pic(bin_id: &str, comment: Option<&str>) -> String {
    let comment = comment
        .map(|c| format!("<hp:shapeComment>{}</hp:shapeComment>", escape(c)))
        .unwrap_or_default();
    format!(
        r#"<hp:pic id="2" zOrder="0" numberingType="PICTURE" textWrap="TOP_AND_BOTTOM"><hp:orgSz width="14400" height="7200"/><hp:curSz width="14400" height="7200"/><hc:img binaryItemIDRef="{bin_id}" bright="0" contrast="0" effect="REAL_PIC" alpha="0"/>{comment}</hp:pic>"#
    )
}

pub fn pic_para(bin_id: &str, comment: Option<&str>) -> String {
    styled_para(
        STYLE_BODY,
        &format!(r#"<hp:run charPrIDRef="0">{}<hp:t/></hp:run>"#, pic(bin_id, comment)),
    )
}

/// In-memory HWPX package.
pub struct HwpxBuilder {
    mimetype: Option<String>,
    version: Option<String>,
    header: Option<String>,
    sections: Vec<(String, String)>,
    bin_data: Vec<(String, String, Vec<u8>)>,
}

impl HwpxBuilder {
    pub fn new() -> Self {
        HwpxBuilder {
            mimetype: Some("application/hwp+zip".to_string()),
            version: Some(version_xml(5)),
            header: Some(default_header()),
            sections: Vec::new(),
            bin_data: Vec::new(),
        }
    }

    /// Append `Contents/section<N>.xml` with the given block markup.
    pub fn section(mut self, body: &str) -> Self {
        let name = format!("Contents/section{}.xml", self.sections.len());
        self.sections.push((name, section_xml(body)));
        self
    }

    /// Section part under an explicit name with raw XML.
    pub fn raw_section(mut self, name: &str, xml: &str) -> Self {
        self.sections.push((name.to_string(), xml.to_string()));
        self
    }

    pub fn header(mut self, xml: Option<&str>) -> Self {
        self.header = xml.map(str::to_string);
        self
    }

    pub fn version_major(mut self, major: u32) -> Self {
        self.version = Some(version_xml(major));
        self
    }

    pub fn raw_version(mut self, xml: Option<&str>) -> Self {
        self.version = xml.map(str::to_string);
        self
    }

    pub fn mimetype(mut self, mimetype: Option<&str>) -> Self {
        self.mimetype = mimetype.map(str::to_string);
        self
    }

    pub fn bin_item(mut self, id: &str, file_name: &str, data: &[u8]) -> Self {
        self.bin_data
            .push((id.to_string(), file_name.to_string(), data.to_vec()));
        self
    }

    fn manifest(&self) -> String {
        let mut items = String::new();
        items.push_str(r#"<opf:item id="header" href="Contents/header.xml" media-type="application/xml"/>"#);
        for (name, _) in &self.sections {
            let id = name
                .trim_start_matches("Contents/")
                .trim_end_matches(".xml");
            items.push_str(&format!(
                r#"<opf:item id="{id}" href="{name}" media-type="application/xml"/>"#
            ));
        }
        for (id, file_name, _) in &self.bin_data {
            items.push_str(&format!(
                r#"<opf:item id="{id}" href="BinData/{file_name}" media-type="image/png" isEmbeded="1"/>"#
            ));
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<opf:package xmlns:opf="http://www.idpf.org/2007/opf/" version="" unique-identifier="" id=""><opf:manifest>{items}</opf:manifest><opf:spine><opf:itemref idref="header" linear="yes"/></opf:spine></opf:package>"#
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        if let Some(mimetype) = &self.mimetype {
            zip.start_file("mimetype", stored).unwrap();
            zip.write_all(mimetype.as_bytes()).unwrap();
        }
        if let Some(version) = &self.version {
            zip.start_file("version.xml", deflated).unwrap();
            zip.write_all(version.as_bytes()).unwrap();
        }
        if let Some(header) = &self.header {
            zip.start_file("Contents/header.xml", deflated).unwrap();
            zip.write_all(header.as_bytes()).unwrap();
        }
        for (name, xml) in &self.sections {
            zip.start_file(name.as_str(), deflated).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.start_file("Contents/content.hpf", deflated).unwrap();
        zip.write_all(self.manifest().as_bytes()).unwrap();
        for (_, file_name, data) in &self.bin_data {
            zip.start_file(format!("BinData/{file_name}"), stored).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    pub fn write_to(&self, path: &Path) -> PathBuf {
        std::fs::write(path, self.build()).unwrap();
        path.to_path_buf()
    }
}

pub fn version_xml(major: u32) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<hv:HCFVersion xmlns:hv="http://www.hancom.co.kr/hwpml/2011/version" tagetApplication="WORDPROCESSOR" major="{major}" minor="1" micro="0" buildNumber="1" os="1" xmlVersion="1.4" application="Hancom Office Hangul" appVersion="12, 0, 0, 0"/>"#
    )
}

/// Fake PNG payload; the converter never decodes image bytes.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n0000IHDR-test-image";

pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("hwp2md_test_")
        .tempdir()
        .unwrap()
}

pub fn convert_bytes(bytes: &[u8]) -> hwp2md::Conversion {
    hwp2md::convert_hwpx_bytes(bytes, &hwp2md::Options::default()).unwrap()
}
