use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use crate::error::Error;
use crate::model::{BinItem, Warning};

use super::{num_attr, strip_bom};

const MIMETYPE_PART: &str = "mimetype";
const VERSION_PART: &str = "version.xml";
const MANIFEST_PART: &str = "Contents/content.hpf";
const SECTION_PREFIX: &str = "Contents/section";
const BIN_DATA_PREFIX: &str = "BinData/";
/// Largest up-front buffer reserved for a part.
const MAX_PREALLOC: u64 = 64 << 20;

/// Major format version this parser understands.
const SUPPORTED_MAJOR: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    pub xml_version: Option<String>,
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if let Some(xml) = &self.xml_version {
            write!(f, " (xml {xml})")?;
        }
        Ok(())
    }
}

/// An open HWPX package. Parts are read on request; nothing beyond the
/// small bookkeeping parts is loaded up front.
pub struct Container<R> {
    zip: zip::ZipArchive<R>,
    sections: Vec<(usize, String)>,
    version: Option<Version>,
    bin_data: BTreeMap<String, BinItem>,
    warnings: Vec<Warning>,
}

impl Container<BufReader<File>> {
    pub fn open_path(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
                std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
            ),
            _ => Error::Io(e),
        })?;
        Self::open(BufReader::new(file))
    }
}

impl<R: Read + Seek> Container<R> {
    pub fn open(reader: R) -> Result<Self, Error> {
        let mut zip = zip::ZipArchive::new(reader)
            .map_err(|e| Error::InvalidContainer(format!("not a ZIP archive: {e}")))?;
        let names: Vec<String> = zip.file_names().map(|s| s.to_string()).collect();

        let mimetype = read_zip_text(&mut zip, MIMETYPE_PART)
            .ok_or_else(|| Error::InvalidContainer("missing mimetype".into()))?;
        if !mimetype.to_ascii_lowercase().contains("hwp") {
            return Err(Error::InvalidContainer(format!(
                "unexpected mimetype '{}'",
                mimetype.trim()
            )));
        }
        if !names.iter().any(|n| n == VERSION_PART) {
            return Err(Error::InvalidContainer("missing version.xml".into()));
        }

        let sections = section_parts(&names);
        if sections.is_empty() {
            return Err(Error::InvalidContainer(
                "no Contents/sectionN.xml part".into(),
            ));
        }

        let mut warnings = Vec::new();
        for (pos, (index, part)) in sections.iter().enumerate() {
            if *index != pos {
                warnings.push(Warning::new(
                    part.as_str(),
                    format!("section numbering is not contiguous (expected section{pos}.xml)"),
                ));
                break;
            }
        }

        let version = match read_zip_text(&mut zip, VERSION_PART)
            .as_deref()
            .and_then(parse_version)
        {
            Some(v) => {
                if v.major != SUPPORTED_MAJOR {
                    let e = Error::UnsupportedVersion(v.to_string());
                    warnings.push(Warning::new(VERSION_PART, format!("{e}; continuing")));
                }
                Some(v)
            }
            None => {
                let e = Error::UnsupportedVersion("unreadable version.xml".into());
                warnings.push(Warning::new(VERSION_PART, format!("{e}; continuing")));
                None
            }
        };

        let manifest = read_zip_text(&mut zip, MANIFEST_PART);
        let bin_data = bin_data_index(manifest.as_deref(), &names);

        log::debug!(
            "Opened HWPX container: {} sections, {} binary items, version {}",
            sections.len(),
            bin_data.len(),
            version
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unknown".into())
        );

        Ok(Self {
            zip,
            sections,
            version,
            bin_data,
            warnings,
        })
    }

    /// `(N, "Contents/sectionN.xml")` in numeric order.
    pub fn sections(&self) -> &[(usize, String)] {
        &self.sections
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn bin_data(&self) -> &BTreeMap<String, BinItem> {
        &self.bin_data
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn read_part(&mut self, name: &str) -> Result<Vec<u8>, Error> {
        let mut entry = self.zip.by_name(name)?;
        // Declared sizes are untrusted.
        let mut data = Vec::with_capacity(entry.size().min(MAX_PREALLOC) as usize);
        entry.read_to_end(&mut data)?;
        Ok(data)
    }

    pub fn read_text(&mut self, name: &str) -> Option<String> {
        read_zip_text(&mut self.zip, name)
    }
}

fn read_zip_text<R: Read + Seek>(zip: &mut zip::ZipArchive<R>, name: &str) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

fn section_parts(names: &[String]) -> Vec<(usize, String)> {
    let mut parts: Vec<(usize, String)> = names
        .iter()
        .filter_map(|name| {
            let n = name
                .strip_prefix(SECTION_PREFIX)?
                .strip_suffix(".xml")?
                .parse::<usize>()
                .ok()?;
            Some((n, name.clone()))
        })
        .collect();
    parts.sort();
    parts
}

fn parse_version(xml: &str) -> Option<Version> {
    let doc = roxmltree::Document::parse(strip_bom(xml)).ok()?;
    let root = doc.root_element();
    Some(Version {
        major: num_attr(root, "major")?,
        minor: num_attr(root, "minor").unwrap_or(0),
        micro: num_attr(root, "micro").unwrap_or(0),
        xml_version: root.attribute("xmlVersion").map(|s| s.to_string()),
    })
}

/// Map binary item IDs to `BinData/` entries: manifest items first, then
/// any remaining entry by file stem.
fn bin_data_index(manifest: Option<&str>, names: &[String]) -> BTreeMap<String, BinItem> {
    let mut index = BTreeMap::new();

    let doc = manifest.and_then(|xml| roxmltree::Document::parse(strip_bom(xml)).ok());
    if let Some(doc) = &doc {
        for item in doc.descendants() {
            if !item.is_element() || item.tag_name().name() != "item" {
                continue;
            }
            let (Some(id), Some(href)) = (item.attribute("id"), item.attribute("href")) else {
                continue;
            };
            let href = href.trim_start_matches('/');
            if !href.starts_with(BIN_DATA_PREFIX) || !names.iter().any(|n| n == href) {
                continue;
            }
            index.insert(
                id.to_string(),
                BinItem {
                    path: href.to_string(),
                    media_type: item.attribute("media-type").map(|s| s.to_string()),
                },
            );
        }
    }

    for name in names {
        let Some(file) = name.strip_prefix(BIN_DATA_PREFIX) else {
            continue;
        };
        if file.is_empty() || file.ends_with('/') {
            continue;
        }
        let stem = file.rsplit_once('.').map(|(s, _)| s).unwrap_or(file);
        if index.values().any(|item| &item.path == name) {
            continue;
        }
        index.entry(stem.to_string()).or_insert_with(|| BinItem {
            path: name.clone(),
            media_type: None,
        });
    }

    index
}

/// Sniff whether a file is an HWPX package: a ZIP whose `mimetype` mentions
/// `hwp`, or that at least carries `Contents/section0.xml`.
pub fn is_hwpx(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    sniff(BufReader::new(file))
}

pub fn is_hwpx_bytes(bytes: &[u8]) -> bool {
    sniff(std::io::Cursor::new(bytes))
}

fn sniff<R: Read + Seek>(reader: R) -> bool {
    let Ok(mut zip) = zip::ZipArchive::new(reader) else {
        return false;
    };
    if let Some(mimetype) = read_zip_text(&mut zip, MIMETYPE_PART) {
        return mimetype.to_ascii_lowercase().contains("hwp");
    }
    zip.file_names().any(|n| n == "Contents/section0.xml")
}
