use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use serde::Serialize;

use crate::boxes::{BoxNode, Property};
use crate::cursor::ByteSource;
use crate::fileset::{FilesetValidator, FilesetVerdict, FragmentClass};
use crate::fragment::{ChainExtractor, FragmentInfo};
use crate::parser::{BoxObserver, parse_tree};
use crate::registry::{Registry, default_registry};
use crate::util::{hex_dump, read_slice};

/// A JSON-serializable representation of a single box.
///
/// This structure contains all the metadata and diagnostics of a parsed box,
/// making it suitable for serialization to JSON for use in UIs or CLIs.
#[derive(Serialize)]
pub struct ExportBox {
    /// Absolute byte offset of this box in the file
    pub offset: u64,
    /// Declared size including header and payload (0 = to end of parent)
    pub size: u64,
    /// Size of just the box header (8 to 32 bytes)
    pub header_size: u64,

    /// Four-character box type code (e.g., "ftyp", "moov")
    pub typ: String,
    /// Extended type for uuid boxes (hex string)
    pub uuid: Option<String>,
    /// Human-readable box type name (e.g., "file type box")
    pub name: String,
    /// Whether consumed bytes matched the declared size
    pub size_health: crate::boxes::SizeHealth,
    /// Structural findings for containers ("missing-mandatory", ...)
    pub consistency: Vec<&'static str>,
    /// True for stub entries standing in for absent mandatory children
    pub synthetic: bool,
    /// Decoded payload fields
    pub properties: Vec<Property>,
    /// Child boxes for container types
    pub children: Vec<ExportBox>,
}

fn export_node(node: &BoxNode) -> ExportBox {
    let (typ, uuid) = match node.header.key {
        crate::boxes::BoxKey::FourCC(cc) => (cc.to_string(), None),
        crate::boxes::BoxKey::Uuid(u) => {
            ("uuid".to_string(), Some(hex::encode(u.as_bytes())))
        }
    };
    ExportBox {
        offset: node.header.offset,
        size: node.header.total_size(),
        header_size: node.header.header_size,
        typ,
        uuid,
        name: node.name.to_string(),
        size_health: node.size_health,
        consistency: node.consistency.names(),
        synthetic: node.is_synthetic(),
        properties: node.properties(),
        children: node.children.iter().map(export_node).collect(),
    }
}

/// Parse a source and return the complete box tree in exportable form.
///
/// # Example
/// ```no_run
/// use std::fs::File;
///
/// fn main() -> anyhow::Result<()> {
///     let mut file = File::open("video.mp4")?;
///     let size = file.metadata()?.len();
///     let boxes = fragbox::analyze(&mut file, size)?;
///     println!("{} top-level boxes", boxes.len());
///     Ok(())
/// }
/// ```
pub fn analyze<R: Read + Seek>(r: &mut R, size: u64) -> anyhow::Result<Vec<ExportBox>> {
    let reg = default_registry();
    let tree = parse_tree(r, size, &reg, &mut [])?;
    Ok(tree.iter().map(export_node).collect())
}

/// Parse a source and return the box tree together with the raw nodes.
pub fn analyze_tree<R: Read + Seek>(r: &mut R, size: u64) -> anyhow::Result<Vec<BoxNode>> {
    let reg = default_registry();
    Ok(parse_tree(r, size, &reg, &mut [])?)
}

/// One fragment in a fileset report.
#[derive(Serialize)]
pub struct FragmentExport {
    pub path: String,
    pub ordinal: Option<u32>,
    pub classification: &'static str,
    pub surveillance: bool,
    pub start: Option<String>,
    pub finish: Option<String>,
    pub duration_ms: Option<u64>,
    pub estimated_fps: Option<f64>,
    /// Track ids seen in the file's track and fragment headers.
    pub track_ids: Vec<u32>,
    pub display: String,
}

/// Verdict plus per-fragment details for a validated batch.
#[derive(Serialize)]
pub struct FilesetReport {
    pub verdict: FilesetVerdict,
    pub fragments: Vec<FragmentExport>,
}

/// Incremental session over a batch of files: feed each file once, then
/// call [`FilesetSession::finish`] for the ordered fragments and verdict.
pub struct FilesetSession {
    registry: Registry,
    chain: ChainExtractor,
    fileset: FilesetValidator,
}

impl FilesetSession {
    pub fn new() -> Self {
        FilesetSession {
            registry: default_registry(),
            chain: ChainExtractor::new(),
            fileset: FilesetValidator::new(),
        }
    }

    /// Parse one file from disk into the session.
    pub fn add_path(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let mut f = File::open(path)?;
        let len = f.metadata()?.len();
        self.add_reader(&path.display().to_string(), &mut f, len)
    }

    /// Parse one already-open source into the session.
    pub fn add_reader(
        &mut self,
        name: &str,
        r: &mut dyn ByteSource,
        size: u64,
    ) -> anyhow::Result<()> {
        self.chain.open_file(name);
        self.fileset.open_file(name);
        let observers: &mut [&mut dyn BoxObserver] = &mut [&mut self.chain, &mut self.fileset];
        let result = parse_tree(r, size, &self.registry, observers);
        self.chain.close_file();
        self.fileset.close_file();
        result?;
        Ok(())
    }

    /// Reorder the fragments, compute the verdict, and build the report.
    pub fn finish(mut self) -> FilesetReport {
        let verdict = self.fileset.verdict();
        let ordered = self.chain.reorder();

        let class_of = |info: &FragmentInfo| -> FragmentClass {
            self.fileset
                .files()
                .iter()
                .find(|r| r.path == info.path)
                .map(|r| r.class)
                .unwrap_or_default()
        };

        let fragments = ordered
            .iter()
            .map(|info| FragmentExport {
                path: info.path.clone(),
                ordinal: info.ordinal,
                classification: class_of(info).name(),
                surveillance: info.is_surveillance(),
                start: info.start_utc().map(|d| crate::util::format_utc(&d)),
                finish: info.finish_utc().map(|d| crate::util::format_utc(&d)),
                duration_ms: info.duration_ms(),
                estimated_fps: info.estimated_fps(),
                track_ids: info.track_ids.iter().copied().collect(),
                display: info.display_name(),
            })
            .collect();

        FilesetReport { verdict, fragments }
    }
}

impl Default for FilesetSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a hex dump operation containing the formatted hex output.
#[derive(Serialize)]
pub struct HexDump {
    /// Starting offset of the dumped data
    pub offset: u64,
    /// Actual number of bytes that were read and dumped
    pub length: u64,
    /// Formatted hex dump string with addresses and ASCII representation
    pub hex: String,
}

/// Hex-dump a range of bytes from a data source.
///
/// This function never reads past EOF; if `offset + max_len` goes beyond the
/// data size, the returned length will be smaller than `max_len`.
pub fn hex_range<R: Read + Seek>(
    r: &mut R,
    size: u64,
    offset: u64,
    max_len: u64,
) -> anyhow::Result<HexDump> {
    use std::cmp::min;

    // How many bytes are actually available from this offset to EOF.
    let available = size.saturating_sub(offset);

    // Don't read past EOF or more than the caller requested.
    let to_read = min(available, max_len);

    // If nothing is available, just return an empty dump.
    if to_read == 0 {
        return Ok(HexDump {
            offset,
            length: 0,
            hex: String::new(),
        });
    }

    let data = read_slice(r, offset, to_read)?;
    let hex_str = hex_dump(&data, offset);

    Ok(HexDump {
        offset,
        length: to_read, // actual bytes read, not max_len
        hex: hex_str,
    })
}
