pub mod api;
pub mod boxes;
pub mod consistency;
pub mod cursor;
pub mod fileset;
pub mod fragment;
pub mod parser;
pub mod payload;
pub mod registry;
pub mod util;

pub use api::{
    ExportBox, FilesetReport, FilesetSession, FragmentExport, HexDump, analyze, analyze_tree,
    hex_range,
};
pub use boxes::{
    BoxHeader, BoxKey, BoxNode, ConsistencyMask, FourCC, Property, PropertyValue, SizeHealth,
};
pub use cursor::{BoundedCursor, ByteSource};
pub use fileset::{FilesetValidator, FilesetVerdict, FragmentClass};
pub use fragment::{ChainExtractor, FragmentInfo};
pub use parser::{BoxObserver, ParseError, parse_box, parse_tree, read_box_header};
pub use payload::{BoxPayload, SURVEILLANCE_LINK_UUID};
pub use registry::{BoxDef, Registry, default_registry};
