use std::collections::HashMap;

use crate::boxes::{BoxKey, FourCC};
use crate::consistency::{self, ChildSpec};
use crate::cursor::BoundedCursor;
use crate::payload::{self, BoxPayload, SURVEILLANCE_LINK_UUID};

/// Payload reader for one box type. Readers never fail: missing bytes
/// degrade to zeroed fields and are reflected in the box's size health.
pub type ReadFn = fn(&mut BoundedCursor<'_>) -> BoxPayload;

/// Everything the parser knows about one box type.
pub struct BoxDef {
    /// Human-readable name ("movie header box", ...).
    pub name: &'static str,
    /// Whether child boxes follow the payload.
    pub container: bool,
    /// Typed payload reader; `None` leaves the payload opaque.
    pub read: Option<ReadFn>,
    /// Child expectations, evaluated after the children are parsed.
    pub children: Option<&'static ChildSpec>,
}

/// Registry of box definitions keyed by `BoxKey` (4CC or UUID).
///
/// The registry is immutable once constructed; use [`Registry::with_box`]
/// to build it fluently.
pub struct Registry {
    map: HashMap<BoxKey, BoxDef>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Return a new registry with the given definition added.
    pub fn with_box(mut self, key: BoxKey, def: BoxDef) -> Self {
        self.map.insert(key, def);
        self
    }

    /// Look up the definition for a box type. `None` means the type is
    /// unknown and its payload should be skipped.
    pub fn lookup(&self, key: &BoxKey) -> Option<&BoxDef> {
        self.map.get(key)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn cc(code: &[u8; 4]) -> BoxKey {
    BoxKey::FourCC(FourCC(*code))
}

fn container(name: &'static str, children: Option<&'static ChildSpec>) -> BoxDef {
    BoxDef {
        name,
        container: true,
        read: None,
        children,
    }
}

fn typed(name: &'static str, read: ReadFn) -> BoxDef {
    BoxDef {
        name,
        container: false,
        read: Some(read),
        children: None,
    }
}

fn opaque(name: &'static str) -> BoxDef {
    BoxDef {
        name,
        container: false,
        read: None,
        children: None,
    }
}

/// Registry covering the box types this crate understands.
pub fn default_registry() -> Registry {
    Registry::new()
        // top level
        .with_box(cc(b"ftyp"), typed("file type box", payload::read_ftyp))
        .with_box(
            cc(b"moov"),
            container("movie box", Some(&consistency::MOOV_CHILDREN)),
        )
        .with_box(
            cc(b"moof"),
            container("movie fragment box", Some(&consistency::MOOF_CHILDREN)),
        )
        .with_box(cc(b"mdat"), opaque("media data box"))
        .with_box(cc(b"free"), opaque("free space box"))
        .with_box(cc(b"skip"), opaque("free space box"))
        .with_box(cc(b"mfra"), container("movie fragment random access box", None))
        // movie structure
        .with_box(cc(b"mvhd"), typed("movie header box", payload::read_mvhd))
        .with_box(
            cc(b"trak"),
            container("track box", Some(&consistency::TRAK_CHILDREN)),
        )
        .with_box(cc(b"tkhd"), typed("track header box", payload::read_tkhd))
        .with_box(cc(b"edts"), container("edit box", None))
        .with_box(
            cc(b"mdia"),
            container("media box", Some(&consistency::MDIA_CHILDREN)),
        )
        .with_box(cc(b"mdhd"), typed("media header box", payload::read_mdhd))
        .with_box(cc(b"hdlr"), typed("handler reference box", payload::read_hdlr))
        .with_box(
            cc(b"minf"),
            container("media information box", Some(&consistency::MINF_CHILDREN)),
        )
        .with_box(cc(b"vmhd"), typed("video media header box", payload::read_vmhd))
        .with_box(cc(b"smhd"), typed("sound media header box", payload::read_smhd))
        .with_box(
            cc(b"dinf"),
            container("data information box", Some(&consistency::DINF_CHILDREN)),
        )
        .with_box(
            cc(b"dref"),
            BoxDef {
                name: "data reference box",
                container: true,
                read: Some(payload::read_dref),
                children: Some(&consistency::DREF_CHILDREN),
            },
        )
        .with_box(cc(b"url "), typed("data entry url box", payload::read_url))
        .with_box(
            cc(b"stbl"),
            container("sample table box", Some(&consistency::STBL_CHILDREN)),
        )
        .with_box(cc(b"stsd"), typed("sample description box", payload::read_stsd))
        .with_box(
            cc(b"stts"),
            typed("decoding time to sample box", payload::read_stts),
        )
        .with_box(
            cc(b"ctts"),
            typed("composition time to sample box", payload::read_ctts),
        )
        .with_box(cc(b"udta"), container("user data box", None))
        // fragmented movie structure
        .with_box(
            cc(b"mvex"),
            container("movie extends box", Some(&consistency::MVEX_CHILDREN)),
        )
        .with_box(cc(b"mehd"), typed("movie extends header box", payload::read_mehd))
        .with_box(cc(b"trex"), typed("track extends box", payload::read_trex))
        .with_box(
            cc(b"mfhd"),
            typed("movie fragment header box", payload::read_mfhd),
        )
        .with_box(
            cc(b"traf"),
            container("track fragment box", Some(&consistency::TRAF_CHILDREN)),
        )
        .with_box(
            cc(b"tfhd"),
            typed("track fragment header box", payload::read_tfhd),
        )
        .with_box(
            cc(b"tfdt"),
            typed("track fragment decode time box", payload::read_tfdt),
        )
        .with_box(cc(b"trun"), typed("track fragment run box", payload::read_trun))
        // surveillance linkage, carried as an extended type
        .with_box(
            BoxKey::Uuid(SURVEILLANCE_LINK_UUID),
            typed(
                "surveillance fragment link box",
                payload::read_surveillance_link,
            ),
        )
}
