use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::payload::BoxPayload;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn from_str(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() == 4 {
            Some(FourCC([b[0], b[1], b[2], b[3]]))
        } else {
            None
        }
    }

    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

/// Suffix of the ISO reserved UUID namespace: a plain four-character code
/// `xxxx` is equivalent to the extended type `xxxxxxxx-0011-0010-8000-00AA00389B71`.
const ISO_UUID_SUFFIX: [u8; 12] = [
    0x00, 0x11, 0x00, 0x10, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

impl FourCC {
    /// Lift this code into the ISO reserved UUID namespace.
    pub fn to_uuid(self) -> Uuid {
        let mut b = [0u8; 16];
        b[..4].copy_from_slice(&self.0);
        b[4..].copy_from_slice(&ISO_UUID_SUFFIX);
        Uuid::from_bytes(b)
    }
}

/// Identity of a box type: a four-character code, or an extended 128-bit
/// type carried by a `uuid` box.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BoxKey {
    FourCC(FourCC),
    Uuid(Uuid),
}

impl BoxKey {
    /// Build a key from an extended type, collapsing UUIDs that live in the
    /// ISO reserved namespace back to their four-character form.
    pub fn from_uuid(u: Uuid) -> Self {
        let b = u.as_bytes();
        if b[4..] == ISO_UUID_SUFFIX {
            BoxKey::FourCC(FourCC([b[0], b[1], b[2], b[3]]))
        } else {
            BoxKey::Uuid(u)
        }
    }

    pub fn to_uuid(&self) -> Uuid {
        match self {
            BoxKey::FourCC(cc) => cc.to_uuid(),
            BoxKey::Uuid(u) => *u,
        }
    }

    pub fn fourcc(&self) -> Option<FourCC> {
        match self {
            BoxKey::FourCC(cc) => Some(*cc),
            BoxKey::Uuid(_) => None,
        }
    }
}

impl fmt::Display for BoxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxKey::FourCC(cc) => write!(f, "{}", cc),
            BoxKey::Uuid(u) => write!(f, "uuid:{}", u),
        }
    }
}

/// Whether the bytes consumed for a box matched its declared length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SizeHealth {
    /// Consumed bytes match the declared size.
    Ok,
    /// Fewer bytes were consumed than the box declared.
    Insufficient,
    /// A read was attempted past the declared end of the box.
    Exceeding,
}

#[derive(Debug, Clone)]
pub struct BoxHeader {
    /// Absolute file offset of the box header.
    pub offset: u64,
    /// 32-bit size field as it appeared on the wire. 1 = large size follows,
    /// 0 = box extends to the end of the enclosing container.
    pub short_size: u32,
    /// 64-bit size, present when `short_size == 1`.
    pub large_size: Option<u64>,
    pub key: BoxKey,
    /// 8, 16, 24, or 32 depending on large size / extended type.
    pub header_size: u64,
}

impl BoxHeader {
    /// Authoritative declared size: the large size when the short size
    /// signals extension, the short size otherwise. 0 means "to parent end".
    pub fn total_size(&self) -> u64 {
        match self.short_size {
            1 => self.large_size.unwrap_or(0),
            n => n as u64,
        }
    }

    /// Header for a synthetic stub box: carries only the expected type,
    /// no byte range.
    pub fn synthetic(key: BoxKey) -> Self {
        BoxHeader {
            offset: 0,
            short_size: 0,
            large_size: None,
            key,
            header_size: 0,
        }
    }
}

/// Composable structural-consistency flags, accumulated per container box
/// after its children are parsed. Diagnostic only; parsing never stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsistencyMask(u8);

impl ConsistencyMask {
    pub const MISSING_MANDATORY: ConsistencyMask = ConsistencyMask(1 << 0);
    pub const TOO_MANY: ConsistencyMask = ConsistencyMask(1 << 1);
    pub const CONFLICTING: ConsistencyMask = ConsistencyMask(1 << 2);
    pub const UNEXPECTED: ConsistencyMask = ConsistencyMask(1 << 3);

    pub fn insert(&mut self, other: ConsistencyMask) {
        self.0 |= other.0;
    }

    pub fn contains(self, other: ConsistencyMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn names(self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.contains(Self::MISSING_MANDATORY) {
            out.push("missing-mandatory");
        }
        if self.contains(Self::TOO_MANY) {
            out.push("too-many");
        }
        if self.contains(Self::CONFLICTING) {
            out.push("conflicting");
        }
        if self.contains(Self::UNEXPECTED) {
            out.push("unexpected");
        }
        out
    }
}

/// One exported name/value pair of a box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

impl Property {
    pub fn text(name: &str, value: impl fmt::Display) -> Self {
        Property {
            name: name.to_string(),
            value: PropertyValue::Text(value.to_string()),
        }
    }

    pub fn list(name: &str, items: Vec<Property>) -> Self {
        Property {
            name: name.to_string(),
            value: PropertyValue::List(items),
        }
    }
}

/// A displayable property value: a scalar rendered to text, or a nested
/// list of named values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PropertyValue {
    Text(String),
    List(Vec<Property>),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => write!(f, "{}", s),
            PropertyValue::List(items) => write!(f, "List of {} records", items.len()),
        }
    }
}

/// One node of the parsed box tree.
#[derive(Debug)]
pub struct BoxNode {
    pub header: BoxHeader,
    /// Human-readable box name from the registry ("movie header box", ...).
    pub name: &'static str,
    pub payload: BoxPayload,
    /// Child boxes; empty for non-containers.
    pub children: Vec<BoxNode>,
    pub size_health: SizeHealth,
    pub consistency: ConsistencyMask,
}

impl BoxNode {
    pub fn declared_size(&self) -> u64 {
        self.header.total_size()
    }

    pub fn describe(&self) -> &'static str {
        self.name
    }

    /// True for stub nodes inserted for missing mandatory children.
    pub fn is_synthetic(&self) -> bool {
        matches!(
            self.payload,
            BoxPayload::MissingMandatory { .. } | BoxPayload::MissingMandatoryGroup { .. }
        )
    }

    pub fn properties(&self) -> Vec<Property> {
        self.payload.properties()
    }

    /// First node (this one included) whose type matches `code`, depth-first.
    pub fn find_first(&self, code: [u8; 4]) -> Option<&BoxNode> {
        if self.header.key == BoxKey::FourCC(FourCC(code)) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_first(code))
    }
}
