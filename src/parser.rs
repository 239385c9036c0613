use tracing::{debug, warn};

use crate::boxes::{BoxHeader, BoxKey, BoxNode, ConsistencyMask, SizeHealth};
use crate::cursor::{BoundedCursor, ByteSource};
use crate::payload::BoxPayload;
use crate::registry::Registry;

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid box size")]
    InvalidSize,
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Callback fired for every parsed box, in document order.
///
/// `on_box` runs after the payload is decoded but before the box's children
/// are parsed, so a parent is always observed before its descendants and
/// siblings arrive in file order.
pub trait BoxObserver {
    fn on_box(&mut self, header: &BoxHeader, payload: &BoxPayload);
}

/// Read a box header at the cursor's current position.
///
/// Returns `Ok(None)` when the window ends before a complete header fits,
/// and `Err(InvalidSize)` when the declared size is nonzero but smaller
/// than the header itself.
pub fn read_box_header(cur: &mut BoundedCursor<'_>) -> Result<Option<BoxHeader>> {
    let offset = cur.position();
    let Some(short_size) = cur.read_u32() else {
        return Ok(None);
    };
    let Some(typ) = cur.read_fourcc() else {
        return Ok(None);
    };

    let mut header_size = 8u64;
    let large_size = if short_size == 1 {
        let Some(ls) = cur.read_u64() else {
            return Ok(None);
        };
        header_size += 8;
        Some(ls)
    } else {
        None
    };

    let key = if &typ.0 == b"uuid" {
        let Some(u) = cur.read_uuid() else {
            return Ok(None);
        };
        header_size += 16;
        BoxKey::from_uuid(u)
    } else {
        BoxKey::FourCC(typ)
    };

    let hdr = BoxHeader {
        offset,
        short_size,
        large_size,
        key,
        header_size,
    };

    let total = hdr.total_size();
    if total != 0 && total < header_size {
        return Err(ParseError::InvalidSize);
    }

    Ok(Some(hdr))
}

/// Parse one box (and recursively its children) from the cursor.
///
/// Returns `Ok(None)` when the current window has no room left for another
/// box. Malformed sizes never abort the walk: the remainder of the window
/// is skipped and the error is logged.
pub fn parse_box(
    cur: &mut BoundedCursor<'_>,
    reg: &Registry,
    observers: &mut [&mut dyn BoxObserver],
) -> Result<Option<BoxNode>> {
    if cur.remaining() < 8 {
        if cur.remaining() > 0 {
            debug!(bytes = cur.remaining(), "trailing bytes too short for a box");
            cur.skip_to_end();
        }
        return Ok(None);
    }

    let hdr = match read_box_header(cur) {
        Ok(Some(h)) => h,
        Ok(None) => {
            cur.skip_to_end();
            return Ok(None);
        }
        Err(ParseError::InvalidSize) => {
            warn!(offset = cur.position(), "box declares a size smaller than its header, skipping rest of container");
            cur.skip_to_end();
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let total = hdr.total_size();
    let box_end = if total == 0 {
        // Size 0: box runs to the end of the enclosing window.
        cur.window_end()
    } else {
        hdr.offset + total
    };
    cur.push_window(box_end);

    let def = reg.lookup(&hdr.key);
    let name = def.map_or("unknown box", |d| d.name);

    let payload = match def {
        Some(d) => match d.read {
            Some(read) => read(cur),
            None if d.container => BoxPayload::Container,
            None => {
                cur.skip_to_end();
                BoxPayload::Leaf
            }
        },
        None => {
            cur.skip_to_end();
            BoxPayload::Unknown
        }
    };

    for obs in observers.iter_mut() {
        obs.on_box(&hdr, &payload);
    }

    let mut children = Vec::new();
    if def.is_some_and(|d| d.container) {
        while let Some(child) = parse_box(cur, reg, observers)? {
            children.push(child);
        }
    }

    let size_health = cur.pop_window();

    let mut node = BoxNode {
        header: hdr,
        name,
        payload,
        children,
        size_health,
        consistency: ConsistencyMask::default(),
    };

    if let Some(spec) = def.and_then(|d| d.children) {
        crate::consistency::evaluate(spec, &mut node);
    }

    if node.size_health != SizeHealth::Ok {
        debug!(
            offset = node.header.offset,
            box_type = %node.header.key,
            health = ?node.size_health,
            "box size mismatch"
        );
    }

    Ok(Some(node))
}

/// Parse all top-level boxes of a source spanning `[0, len)`.
pub fn parse_tree(
    src: &mut dyn ByteSource,
    len: u64,
    reg: &Registry,
    observers: &mut [&mut dyn BoxObserver],
) -> Result<Vec<BoxNode>> {
    let mut cur = BoundedCursor::new(src, 0, len)?;
    let mut out = Vec::new();
    while let Some(node) = parse_box(&mut cur, reg, observers)? {
        out.push(node);
    }
    Ok(out)
}
