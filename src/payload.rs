use uuid::Uuid;

use crate::boxes::{BoxKey, FourCC, Property};
use crate::cursor::BoundedCursor;
use crate::util::{filetime_to_utc, format_utc, mp4_time_to_utc};

/// Extended type under which surveillance recorders carry fragment linkage.
pub const SURVEILLANCE_LINK_UUID: Uuid = Uuid::from_bytes([
    0xd4, 0x80, 0x7e, 0xf2, 0xca, 0x39, 0x46, 0x95, 0x8e, 0x54, 0x26, 0xcb, 0x9e, 0x46, 0xa7,
    0x9f,
]);

/// Decoded payload of a box. The set of understood types is closed; anything
/// the registry does not know lands in `Unknown` with its bytes skipped.
#[derive(Debug)]
pub enum BoxPayload {
    Ftyp(FtypPayload),
    Mvhd(MvhdPayload),
    Tkhd(TkhdPayload),
    Mdhd(MdhdPayload),
    Hdlr(HdlrPayload),
    Mehd(MehdPayload),
    Trex(TrexPayload),
    Mfhd(MfhdPayload),
    Tfhd(TfhdPayload),
    Tfdt(TfdtPayload),
    Trun(TrunPayload),
    Stts(SttsPayload),
    Ctts(CttsPayload),
    Vmhd(VmhdPayload),
    Smhd(SmhdPayload),
    Dref(DrefPayload),
    Url(UrlPayload),
    Stsd(StsdPayload),
    SurveillanceLink(SurveillanceLinkPayload),
    /// Pure container; children carry the content.
    Container,
    /// Known box whose payload is not interpreted (mdat, free, ...).
    Leaf,
    /// Type not present in the registry; payload bytes skipped.
    Unknown,
    /// Stub inserted where a mandatory child was absent.
    MissingMandatory { expected: BoxKey },
    /// Stub inserted where one box out of a mandatory group was absent.
    MissingMandatoryGroup { expected: Vec<BoxKey> },
}

#[derive(Debug)]
pub struct FtypPayload {
    pub major_brand: FourCC,
    pub minor_version: u32,
    pub compatible_brands: Vec<FourCC>,
}

#[derive(Debug)]
pub struct MvhdPayload {
    pub version: u8,
    pub flags: u32,
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    pub rate: u32,
    pub volume: u16,
    pub next_track_id: u32,
}

#[derive(Debug)]
pub struct TkhdPayload {
    pub version: u8,
    pub flags: u32,
    pub creation_time: u64,
    pub modification_time: u64,
    pub track_id: u32,
    pub duration: u64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub struct MdhdPayload {
    pub version: u8,
    pub flags: u32,
    pub creation_time: u64,
    pub modification_time: u64,
    pub timescale: u32,
    pub duration: u64,
    pub language: String,
}

#[derive(Debug)]
pub struct HdlrPayload {
    pub version: u8,
    pub flags: u32,
    pub handler_type: FourCC,
    pub name: String,
}

#[derive(Debug)]
pub struct MehdPayload {
    pub version: u8,
    pub flags: u32,
    pub fragment_duration: u64,
}

#[derive(Debug)]
pub struct TrexPayload {
    pub version: u8,
    pub flags: u32,
    pub track_id: u32,
    pub default_sample_description_index: u32,
    pub default_sample_duration: u32,
    pub default_sample_size: u32,
    pub default_sample_flags: u32,
}

#[derive(Debug)]
pub struct MfhdPayload {
    pub version: u8,
    pub flags: u32,
    pub sequence_number: u32,
}

#[derive(Debug)]
pub struct TfhdPayload {
    pub version: u8,
    pub flags: u32,
    pub track_id: u32,
    pub base_data_offset: Option<u64>,
    pub sample_description_index: Option<u32>,
    pub default_sample_duration: Option<u32>,
    pub default_sample_size: Option<u32>,
    pub default_sample_flags: Option<u32>,
}

#[derive(Debug)]
pub struct TfdtPayload {
    pub version: u8,
    pub flags: u32,
    pub base_media_decode_time: u64,
}

#[derive(Debug)]
pub struct TrunSample {
    pub duration: Option<u32>,
    pub size: Option<u32>,
    pub flags: Option<u32>,
    pub composition_offset: Option<i64>,
}

#[derive(Debug)]
pub struct TrunPayload {
    pub version: u8,
    pub flags: u32,
    pub sample_count: u32,
    pub data_offset: Option<i32>,
    pub first_sample_flags: Option<u32>,
    pub samples: Vec<TrunSample>,
}

#[derive(Debug)]
pub struct SttsEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

#[derive(Debug)]
pub struct SttsPayload {
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<SttsEntry>,
}

#[derive(Debug)]
pub struct CttsEntry {
    pub sample_count: u32,
    pub sample_offset: i64,
}

#[derive(Debug)]
pub struct CttsPayload {
    pub version: u8,
    pub flags: u32,
    pub entries: Vec<CttsEntry>,
}

#[derive(Debug)]
pub struct VmhdPayload {
    pub version: u8,
    pub flags: u32,
    pub graphics_mode: u16,
    pub opcolor: [u16; 3],
}

#[derive(Debug)]
pub struct SmhdPayload {
    pub version: u8,
    pub flags: u32,
    pub balance: i16,
}

#[derive(Debug)]
pub struct DrefPayload {
    pub version: u8,
    pub flags: u32,
    pub entry_count: u32,
}

#[derive(Debug)]
pub struct UrlPayload {
    pub version: u8,
    pub flags: u32,
    pub location: Option<String>,
}

#[derive(Debug)]
pub struct StsdPayload {
    pub version: u8,
    pub flags: u32,
    pub entry_count: u32,
}

/// Fragment linkage record: where this file sits in a recorder's chain.
///
/// Start time is in 100-nanosecond ticks since 1601-01-01 UTC. A
/// predecessor equal to the fragment's own id marks the start of the chain;
/// a successor equal to the own id marks the end.
#[derive(Debug, Clone)]
pub struct SurveillanceLinkPayload {
    pub version: u8,
    pub flags: u32,
    pub start_time: u64,
    pub duration: u64,
    pub timescale: u32,
    pub fragment_id: Uuid,
    pub predecessor_id: Uuid,
    pub successor_id: Uuid,
}

fn read_fullbox(cur: &mut BoundedCursor<'_>) -> (u8, u32) {
    let version = cur.read_u8().unwrap_or(0);
    let flags = cur.read_u24().unwrap_or(0);
    (version, flags)
}

pub fn read_ftyp(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let major_brand = cur.read_fourcc().unwrap_or(FourCC(*b"    "));
    let minor_version = cur.read_u32().unwrap_or(0);
    let mut compatible_brands = Vec::new();
    while cur.remaining() >= 4 {
        let Some(cc) = cur.read_fourcc() else { break };
        compatible_brands.push(cc);
    }
    BoxPayload::Ftyp(FtypPayload {
        major_brand,
        minor_version,
        compatible_brands,
    })
}

pub fn read_mvhd(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let (creation_time, modification_time, timescale, duration) = if version == 1 {
        (
            cur.read_u64().unwrap_or(0),
            cur.read_u64().unwrap_or(0),
            cur.read_u32().unwrap_or(0),
            cur.read_u64().unwrap_or(0),
        )
    } else {
        (
            cur.read_u32().unwrap_or(0) as u64,
            cur.read_u32().unwrap_or(0) as u64,
            cur.read_u32().unwrap_or(0),
            cur.read_u32().unwrap_or(0) as u64,
        )
    };
    let rate = cur.read_u32().unwrap_or(0);
    let volume = cur.read_u16().unwrap_or(0);
    // reserved(10) + matrix(36) + pre_defined(24)
    cur.skip(70);
    let next_track_id = cur.read_u32().unwrap_or(0);
    BoxPayload::Mvhd(MvhdPayload {
        version,
        flags,
        creation_time,
        modification_time,
        timescale,
        duration,
        rate,
        volume,
        next_track_id,
    })
}

pub fn read_tkhd(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let (creation_time, modification_time) = if version == 1 {
        (cur.read_u64().unwrap_or(0), cur.read_u64().unwrap_or(0))
    } else {
        (
            cur.read_u32().unwrap_or(0) as u64,
            cur.read_u32().unwrap_or(0) as u64,
        )
    };
    let track_id = cur.read_u32().unwrap_or(0);
    cur.skip(4); // reserved
    let duration = if version == 1 {
        cur.read_u64().unwrap_or(0)
    } else {
        cur.read_u32().unwrap_or(0) as u64
    };
    // reserved(8) + layer(2) + alternate_group(2) + volume(2) + reserved(2)
    // + matrix(36)
    cur.skip(52);
    let width = cur.read_u32().unwrap_or(0);
    let height = cur.read_u32().unwrap_or(0);
    BoxPayload::Tkhd(TkhdPayload {
        version,
        flags,
        creation_time,
        modification_time,
        track_id,
        duration,
        width,
        height,
    })
}

/// Unpack a packed ISO-639-2/T language code (three 5-bit letters).
fn lang_from_u16(v: u16) -> String {
    let c0 = ((v >> 10) & 0x1F) as u8 + 0x60;
    let c1 = ((v >> 5) & 0x1F) as u8 + 0x60;
    let c2 = (v & 0x1F) as u8 + 0x60;
    String::from_utf8_lossy(&[c0, c1, c2]).into_owned()
}

pub fn read_mdhd(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let (creation_time, modification_time, timescale, duration) = if version == 1 {
        (
            cur.read_u64().unwrap_or(0),
            cur.read_u64().unwrap_or(0),
            cur.read_u32().unwrap_or(0),
            cur.read_u64().unwrap_or(0),
        )
    } else {
        (
            cur.read_u32().unwrap_or(0) as u64,
            cur.read_u32().unwrap_or(0) as u64,
            cur.read_u32().unwrap_or(0),
            cur.read_u32().unwrap_or(0) as u64,
        )
    };
    let language = lang_from_u16(cur.read_u16().unwrap_or(0));
    cur.skip(2); // pre_defined
    BoxPayload::Mdhd(MdhdPayload {
        version,
        flags,
        creation_time,
        modification_time,
        timescale,
        duration,
        language,
    })
}

pub fn read_hdlr(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    cur.skip(4); // pre_defined
    let handler_type = cur.read_fourcc().unwrap_or(FourCC(*b"    "));
    cur.skip(12); // reserved
    let name = cur.read_cstring().unwrap_or_default();
    BoxPayload::Hdlr(HdlrPayload {
        version,
        flags,
        handler_type,
        name,
    })
}

pub fn read_mehd(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let fragment_duration = if version == 1 {
        cur.read_u64().unwrap_or(0)
    } else {
        cur.read_u32().unwrap_or(0) as u64
    };
    BoxPayload::Mehd(MehdPayload {
        version,
        flags,
        fragment_duration,
    })
}

pub fn read_trex(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    BoxPayload::Trex(TrexPayload {
        version,
        flags,
        track_id: cur.read_u32().unwrap_or(0),
        default_sample_description_index: cur.read_u32().unwrap_or(0),
        default_sample_duration: cur.read_u32().unwrap_or(0),
        default_sample_size: cur.read_u32().unwrap_or(0),
        default_sample_flags: cur.read_u32().unwrap_or(0),
    })
}

pub fn read_mfhd(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    BoxPayload::Mfhd(MfhdPayload {
        version,
        flags,
        sequence_number: cur.read_u32().unwrap_or(0),
    })
}

pub fn read_tfhd(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let track_id = cur.read_u32().unwrap_or(0);
    let base_data_offset = if flags & 0x000001 != 0 {
        cur.read_u64()
    } else {
        None
    };
    let sample_description_index = if flags & 0x000002 != 0 {
        cur.read_u32()
    } else {
        None
    };
    let default_sample_duration = if flags & 0x000008 != 0 {
        cur.read_u32()
    } else {
        None
    };
    let default_sample_size = if flags & 0x000010 != 0 {
        cur.read_u32()
    } else {
        None
    };
    let default_sample_flags = if flags & 0x000020 != 0 {
        cur.read_u32()
    } else {
        None
    };
    BoxPayload::Tfhd(TfhdPayload {
        version,
        flags,
        track_id,
        base_data_offset,
        sample_description_index,
        default_sample_duration,
        default_sample_size,
        default_sample_flags,
    })
}

pub fn read_tfdt(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let base_media_decode_time = if version == 1 {
        cur.read_u64().unwrap_or(0)
    } else {
        cur.read_u32().unwrap_or(0) as u64
    };
    BoxPayload::Tfdt(TfdtPayload {
        version,
        flags,
        base_media_decode_time,
    })
}

pub fn read_trun(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let sample_count = cur.read_u32().unwrap_or(0);
    let data_offset = if flags & 0x000001 != 0 {
        cur.read_i32()
    } else {
        None
    };
    let first_sample_flags = if flags & 0x000004 != 0 {
        cur.read_u32()
    } else {
        None
    };
    let mut samples = Vec::new();
    for _ in 0..sample_count {
        let duration = if flags & 0x000100 != 0 {
            let Some(v) = cur.read_u32() else { break };
            Some(v)
        } else {
            None
        };
        let size = if flags & 0x000200 != 0 {
            let Some(v) = cur.read_u32() else { break };
            Some(v)
        } else {
            None
        };
        let sflags = if flags & 0x000400 != 0 {
            let Some(v) = cur.read_u32() else { break };
            Some(v)
        } else {
            None
        };
        let composition_offset = if flags & 0x000800 != 0 {
            if version == 0 {
                let Some(v) = cur.read_u32() else { break };
                Some(v as i64)
            } else {
                let Some(v) = cur.read_i32() else { break };
                Some(v as i64)
            }
        } else {
            None
        };
        samples.push(TrunSample {
            duration,
            size,
            flags: sflags,
            composition_offset,
        });
    }
    BoxPayload::Trun(TrunPayload {
        version,
        flags,
        sample_count,
        data_offset,
        first_sample_flags,
        samples,
    })
}

pub fn read_stts(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let entry_count = cur.read_u32().unwrap_or(0);
    let mut entries = Vec::new();
    for _ in 0..entry_count {
        let Some(sample_count) = cur.read_u32() else {
            break;
        };
        let Some(sample_delta) = cur.read_u32() else {
            break;
        };
        entries.push(SttsEntry {
            sample_count,
            sample_delta,
        });
    }
    BoxPayload::Stts(SttsPayload {
        version,
        flags,
        entries,
    })
}

pub fn read_ctts(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let entry_count = cur.read_u32().unwrap_or(0);
    let mut entries = Vec::new();
    for _ in 0..entry_count {
        let Some(sample_count) = cur.read_u32() else {
            break;
        };
        let sample_offset = if version == 0 {
            let Some(v) = cur.read_u32() else { break };
            v as i64
        } else {
            let Some(v) = cur.read_i32() else { break };
            v as i64
        };
        entries.push(CttsEntry {
            sample_count,
            sample_offset,
        });
    }
    BoxPayload::Ctts(CttsPayload {
        version,
        flags,
        entries,
    })
}

pub fn read_vmhd(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let graphics_mode = cur.read_u16().unwrap_or(0);
    let opcolor = [
        cur.read_u16().unwrap_or(0),
        cur.read_u16().unwrap_or(0),
        cur.read_u16().unwrap_or(0),
    ];
    BoxPayload::Vmhd(VmhdPayload {
        version,
        flags,
        graphics_mode,
        opcolor,
    })
}

pub fn read_smhd(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let balance = cur.read_i16().unwrap_or(0);
    cur.skip(2); // reserved
    BoxPayload::Smhd(SmhdPayload {
        version,
        flags,
        balance,
    })
}

/// Payload reader for `dref`: the entry boxes that follow the count are
/// parsed as ordinary children by the container path.
pub fn read_dref(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let entry_count = cur.read_u32().unwrap_or(0);
    BoxPayload::Dref(DrefPayload {
        version,
        flags,
        entry_count,
    })
}

pub fn read_url(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    // Flag 0x1 means the media lives in the same file and no location
    // string follows.
    let location = if flags & 0x000001 != 0 || cur.remaining() == 0 {
        None
    } else {
        cur.read_cstring()
    };
    BoxPayload::Url(UrlPayload {
        version,
        flags,
        location,
    })
}

pub fn read_stsd(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let entry_count = cur.read_u32().unwrap_or(0);
    // Sample entries are codec-specific; not interpreted here.
    cur.skip_to_end();
    BoxPayload::Stsd(StsdPayload {
        version,
        flags,
        entry_count,
    })
}

pub fn read_surveillance_link(cur: &mut BoundedCursor<'_>) -> BoxPayload {
    let (version, flags) = read_fullbox(cur);
    let start_time = cur.read_u64().unwrap_or(0);
    let duration = cur.read_u64().unwrap_or(0);
    let timescale = cur.read_u32().unwrap_or(0);
    let fragment_id = cur.read_uuid().unwrap_or(Uuid::nil());
    let predecessor_id = cur.read_uuid().unwrap_or(Uuid::nil());
    let successor_id = cur.read_uuid().unwrap_or(Uuid::nil());
    BoxPayload::SurveillanceLink(SurveillanceLinkPayload {
        version,
        flags,
        start_time,
        duration,
        timescale,
        fragment_id,
        predecessor_id,
        successor_id,
    })
}

fn time_prop(name: &str, raw: u64) -> Property {
    match mp4_time_to_utc(raw) {
        Some(dt) => Property::text(name, format_utc(&dt)),
        None => Property::text(name, raw),
    }
}

impl BoxPayload {
    /// Exportable name/value pairs for display and JSON output.
    pub fn properties(&self) -> Vec<Property> {
        match self {
            BoxPayload::Ftyp(p) => {
                let brands = p
                    .compatible_brands
                    .iter()
                    .map(|b| b.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                vec![
                    Property::text("major_brand", p.major_brand),
                    Property::text("minor_version", p.minor_version),
                    Property::text("compatible_brands", brands),
                ]
            }
            BoxPayload::Mvhd(p) => vec![
                Property::text("version", p.version),
                time_prop("creation_time", p.creation_time),
                time_prop("modification_time", p.modification_time),
                Property::text("timescale", p.timescale),
                Property::text("duration", p.duration),
                Property::text("rate", format!("{:.2}", p.rate as f64 / 65536.0)),
                Property::text("volume", format!("{:.2}", p.volume as f64 / 256.0)),
                Property::text("next_track_id", p.next_track_id),
            ],
            BoxPayload::Tkhd(p) => vec![
                Property::text("version", p.version),
                Property::text("flags", format!("{:#08x}", p.flags)),
                time_prop("creation_time", p.creation_time),
                time_prop("modification_time", p.modification_time),
                Property::text("track_id", p.track_id),
                Property::text("duration", p.duration),
                Property::text("width", format!("{:.2}", p.width as f64 / 65536.0)),
                Property::text("height", format!("{:.2}", p.height as f64 / 65536.0)),
            ],
            BoxPayload::Mdhd(p) => vec![
                Property::text("version", p.version),
                time_prop("creation_time", p.creation_time),
                time_prop("modification_time", p.modification_time),
                Property::text("timescale", p.timescale),
                Property::text("duration", p.duration),
                Property::text("language", &p.language),
            ],
            BoxPayload::Hdlr(p) => vec![
                Property::text("handler_type", p.handler_type),
                Property::text("name", &p.name),
            ],
            BoxPayload::Mehd(p) => vec![Property::text("fragment_duration", p.fragment_duration)],
            BoxPayload::Trex(p) => vec![
                Property::text("track_id", p.track_id),
                Property::text(
                    "default_sample_description_index",
                    p.default_sample_description_index,
                ),
                Property::text("default_sample_duration", p.default_sample_duration),
                Property::text("default_sample_size", p.default_sample_size),
                Property::text(
                    "default_sample_flags",
                    format!("{:#010x}", p.default_sample_flags),
                ),
            ],
            BoxPayload::Mfhd(p) => vec![Property::text("sequence_number", p.sequence_number)],
            BoxPayload::Tfhd(p) => {
                let mut out = vec![
                    Property::text("flags", format!("{:#08x}", p.flags)),
                    Property::text("track_id", p.track_id),
                ];
                if let Some(v) = p.base_data_offset {
                    out.push(Property::text("base_data_offset", v));
                }
                if let Some(v) = p.sample_description_index {
                    out.push(Property::text("sample_description_index", v));
                }
                if let Some(v) = p.default_sample_duration {
                    out.push(Property::text("default_sample_duration", v));
                }
                if let Some(v) = p.default_sample_size {
                    out.push(Property::text("default_sample_size", v));
                }
                if let Some(v) = p.default_sample_flags {
                    out.push(Property::text("default_sample_flags", format!("{:#010x}", v)));
                }
                out
            }
            BoxPayload::Tfdt(p) => vec![
                Property::text("version", p.version),
                Property::text("base_media_decode_time", p.base_media_decode_time),
            ],
            BoxPayload::Trun(p) => {
                let mut out = vec![
                    Property::text("flags", format!("{:#08x}", p.flags)),
                    Property::text("sample_count", p.sample_count),
                ];
                if let Some(v) = p.data_offset {
                    out.push(Property::text("data_offset", v));
                }
                if let Some(v) = p.first_sample_flags {
                    out.push(Property::text("first_sample_flags", format!("{:#010x}", v)));
                }
                let rows = p
                    .samples
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        let mut cols = Vec::new();
                        if let Some(v) = s.duration {
                            cols.push(Property::text("duration", v));
                        }
                        if let Some(v) = s.size {
                            cols.push(Property::text("size", v));
                        }
                        if let Some(v) = s.flags {
                            cols.push(Property::text("flags", format!("{:#010x}", v)));
                        }
                        if let Some(v) = s.composition_offset {
                            cols.push(Property::text("composition_offset", v));
                        }
                        Property::list(&format!("sample[{}]", i), cols)
                    })
                    .collect();
                out.push(Property::list("samples", rows));
                out
            }
            BoxPayload::Stts(p) => {
                let rows = p
                    .entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| {
                        Property::list(
                            &format!("entry[{}]", i),
                            vec![
                                Property::text("sample_count", e.sample_count),
                                Property::text("sample_delta", e.sample_delta),
                            ],
                        )
                    })
                    .collect();
                vec![
                    Property::text("entry_count", p.entries.len()),
                    Property::list("entries", rows),
                ]
            }
            BoxPayload::Ctts(p) => {
                let rows = p
                    .entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| {
                        Property::list(
                            &format!("entry[{}]", i),
                            vec![
                                Property::text("sample_count", e.sample_count),
                                Property::text("sample_offset", e.sample_offset),
                            ],
                        )
                    })
                    .collect();
                vec![
                    Property::text("entry_count", p.entries.len()),
                    Property::list("entries", rows),
                ]
            }
            BoxPayload::Vmhd(p) => vec![
                Property::text("graphics_mode", p.graphics_mode),
                Property::text(
                    "opcolor",
                    format!("{} {} {}", p.opcolor[0], p.opcolor[1], p.opcolor[2]),
                ),
            ],
            BoxPayload::Smhd(p) => vec![Property::text(
                "balance",
                format!("{:.2}", p.balance as f64 / 256.0),
            )],
            BoxPayload::Dref(p) => vec![Property::text("entry_count", p.entry_count)],
            BoxPayload::Url(p) => {
                let mut out = vec![Property::text("flags", format!("{:#08x}", p.flags))];
                match &p.location {
                    Some(loc) => out.push(Property::text("location", loc)),
                    None => out.push(Property::text("location", "(same file)")),
                }
                out
            }
            BoxPayload::Stsd(p) => vec![Property::text("entry_count", p.entry_count)],
            BoxPayload::SurveillanceLink(p) => {
                let start = match filetime_to_utc(p.start_time) {
                    Some(dt) => format_utc(&dt),
                    None => p.start_time.to_string(),
                };
                vec![
                    Property::text("start_time", start),
                    Property::text("duration", p.duration),
                    Property::text("timescale", p.timescale),
                    Property::text("fragment_id", p.fragment_id),
                    Property::text("predecessor_id", p.predecessor_id),
                    Property::text("successor_id", p.successor_id),
                ]
            }
            BoxPayload::Container | BoxPayload::Leaf | BoxPayload::Unknown => Vec::new(),
            BoxPayload::MissingMandatory { expected } => {
                vec![Property::text("expected", expected)]
            }
            BoxPayload::MissingMandatoryGroup { expected } => {
                let names = expected
                    .iter()
                    .map(|k| k.to_string())
                    .collect::<Vec<_>>()
                    .join(" | ");
                vec![Property::text("expected_one_of", names)]
            }
        }
    }
}
