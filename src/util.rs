use std::io::{Read, Seek, SeekFrom};

use chrono::{DateTime, TimeZone, Utc};

pub fn read_slice<R: Read + Seek>(r: &mut R, offset: u64, len: u64) -> std::io::Result<Vec<u8>> {
    r.seek(SeekFrom::Start(offset))?;
    let mut v = vec![0u8; len as usize];
    r.read_exact(&mut v)?;
    Ok(v)
}

pub fn hex_dump(bytes: &[u8], start_offset: u64) -> String {
    // Simple hexdump
    let mut out = String::new();
    for (i, chunk) in bytes.chunks(16).enumerate() {
        let offs = start_offset + (i as u64) * 16;
        let hexs: String = chunk.iter().map(|b| format!("{:02x} ", b)).collect();
        let ascii: String = chunk
            .iter()
            .map(|b| {
                let c = *b;
                if (32..=126).contains(&c) { c as char } else { '.' }
            })
            .collect();
        out.push_str(&format!("{:08x}  {:<48}  |{}|\n", offs, hexs, ascii));
    }
    out
}

/// Seconds between 1904-01-01 (box time epoch) and 1970-01-01.
const MP4_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Seconds between 1601-01-01 (linkage time epoch) and 1970-01-01.
const FILETIME_EPOCH_OFFSET: i64 = 11_644_473_600;

/// Convert seconds since 1904-01-01 to UTC. Zero is treated as "unset".
pub fn mp4_time_to_utc(secs: u64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    let unix = (secs as i64).checked_sub(MP4_EPOCH_OFFSET)?;
    Utc.timestamp_opt(unix, 0).single()
}

/// Convert 100-nanosecond ticks since 1601-01-01 to UTC.
pub fn filetime_to_utc(ticks: u64) -> Option<DateTime<Utc>> {
    if ticks == 0 {
        return None;
    }
    let secs = (ticks / 10_000_000) as i64;
    let nanos = (ticks % 10_000_000) as u32 * 100;
    let unix = secs.checked_sub(FILETIME_EPOCH_OFFSET)?;
    Utc.timestamp_opt(unix, nanos).single()
}

pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string()
}
