#![allow(dead_code)]

use uuid::Uuid;

use fragbox::SURVEILLANCE_LINK_UUID;

/// Plain box: 32-bit size + type + payload.
pub fn make_box(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&((8 + payload.len()) as u32).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

/// FullBox: version + 24-bit flags before the payload.
pub fn make_full_box(typ: &[u8; 4], version: u8, flags: u32, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.push(version);
    body.extend_from_slice(&flags.to_be_bytes()[1..]);
    body.extend_from_slice(payload);
    make_box(typ, &body)
}

/// Box using the 64-bit large size encoding (size field = 1).
pub fn make_large_box(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&1u32.to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(&((16 + payload.len()) as u64).to_be_bytes());
    v.extend_from_slice(payload);
    v
}

/// `uuid` box carrying an extended type.
pub fn make_uuid_box(extended: &Uuid, payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&((24 + payload.len()) as u32).to_be_bytes());
    v.extend_from_slice(b"uuid");
    v.extend_from_slice(extended.as_bytes());
    v.extend_from_slice(payload);
    v
}

/// Container wrapping already-encoded child boxes.
pub fn make_container(typ: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let payload: Vec<u8> = children.iter().flatten().copied().collect();
    make_box(typ, &payload)
}

/// Full mvhd payload, version 0.
pub fn encode_mvhd(timescale: u32, duration: u32) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&0u32.to_be_bytes()); // creation_time
    p.extend_from_slice(&0u32.to_be_bytes()); // modification_time
    p.extend_from_slice(&timescale.to_be_bytes());
    p.extend_from_slice(&duration.to_be_bytes());
    p.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // rate = 1.0
    p.extend_from_slice(&0x0100u16.to_be_bytes()); // volume = 1.0
    p.extend_from_slice(&[0u8; 70]); // reserved + matrix + pre_defined
    p.extend_from_slice(&2u32.to_be_bytes()); // next_track_id
    make_full_box(b"mvhd", 0, 0, &p)
}

/// tfhd with the default-sample-duration flag set.
pub fn encode_tfhd(track_id: u32, default_sample_duration: u32) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&track_id.to_be_bytes());
    p.extend_from_slice(&default_sample_duration.to_be_bytes());
    make_full_box(b"tfhd", 0, 0x000008, &p)
}

/// trun with per-sample durations and sizes.
pub fn encode_trun(samples: &[(u32, u32)]) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&(samples.len() as u32).to_be_bytes());
    for (duration, size) in samples {
        p.extend_from_slice(&duration.to_be_bytes());
        p.extend_from_slice(&size.to_be_bytes());
    }
    make_full_box(b"trun", 0, 0x000300, &p)
}

/// Surveillance linkage box under its vendor extended type.
pub fn make_link_box(
    start_ticks: u64,
    duration: u64,
    timescale: u32,
    own: Uuid,
    pred: Uuid,
    succ: Uuid,
) -> Vec<u8> {
    let mut p = Vec::new();
    p.push(0); // version
    p.extend_from_slice(&[0, 0, 0]); // flags
    p.extend_from_slice(&start_ticks.to_be_bytes());
    p.extend_from_slice(&duration.to_be_bytes());
    p.extend_from_slice(&timescale.to_be_bytes());
    p.extend_from_slice(own.as_bytes());
    p.extend_from_slice(pred.as_bytes());
    p.extend_from_slice(succ.as_bytes());
    make_uuid_box(&SURVEILLANCE_LINK_UUID, &p)
}

pub fn make_ftyp() -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(b"isom");
    p.extend_from_slice(&512u32.to_be_bytes());
    p.extend_from_slice(b"isom");
    make_box(b"ftyp", &p)
}

/// Smallest movie that parses cleanly: ftyp + moov(mvhd).
pub fn make_minimal_movie() -> Vec<u8> {
    let mut v = make_ftyp();
    v.extend_from_slice(&make_container(b"moov", &[encode_mvhd(1000, 5000)]));
    v
}

/// One fragment file of a surveillance chain: ftyp + moov(mvhd + link) +
/// moof(mfhd + traf(tfhd + trun)).
pub fn make_fragment_file(own: Uuid, pred: Uuid, succ: Uuid, start_ticks: u64) -> Vec<u8> {
    let moov = make_container(
        b"moov",
        &[
            encode_mvhd(90_000, 0),
            make_link_box(start_ticks, 90_000, 90_000, own, pred, succ),
        ],
    );
    let mfhd = make_full_box(b"mfhd", 0, 0, &1u32.to_be_bytes());
    let traf = make_container(
        b"traf",
        &[
            encode_tfhd(1, 3000),
            encode_trun(&[(3000, 100), (3000, 120), (3000, 80)]),
        ],
    );
    let moof = make_container(b"moof", &[mfhd, traf]);

    let mut v = make_ftyp();
    v.extend_from_slice(&moov);
    v.extend_from_slice(&moof);
    v
}
