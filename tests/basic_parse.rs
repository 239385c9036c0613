mod common;

use std::io::Cursor;

use fragbox::{
    BoundedCursor, BoxKey, BoxNode, FourCC, ParseError, PropertyValue, SURVEILLANCE_LINK_UUID,
    SizeHealth, analyze_tree, read_box_header,
};
use uuid::Uuid;

fn tree_of(data: Vec<u8>) -> Vec<BoxNode> {
    let len = data.len() as u64;
    let mut src = Cursor::new(data);
    analyze_tree(&mut src, len).expect("parse failed")
}

fn prop(node: &BoxNode, name: &str) -> String {
    node.properties()
        .into_iter()
        .find(|p| p.name == name)
        .map(|p| match p.value {
            PropertyValue::Text(s) => s,
            PropertyValue::List(items) => format!("{} records", items.len()),
        })
        .unwrap_or_else(|| panic!("property {} missing", name))
}

#[test]
fn read_single_ftyp_header() {
    let data = common::make_ftyp();
    let len = data.len() as u64;
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, len).unwrap();

    let hdr = read_box_header(&mut cur)
        .expect("read_box_header failed")
        .expect("no header");
    assert_eq!(hdr.offset, 0);
    assert_eq!(hdr.total_size(), 24);
    assert_eq!(hdr.key, BoxKey::FourCC(FourCC(*b"ftyp")));
    assert_eq!(hdr.header_size, 8);
}

#[test]
fn large_size_header_uses_the_64_bit_field() {
    let data = common::make_large_box(b"mdat", &[0xAA; 4]);
    let len = data.len() as u64;
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, len).unwrap();

    let hdr = read_box_header(&mut cur)
        .expect("read_box_header failed")
        .expect("no header");
    assert_eq!(hdr.short_size, 1);
    assert_eq!(hdr.large_size, Some(20));
    assert_eq!(hdr.total_size(), 20);
    assert_eq!(hdr.header_size, 16);
}

#[test]
fn uuid_type_in_iso_namespace_collapses_to_fourcc() {
    let data = common::make_uuid_box(&FourCC(*b"mvhd").to_uuid(), &[]);
    let len = data.len() as u64;
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, len).unwrap();

    let hdr = read_box_header(&mut cur)
        .expect("read_box_header failed")
        .expect("no header");
    assert_eq!(hdr.key, BoxKey::FourCC(FourCC(*b"mvhd")));
    assert_eq!(hdr.header_size, 24);
}

#[test]
fn vendor_uuid_type_is_kept() {
    let data = common::make_uuid_box(&SURVEILLANCE_LINK_UUID, &[]);
    let len = data.len() as u64;
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, len).unwrap();

    let hdr = read_box_header(&mut cur)
        .expect("read_box_header failed")
        .expect("no header");
    assert_eq!(hdr.key, BoxKey::Uuid(SURVEILLANCE_LINK_UUID));
}

#[test]
fn declared_size_smaller_than_header_is_invalid() {
    let mut data = Vec::new();
    data.extend_from_slice(&4u32.to_be_bytes());
    data.extend_from_slice(b"free");
    let len = data.len() as u64;
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, len).unwrap();

    let err = read_box_header(&mut cur).unwrap_err();
    assert!(matches!(err, ParseError::InvalidSize));
}

#[test]
fn malformed_size_skips_the_rest_of_the_window() {
    let mut data = common::make_ftyp();
    data.extend_from_slice(&4u32.to_be_bytes());
    data.extend_from_slice(b"free");
    data.extend_from_slice(&common::make_ftyp());

    // Parsing stops at the malformed box; the first one survives.
    let tree = tree_of(data);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "file type box");
}

#[test]
fn size_zero_box_runs_to_end_of_file() {
    let mut data = common::make_ftyp();
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&[0xAB; 16]);

    let tree = tree_of(data);
    assert_eq!(tree.len(), 2);
    let mdat = &tree[1];
    assert_eq!(mdat.name, "media data box");
    assert_eq!(mdat.header.short_size, 0);
    assert_eq!(mdat.declared_size(), 0);
    assert_eq!(mdat.size_health, SizeHealth::Ok);
}

#[test]
fn unknown_type_is_skipped_not_fatal() {
    let mut data = common::make_box(b"zzzz", &[1, 2, 3, 4]);
    data.extend_from_slice(&common::make_ftyp());

    let tree = tree_of(data);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].name, "unknown box");
    assert_eq!(tree[0].size_health, SizeHealth::Ok);
    assert_eq!(tree[1].name, "file type box");
}

#[test]
fn minimal_movie_parses_with_missing_track_stub() {
    let tree = tree_of(common::make_minimal_movie());
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].name, "file type box");
    assert_eq!(prop(&tree[0], "major_brand"), "isom");

    let moov = &tree[1];
    assert_eq!(moov.name, "movie box");
    assert!(moov.consistency.names().contains(&"missing-mandatory"));

    let mvhd = moov.find_first(*b"mvhd").expect("no mvhd");
    assert_eq!(prop(mvhd, "timescale"), "1000");
    assert_eq!(prop(mvhd, "duration"), "5000");

    let stub = moov
        .children
        .iter()
        .find(|c| c.is_synthetic())
        .expect("no stub for the missing track");
    assert_eq!(stub.header.key, BoxKey::FourCC(FourCC(*b"trak")));
}

#[test]
fn truncated_box_reports_insufficient() {
    let mut data = Vec::new();
    data.extend_from_slice(&100u32.to_be_bytes());
    data.extend_from_slice(b"free");
    data.extend_from_slice(&[0u8; 8]);

    let tree = tree_of(data);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].size_health, SizeHealth::Insufficient);
}

#[test]
fn payload_overrun_reports_exceeding() {
    // mvhd needs far more than 8 payload bytes.
    let tree = tree_of(common::make_box(b"mvhd", &[0u8; 8]));
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].size_health, SizeHealth::Exceeding);
}

#[test]
fn surveillance_link_decodes_under_its_extended_type() {
    let own = Uuid::from_u128(0xAA);
    let succ = Uuid::from_u128(0xBB);
    let tree = tree_of(common::make_link_box(0, 90_000, 90_000, own, own, succ));

    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "surveillance fragment link box");
    assert_eq!(prop(&tree[0], "fragment_id"), own.to_string());
    assert_eq!(prop(&tree[0], "successor_id"), succ.to_string());
    assert_eq!(prop(&tree[0], "timescale"), "90000");
}

#[test]
fn fragment_file_tree_is_structurally_sound() {
    let own = Uuid::from_u128(1);
    let tree = tree_of(common::make_fragment_file(own, own, own, 0));

    let moof = tree.iter().find(|b| b.name == "movie fragment box").expect("no moof");
    assert!(moof.consistency.is_empty());
    assert_eq!(moof.size_health, SizeHealth::Ok);

    let trun = moof.find_first(*b"trun").expect("no trun");
    assert_eq!(prop(trun, "sample_count"), "3");
}
