mod common;

use std::io::Cursor;

use fragbox::{FilesetReport, FilesetSession, FilesetVerdict};
use uuid::Uuid;

fn report_of(files: &[(&str, Vec<u8>)]) -> FilesetReport {
    let mut session = FilesetSession::new();
    for (name, bytes) in files {
        let len = bytes.len() as u64;
        let mut src = Cursor::new(bytes.as_slice());
        session
            .add_reader(name, &mut src, len)
            .expect("parse failed");
    }
    session.finish()
}

#[test]
fn standalone_recording_is_conformant() {
    let a = Uuid::from_u128(1);
    let report = report_of(&[("only.mp4", common::make_fragment_file(a, a, a, 0))]);

    assert_eq!(report.verdict, FilesetVerdict::Conformant);
    assert_eq!(report.fragments[0].classification, "standalone fragment");
}

#[test]
fn plain_movie_is_not_surveillance_format() {
    let report = report_of(&[("plain.mp4", common::make_minimal_movie())]);

    assert_eq!(report.verdict, FilesetVerdict::NotSurveillanceFormat);
    let frag = &report.fragments[0];
    assert!(!frag.surveillance);
    assert_eq!(frag.classification, "undefined");
}

#[test]
fn mixing_plain_and_linked_files_is_not_surveillance_format() {
    let a = Uuid::from_u128(1);
    let b = Uuid::from_u128(2);
    let report = report_of(&[
        ("a.mp4", common::make_fragment_file(a, a, b, 0)),
        ("plain.mp4", common::make_minimal_movie()),
    ]);

    assert_eq!(report.verdict, FilesetVerdict::NotSurveillanceFormat);
}

#[test]
fn two_start_fragments_are_not_a_fileset() {
    let a = Uuid::from_u128(1);
    let b = Uuid::from_u128(2);
    let report = report_of(&[
        ("a.mp4", common::make_fragment_file(a, a, b, 0)),
        ("b.mp4", common::make_fragment_file(b, b, a, 0)),
    ]);

    assert_eq!(report.verdict, FilesetVerdict::NotSurveillanceFileset);
}

#[test]
fn missing_middle_fragment_breaks_the_chain() {
    let a = Uuid::from_u128(1);
    let b = Uuid::from_u128(2);
    let c = Uuid::from_u128(3);
    let report = report_of(&[
        ("a.mp4", common::make_fragment_file(a, a, b, 0)),
        ("c.mp4", common::make_fragment_file(c, b, c, 0)),
    ]);

    assert_eq!(report.verdict, FilesetVerdict::NotSurveillanceFileset);
}

#[test]
fn empty_batch_is_not_surveillance_format() {
    let report = report_of(&[]);
    assert_eq!(report.verdict, FilesetVerdict::NotSurveillanceFormat);
    assert!(report.fragments.is_empty());
}
