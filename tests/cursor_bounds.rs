use std::io::Cursor;

use fragbox::{BoundedCursor, SizeHealth};

fn counting_bytes(n: u8) -> Vec<u8> {
    (0..n).collect()
}

#[test]
fn consuming_the_whole_window_is_ok() {
    let data = counting_bytes(16);
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, 16).unwrap();

    cur.push_window(8);
    assert_eq!(cur.read_u32(), Some(0x0001_0203));
    assert_eq!(cur.read_u32(), Some(0x0405_0607));
    assert_eq!(cur.pop_window(), SizeHealth::Ok);
}

#[test]
fn stopping_short_of_the_declared_end_is_insufficient() {
    let data = counting_bytes(16);
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, 16).unwrap();

    cur.push_window(8);
    assert_eq!(cur.read_u32(), Some(0x0001_0203));
    assert_eq!(cur.pop_window(), SizeHealth::Insufficient);
    // The next sibling still starts at the declared end.
    assert_eq!(cur.position(), 8);
    assert_eq!(cur.read_u32(), Some(0x0809_0A0B));
}

#[test]
fn reading_past_the_declared_end_is_exceeding() {
    let data = counting_bytes(16);
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, 16).unwrap();

    cur.push_window(4);
    assert_eq!(cur.read_u64(), None);
    assert_eq!(cur.pop_window(), SizeHealth::Exceeding);
    // Position clamps to the window end instead of running away.
    assert_eq!(cur.position(), 4);
    assert_eq!(cur.read_u32(), Some(0x0405_0607));
}

#[test]
fn child_claiming_bytes_beyond_its_parent_marks_the_parent() {
    let data = counting_bytes(16);
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, 12).unwrap();

    cur.push_window(8); // parent box
    assert_eq!(cur.read_u32(), Some(0x0001_0203));
    cur.push_window(20); // child declares an end past everything
    assert_eq!(cur.read_u64(), None);

    // The child never reached its own declared end, so it reads short; the
    // parent is the window the read actually crossed.
    assert_eq!(cur.pop_window(), SizeHealth::Insufficient);
    assert_eq!(cur.pop_window(), SizeHealth::Exceeding);
}

#[test]
fn source_eof_before_the_declared_end_is_exceeding() {
    let data = counting_bytes(8);
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, 32).unwrap();

    cur.push_window(24);
    assert_eq!(cur.read_u64(), Some(0x0001_0203_0405_0607));
    // The window has room but the source does not.
    assert_eq!(cur.read_u64(), None);
    assert_eq!(cur.pop_window(), SizeHealth::Exceeding);
}

#[test]
fn skip_honors_the_window() {
    let data = counting_bytes(16);
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, 16).unwrap();

    cur.push_window(8);
    assert!(cur.skip(4));
    assert!(!cur.skip(8));
    assert_eq!(cur.position(), 8);
    assert_eq!(cur.pop_window(), SizeHealth::Exceeding);
}

#[test]
fn cstring_stops_at_the_terminator() {
    let data = b"abc\0efgh".to_vec();
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, 8).unwrap();

    cur.push_window(8);
    assert_eq!(cur.read_cstring().as_deref(), Some("abc"));
    assert_eq!(cur.position(), 4);
}

#[test]
fn cstring_without_terminator_is_an_overrun() {
    let data = b"abcd".to_vec();
    let mut src = Cursor::new(data);
    let mut cur = BoundedCursor::new(&mut src, 0, 4).unwrap();

    cur.push_window(4);
    assert_eq!(cur.read_cstring(), None);
    assert_eq!(cur.pop_window(), SizeHealth::Exceeding);
}
