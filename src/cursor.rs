use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};
use uuid::Uuid;

use crate::boxes::FourCC;

/// Anything the cursor can pull bytes from. Blanket-implemented so files,
/// `Cursor<Vec<u8>>`, and buffered readers all qualify.
pub trait ByteSource: Read + Seek {}

impl<T: Read + Seek> ByteSource for T {}

/// Health of a single window, tracked while the window is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowHealth {
    Ok,
    /// A read crossed this window's declared end.
    Oversized,
}

#[derive(Debug)]
struct Window {
    /// End the box declared on the wire.
    declared_end: u64,
    /// Effective end: declared end clamped to every enclosing window.
    limit: u64,
    health: WindowHealth,
}

/// A reader over a stack of nested byte windows.
///
/// Each open box pushes a window; reads are bounds-checked against the
/// innermost window. A failed read never aborts parsing: it returns `None`,
/// marks every window whose declared end the read would have crossed, and
/// clamps the position so subsequent reads stay in bounds.
pub struct BoundedCursor<'a> {
    src: &'a mut dyn ByteSource,
    pos: u64,
    windows: Vec<Window>,
}

impl<'a> BoundedCursor<'a> {
    /// Open a cursor over `[start, end)` of `src`.
    pub fn new(src: &'a mut dyn ByteSource, start: u64, end: u64) -> std::io::Result<Self> {
        src.seek(SeekFrom::Start(start))?;
        Ok(BoundedCursor {
            src,
            pos: start,
            windows: vec![Window {
                declared_end: end,
                limit: end,
                health: WindowHealth::Ok,
            }],
        })
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    fn top(&self) -> &Window {
        // The root window is pushed in new() and never popped.
        self.windows.last().unwrap()
    }

    /// Bytes left before the innermost window's effective end.
    pub fn remaining(&self) -> u64 {
        self.top().limit.saturating_sub(self.pos)
    }

    /// Declared end of the innermost window.
    pub fn window_end(&self) -> u64 {
        self.top().declared_end
    }

    /// Open a nested window ending at the absolute offset `end`. The
    /// effective limit never exceeds the enclosing window's limit, so a
    /// child box lying about its size cannot read past its parent.
    pub fn push_window(&mut self, end: u64) {
        let parent_limit = self.top().limit;
        self.windows.push(Window {
            declared_end: end,
            limit: end.min(parent_limit),
            health: WindowHealth::Ok,
        });
    }

    /// Close the innermost window and report how its consumption compared
    /// to its declared size. The position lands on the window's effective
    /// end regardless, so the next sibling parses from the right offset.
    pub fn pop_window(&mut self) -> crate::boxes::SizeHealth {
        debug_assert!(self.windows.len() > 1, "root window must stay open");
        let w = self.windows.pop().unwrap();
        let health = if w.health == WindowHealth::Oversized {
            crate::boxes::SizeHealth::Exceeding
        } else if self.pos < w.declared_end {
            // Covers both an early stop by the payload reader and a source
            // that ran out before the declared end.
            crate::boxes::SizeHealth::Insufficient
        } else {
            crate::boxes::SizeHealth::Ok
        };
        let target = w.declared_end.min(w.limit);
        if self.pos != target {
            self.pos = target;
            let _ = self.src.seek(SeekFrom::Start(target));
        }
        health
    }

    /// Check that `n` more bytes fit in the innermost window. On failure,
    /// mark every window whose declared end the read would cross, clamp the
    /// position to the effective end, and return false.
    fn ensure(&mut self, n: u64) -> bool {
        let want = self.pos.saturating_add(n);
        if want <= self.top().limit {
            return true;
        }
        for w in self.windows.iter_mut() {
            if want > w.declared_end {
                w.health = WindowHealth::Oversized;
            }
        }
        let limit = self.top().limit;
        if self.pos != limit {
            self.pos = limit;
            let _ = self.src.seek(SeekFrom::Start(limit));
        }
        false
    }

    fn fail_io(&mut self) {
        for w in self.windows.iter_mut() {
            w.health = WindowHealth::Oversized;
        }
    }

    fn read_with<T>(
        &mut self,
        n: u64,
        f: impl FnOnce(&mut dyn ByteSource) -> std::io::Result<T>,
    ) -> Option<T> {
        if !self.ensure(n) {
            return None;
        }
        match f(self.src) {
            Ok(v) => {
                self.pos += n;
                Some(v)
            }
            Err(_) => {
                self.fail_io();
                None
            }
        }
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        self.read_with(1, |s| s.read_u8())
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        self.read_with(2, |s| s.read_u16::<BigEndian>())
    }

    pub fn read_u24(&mut self) -> Option<u32> {
        self.read_with(3, |s| s.read_u24::<BigEndian>())
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        self.read_with(4, |s| s.read_u32::<BigEndian>())
    }

    pub fn read_u64(&mut self) -> Option<u64> {
        self.read_with(8, |s| s.read_u64::<BigEndian>())
    }

    pub fn read_i16(&mut self) -> Option<i16> {
        self.read_with(2, |s| s.read_i16::<BigEndian>())
    }

    pub fn read_i32(&mut self) -> Option<i32> {
        self.read_with(4, |s| s.read_i32::<BigEndian>())
    }

    pub fn read_i64(&mut self) -> Option<i64> {
        self.read_with(8, |s| s.read_i64::<BigEndian>())
    }

    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.read_with(N as u64, |s| {
            let mut buf = [0u8; N];
            s.read_exact(&mut buf)?;
            Ok(buf)
        })
    }

    pub fn read_fourcc(&mut self) -> Option<FourCC> {
        self.read_array::<4>().map(FourCC)
    }

    pub fn read_uuid(&mut self) -> Option<Uuid> {
        self.read_array::<16>().map(Uuid::from_bytes)
    }

    /// Read a null-terminated UTF-8 string. If the window ends before a
    /// terminator appears, the windows are marked as over-read and `None`
    /// is returned.
    pub fn read_cstring(&mut self) -> Option<String> {
        let mut buf = Vec::new();
        loop {
            if self.pos >= self.top().limit {
                // Terminator would have to live past the window end.
                let _ = self.ensure(1);
                return None;
            }
            let b = self.read_u8()?;
            if b == 0 {
                break;
            }
            buf.push(b);
        }
        Some(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Advance `n` bytes without interpreting them.
    pub fn skip(&mut self, n: u64) -> bool {
        if !self.ensure(n) {
            return false;
        }
        self.pos += n;
        if self.src.seek(SeekFrom::Start(self.pos)).is_err() {
            self.fail_io();
            return false;
        }
        true
    }

    /// Jump to the effective end of the innermost window.
    pub fn skip_to_end(&mut self) {
        let limit = self.top().limit;
        if self.pos != limit {
            self.pos = limit;
            let _ = self.src.seek(SeekFrom::Start(limit));
        }
    }
}
