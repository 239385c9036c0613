use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::boxes::BoxHeader;
use crate::parser::BoxObserver;
use crate::payload::BoxPayload;

/// Role bits assigned to one file from its own linkage record and from
/// cross-references found in the other files of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FragmentClass(u8);

impl FragmentClass {
    /// Another file names this one as its successor.
    pub const HAS_PREDECESSOR: FragmentClass = FragmentClass(1 << 0);
    /// Another file names this one as its predecessor.
    pub const HAS_SUCCESSOR: FragmentClass = FragmentClass(1 << 1);
    /// The file's own record marks it as the chain start.
    pub const IS_START_FRAGMENT: FragmentClass = FragmentClass(1 << 2);
    /// The file's own record marks it as the chain end.
    pub const IS_FINAL_FRAGMENT: FragmentClass = FragmentClass(1 << 3);
    /// The file carried a linkage record at all.
    pub const IS_SURVEILLANCE: FragmentClass = FragmentClass(1 << 4);

    /// Start of a multi-file chain.
    pub const START_FRAGMENT: FragmentClass =
        FragmentClass(Self::IS_SURVEILLANCE.0 | Self::IS_START_FRAGMENT.0 | Self::HAS_SUCCESSOR.0);
    /// End of a multi-file chain.
    pub const FINAL_FRAGMENT: FragmentClass =
        FragmentClass(Self::IS_SURVEILLANCE.0 | Self::IS_FINAL_FRAGMENT.0 | Self::HAS_PREDECESSOR.0);
    /// Interior link of a multi-file chain.
    pub const MIDDLE_FRAGMENT: FragmentClass =
        FragmentClass(Self::IS_SURVEILLANCE.0 | Self::HAS_PREDECESSOR.0 | Self::HAS_SUCCESSOR.0);
    /// Single self-contained recording.
    pub const STANDALONE_FRAGMENT: FragmentClass = FragmentClass(
        Self::IS_SURVEILLANCE.0 | Self::IS_START_FRAGMENT.0 | Self::IS_FINAL_FRAGMENT.0,
    );

    pub fn insert(&mut self, other: FragmentClass) {
        self.0 |= other.0;
    }

    pub fn contains(self, other: FragmentClass) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when the bit pattern matches none of the recognized roles.
    pub fn is_undefined(self) -> bool {
        self != Self::START_FRAGMENT
            && self != Self::FINAL_FRAGMENT
            && self != Self::MIDDLE_FRAGMENT
            && self != Self::STANDALONE_FRAGMENT
    }

    pub fn name(self) -> &'static str {
        if self == Self::START_FRAGMENT {
            "start fragment"
        } else if self == Self::FINAL_FRAGMENT {
            "final fragment"
        } else if self == Self::MIDDLE_FRAGMENT {
            "middle fragment"
        } else if self == Self::STANDALONE_FRAGMENT {
            "standalone fragment"
        } else {
            "undefined"
        }
    }
}

/// Per-file classification state.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: String,
    pub class: FragmentClass,
    /// Number of linkage records seen in the file. Valid files carry
    /// exactly one.
    pub link_count: u32,
    pub own_id: Option<Uuid>,
    pub predecessor_id: Option<Uuid>,
    pub successor_id: Option<Uuid>,
}

impl FileRecord {
    fn new(path: &str) -> Self {
        FileRecord {
            path: path.to_string(),
            class: FragmentClass::default(),
            link_count: 0,
            own_id: None,
            predecessor_id: None,
            successor_id: None,
        }
    }
}

/// Outcome of validating a batch of files as one recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilesetVerdict {
    /// The files form exactly one complete chain (or one standalone file).
    Conformant,
    /// At least one file carried no complete linkage record.
    NotSurveillanceFormat,
    /// Linkage is present but the roles do not form a single valid chain.
    NotSurveillanceFileset,
}

/// Classifies each file of a batch by its linkage role and judges whether
/// the batch forms a single valid recording.
#[derive(Debug, Default)]
pub struct FilesetValidator {
    files: Vec<FileRecord>,
    current: Option<FileRecord>,
}

impl FilesetValidator {
    pub fn new() -> Self {
        FilesetValidator::default()
    }

    pub fn open_file(&mut self, path: &str) {
        self.current = Some(FileRecord::new(path));
    }

    pub fn close_file(&mut self) {
        if let Some(rec) = self.current.take() {
            self.files.push(rec);
        }
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    fn all_records(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.iter().chain(self.current.as_ref())
    }

    /// One file is individually valid when it carried exactly one linkage
    /// record and its role bits form a recognized role.
    pub fn is_valid_file(&self) -> bool {
        let mut records = self.all_records();
        let Some(rec) = records.next() else {
            return false;
        };
        if records.next().is_some() {
            return false;
        }
        rec.link_count == 1 && !rec.class.is_undefined()
    }

    /// The batch is a single valid recording when every file is a valid
    /// fragment, roles are consistent, and exactly one start and one final
    /// fragment exist. A single standalone file also qualifies.
    pub fn is_valid_fileset(&self) -> bool {
        if self.files.is_empty() {
            return false;
        }
        if self.files.len() == 1 {
            let rec = &self.files[0];
            return rec.link_count == 1 && rec.class == FragmentClass::STANDALONE_FRAGMENT;
        }

        let mut starts = 0;
        let mut finals = 0;
        for rec in &self.files {
            if rec.link_count != 1 || rec.class.is_undefined() {
                return false;
            }
            if rec.class == FragmentClass::STANDALONE_FRAGMENT {
                return false;
            }
            if rec.class == FragmentClass::START_FRAGMENT {
                starts += 1;
            }
            if rec.class == FragmentClass::FINAL_FRAGMENT {
                finals += 1;
            }
        }
        starts == 1 && finals == 1
    }

    /// Overall verdict for the batch.
    pub fn verdict(&self) -> FilesetVerdict {
        if self.files.is_empty()
            || self
                .files
                .iter()
                .any(|r| !r.class.contains(FragmentClass::IS_SURVEILLANCE))
        {
            return FilesetVerdict::NotSurveillanceFormat;
        }
        if self.is_valid_fileset() {
            FilesetVerdict::Conformant
        } else {
            FilesetVerdict::NotSurveillanceFileset
        }
    }
}

impl BoxObserver for FilesetValidator {
    fn on_box(&mut self, _header: &BoxHeader, payload: &BoxPayload) {
        let BoxPayload::SurveillanceLink(p) = payload else {
            return;
        };
        let Some(rec) = self.current.as_mut() else {
            return;
        };

        rec.link_count += 1;
        rec.own_id = Some(p.fragment_id);
        rec.predecessor_id = Some(p.predecessor_id);
        rec.successor_id = Some(p.successor_id);
        rec.class.insert(FragmentClass::IS_SURVEILLANCE);
        if p.predecessor_id == p.fragment_id {
            rec.class.insert(FragmentClass::IS_START_FRAGMENT);
        }
        if p.successor_id == p.fragment_id {
            rec.class.insert(FragmentClass::IS_FINAL_FRAGMENT);
        }

        debug!(path = %rec.path, class = rec.class.name(), "classified from linkage record");

        // Cross-link against files already closed, in both directions. Only
        // records that actually carried linkage take part, so a nil UUID in
        // one file cannot pair with another nil.
        for other in &mut self.files {
            if other.link_count == 0 {
                continue;
            }
            if other.successor_id == Some(p.fragment_id)
                && other.own_id != Some(p.fragment_id)
            {
                rec.class.insert(FragmentClass::HAS_PREDECESSOR);
                other.class.insert(FragmentClass::HAS_SUCCESSOR);
            }
            if other.predecessor_id == Some(p.fragment_id)
                && other.own_id != Some(p.fragment_id)
            {
                rec.class.insert(FragmentClass::HAS_SUCCESSOR);
                other.class.insert(FragmentClass::HAS_PREDECESSOR);
            }
            if Some(p.successor_id) == other.own_id && Some(p.fragment_id) != other.own_id {
                rec.class.insert(FragmentClass::HAS_SUCCESSOR);
                other.class.insert(FragmentClass::HAS_PREDECESSOR);
            }
            if Some(p.predecessor_id) == other.own_id && Some(p.fragment_id) != other.own_id {
                rec.class.insert(FragmentClass::HAS_PREDECESSOR);
                other.class.insert(FragmentClass::HAS_SUCCESSOR);
            }
        }
    }
}
