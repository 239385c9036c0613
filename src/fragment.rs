use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::boxes::BoxHeader;
use crate::parser::BoxObserver;
use crate::payload::BoxPayload;
use crate::util::{filetime_to_utc, format_utc};

/// Timing and linkage facts accumulated from one file's boxes.
#[derive(Debug, Default, Clone)]
pub struct FragmentInfo {
    pub path: String,
    /// Linkage identity; all three present only when the file carried a
    /// complete linkage record.
    pub fragment_id: Option<Uuid>,
    pub predecessor_id: Option<Uuid>,
    pub successor_id: Option<Uuid>,
    /// Start of recording in 100ns ticks since 1601-01-01 UTC.
    pub start_ticks: Option<u64>,
    pub link_duration: Option<u64>,
    pub link_timescale: Option<u32>,
    /// Position within the reordered chain, assigned by [`ChainExtractor::reorder`].
    pub ordinal: Option<u32>,
    pub track_ids: BTreeSet<u32>,
    pub movie_timescale: Option<u32>,
    pub track_timescales: HashMap<u32, u32>,
    current_track: Option<u32>,
    default_sample_duration: Option<u32>,
    pub sample_count: u64,
    sample_duration_total: u64,
    composition_min: Option<i64>,
    composition_max: Option<i64>,
}

impl FragmentInfo {
    fn new(path: &str) -> Self {
        FragmentInfo {
            path: path.to_string(),
            ..Default::default()
        }
    }

    /// True when the file carried a complete linkage record.
    pub fn is_surveillance(&self) -> bool {
        self.fragment_id.is_some()
            && self.predecessor_id.is_some()
            && self.successor_id.is_some()
    }

    /// Duration in milliseconds: from the linkage record when present,
    /// otherwise estimated from accumulated sample durations against the
    /// fragment track's timescale.
    pub fn duration_ms(&self) -> Option<u64> {
        if let (Some(d), Some(ts)) = (self.link_duration, self.link_timescale) {
            if ts > 0 {
                return Some(d.saturating_mul(1000) / ts as u64);
            }
        }
        let ts = self
            .current_track
            .and_then(|t| self.track_timescales.get(&t).copied())
            .or(self.movie_timescale)?;
        if ts == 0 || self.sample_duration_total == 0 {
            return None;
        }
        Some(self.sample_duration_total.saturating_mul(1000) / ts as u64)
    }

    /// Rough frames-per-second estimate from sample count over duration.
    pub fn estimated_fps(&self) -> Option<f64> {
        let ms = self.duration_ms()?;
        if ms == 0 || self.sample_count == 0 {
            return None;
        }
        Some(self.sample_count as f64 * 1000.0 / ms as f64)
    }

    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        filetime_to_utc(self.start_ticks?)
    }

    pub fn finish_utc(&self) -> Option<DateTime<Utc>> {
        let start = self.start_utc()?;
        let ms = self.duration_ms()?;
        start.checked_add_signed(chrono::Duration::milliseconds(ms as i64))
    }

    /// Display line for listings: wall-clock range for surveillance files,
    /// plain duration otherwise.
    pub fn display_name(&self) -> String {
        if self.is_surveillance() {
            let start = self
                .start_utc()
                .map(|d| format_utc(&d))
                .unwrap_or_else(|| "?".to_string());
            let finish = self
                .finish_utc()
                .map(|d| format_utc(&d))
                .unwrap_or_else(|| "?".to_string());
            format!("{} / {} / {}", self.path, start, finish)
        } else {
            match self.duration_ms() {
                Some(ms) => format!("{} / duration {:.1} seconds", self.path, ms as f64 / 1000.0),
                None => format!("{} / duration unknown", self.path),
            }
        }
    }
}

/// Collects per-file [`FragmentInfo`] records across a batch of files and
/// reorders them into recording order using their linkage UUIDs.
#[derive(Debug, Default)]
pub struct ChainExtractor {
    files: Vec<FragmentInfo>,
    current: Option<FragmentInfo>,
    surveillance_batch: bool,
}

impl ChainExtractor {
    pub fn new() -> Self {
        ChainExtractor {
            files: Vec::new(),
            current: None,
            surveillance_batch: true,
        }
    }

    /// Begin accumulating facts for a new file.
    pub fn open_file(&mut self, path: &str) {
        self.current = Some(FragmentInfo::new(path));
    }

    /// Finish the current file and add its record to the batch.
    pub fn close_file(&mut self) {
        if let Some(info) = self.current.take() {
            self.surveillance_batch &= info.is_surveillance();
            self.files.push(info);
        }
    }

    pub fn files(&self) -> &[FragmentInfo] {
        &self.files
    }

    /// Order the batch by linkage and assign ordinals.
    ///
    /// If any file lacks linkage, file order is kept as opened. Otherwise
    /// the start fragment (predecessor equal to its own id) is moved to the
    /// front and successors are chained behind it one at a time. Quadratic
    /// in the number of files, which stays small in practice.
    pub fn reorder(&mut self) -> &[FragmentInfo] {
        if !self.surveillance_batch || self.files.is_empty() {
            for (i, f) in self.files.iter_mut().enumerate() {
                f.ordinal = Some(i as u32);
            }
            return &self.files;
        }

        if let Some(start) = self
            .files
            .iter()
            .position(|f| f.predecessor_id.is_some() && f.predecessor_id == f.fragment_id)
        {
            let rec = self.files.remove(start);
            self.files.insert(0, rec);
        }

        let mut i = 0;
        while i < self.files.len() {
            let own = self.files[i].fragment_id;
            if let Some(next) = self.files[i + 1..]
                .iter()
                .position(|f| f.predecessor_id == own && f.fragment_id != own)
            {
                let rec = self.files.remove(i + 1 + next);
                self.files.insert(i + 1, rec);
            }
            i += 1;
        }

        for (i, f) in self.files.iter_mut().enumerate() {
            f.ordinal = Some(i as u32);
        }
        &self.files
    }
}

impl BoxObserver for ChainExtractor {
    fn on_box(&mut self, _header: &BoxHeader, payload: &BoxPayload) {
        let Some(info) = self.current.as_mut() else {
            return;
        };
        match payload {
            BoxPayload::Mvhd(p) => {
                info.movie_timescale = Some(p.timescale);
            }
            BoxPayload::Tkhd(p) => {
                info.track_ids.insert(p.track_id);
                info.current_track = Some(p.track_id);
            }
            BoxPayload::Mdhd(p) => {
                if let Some(track) = info.current_track {
                    info.track_timescales.insert(track, p.timescale);
                }
            }
            BoxPayload::Tfhd(p) => {
                info.track_ids.insert(p.track_id);
                info.current_track = Some(p.track_id);
                info.default_sample_duration = p.default_sample_duration;
            }
            BoxPayload::Trun(p) => {
                info.sample_count += p.samples.len() as u64;
                for s in &p.samples {
                    let dur = s.duration.or(info.default_sample_duration).unwrap_or(0);
                    info.sample_duration_total += dur as u64;
                    if let Some(off) = s.composition_offset {
                        info.composition_min =
                            Some(info.composition_min.map_or(off, |m| m.min(off)));
                        info.composition_max =
                            Some(info.composition_max.map_or(off, |m| m.max(off)));
                    }
                }
            }
            BoxPayload::Stts(p) => {
                for e in &p.entries {
                    info.sample_count += e.sample_count as u64;
                    info.sample_duration_total +=
                        e.sample_count as u64 * e.sample_delta as u64;
                }
            }
            BoxPayload::Ctts(p) => {
                for e in &p.entries {
                    info.composition_min =
                        Some(info.composition_min.map_or(e.sample_offset, |m| {
                            m.min(e.sample_offset)
                        }));
                    info.composition_max =
                        Some(info.composition_max.map_or(e.sample_offset, |m| {
                            m.max(e.sample_offset)
                        }));
                }
            }
            BoxPayload::SurveillanceLink(p) => {
                debug!(path = %info.path, fragment_id = %p.fragment_id, "linkage record");
                info.fragment_id = Some(p.fragment_id);
                info.predecessor_id = Some(p.predecessor_id);
                info.successor_id = Some(p.successor_id);
                info.start_ticks = Some(p.start_time);
                info.link_duration = Some(p.duration);
                info.link_timescale = Some(p.timescale);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(path: &str, own: u128, pred: u128, succ: u128) -> FragmentInfo {
        FragmentInfo {
            path: path.to_string(),
            fragment_id: Some(Uuid::from_u128(own)),
            predecessor_id: Some(Uuid::from_u128(pred)),
            successor_id: Some(Uuid::from_u128(succ)),
            ..Default::default()
        }
    }

    fn extractor_with(files: Vec<FragmentInfo>) -> ChainExtractor {
        let surveillance = files.iter().all(|f| f.is_surveillance());
        ChainExtractor {
            files,
            current: None,
            surveillance_batch: surveillance,
        }
    }

    #[test]
    fn reorder_chains_fragments_by_linkage() {
        // Opened out of order: final, start, middle.
        let mut ex = extractor_with(vec![
            link("c.mp4", 3, 2, 3),
            link("a.mp4", 1, 1, 2),
            link("b.mp4", 2, 1, 3),
        ]);
        let ordered = ex.reorder();
        let paths: Vec<_> = ordered.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.mp4", "b.mp4", "c.mp4"]);
        let ordinals: Vec<_> = ordered.iter().map(|f| f.ordinal.unwrap()).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
    }

    #[test]
    fn reorder_keeps_open_order_without_linkage() {
        let mut ex = extractor_with(vec![
            FragmentInfo::new("x.mp4"),
            link("a.mp4", 1, 1, 1),
        ]);
        let ordered = ex.reorder();
        let paths: Vec<_> = ordered.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["x.mp4", "a.mp4"]);
    }

    #[test]
    fn standalone_fragment_stays_put() {
        let mut ex = extractor_with(vec![link("only.mp4", 1, 1, 1)]);
        let ordered = ex.reorder();
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].ordinal, Some(0));
    }

    #[test]
    fn duration_prefers_linkage_record() {
        let mut info = FragmentInfo::new("f.mp4");
        info.link_duration = Some(9000);
        info.link_timescale = Some(90000);
        assert_eq!(info.duration_ms(), Some(100));
    }

    #[test]
    fn duration_falls_back_to_sample_accumulation() {
        let mut info = FragmentInfo::new("f.mp4");
        info.movie_timescale = Some(1000);
        info.sample_count = 30;
        info.sample_duration_total = 3000;
        assert_eq!(info.duration_ms(), Some(3000));
        let fps = info.estimated_fps().unwrap();
        assert!((fps - 10.0).abs() < 0.01);
    }
}
