use tracing::warn;

use crate::report::BenchmarkRecord;

/// Benchmark identifiers renamed to their display names.
const LIBRARY_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("fpcap", "fpcap (mmap)"),
    ("fpcap-fread", "fpcap (fread)"),
];

/// Near-duplicate format spellings merged into one canonical label.
const FORMAT_ALIASES: &[(&str, &str)] = &[
    ("pcapng.zst", "pcapng.zst(d)"),
    ("pcapng.zstd", "pcapng.zst(d)"),
];

/// Preferred top-to-bottom ordering of format groups in the chart.
pub const FORMAT_ORDER: &[&str] = &["pcap", "pcapng", "pcapng.zst(d)"];

/// Results for one file format: `(library, time in ms)` in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatGroup {
    pub format: String,
    pub entries: Vec<(String, f64)>,
}

impl FormatGroup {
    pub fn time_for(&self, library: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == library)
            .map(|(_, time_ms)| *time_ms)
    }
}

/// `{format -> {library -> ms}}` with encounter order preserved for both
/// levels, which is what drives the chart's draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedResults {
    groups: Vec<FormatGroup>,
}

impl GroupedResults {
    /// Last write wins on a duplicate (format, library) pair.
    pub fn insert(&mut self, format: &str, library: &str, time_ms: f64) {
        let idx = match self.groups.iter().position(|g| g.format == format) {
            Some(idx) => idx,
            None => {
                self.groups.push(FormatGroup {
                    format: format.to_owned(),
                    entries: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[idx];
        match group.entries.iter_mut().find(|(name, _)| name == library) {
            Some(entry) => entry.1 = time_ms,
            None => group.entries.push((library.to_owned(), time_ms)),
        }
    }

    pub fn get(&self, format: &str) -> Option<&FormatGroup> {
        self.groups.iter().find(|g| g.format == format)
    }

    pub fn groups(&self) -> &[FormatGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn format_count(&self) -> usize {
        self.groups.len()
    }

    pub fn result_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }
}

/// Reshapes the flat record list into `{format -> {library -> ms}}`.
///
/// Records whose name does not match `"<library> (<format>)"` are skipped
/// with a warning; everything else is converted to milliseconds and run
/// through the rename and alias tables.
pub fn group_records(records: &[BenchmarkRecord]) -> GroupedResults {
    let mut grouped = GroupedResults::default();
    for record in records {
        let Some((library, format)) = split_name(&record.name) else {
            warn!("skipping unrecognized benchmark name: {}", record.name);
            continue;
        };
        let time_ms = record.real_time * record.time_unit.to_ms_factor();
        grouped.insert(canonical_format(format), display_name(library), time_ms);
    }
    grouped
}

/// Splits `"<library> (<format>)"` on the first `" ("`.
fn split_name(name: &str) -> Option<(&str, &str)> {
    let (library, rest) = name.split_once(" (")?;
    let format = rest.strip_suffix(')')?;
    Some((library, format))
}

fn display_name(library: &str) -> &str {
    LIBRARY_DISPLAY_NAMES
        .iter()
        .find(|(from, _)| *from == library)
        .map(|(_, to)| *to)
        .unwrap_or(library)
}

fn canonical_format(format: &str) -> &str {
    FORMAT_ALIASES
        .iter()
        .find(|(from, _)| *from == format)
        .map(|(_, to)| *to)
        .unwrap_or(format)
}
