//! Sliding-window frequent-item tracker
//!
//! Keeps the rounded readings of the last `N` stream positions and, after
//! every accepted reading, rebuilds a [`MisraGries`] table over exactly those
//! readings. The resulting top-k set is recorded under the reading's
//! `(date, time)`.
//!
//! Missing readings hold a stream position without contributing a value. They
//! are tracked in a [`MissingValueLedger`] and expire after `N` positions just
//! like real values, so a run of missing readings shrinks the number of real
//! values in the window but never its nominal length.

use super::{MisraGries, OnFull};
use crate::traits::ConfigError;
use std::collections::{BTreeMap, VecDeque};
use std::io;
use thiserror::Error;
use tracing::debug;

/// One month of per-second readings
pub const DEFAULT_WINDOW: usize = 30 * 24 * 60 * 60;

/// Error for a single malformed record
///
/// Recoverable: the tracker skips the record and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Line did not split into the configured number of fields
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    /// Date is not a numeric `day/month/year`
    #[error("invalid date {0:?}")]
    InvalidDate(String),
    /// Time field is empty
    #[error("empty time field")]
    EmptyTime,
    /// Value is neither the missing marker nor a finite number
    #[error("invalid value {0:?}")]
    InvalidValue(String),
}

/// Tracker configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackerConfig {
    /// Window length in stream positions (N)
    pub window: usize,
    /// Capacity of the frequency table (k)
    pub k: usize,
    /// Decimal places readings are rounded to
    pub precision: usize,
    /// Raw value that marks a missing reading
    pub missing_marker: String,
    /// Fields per raw line, for [`SlidingWindowTracker::process_line`]
    pub fields_per_record: usize,
    /// Field separator for raw lines
    pub separator: char,
    /// The first line passed to [`SlidingWindowTracker::process_line`] is a
    /// column header
    pub has_header: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            k: 10,
            precision: 1,
            missing_marker: "?".to_string(),
            fields_per_record: 9,
            separator: ';',
            has_header: true,
        }
    }
}

impl TrackerConfig {
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_missing_marker(mut self, marker: impl Into<String>) -> Self {
        self.missing_marker = marker.into();
        self
    }

    pub fn with_fields_per_record(mut self, fields: usize) -> Self {
        self.fields_per_record = fields;
        self
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.k == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

/// Stream positions of missing readings still inside the window
///
/// The age of an entry is the current position minus the entry's position.
/// Entries are pruned once their age reaches the window length.
#[derive(Clone, Debug, Default)]
pub struct MissingValueLedger {
    /// Positions, oldest first
    positions: VecDeque<u64>,
}

impl MissingValueLedger {
    /// Record a missing reading at `position`
    pub fn record(&mut self, position: u64) {
        self.positions.push_back(position);
    }

    /// Drop entries whose age at `position` is `window` or more
    pub fn prune(&mut self, position: u64, window: u64) {
        while let Some(&oldest) = self.positions.front() {
            if position - oldest >= window {
                self.positions.pop_front();
            } else {
                break;
            }
        }
    }

    /// Ages of the recorded entries at `position`, oldest first
    pub fn ages(&self, position: u64) -> impl Iterator<Item = u64> + '_ {
        self.positions.iter().map(move |&p| position - p)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// What happened to an accepted record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A value was pushed and the top-k set recomputed
    Value,
    /// A missing reading was consumed
    Missing,
    /// The header line was dropped
    Header,
}

/// Calendar key ordering results by year, month, day
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct DateKey {
    year: u32,
    month: u32,
    day: u32,
}

impl DateKey {
    /// Parse `day/month/year`
    fn parse(date: &str) -> Result<Self, RecordError> {
        let invalid = || RecordError::InvalidDate(date.to_string());
        let mut parts = date.split('/');
        let (Some(day), Some(month), Some(year), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        Ok(Self {
            year: year.trim().parse().map_err(|_| invalid())?,
            month: month.trim().parse().map_err(|_| invalid())?,
            day: day.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// Per-date results, keyed by time
#[derive(Clone, Debug)]
struct DayResults {
    /// Date as it appeared in the stream
    label: String,
    by_time: BTreeMap<String, Vec<String>>,
}

/// Sliding-window top-k tracker over timestamped readings
///
/// # Example
///
/// ```
/// use streamsketch::frequency::{SlidingWindowTracker, TrackerConfig};
///
/// let config = TrackerConfig::default().with_window(3).with_k(2);
/// let mut tracker = SlidingWindowTracker::new(config).unwrap();
///
/// tracker.process_record("16/12/2006", "17:24:00", "4.216").unwrap();
/// tracker.process_record("16/12/2006", "17:25:00", "?").unwrap();
/// tracker.process_record("16/12/2006", "17:26:00", "4.231").unwrap();
///
/// assert_eq!(
///     tracker.frequent_at("16/12/2006", "17:26:00"),
///     Some(&["4.2".to_string()][..])
/// );
///
/// let mut out = Vec::new();
/// tracker.write_results(&mut out).unwrap();
/// ```
#[derive(Debug)]
pub struct SlidingWindowTracker {
    config: TrackerConfig,
    /// `(position, rounded value)`, oldest first
    values: VecDeque<(u64, String)>,
    ledger: MissingValueLedger,
    /// Position the next accepted record will occupy
    position: u64,
    results: BTreeMap<DateKey, DayResults>,
    skipped: u64,
    /// Set until `process_line` has seen its first line
    header_pending: bool,
}

impl SlidingWindowTracker {
    /// Create a tracker
    ///
    /// # Errors
    ///
    /// Any error from [`TrackerConfig::validate`].
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        debug!(
            target: "streamsketch::window",
            window = config.window,
            k = config.k,
            precision = config.precision,
            "sliding window tracker configured"
        );

        Ok(Self {
            values: VecDeque::new(),
            ledger: MissingValueLedger::default(),
            position: 0,
            results: BTreeMap::new(),
            skipped: 0,
            header_pending: config.has_header,
            config,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Records that occupied a stream position (values and missing readings)
    pub fn records_consumed(&self) -> u64 {
        self.position
    }

    /// Malformed records skipped so far
    pub fn skipped_records(&self) -> u64 {
        self.skipped
    }

    /// Real values currently in the window
    pub fn window_len(&self) -> usize {
        self.values.len()
    }

    /// Missing readings currently in the window
    pub fn missing_in_window(&self) -> usize {
        self.ledger.len()
    }

    /// Current window contents, oldest first
    pub fn window_values(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.iter().map(|(_, v)| v.as_str())
    }

    /// Split a raw line and process its date, time and value fields
    ///
    /// With [`TrackerConfig::has_header`] set, the first line is dropped
    /// without being validated or counted as skipped. Malformed lines are
    /// counted and returned as errors.
    pub fn process_line(&mut self, line: &str) -> Result<RecordOutcome, RecordError> {
        if self.header_pending {
            self.header_pending = false;
            return Ok(RecordOutcome::Header);
        }

        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split(self.config.separator).collect();
        if fields.len() != self.config.fields_per_record || fields.len() < 3 {
            return Err(self.skip(RecordError::FieldCount {
                expected: self.config.fields_per_record,
                found: fields.len(),
            }));
        }
        self.process_record(fields[0], fields[1], fields[2])
    }

    /// Process one reading
    ///
    /// A missing marker occupies a stream position without a value. Any
    /// other value must parse as a finite number; it is rounded, pushed into
    /// the window, and the top-k set over the window is rebuilt and stored
    /// under `(date, time)`.
    ///
    /// Malformed records are counted, consume no stream position, and are
    /// returned as errors.
    pub fn process_record(
        &mut self,
        date: &str,
        time: &str,
        raw_value: &str,
    ) -> Result<RecordOutcome, RecordError> {
        let raw_value = raw_value.trim();

        if raw_value == self.config.missing_marker {
            self.advance();
            self.ledger.record(self.position);
            self.position += 1;
            return Ok(RecordOutcome::Missing);
        }

        let key = match DateKey::parse(date) {
            Ok(key) => key,
            Err(err) => return Err(self.skip(err)),
        };
        let time = time.trim();
        if time.is_empty() {
            return Err(self.skip(RecordError::EmptyTime));
        }
        let value = match raw_value.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => return Err(self.skip(RecordError::InvalidValue(raw_value.to_string()))),
        };

        self.advance();
        let rounded = format!("{:.*}", self.config.precision, value);
        self.values.push_back((self.position, rounded));
        self.position += 1;

        let frequent = self.recompute();
        self.results
            .entry(key)
            .or_insert_with(|| DayResults {
                label: date.trim().to_string(),
                by_time: BTreeMap::new(),
            })
            .by_time
            .insert(time.to_string(), frequent);

        Ok(RecordOutcome::Value)
    }

    /// Expire everything that falls out of the window once the next record
    /// takes `self.position`
    fn advance(&mut self) {
        let window = self.config.window as u64;
        while let Some(&(oldest, _)) = self.values.front() {
            if self.position - oldest >= window {
                self.values.pop_front();
            } else {
                break;
            }
        }
        self.ledger.prune(self.position, window);
    }

    /// Rebuild top-k over the current window, sorted
    fn recompute(&self) -> Vec<String> {
        let mut table = MisraGries::<&str>::with_valid_capacity(self.config.k, OnFull::Discard);
        for (_, v) in &self.values {
            table.process(v.as_str());
        }

        let mut frequent: Vec<String> = table.iter().map(|(v, _)| v.to_string()).collect();
        frequent.sort();
        frequent
    }

    fn skip(&mut self, err: RecordError) -> RecordError {
        self.skipped += 1;
        debug!(
            target: "streamsketch::window",
            position = self.position,
            skipped = self.skipped,
            error = %err,
            "skipping malformed record"
        );
        err
    }

    /// Sorted top-k set recorded for `(date, time)`
    pub fn frequent_at(&self, date: &str, time: &str) -> Option<&[String]> {
        let key = DateKey::parse(date).ok()?;
        self.results
            .get(&key)?
            .by_time
            .get(time.trim())
            .map(Vec::as_slice)
    }

    /// Results ordered by (year, month, day), then time
    pub fn results(&self) -> impl Iterator<Item = (&str, &str, &[String])> + '_ {
        self.results.values().flat_map(|day| {
            day.by_time
                .iter()
                .map(move |(time, set)| (day.label.as_str(), time.as_str(), set.as_slice()))
        })
    }

    /// Write results to `sink`
    ///
    /// Each entry is a `date time` line followed by a tab-indented list of
    /// quoted values, e.g. `\t['1.0', '4.2']`.
    pub fn write_results<W: io::Write>(&self, mut sink: W) -> io::Result<()> {
        for (date, time, set) in self.results() {
            writeln!(sink, "{} {}", date, time)?;
            write!(sink, "\t[")?;
            for (i, value) in set.iter().enumerate() {
                if i > 0 {
                    write!(sink, ", ")?;
                }
                write!(sink, "'{}'", value)?;
            }
            writeln!(sink, "]")?;
        }
        sink.flush()
    }
}
