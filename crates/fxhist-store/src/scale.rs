//! In-place price transformation of a history file.
//!
//! Records are rewritten one at a time at their fixed offsets. A run is not
//! transactional: a crash leaves the transformed prefix and an untouched
//! suffix, and re-running over the remaining range finishes the job.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::str::FromStr;

use fxhist_format::{BarCodec, HEADER_SIZE, HistoryHeader};
use fxhist_types::{Bar, FormatError, HistoryError, Result};
use tracing::info;

const CHUNK_RECORDS: usize = 1024;

/// Arithmetic operator applied to prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleOp {
    /// `price + operand`
    Add,
    /// `price - operand`
    Sub,
    /// `price * operand`
    Mul,
    /// `price / operand`
    Div,
}

impl ScaleOp {
    /// Returns the operator symbol.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
        }
    }

    fn apply(self, price: f64, operand: f64) -> f64 {
        match self {
            Self::Add => price + operand,
            Self::Sub => price - operand,
            Self::Mul => price * operand,
            Self::Div => price / operand,
        }
    }
}

impl FromStr for ScaleOp {
    type Err = HistoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "+" | "add" => Ok(Self::Add),
            "-" | "sub" => Ok(Self::Sub),
            "*" | "x" | "mul" => Ok(Self::Mul),
            "/" | "div" => Ok(Self::Div),
            other => Err(HistoryError::InvalidOperand(format!(
                "unknown operator '{other}', expected one of + - * /"
            ))),
        }
    }
}

impl fmt::Display for ScaleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Half-open `[from, to)` range of open times; open ends are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScaleRange {
    /// Inclusive lower bound.
    pub from: Option<i64>,
    /// Exclusive upper bound.
    pub to: Option<i64>,
}

impl ScaleRange {
    /// Range covering every bar.
    pub const ALL: Self = Self {
        from: None,
        to: None,
    };

    /// Creates a range.
    #[must_use]
    pub const fn new(from: Option<i64>, to: Option<i64>) -> Self {
        Self { from, to }
    }

    /// Returns true if `time` lies in the range.
    #[must_use]
    pub fn contains(&self, time: i64) -> bool {
        self.from.is_none_or(|from| time >= from) && self.to.is_none_or(|to| time < to)
    }
}

/// Result of a scaling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScaleReport {
    /// Records inspected.
    pub scanned: u64,
    /// Records rewritten.
    pub rewritten: u64,
}

/// Rewrites the prices of bars in a time range with one operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarScaler {
    op: ScaleOp,
    operand: f64,
    range: ScaleRange,
}

impl BarScaler {
    /// Creates a scaler after validating the operand.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::InvalidOperand`] for NaN or infinite operands,
    /// and for zero with `*` or `/`.
    pub fn new(op: ScaleOp, operand: f64, range: ScaleRange) -> Result<Self> {
        if !operand.is_finite() {
            return Err(HistoryError::InvalidOperand(format!("{operand} is not finite")));
        }
        if operand == 0.0 && matches!(op, ScaleOp::Mul | ScaleOp::Div) {
            return Err(HistoryError::InvalidOperand(format!("cannot apply {op} 0")));
        }
        Ok(Self { op, operand, range })
    }

    /// Returns the operator.
    #[must_use]
    pub const fn op(&self) -> ScaleOp {
        self.op
    }

    /// Returns the operand.
    #[must_use]
    pub const fn operand(&self) -> f64 {
        self.operand
    }

    /// Returns the time range.
    #[must_use]
    pub const fn range(&self) -> ScaleRange {
        self.range
    }

    /// Applies the operator to one bar's prices, rounded to `digits`.
    ///
    /// Volume fields are left alone; high and low are swapped back into order
    /// when a negative factor inverts them.
    #[must_use]
    pub fn apply(&self, bar: &Bar, digits: u32) -> Bar {
        let scale = 10f64.powi(digits.min(15) as i32);
        let round = |price: f64| (self.op.apply(price, self.operand) * scale).round() / scale;

        let mut scaled = *bar;
        scaled.open = round(bar.open);
        scaled.high = round(bar.high);
        scaled.low = round(bar.low);
        scaled.close = round(bar.close);
        if scaled.low > scaled.high {
            std::mem::swap(&mut scaled.low, &mut scaled.high);
        }
        scaled
    }

    /// Rewrites every in-range record of the file at `path`.
    ///
    /// The header and record count are validated before the first write.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotFound`] for a missing file, a
    /// [`FormatError`] for a corrupt one, and I/O errors.
    pub fn scale_file(&self, path: impl AsRef<Path>) -> Result<ScaleReport> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    HistoryError::NotFound {
                        path: path.to_path_buf(),
                    }
                } else {
                    e.into()
                }
            })?;

        let header = HistoryHeader::read(&mut file)?;
        let codec = BarCodec::for_version(header.format);
        let size = codec.record_size();
        let len = file.metadata()?.len();
        let body = len.saturating_sub(HEADER_SIZE as u64);
        if body % size as u64 != 0 {
            return Err(FormatError::TrailingBytes {
                len,
                extra: body % size as u64,
            }
            .into());
        }

        let total = body / size as u64;
        let mut report = ScaleReport::default();
        let mut record = Vec::with_capacity(size);
        let mut buf = Vec::new();

        while report.scanned < total {
            let count = (total - report.scanned).min(CHUNK_RECORDS as u64);
            let chunk_offset = HEADER_SIZE as u64 + report.scanned * size as u64;
            buf.resize(count as usize * size, 0);
            file.seek(SeekFrom::Start(chunk_offset))?;
            file.read_exact(&mut buf)?;

            for (index, bar) in codec.decode_all(&buf)?.enumerate() {
                if !self.range.contains(bar.open_time) {
                    continue;
                }
                record.clear();
                codec.encode_into(&self.apply(&bar, header.digits), &mut record)?;
                file.seek(SeekFrom::Start(chunk_offset + (index * size) as u64))?;
                file.write_all(&record)?;
                report.rewritten += 1;
            }
            report.scanned += count;
        }

        file.sync_data()?;
        info!(
            path = %path.display(),
            op = %self.op,
            operand = self.operand,
            rewritten = report.rewritten,
            "scaled history file"
        );
        Ok(report)
    }
}
