use std::fmt::Write;
use std::ops::RangeInclusive;

use crate::error::Result;

/// A run of consecutive cell numbers sharing one value array. Cell numbers
/// are positive, which keeps the `start-end` token unambiguous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRun<const N: usize> {
    /// First cell of the run.
    pub start: i32,
    /// Last cell of the run (equal to `start` for a single cell).
    pub end: i32,
    /// Values shared by every cell of the run.
    pub values: [f64; N],
}

impl<const N: usize> CellRun<N> {
    /// A run holding the single cell `id`.
    #[must_use]
    pub fn single(id: i32, values: [f64; N]) -> Self {
        Self {
            start: id,
            end: id,
            values,
        }
    }

    /// Cells covered by the run.
    #[must_use]
    pub fn cells(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }

    /// `start` for a single cell, `start-end` otherwise.
    #[must_use]
    pub fn range_token(&self) -> String {
        if self.start == self.end {
            self.start.to_string()
        } else {
            format!("{}-{}", self.start, self.end)
        }
    }
}

/// Textual layout of value-set records.
#[derive(Debug, Clone)]
pub struct RecordFormat {
    /// Digits after the decimal point of every value.
    pub precision: usize,
    /// Text placed between fields.
    pub separator: String,
}

impl Default for RecordFormat {
    fn default() -> Self {
        Self {
            precision: 6,
            separator: " ".into(),
        }
    }
}

impl RecordFormat {
    /// Writes one record: `<key> <out> <range> <v1> .. <vN>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn write_record<const N: usize>(
        &self,
        out: &mut impl Write,
        key_name: &str,
        out_name: &str,
        run: &CellRun<N>,
    ) -> Result<()> {
        let sep = &self.separator;
        write!(out, "{key_name}{sep}{out_name}{sep}{}", run.range_token())?;
        for v in &run.values {
            write!(out, "{sep}{v:.prec$}", prec = self.precision)?;
        }
        writeln!(out)?;
        Ok(())
    }
}
