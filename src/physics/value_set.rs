use std::collections::BTreeMap;
use std::fmt::Write;

use crate::error::{EmptyKeyError, ReferenceError, Result};

use super::record::{CellRun, RecordFormat};

/// Per-cell store of `N` physics values with a global default, written out
/// as compact records that merge runs of consecutive cells with identical
/// values.
///
/// Values are compared bit for bit. They come from discrete parameter
/// assignment, and a tolerance would merge physically distinct regions.
#[derive(Debug, Clone, PartialEq)]
pub struct CellValueSet<const N: usize> {
    key_name: String,
    out_name: String,
    default_value: f64,
    always_emit: bool,
    values: BTreeMap<i32, [f64; N]>,
}

impl<const N: usize> CellValueSet<N> {
    /// Creates an empty set with a zero default. An empty `out_name` leaves
    /// the output label unset.
    #[must_use]
    pub fn new(key_name: impl Into<String>, out_name: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            out_name: out_name.into(),
            default_value: 0.0,
            always_emit: false,
            values: BTreeMap::new(),
        }
    }

    /// Sets the global default applied to cells without an explicit entry.
    #[must_use]
    pub fn with_default(mut self, value: f64) -> Self {
        self.default_value = value;
        self
    }

    /// Emits runs even when they only repeat the global default.
    #[must_use]
    pub fn with_always_emit(mut self) -> Self {
        self.always_emit = true;
        self
    }

    /// Key name written at the head of each record.
    #[must_use]
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Output label written after the key name.
    #[must_use]
    pub fn out_name(&self) -> &str {
        &self.out_name
    }

    /// Replaces the output label.
    pub fn set_out_name(&mut self, out_name: impl Into<String>) {
        self.out_name = out_name.into();
    }

    /// Global default value.
    #[must_use]
    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    /// The default as a full value array.
    #[must_use]
    pub fn default_array(&self) -> [f64; N] {
        [self.default_value; N]
    }

    /// Writes slot `slot` of `cell`, creating the entry from the default
    /// if absent.
    ///
    /// # Errors
    ///
    /// Returns a reference error if `slot >= N`.
    pub fn set_value(&mut self, cell: i32, slot: usize, value: f64) -> Result<()> {
        if slot >= N {
            return Err(ReferenceError::SlotOutOfRange { slot, arity: N }.into());
        }
        let default = self.default_array();
        self.values.entry(cell).or_insert(default)[slot] = value;
        Ok(())
    }

    /// Writes a prefix of the slots of `cell`. Slots past `values.len()`
    /// keep their previous (or default) values; values past `N` are dropped.
    pub fn set_values(&mut self, cell: i32, values: &[f64]) {
        if values.len() > N {
            tracing::warn!(
                key = %self.key_name,
                cell,
                given = values.len(),
                arity = N,
                "extra values ignored"
            );
        }
        let default = self.default_array();
        let entry = self.values.entry(cell).or_insert(default);
        for (slot, v) in entry.iter_mut().zip(values) {
            *slot = *v;
        }
    }

    /// Applies [`CellValueSet::set_values`] to every cell in `cells`.
    pub fn set_values_for(&mut self, cells: impl IntoIterator<Item = i32>, values: &[f64]) {
        for cell in cells {
            self.set_values(cell, values);
        }
    }

    /// Removes every explicit entry. The default is untouched.
    pub fn clear_all(&mut self) {
        self.values.clear();
    }

    /// Explicit entry of `cell`, if any.
    #[must_use]
    pub fn explicit(&self, cell: i32) -> Option<&[f64; N]> {
        self.values.get(&cell)
    }

    /// Values of `cell`: its explicit entry or the default.
    #[must_use]
    pub fn get(&self, cell: i32) -> [f64; N] {
        self.values
            .get(&cell)
            .copied()
            .unwrap_or_else(|| self.default_array())
    }

    /// Number of explicit entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no explicit entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Explicit entries in ascending cell order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[f64; N])> {
        self.values.iter().map(|(c, v)| (*c, v))
    }

    /// Splits `cells` (in the given order) into maximal runs of numerically
    /// consecutive cells with bit-identical values. Runs equal to the
    /// default are dropped unless the set always emits.
    #[must_use]
    pub fn cell_split(&self, cells: &[i32]) -> Vec<CellRun<N>> {
        let mut runs: Vec<CellRun<N>> = Vec::new();
        for &cell in cells {
            let values = self.get(cell);
            if let Some(run) = runs.last_mut() {
                if run.end.checked_add(1) == Some(cell) && same_bits(&run.values, &values) {
                    run.end = cell;
                    continue;
                }
            }
            runs.push(CellRun::single(cell, values));
        }
        if !self.always_emit {
            let default = self.default_array();
            runs.retain(|run| !same_bits(&run.values, &default));
        }
        runs
    }

    /// Renders runs as one record per line.
    ///
    /// # Errors
    ///
    /// Returns a reference error if a run starts at a non-positive cell,
    /// an empty-key error if runs exist but the key or output name is unset,
    /// or a format error if the writer fails. Nothing is written on the
    /// first two.
    pub fn write_fluka(
        &self,
        out: &mut impl Write,
        runs: &[CellRun<N>],
        format: &RecordFormat,
    ) -> Result<()> {
        if runs.is_empty() {
            return Ok(());
        }
        check_cells(runs.iter().map(|run| run.start))?;
        self.check_names()?;
        for run in runs {
            format.write_record(out, &self.key_name, &self.out_name, run)?;
        }
        Ok(())
    }

    /// Writes the records for `cells`, preceded by a `* <header>` comment
    /// line when `header` is not empty.
    ///
    /// # Errors
    ///
    /// See [`CellValueSet::write_fluka`]. Nothing is written on an
    /// empty-key error.
    pub fn write_output(&self, out: &mut impl Write, cells: &[i32], header: &str) -> Result<()> {
        self.write_output_with(out, cells, header, &RecordFormat::default())
    }

    /// [`CellValueSet::write_output`] with an explicit record layout.
    ///
    /// # Errors
    ///
    /// See [`CellValueSet::write_fluka`].
    pub fn write_output_with(
        &self,
        out: &mut impl Write,
        cells: &[i32],
        header: &str,
        format: &RecordFormat,
    ) -> Result<()> {
        check_cells(cells.iter().copied())?;
        let runs = self.cell_split(cells);
        if runs.is_empty() {
            return Ok(());
        }
        self.check_names()?;
        if !header.is_empty() {
            writeln!(out, "* {header}")?;
        }
        self.write_fluka(out, &runs, format)
    }

    fn check_names(&self) -> Result<()> {
        if self.key_name.is_empty() {
            return Err(EmptyKeyError::MissingKeyName.into());
        }
        if self.out_name.is_empty() {
            return Err(EmptyKeyError::MissingOutName {
                key: self.key_name.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// Range tokens are `start-end`, so only positive cell numbers are accepted.
fn check_cells(mut cells: impl Iterator<Item = i32>) -> Result<()> {
    match cells.find(|&cell| cell <= 0) {
        Some(cell) => Err(ReferenceError::NonPositiveCell(cell).into()),
        None => Ok(()),
    }
}

fn same_bits<const N: usize>(a: &[f64; N], b: &[f64; N]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CellforgeError;

    fn density() -> CellValueSet<3> {
        let mut set = CellValueSet::<3>::new("density", "RHO").with_default(1.0);
        set.set_values(10, &[2.5, 2.5, 2.5]);
        set.set_values(11, &[2.5, 2.5, 2.5]);
        set.set_values(15, &[7.8, 7.8, 7.8]);
        set
    }

    #[test]
    fn merges_consecutive_identical_cells() {
        let runs = density().cell_split(&[10, 11, 15]);
        assert_eq!(
            runs,
            vec![
                CellRun {
                    start: 10,
                    end: 11,
                    values: [2.5; 3]
                },
                CellRun::single(15, [7.8; 3]),
            ]
        );
    }

    #[test]
    fn writes_merged_records() {
        let mut s = String::new();
        density().write_output(&mut s, &[10, 11, 15], "").unwrap();
        assert_eq!(
            s,
            "density RHO 10-11 2.500000 2.500000 2.500000\n\
             density RHO 15 7.800000 7.800000 7.800000\n"
        );
    }

    #[test]
    fn header_comes_first() {
        let mut s = String::new();
        density().write_output(&mut s, &[15], "material densities").unwrap();
        assert!(s.starts_with("* material densities\n"));
        assert_eq!(s.lines().count(), 2);
    }

    #[test]
    fn run_breaks_on_gap_and_on_order() {
        let mut set = CellValueSet::<1>::new("bias", "IMP");
        for c in [1, 2, 3, 5] {
            set.set_values(c, &[4.0]);
        }
        let runs = set.cell_split(&[1, 2, 3, 5]);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].cells(), 1..=3);
        let runs = set.cell_split(&[3, 2, 1]);
        assert_eq!(runs.len(), 3);
    }

    #[test]
    fn explicit_default_merges_with_implicit_default() {
        let mut set = CellValueSet::<1>::new("bias", "IMP")
            .with_default(1.0)
            .with_always_emit();
        set.set_values(2, &[1.0]);
        let runs = set.cell_split(&[1, 2, 3]);
        assert_eq!(runs, vec![CellRun { start: 1, end: 3, values: [1.0] }]);
    }

    #[test]
    fn default_runs_are_dropped_unless_always_emit() {
        let set = CellValueSet::<2>::new("cut", "EMF").with_default(0.5);
        assert!(set.cell_split(&[1, 2, 3, 4]).is_empty());
        let mut s = String::new();
        set.write_output(&mut s, &[1, 2, 3, 4], "hdr").unwrap();
        assert!(s.is_empty());

        let set = set.with_always_emit();
        assert_eq!(
            set.cell_split(&[1, 2, 3, 4]),
            vec![CellRun { start: 1, end: 4, values: [0.5, 0.5] }]
        );
    }

    #[test]
    fn exact_equality_does_not_merge_near_values() {
        let mut set = CellValueSet::<1>::new("rho", "RHO");
        set.set_values(1, &[0.1 + 0.2]);
        set.set_values(2, &[0.3]);
        assert_eq!(set.cell_split(&[1, 2]).len(), 2);
    }

    #[test]
    fn set_value_fills_rest_with_default() {
        let mut set = CellValueSet::<3>::new("k", "o").with_default(9.0);
        set.set_value(4, 1, 2.0).unwrap();
        assert_eq!(set.get(4), [9.0, 2.0, 9.0]);
        set.set_values(4, &[1.0]);
        assert_eq!(set.get(4), [1.0, 2.0, 9.0]);
        assert_eq!(set.get(99), [9.0; 3]);
        assert!(set.explicit(99).is_none());
        assert!(matches!(
            set.set_value(4, 3, 0.0),
            Err(CellforgeError::Reference(ReferenceError::SlotOutOfRange { slot: 3, arity: 3 }))
        ));
    }

    #[test]
    fn missing_out_name_fails_before_writing() {
        let mut set = CellValueSet::<1>::new("rho", "");
        let mut s = String::new();
        set.write_output(&mut s, &[1], "hdr").unwrap();
        set.set_values(1, &[3.0]);
        let err = set.write_output(&mut s, &[1], "hdr").unwrap_err();
        assert!(matches!(
            err,
            CellforgeError::EmptyKey(EmptyKeyError::MissingOutName { .. })
        ));
        assert!(s.is_empty());
        set.set_out_name("RHO");
        set.write_output(&mut s, &[1], "hdr").unwrap();
        assert!(!s.is_empty());
    }

    #[test]
    fn non_positive_cells_are_refused() {
        let mut set = density();
        set.set_values(5, &[2.0]);
        let mut out = String::new();
        let err = set.write_output(&mut out, &[5, -3, -2], "h").unwrap_err();
        assert!(matches!(err, CellforgeError::Reference(ReferenceError::NonPositiveCell(-3))));
        assert!(out.is_empty());
        let runs = [CellRun::single(0, [1.0; 3])];
        assert!(set.write_fluka(&mut out, &runs, &RecordFormat::default()).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn clear_then_replay_is_idempotent() {
        let mut set = density();
        let before = set.clone();
        set.clear_all();
        assert!(set.is_empty());
        assert!((set.default_value() - 1.0).abs() < f64::EPSILON);
        set.set_values(10, &[2.5, 2.5, 2.5]);
        set.set_values(11, &[2.5, 2.5, 2.5]);
        set.set_values(15, &[7.8, 7.8, 7.8]);
        assert_eq!(set, before);
    }

    #[test]
    fn copy_is_deep() {
        let original = density();
        let mut copy = original.clone();
        copy.set_values(10, &[0.0]);
        assert_eq!(original.get(10), [2.5; 3]);
    }

    #[test]
    fn compression_is_transparent() {
        let mut set = CellValueSet::<2>::new("k", "o").with_default(-1.0);
        let cells: Vec<i32> = (100..140).collect();
        for &c in &cells {
            if c % 7 != 0 {
                set.set_values(c, &[f64::from(c / 5), 1.0]);
            }
        }

        let mut expanded = BTreeMap::new();
        for run in set.cell_split(&cells) {
            for c in run.cells() {
                assert!(expanded.insert(c, run.values).is_none());
            }
        }
        for &c in &cells {
            match expanded.get(&c) {
                Some(values) => assert_eq!(*values, set.get(c)),
                None => assert_eq!(set.get(c), set.default_array()),
            }
        }
        let explicit: Vec<i32> = set.iter().map(|(c, _)| c).collect();
        assert!(explicit.iter().all(|c| expanded.contains_key(c)));

        let emitting = set.clone().with_always_emit();
        let covered: usize = emitting
            .cell_split(&cells)
            .iter()
            .map(|run| run.cells().count())
            .sum();
        assert_eq!(covered, cells.len());
    }
}
