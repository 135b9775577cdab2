use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;

/// Primary on-disk date format of the `GAME_DATE` column.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Formats tried when a date is not in [`DATE_FORMAT`].
const FALLBACK_DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

// ---------------------------------------------------------------------------
// CellValue – a single cell of a shot frame
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a CSV column settles into.
///
/// Cells are totally ordered (floats by `total_cmp`), so equality, ordering
/// and hashing agree even for `NaN`.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl CellValue {
    /// Sort position of the variant when two cells hold different types.
    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Integer(_) => 2,
            CellValue::Float(_) => 3,
            CellValue::Date(_) => 4,
            CellValue::String(_) => 5,
        }
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
            (CellValue::Float(a), CellValue::Float(b)) => a.total_cmp(b),
            (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
            (CellValue::String(a), CellValue::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.rank());
        match self {
            CellValue::Bool(b) => b.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(v) => state.write_u64(v.to_bits()),
            CellValue::Date(d) => d.hash(state),
            CellValue::String(s) => s.hash(state),
            CellValue::Null => {}
        }
    }
}

/// Renders the cell the way it would be written back to CSV; nulls are empty.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => f.write_str(s),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Infer the narrowest type for a raw CSV field.
    pub fn guess(s: &str) -> CellValue {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            CellValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the cell as a calendar date.
    ///
    /// Integers are read as `YYYYMMDD`; strings go through [`parse_date`].
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::Integer(i) => parse_date_strict(&i.to_string()),
            CellValue::String(s) => parse_date(s),
            _ => None,
        }
    }
}

/// Parse `YYYYMMDD` only.
pub fn parse_date_strict(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Parse `YYYYMMDD`, falling back to a handful of free-form layouts.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    parse_date_strict(s).or_else(|| {
        FALLBACK_DATE_FORMATS.iter().find_map(|fmt| {
            NaiveDate::parse_from_str(s, fmt)
                .ok()
                .or_else(|| chrono::NaiveDateTime::parse_from_str(s, fmt).ok().map(|dt| dt.date()))
        })
    })
}

// ---------------------------------------------------------------------------
// ShotRecord – one row of the frame
// ---------------------------------------------------------------------------

/// A single shot event: column name → value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShotRecord {
    pub columns: BTreeMap<String, CellValue>,
}

impl ShotRecord {
    /// Non-null value of a column.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.columns.get(column).filter(|v| !v.is_null())
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(CellValue::as_f64)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(CellValue::as_i64)
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(CellValue::as_str)
    }

    pub fn get_date(&self, column: &str) -> Option<NaiveDate> {
        self.get(column).and_then(CellValue::as_date)
    }

    pub fn set(&mut self, column: &str, value: CellValue) {
        self.columns.insert(column.to_string(), value);
    }
}

// ---------------------------------------------------------------------------
// ShotFrame – an ordered set of shots sharing a column list
// ---------------------------------------------------------------------------

/// Rows plus the ordered column list they were read with.
///
/// Filtering never reorders rows; derived columns are appended to the end of
/// `column_names`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShotFrame {
    pub rows: Vec<ShotRecord>,
    pub column_names: Vec<String>,
}

impl ShotFrame {
    pub fn new(column_names: Vec<String>, rows: Vec<ShotRecord>) -> Self {
        Self { rows, column_names }
    }

    /// Number of shots.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the frame is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Keep the rows matching `pred`, preserving order and columns.
    pub fn filter<F>(&self, mut pred: F) -> ShotFrame
    where
        F: FnMut(&ShotRecord) -> bool,
    {
        ShotFrame {
            rows: self.rows.iter().filter(|r| pred(r)).cloned().collect(),
            column_names: self.column_names.clone(),
        }
    }

    /// Keep the rows whose positional index satisfies `pred`.
    pub fn filter_indexed<F>(&self, mut pred: F) -> ShotFrame
    where
        F: FnMut(usize, &ShotRecord) -> bool,
    {
        ShotFrame {
            rows: self
                .rows
                .iter()
                .enumerate()
                .filter(|(i, r)| pred(*i, r))
                .map(|(_, r)| r.clone())
                .collect(),
            column_names: self.column_names.clone(),
        }
    }

    fn register_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.column_names.push(column.to_string());
        }
    }

    /// Set a column from one value per row.
    pub fn set_column(&mut self, column: &str, values: Vec<CellValue>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.register_column(column);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.set(column, value);
        }
    }

    /// Set a column to the same value on every row.
    pub fn fill_column(&mut self, column: &str, value: CellValue) {
        self.register_column(column);
        for row in &mut self.rows {
            row.set(column, value.clone());
        }
    }

    /// Drop a column from every row.
    pub fn remove_column(&mut self, column: &str) {
        self.column_names.retain(|c| c != column);
        for row in &mut self.rows {
            row.columns.remove(column);
        }
    }

    /// Rename `from` to `to` unless `to` already exists.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if !self.has_column(from) || self.has_column(to) {
            return false;
        }
        for name in &mut self.column_names {
            if name == from {
                *name = to.to_string();
            }
        }
        for row in &mut self.rows {
            if let Some(v) = row.columns.remove(from) {
                row.columns.insert(to.to_string(), v);
            }
        }
        true
    }

    /// Lower-case every column name.
    pub fn lowercase_columns(&mut self) {
        let renames: Vec<(String, String)> = self
            .column_names
            .iter()
            .filter(|c| c.chars().any(|ch| ch.is_uppercase()))
            .map(|c| (c.clone(), c.to_lowercase()))
            .collect();
        for (from, to) in renames {
            if !self.rename_column(&from, &to) {
                log::warn!("Column '{from}' collides with existing '{to}' after lower-casing; kept as-is");
            }
        }
    }

    /// Distinct non-null values of a column, in first-seen order.
    pub fn unique_values(&self, column: &str) -> Vec<CellValue> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|r| r.get(column))
            .filter(|v| seen.insert((*v).clone()))
            .cloned()
            .collect()
    }

    /// Concatenate frames in order; the column list is the union, first-seen order.
    pub fn concat(frames: Vec<ShotFrame>) -> ShotFrame {
        let mut out = ShotFrame::default();
        for frame in frames {
            for col in &frame.column_names {
                out.register_column(col);
            }
            out.rows.extend(frame.rows);
        }
        out
    }

    /// Date span covered by a date-typed column.
    pub fn date_range(&self, column: &str) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.rows.iter().filter_map(|r| r.get_date(column));
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, CellValue)]) -> ShotRecord {
        ShotRecord {
            columns: pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        }
    }

    #[test]
    fn guess_picks_narrowest_type() {
        assert_eq!(CellValue::guess(""), CellValue::Null);
        assert_eq!(CellValue::guess("20221020"), CellValue::Integer(20221020));
        assert_eq!(CellValue::guess("-1.5"), CellValue::Float(-1.5));
        assert_eq!(CellValue::guess("true"), CellValue::Bool(true));
        assert_eq!(
            CellValue::guess("Restricted Area"),
            CellValue::String("Restricted Area".into())
        );
    }

    #[test]
    fn ordering_equality_and_hashing_agree() {
        let nan = CellValue::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        let set: HashSet<CellValue> = [nan.clone(), nan, CellValue::Float(0.5)].into_iter().collect();
        assert_eq!(set.len(), 2);

        let mut cells = vec![
            CellValue::String("a".into()),
            CellValue::Integer(2),
            CellValue::Null,
            CellValue::Integer(-1),
            CellValue::Bool(true),
        ];
        cells.sort();
        assert_eq!(
            cells,
            vec![
                CellValue::Null,
                CellValue::Bool(true),
                CellValue::Integer(-1),
                CellValue::Integer(2),
                CellValue::String("a".into()),
            ]
        );
        assert_ne!(CellValue::Integer(1), CellValue::Float(1.0));
    }

    #[test]
    fn display_matches_csv_text() {
        let d = NaiveDate::from_ymd_opt(2022, 10, 20).unwrap();
        assert_eq!(CellValue::Date(d).to_string(), "20221020");
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Float(8.75).to_string(), "8.75");
        assert_eq!(CellValue::String("BOS".into()).to_string(), "BOS");
    }

    #[test]
    fn dates_parse_from_integers_and_free_form_strings() {
        let d = NaiveDate::from_ymd_opt(2022, 10, 20).unwrap();
        assert_eq!(CellValue::Integer(20221020).as_date(), Some(d));
        assert_eq!(CellValue::String("2022-10-20".into()).as_date(), Some(d));
        assert_eq!(CellValue::String("10/20/2022".into()).as_date(), Some(d));
        assert_eq!(CellValue::String("not a date".into()).as_date(), None);
        assert_eq!(CellValue::Integer(20221399).as_date(), None);
    }

    #[test]
    fn rename_refuses_to_clobber() {
        let mut frame = ShotFrame::new(
            vec!["loc_x".into(), "x".into()],
            vec![row(&[("loc_x", CellValue::Integer(1)), ("x", CellValue::Integer(2))])],
        );
        assert!(!frame.rename_column("loc_x", "x"));
        assert_eq!(frame.rows[0].get_i64("x"), Some(2));
    }

    #[test]
    fn lowercase_keeps_column_order() {
        let mut frame = ShotFrame::new(
            vec!["GAME_ID".into(), "LOC_X".into()],
            vec![row(&[("GAME_ID", CellValue::Integer(1)), ("LOC_X", CellValue::Integer(-5))])],
        );
        frame.lowercase_columns();
        assert_eq!(frame.column_names, vec!["game_id", "loc_x"]);
        assert_eq!(frame.rows[0].get_i64("loc_x"), Some(-5));
    }

    #[test]
    fn unique_values_skip_nulls_and_keep_first_seen_order() {
        let frame = ShotFrame::new(
            vec!["game_id".into()],
            vec![
                row(&[("game_id", CellValue::Integer(3))]),
                row(&[("game_id", CellValue::Null)]),
                row(&[("game_id", CellValue::Integer(1))]),
                row(&[("game_id", CellValue::Integer(3))]),
            ],
        );
        assert_eq!(
            frame.unique_values("game_id"),
            vec![CellValue::Integer(3), CellValue::Integer(1)]
        );
    }

    #[test]
    fn concat_unions_columns() {
        let a = ShotFrame::new(vec!["a".into()], vec![row(&[("a", CellValue::Integer(1))])]);
        let b = ShotFrame::new(
            vec!["a".into(), "b".into()],
            vec![row(&[("a", CellValue::Integer(2)), ("b", CellValue::Bool(true))])],
        );
        let all = ShotFrame::concat(vec![a, b]);
        assert_eq!(all.column_names, vec!["a", "b"]);
        assert_eq!(all.len(), 2);
        assert_eq!(all.rows[1].get_i64("a"), Some(2));
    }
}
