use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Calendar day stamp, encoded as YYYYDDD (year + day-of-year)
pub type DateTag = f64;

/// Time-of-day stamp, encoded as HHMMSSmmm
pub type TimeTag2 = f64;

/// Column name of the calendar day stamp shared by all instrument tables
pub const DATETAG: &str = "Datetag";

/// Column name of the time-of-day stamp shared by all instrument tables
pub const TIMETAG2: &str = "Timetag2";

/// Sentinel written by the SeaBASS exporter in place of missing values
pub const MISSING_VALUE: f64 = -9999.0;

/// Returns true for the time stamp columns, which are never interpolated
pub fn is_time_column(name: &str) -> bool {
    name == DATETAG || name == TIMETAG2
}

/// Parses a column name as a wavelength band center (e.g. "412.3")
pub fn band_value(name: &str) -> Option<f64> {
    name.parse::<f64>().ok()
}

/// The single stringification point for spectral column names
pub fn band_label(wavelength: f64) -> String {
    format!("{}", wavelength)
}

/// Instrument identity for the five sensor streams of the SAS platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    /// Downwelling irradiance reference sensor
    Es,
    /// Sky radiance sensor
    Li,
    /// Water-leaving radiance sensor
    Lt,
    /// Shipboard GPS receiver
    Gps,
    /// Solar/pointing attitude subsystem
    Satnav,
}

impl InstrumentKind {
    /// SeaBASS field prefix for the radiometric instruments
    pub fn seabass_prefix(&self) -> Option<&'static str> {
        match self {
            InstrumentKind::Es => Some("Es"),
            InstrumentKind::Li => Some("Lsky"),
            InstrumentKind::Lt => Some("Lt"),
            InstrumentKind::Gps | InstrumentKind::Satnav => None,
        }
    }
}

impl std::fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstrumentKind::Es => write!(f, "ES"),
            InstrumentKind::Li => write!(f, "LI"),
            InstrumentKind::Lt => write!(f, "LT"),
            InstrumentKind::Gps => write!(f, "GPS"),
            InstrumentKind::Satnav => write!(f, "SATNAV"),
        }
    }
}

/// A single named field of a dataset: numeric samples or free-form text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_float(&self) -> Option<&Vec<f64>> {
        match self {
            Column::Float(v) => Some(v),
            Column::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Vec<String>> {
        match self {
            Column::Text(v) => Some(v),
            Column::Float(_) => None,
        }
    }
}

/// Insertion-ordered mapping from column name to a time-aligned sequence.
///
/// All columns of one table share a single time axis and therefore the same
/// length. Column order is preserved because the SeaBASS exporter emits
/// fields in table order; it has no other semantic meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnTable {
    order: Vec<String>,
    columns: HashMap<String, Column>,
}

impl ColumnTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a column. A replaced column keeps its position.
    pub fn insert(&mut self, name: &str, column: Column) {
        if !self.columns.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.columns.insert(name.to_string(), column);
    }

    pub fn insert_float(&mut self, name: &str, values: Vec<f64>) {
        self.insert(name, Column::Float(values));
    }

    pub fn insert_text(&mut self, name: &str, values: Vec<String>) {
        self.insert(name, Column::Text(values));
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let removed = self.columns.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn get_float(&self, name: &str) -> Option<&Vec<f64>> {
        self.columns.get(name).and_then(Column::as_float)
    }

    pub fn get_float_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        match self.columns.get_mut(name) {
            Some(Column::Float(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_text(&self, name: &str) -> Option<&Vec<String>> {
        self.columns.get(name).and_then(Column::as_text)
    }

    /// Column names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of columns
    pub fn n_columns(&self) -> usize {
        self.order.len()
    }

    /// Number of time samples (length of the first column, 0 when empty)
    pub fn n_rows(&self) -> usize {
        self.order
            .first()
            .and_then(|n| self.columns.get(n))
            .map_or(0, Column::len)
    }

    /// Spectral columns in table order: (wavelength, column name)
    pub fn band_names(&self) -> Vec<(f64, String)> {
        self.order
            .iter()
            .filter_map(|n| band_value(n).map(|w| (w, n.clone())))
            .collect()
    }

    /// Row-indexed structured view of the numeric columns, in table order.
    ///
    /// Together with `from_array` this is the documented bidirectional
    /// conversion at the storage boundary; values survive exactly.
    pub fn to_array(&self) -> Array2<f64> {
        let float_names: Vec<&str> = self
            .order
            .iter()
            .map(String::as_str)
            .filter(|n| matches!(self.columns.get(*n), Some(Column::Float(_))))
            .collect();
        let n_rows = self.n_rows();
        let mut out = Array2::zeros((n_rows, float_names.len()));
        for (j, name) in float_names.iter().enumerate() {
            if let Some(Column::Float(values)) = self.columns.get(*name) {
                for (i, &v) in values.iter().enumerate() {
                    out[[i, j]] = v;
                }
            }
        }
        out
    }

    /// Inverse of `to_array`: rebuild a table from named rows
    pub fn from_array(names: &[&str], data: &Array2<f64>) -> Self {
        let mut table = ColumnTable::new();
        for (j, name) in names.iter().enumerate() {
            table.insert_float(name, data.column(j).to_vec());
        }
        table
    }
}

/// Error types for Level-3 processing
#[derive(Debug, thiserror::Error)]
pub enum L3Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Time axis {axis} does not contain strictly increasing values")]
    Monotonicity { axis: &'static str },

    #[error("Missing required group: {0}")]
    MissingGroup(String),

    #[error("Missing required dataset: {0}")]
    MissingDataset(String),

    #[error("Degenerate wavelength range: start {start} >= end {end}")]
    DegenerateRange { start: f64, end: f64 },

    #[error("Interpolation target {target} outside source domain [{min}, {max}]")]
    Extrapolation { target: f64, min: f64, max: f64 },

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for Level-3 operations
pub type L3Result<T> = Result<T, L3Error>;
