//! radtide: A Fast, Modular Shipborne Above-Water Radiometry Level-3 Processor
//!
//! This library harmonizes independently-sampled sensor time series from a
//! ship-mounted above-water radiometry platform (downwelling irradiance,
//! sky and water radiance, GPS position, solar/pointing attitude) onto a
//! common time base and a common wavelength grid, and exports the merged
//! product to the SeaBASS community interchange format.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    band_label, band_value, Column, ColumnTable, InstrumentKind, L3Error, L3Result,
    DATETAG, MISSING_VALUE, TIMETAG2,
};

pub use io::{Dataset, Group, Root, SeaBassHeader, SeaBassWriter};

pub use crate::core::{process, Level3Params, WavelengthGrid};
