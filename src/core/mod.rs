//! Core Level-3 processing modules

pub mod interp;
pub mod level3;
pub mod time_sync;
pub mod timebase;
pub mod wavelength;

// Re-export main types
pub use interp::{interp_linear, resample, CubicSpline, InterpMethod};
pub use level3::{process, Level3Params};
pub use time_sync::{
    classify_groups, flatten_group, interpolate_gps, interpolate_satnav,
    interpolate_to_reference, select_reference, ClassifiedGroups,
};
pub use timebase::{
    apply_gps_clock_correction, date_tag_to_date, degrees_minutes_to_decimal, is_increasing,
    seconds_to_time_tag2, time_tag2_to_datetime, time_tag2_to_seconds, utc_to_seconds,
};
pub use wavelength::{attach_ancillary, interpolate_wavelength, match_columns, WavelengthGrid};
