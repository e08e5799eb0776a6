use crate::io::tree::Root;
use crate::types::{Column, L3Error, L3Result, TimeTag2};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

// Compiled once; utc_to_seconds runs per GPS fix
fn utc_pattern() -> &'static Regex {
    static UTC_PATTERN: OnceLock<Regex> = OnceLock::new();
    UTC_PATTERN.get_or_init(|| Regex::new(r"^\d{1,6}(\.\d+)?$").expect("hard-coded pattern"))
}

/// Parse a UTC-of-day string (HHMMSS or HHMMSS.sss) into seconds since
/// midnight. Leading zeros on the hour may be absent in GPS sentences.
pub fn utc_to_seconds(utc: &str) -> L3Result<f64> {
    let trimmed = utc.trim();
    if !utc_pattern().is_match(trimmed) {
        return Err(L3Error::Format(format!("invalid UTC time: '{}'", utc)));
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| L3Error::Format(format!("invalid UTC time: '{}'", utc)))?;

    let hours = (value / 10000.0).floor();
    let minutes = ((value / 100.0).floor()) % 100.0;
    let seconds = value % 100.0;
    if hours >= 24.0 || minutes >= 60.0 || seconds >= 60.0 {
        return Err(L3Error::Format(format!("UTC time out of range: '{}'", utc)));
    }
    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Convert an HHMMSSmmm stamp into elapsed seconds since midnight
pub fn time_tag2_to_seconds(tag: TimeTag2) -> f64 {
    let hours = (tag / 1.0e7).floor();
    let minutes = ((tag / 1.0e5).floor()) % 100.0;
    let seconds = ((tag / 1000.0).floor()) % 100.0;
    let millis = tag % 1000.0;
    hours * 3600.0 + minutes * 60.0 + seconds + millis / 1000.0
}

/// Inverse of `time_tag2_to_seconds`; round trips within 1e-3 s for values
/// inside one day
pub fn seconds_to_time_tag2(seconds: f64) -> TimeTag2 {
    let mut hours = (seconds / 3600.0).floor();
    let mut minutes = ((seconds - hours * 3600.0) / 60.0).floor();
    let remainder = seconds - hours * 3600.0 - minutes * 60.0;
    let mut whole = remainder.floor();
    let mut millis = ((remainder - whole) * 1000.0).round();
    // carry rounded milliseconds back up through the fields
    if millis >= 1000.0 {
        millis -= 1000.0;
        whole += 1.0;
    }
    if whole >= 60.0 {
        whole -= 60.0;
        minutes += 1.0;
    }
    if minutes >= 60.0 {
        minutes -= 60.0;
        hours += 1.0;
    }
    hours * 1.0e7 + minutes * 1.0e5 + whole * 1000.0 + millis
}

/// Convert a degrees + decimal-minutes coordinate (DDDMM.mmm) to signed
/// decimal degrees; southern and western hemispheres negate
pub fn degrees_minutes_to_decimal(value: f64, hemisphere: &str) -> L3Result<f64> {
    let degrees = (value / 100.0).trunc();
    let minutes = value - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;
    match hemisphere.trim() {
        "N" | "E" => Ok(decimal),
        "S" | "W" => Ok(-decimal),
        other => Err(L3Error::Format(format!("invalid hemisphere: '{}'", other))),
    }
}

/// Convert a YYYYDDD date tag into a calendar date
pub fn date_tag_to_date(tag: f64) -> L3Result<NaiveDate> {
    let tag = tag as i64;
    let year = (tag / 1000) as i32;
    let ordinal = (tag % 1000) as u32;
    NaiveDate::from_yo_opt(year, ordinal)
        .ok_or_else(|| L3Error::Format(format!("invalid date tag: {}", tag)))
}

/// Combine a calendar date with an HHMMSSmmm stamp
pub fn time_tag2_to_datetime(date: NaiveDate, tag: TimeTag2) -> L3Result<NaiveDateTime> {
    let seconds = time_tag2_to_seconds(tag);
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1.0e9).round() as u32;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(whole as u32, nanos)
        .ok_or_else(|| L3Error::Format(format!("invalid time tag: {}", tag)))?;
    Ok(date.and_time(time))
}

/// Strict monotonicity check: any equal or decreasing adjacent pair fails
pub fn is_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] < pair[1])
}

/// Recompute TIMETAG2 across the tree so every instrument follows GPS UTC.
///
/// The single group carrying a `UTCPOS` dataset is the authoritative clock;
/// its first fix supplies the reference seconds. Every other group with a
/// `TIMER` dataset gets its `TIMETAG2` rewritten in place as
/// `seconds_to_time_tag2(timer + reference)`. This is one of the two
/// documented in-place passes of the pipeline and runs before any consumer
/// reads the stamps.
pub fn apply_gps_clock_correction(root: &mut Root) -> L3Result<()> {
    let mut reference: Option<f64> = None;
    for gp in root.groups() {
        if let Some(ds) = gp.get_dataset("UTCPOS") {
            let first = match ds.columns.get("NONE") {
                Some(Column::Text(v)) => v.first().cloned(),
                Some(Column::Float(v)) => v.first().map(|x| format!("{}", x)),
                None => None,
            };
            let first = first.ok_or_else(|| {
                L3Error::MissingDataset(format!("{}/UTCPOS is empty", gp.id))
            })?;
            reference = Some(utc_to_seconds(&first)?);
        }
    }
    let reference = reference
        .ok_or_else(|| L3Error::MissingGroup("GPS (no UTCPOS dataset in tree)".to_string()))?;
    log::debug!("GPS clock reference: {} s since midnight", reference);

    for gp in root.groups_mut() {
        if gp.has_dataset("UTCPOS") {
            continue;
        }
        let timer = match gp.get_dataset("TIMER") {
            Some(ds) => match ds.columns.get_float("NONE") {
                Some(v) => v.clone(),
                None => continue,
            },
            None => continue,
        };
        let id = gp.id.clone();
        if let Some(stamps) = gp
            .get_dataset_mut("TIMETAG2")
            .and_then(|ds| ds.columns.get_float_mut("NONE"))
        {
            for (stamp, offset) in stamps.iter_mut().zip(timer.iter()) {
                *stamp = seconds_to_time_tag2(offset + reference);
            }
            log::debug!("Rewrote TIMETAG2 for group {} from GPS clock", id);
        }
    }
    Ok(())
}
