use crate::core::interp::{interp_linear, resample, InterpMethod};
use crate::core::timebase::{degrees_minutes_to_decimal, is_increasing, time_tag2_to_seconds, utc_to_seconds};
use crate::io::tree::{Group, Root};
use crate::types::{Column, ColumnTable, InstrumentKind, L3Error, L3Result, DATETAG, TIMETAG2};

/// Raw instrument groups resolved once at stage entry by signature dataset.
///
/// The radiometric trio is mandatory; GPS and SATNAV are optional ancillary
/// sources.
#[derive(Debug)]
pub struct ClassifiedGroups<'a> {
    pub es: &'a Group,
    pub li: &'a Group,
    pub lt: &'a Group,
    pub gps: Option<&'a Group>,
    pub satnav: Option<&'a Group>,
}

fn is_shutter_light(group: &Group) -> bool {
    group
        .attributes
        .get("FrameType")
        .map(String::as_str)
        == Some("ShutterLight")
}

/// Classify raw groups by their signature datasets: UTCPOS marks GPS, a
/// shutter-light ES/LI/LT dataset marks the radiometers, AZIMUTH marks the
/// attitude subsystem.
pub fn classify_groups(root: &Root) -> L3Result<ClassifiedGroups<'_>> {
    let mut es = None;
    let mut li = None;
    let mut lt = None;
    let mut gps = None;
    let mut satnav = None;

    for gp in root.groups() {
        if gp.has_dataset("UTCPOS") {
            gps = Some(gp);
        } else if gp.has_dataset("ES") && is_shutter_light(gp) {
            es = Some(gp);
        } else if gp.has_dataset("LI") && is_shutter_light(gp) {
            li = Some(gp);
        } else if gp.has_dataset("LT") && is_shutter_light(gp) {
            lt = Some(gp);
        } else if gp.has_dataset("AZIMUTH") {
            satnav = Some(gp);
        }
    }

    if gps.is_none() {
        log::warn!("No GPS group found; position channels will be absent");
    }
    if satnav.is_none() {
        log::warn!("No SATNAV group found; attitude channels will be absent");
    }

    Ok(ClassifiedGroups {
        es: es.ok_or_else(|| L3Error::MissingGroup("ES (ShutterLight)".to_string()))?,
        li: li.ok_or_else(|| L3Error::MissingGroup("LI (ShutterLight)".to_string()))?,
        lt: lt.ok_or_else(|| L3Error::MissingGroup("LT (ShutterLight)".to_string()))?,
        gps,
        satnav,
    })
}

/// Flatten a raw instrument group into one table: the group's DATETAG and
/// TIMETAG2 datasets become leading columns ahead of the sensor's spectral
/// columns.
pub fn flatten_group(group: &Group, instrument: InstrumentKind) -> L3Result<ColumnTable> {
    let sensor = group.require_dataset(&instrument.to_string())?;
    let dates = group
        .require_dataset("DATETAG")?
        .columns
        .get_float("NONE")
        .ok_or_else(|| L3Error::MissingDataset(format!("{}/DATETAG/NONE", group.id)))?;
    let times = group
        .require_dataset("TIMETAG2")?
        .columns
        .get_float("NONE")
        .ok_or_else(|| L3Error::MissingDataset(format!("{}/TIMETAG2/NONE", group.id)))?;

    let mut out = ColumnTable::new();
    out.insert_float(DATETAG, dates.clone());
    out.insert_float(TIMETAG2, times.clone());
    for name in sensor.columns.names() {
        if let Some(column) = sensor.columns.get(name) {
            out.insert(name, column.clone());
        }
    }
    Ok(out)
}

/// Elapsed-seconds time axis of a flattened instrument table
pub fn seconds_axis(table: &ColumnTable) -> L3Result<Vec<f64>> {
    let stamps = table
        .get_float(TIMETAG2)
        .ok_or_else(|| L3Error::MissingDataset(TIMETAG2.to_string()))?;
    Ok(stamps.iter().map(|&t| time_tag2_to_seconds(t)).collect())
}

/// Pick the reference instrument: the slowest-sampled (fewest records) of
/// the radiometric trio, biased toward LT on ties. A shortest ES or LI
/// usually indicates a logging problem and is worth a warning.
pub fn select_reference(
    es_len: usize,
    li_len: usize,
    lt_len: usize,
    override_choice: Option<InstrumentKind>,
) -> InstrumentKind {
    if let Some(choice) = override_choice {
        log::info!("Reference instrument overridden to {}", choice);
        return choice;
    }
    if es_len < li_len && es_len < lt_len {
        log::warn!("ES has fewest records ({}) - interpolating to ES; this should raise a red flag", es_len);
        InstrumentKind::Es
    } else if li_len < lt_len {
        log::warn!("LI has fewest records ({}) - interpolating to LI; this should raise a red flag", li_len);
        InstrumentKind::Li
    } else {
        log::info!("LT has fewest records ({}) - interpolating to LT", lt_len);
        InstrumentKind::Lt
    }
}

/// Build the output table by attaching the reference's own authoritative
/// stamp pair ahead of the resampled columns
fn with_reference_stamps(resampled: ColumnTable, reference: &ColumnTable) -> L3Result<ColumnTable> {
    let dates = reference
        .get_float(DATETAG)
        .ok_or_else(|| L3Error::MissingDataset(DATETAG.to_string()))?;
    let times = reference
        .get_float(TIMETAG2)
        .ok_or_else(|| L3Error::MissingDataset(TIMETAG2.to_string()))?;
    let mut out = ColumnTable::new();
    out.insert_float(DATETAG, dates.clone());
    out.insert_float(TIMETAG2, times.clone());
    for name in resampled.names() {
        if let Some(column) = resampled.get(name) {
            out.insert(name, column.clone());
        }
    }
    Ok(out)
}

/// Cubic-resample one radiometric table onto the reference time base.
///
/// Both time axes must be strictly increasing; a violation aborts the whole
/// Level-3 pass for this sample since it indicates corrupt instrument logs.
pub fn interpolate_to_reference(
    table: &ColumnTable,
    reference: &ColumnTable,
    instrument: InstrumentKind,
) -> L3Result<ColumnTable> {
    log::info!("Interpolate Data {}", instrument);

    let x = seconds_axis(table)?;
    let y = seconds_axis(reference)?;
    if !is_increasing(&x) {
        return Err(L3Error::Monotonicity { axis: "x" });
    }
    if !is_increasing(&y) {
        return Err(L3Error::Monotonicity { axis: "y" });
    }

    let resampled = resample(table, &x, &y, InterpMethod::Cubic)?;
    with_reference_stamps(resampled, reference)
}

fn text_or_float_column(group: &Group, dataset: &str) -> L3Result<Vec<String>> {
    let ds = group.require_dataset(dataset)?;
    match ds.columns.get("NONE") {
        Some(Column::Text(v)) => Ok(v.clone()),
        Some(Column::Float(v)) => Ok(v.iter().map(|x| format!("{}", x)).collect()),
        None => Err(L3Error::MissingDataset(format!("{}/{}/NONE", group.id, dataset))),
    }
}

fn float_column(group: &Group, dataset: &str) -> L3Result<Vec<f64>> {
    let ds = group.require_dataset(dataset)?;
    ds.columns
        .get_float("NONE")
        .cloned()
        .ok_or_else(|| L3Error::MissingDataset(format!("{}/{}/NONE", group.id, dataset)))
}

/// Linear-resample the GPS channels onto the reference time base.
///
/// Positions arrive as degrees + decimal minutes with separate hemisphere
/// flags and are converted to signed decimal degrees before interpolation.
/// Returns a new GPS group; the raw group is left untouched.
pub fn interpolate_gps(gps: &Group, reference: &ColumnTable) -> L3Result<Group> {
    log::info!("Interpolate GPS Data");

    let utc = text_or_float_column(gps, "UTCPOS")?;
    let mut x = Vec::with_capacity(utc.len());
    for value in &utc {
        x.push(utc_to_seconds(value)?);
    }
    if !is_increasing(&x) {
        return Err(L3Error::Monotonicity { axis: "x" });
    }
    let y = seconds_axis(reference)?;

    // Degrees-minutes to decimal degrees, consuming the hemisphere flags
    let lat_dm = float_column(gps, "LATPOS")?;
    let lon_dm = float_column(gps, "LONPOS")?;
    let lat_hemi = text_or_float_column(gps, "LATHEMI")?;
    let lon_hemi = text_or_float_column(gps, "LONHEMI")?;
    let mut lat = Vec::with_capacity(lat_dm.len());
    let mut lon = Vec::with_capacity(lon_dm.len());
    for i in 0..lat_dm.len() {
        lat.push(degrees_minutes_to_decimal(lat_dm[i], &lat_hemi[i])?);
        lon.push(degrees_minutes_to_decimal(lon_dm[i], &lon_hemi[i])?);
    }

    let mut out = Group::new("GPS");
    let channels: [(&str, Vec<f64>); 5] = [
        ("COURSE", float_column(gps, "COURSE")?),
        ("LATPOS", lat),
        ("LONPOS", lon),
        ("MAGVAR", float_column(gps, "MAGVAR")?),
        ("SPEED", float_column(gps, "SPEED")?),
    ];
    for (name, values) in channels {
        let interpolated = interp_linear(&x, &values, &y)?;
        let mut table = ColumnTable::new();
        table.insert_float("NONE", interpolated);
        let ds = out.add_dataset(name);
        ds.columns = with_reference_stamps(table, reference)?;
    }
    Ok(out)
}

/// Linear-resample the SATNAV attitude channels onto the reference time
/// base, preserving each dataset's native named columns (SUN, SHIP_TRUE,
/// SAS, ROTATOR). Returns a new SATNAV group.
pub fn interpolate_satnav(satnav: &Group, reference: &ColumnTable) -> L3Result<Group> {
    log::info!("Interpolate SATNAV Data");

    let stamps = float_column(satnav, "TIMETAG2")?;
    let x: Vec<f64> = stamps.iter().map(|&t| time_tag2_to_seconds(t)).collect();
    if !is_increasing(&x) {
        return Err(L3Error::Monotonicity { axis: "x" });
    }
    let y = seconds_axis(reference)?;

    let mut out = Group::new("SATNAV");
    for name in ["AZIMUTH", "HEADING", "PITCH", "POINTING", "ROLL"] {
        let ds = satnav.require_dataset(name)?;
        let resampled = resample(&ds.columns, &x, &y, InterpMethod::Linear)?;
        let new_ds = out.add_dataset(name);
        new_ds.columns = with_reference_stamps(resampled, reference)?;
    }
    Ok(out)
}
