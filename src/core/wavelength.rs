use crate::core::interp::CubicSpline;
use crate::io::tree::Group;
use crate::types::{band_label, band_value, ColumnTable, L3Error, L3Result, DATETAG, TIMETAG2};

/// The common spectral grid all radiometers are resampled onto: strictly
/// increasing band centers at a fixed interval, bounded by the intersection
/// of every instrument's native range so no evaluation extrapolates.
#[derive(Debug, Clone, PartialEq)]
pub struct WavelengthGrid {
    bands: Vec<f64>,
    interval: f64,
}

impl WavelengthGrid {
    /// Arithmetic sequence over the half-open range [start, end)
    pub fn new(start: f64, end: f64, interval: f64) -> L3Result<Self> {
        if !(interval > 0.0) {
            return Err(L3Error::Processing(format!(
                "wavelength interval must be positive, got {}",
                interval
            )));
        }
        if start >= end {
            return Err(L3Error::DegenerateRange { start, end });
        }
        let mut bands = Vec::new();
        let mut i = 0usize;
        loop {
            let w = start + i as f64 * interval;
            if w >= end - 1e-9 {
                break;
            }
            bands.push(w);
            i += 1;
        }
        if bands.is_empty() {
            return Err(L3Error::DegenerateRange { start, end });
        }
        Ok(WavelengthGrid { bands, interval })
    }

    /// Bound the grid by the overlap of the instruments' native bands:
    /// start is the largest per-instrument ceil(first band), end the
    /// smallest floor(last band).
    pub fn common(tables: &[&ColumnTable], interval: f64) -> L3Result<Self> {
        let mut start = f64::NEG_INFINITY;
        let mut end = f64::INFINITY;
        for table in tables {
            let bands = table.band_names();
            let (first, last) = match (bands.first(), bands.last()) {
                (Some(first), Some(last)) => (first.0, last.0),
                _ => {
                    return Err(L3Error::Processing(
                        "instrument table has no spectral columns".to_string(),
                    ))
                }
            };
            start = start.max(first.ceil());
            end = end.min(last.floor());
        }
        log::debug!("Common wavelength range: [{}, {}) at {} nm", start, end, interval);
        WavelengthGrid::new(start, end, interval)
    }

    pub fn bands(&self) -> &[f64] {
        &self.bands
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.bands.iter().map(|&w| band_label(w)).collect()
    }
}

/// Spline-resample a time-synchronized instrument table onto the common
/// grid: per time sample, a degree-3 spline through (native wavelength,
/// value) pairs evaluated at every grid band. The stamp pair is carried
/// over unchanged.
pub fn interpolate_wavelength(
    table: &ColumnTable,
    grid: &WavelengthGrid,
) -> L3Result<ColumnTable> {
    let native = table.band_names();
    if native.len() < 2 {
        return Err(L3Error::Processing(
            "instrument table has too few spectral columns for resampling".to_string(),
        ));
    }
    let wavelengths: Vec<f64> = native.iter().map(|(w, _)| *w).collect();

    let dates = table
        .get_float(DATETAG)
        .ok_or_else(|| L3Error::MissingDataset(DATETAG.to_string()))?;
    let times = table
        .get_float(TIMETAG2)
        .ok_or_else(|| L3Error::MissingDataset(TIMETAG2.to_string()))?;
    let n_rows = dates.len();

    let columns: Vec<&Vec<f64>> = native
        .iter()
        .map(|(_, name)| {
            table
                .get_float(name)
                .ok_or_else(|| L3Error::MissingDataset(name.clone()))
        })
        .collect::<L3Result<_>>()?;

    let mut resampled: Vec<Vec<f64>> = vec![Vec::with_capacity(n_rows); grid.len()];
    for row in 0..n_rows {
        let spectrum: Vec<f64> = columns.iter().map(|c| c[row]).collect();
        let spline = CubicSpline::fit(&wavelengths, &spectrum)?;
        let values = spline.eval_many(grid.bands())?;
        for (band, value) in resampled.iter_mut().zip(values) {
            band.push(value);
        }
    }

    let mut out = ColumnTable::new();
    out.insert_float(DATETAG, dates.clone());
    out.insert_float(TIMETAG2, times.clone());
    for (label, values) in grid.labels().iter().zip(resampled) {
        out.insert_float(label, values);
    }
    Ok(out)
}

fn copy_channel(
    group: &Group,
    dataset: &str,
    column: &str,
    target_name: &str,
    tables: &mut [&mut ColumnTable],
) -> L3Result<()> {
    let values = group
        .require_dataset(dataset)?
        .columns
        .get_float(column)
        .cloned()
        .ok_or_else(|| L3Error::MissingDataset(format!("{}/{}/{}", group.id, dataset, column)))?;
    for table in tables.iter_mut() {
        table.insert_float(target_name, values.clone());
    }
    Ok(())
}

/// Reattach the per-time, non-spectral channels to the unified tables:
/// decimal position from GPS; sun azimuth, ship heading, SAS pitch/roll and
/// rotator pointing from SATNAV. The groups were already resampled onto the
/// same time base, so identical values land on all three tables.
pub fn attach_ancillary(
    gps: Option<&Group>,
    satnav: Option<&Group>,
    tables: &mut [&mut ColumnTable],
) -> L3Result<()> {
    if let Some(gps) = gps {
        copy_channel(gps, "LATPOS", "NONE", "LATPOS", tables)?;
        copy_channel(gps, "LONPOS", "NONE", "LONPOS", tables)?;
    }
    if let Some(satnav) = satnav {
        copy_channel(satnav, "AZIMUTH", "SUN", "AZIMUTH", tables)?;
        copy_channel(satnav, "HEADING", "SHIP_TRUE", "SHIP_TRUE", tables)?;
        copy_channel(satnav, "PITCH", "SAS", "PITCH", tables)?;
        copy_channel(satnav, "POINTING", "ROTATOR", "ROTATOR", tables)?;
        copy_channel(satnav, "ROLL", "SAS", "ROLL", tables)?;
    }
    Ok(())
}

/// Equalize the spectral column sets across the three unified tables:
/// compute the tightest mutual bounds (largest per-table minimum, smallest
/// per-table maximum) and drop every spectral column outside them from all
/// three. A diagnostic aid for downstream comparison, not required for the
/// correctness of any single table.
pub fn match_columns(tables: &mut [&mut ColumnTable]) {
    log::info!("Match Columns");

    let mut match_min = f64::NEG_INFINITY;
    let mut match_max = f64::INFINITY;
    for table in tables.iter() {
        let bands = table.band_names();
        if let (Some(min), Some(max)) = (
            bands.iter().map(|(w, _)| *w).reduce(f64::min),
            bands.iter().map(|(w, _)| *w).reduce(f64::max),
        ) {
            match_min = match_min.max(min);
            match_max = match_max.min(max);
        }
    }

    for table in tables.iter_mut() {
        let doomed: Vec<String> = table
            .names()
            .filter(|name| {
                band_value(name).is_some_and(|w| w < match_min || w > match_max)
            })
            .map(String::from)
            .collect();
        for name in doomed {
            table.remove(&name);
        }
    }
}
