use crate::core::timebase::{date_tag_to_date, time_tag2_to_datetime};
use crate::io::tree::{Dataset, Root};
use crate::types::{InstrumentKind, L3Error, L3Result, DATETAG, MISSING_VALUE, TIMETAG2};
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The mandated SeaBASS header block. Blank extent/time fields are filled
/// from the harmonized data at write time; everything else is supplied by
/// the caller (typically deserialized from a config front-end).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeaBassHeader {
    pub investigators: String,
    pub affiliations: String,
    pub contact: String,
    pub experiment: String,
    pub cruise: String,
    pub station: String,
    pub data_file_name: String,
    pub original_file_name: String,
    pub documents: String,
    pub calibration_files: String,
    pub data_type: String,
    pub data_status: String,
    pub start_date: String,
    pub end_date: String,
    pub start_time: String,
    pub end_time: String,
    pub north_latitude: String,
    pub south_latitude: String,
    pub east_longitude: String,
    pub west_longitude: String,
    pub water_depth: String,
    pub measurement_depth: String,
    pub missing: String,
    pub delimiter: String,
    pub comments: String,
    pub other_comments: String,
}

impl Default for SeaBassHeader {
    fn default() -> Self {
        SeaBassHeader {
            investigators: String::new(),
            affiliations: String::new(),
            contact: String::new(),
            experiment: String::new(),
            cruise: String::new(),
            station: String::new(),
            data_file_name: String::new(),
            original_file_name: String::new(),
            documents: String::new(),
            calibration_files: String::new(),
            data_type: "above_water".to_string(),
            data_status: "preliminary".to_string(),
            start_date: String::new(),
            end_date: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            north_latitude: String::new(),
            south_latitude: String::new(),
            east_longitude: String::new(),
            west_longitude: String::new(),
            water_depth: "NA".to_string(),
            measurement_depth: "NA".to_string(),
            missing: format!("{}", MISSING_VALUE),
            delimiter: "comma".to_string(),
            comments: String::new(),
            other_comments: String::new(),
        }
    }
}

/// Writer for the SeaBASS plain-text community interchange format
pub struct SeaBassWriter;

impl SeaBassWriter {
    /// Export the three harmonized radiometric datasets of a Level-3 tree,
    /// one `.sb` file per instrument, into `<out_dir>/SeaBASS/`.
    pub fn write_level3(
        root: &Root,
        out_dir: &Path,
        stem: &str,
        header: &SeaBassHeader,
    ) -> L3Result<Vec<PathBuf>> {
        let reference = root.require_group("Reference")?;
        let sas = root.require_group("SAS")?;
        let es = reference.require_dataset("ES_hyperspectral")?;
        let li = sas.require_dataset("LI_hyperspectral")?;
        let lt = sas.require_dataset("LT_hyperspectral")?;

        let header = Self::resolve_header(header.clone(), root, es, stem)?;

        let seabass_dir = out_dir.join("SeaBASS");
        if !seabass_dir.exists() {
            log::info!("Creating a SeaBASS directory");
            fs::create_dir_all(&seabass_dir)?;
        }

        let mut written = Vec::new();
        for (kind, dataset) in [
            (InstrumentKind::Es, es),
            (InstrumentKind::Li, li),
            (InstrumentKind::Lt, lt),
        ] {
            let units = Self::units_for(root, kind);
            let (rows, fields, unit_line) = Self::format_data(dataset, kind, &units)?;
            let path = seabass_dir.join(format!("{}{}.sb", kind, stem));
            Self::write_file(&path, &header, &fields, &unit_line, &rows)?;
            log::info!("Wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }

    fn units_for(root: &Root, kind: InstrumentKind) -> String {
        let key = format!("{}_UNITS", kind);
        root.attributes.get(&key).cloned().unwrap_or_else(|| match kind {
            InstrumentKind::Es => "uW/cm^2/nm".to_string(),
            _ => "uW/cm^2/nm/sr".to_string(),
        })
    }

    fn sample_datetimes(dataset: &Dataset) -> L3Result<Vec<NaiveDateTime>> {
        let dates = dataset
            .columns
            .get_float(DATETAG)
            .ok_or_else(|| L3Error::MissingDataset(DATETAG.to_string()))?;
        let times = dataset
            .columns
            .get_float(TIMETAG2)
            .ok_or_else(|| L3Error::MissingDataset(TIMETAG2.to_string()))?;
        dates
            .iter()
            .zip(times.iter())
            .map(|(&d, &t)| {
                let date = date_tag_to_date(d)?;
                time_tag2_to_datetime(date, t)
            })
            .collect()
    }

    /// Fill the blank extent and time-range fields from the harmonized
    /// reference data; fields the caller set explicitly are left alone
    fn resolve_header(
        mut header: SeaBassHeader,
        root: &Root,
        es: &Dataset,
        stem: &str,
    ) -> L3Result<SeaBassHeader> {
        if let Some(raw) = root.attributes.get("RAW_FILE_NAME") {
            header.original_file_name = raw.clone();
            if header.station.is_empty() {
                header.station = raw.split('.').next().unwrap_or(stem).to_string();
            }
        } else if header.station.is_empty() {
            header.station = stem.to_string();
        }
        header.data_file_name = format!("{}.sb", stem);

        let datetimes = Self::sample_datetimes(es)?;
        if let (Some(first), Some(last)) = (datetimes.iter().min(), datetimes.iter().max()) {
            if header.start_time.is_empty() {
                header.start_time = format!(
                    "{:02}:{:02}:{:02}[GMT]",
                    first.hour(),
                    first.minute(),
                    first.second()
                );
            }
            if header.end_time.is_empty() {
                header.end_time = format!(
                    "{:02}:{:02}:{:02}[GMT]",
                    last.hour(),
                    last.minute(),
                    last.second()
                );
            }
            if header.start_date.is_empty() {
                header.start_date = format!(
                    "{:04}{:02}{:02}",
                    first.year(),
                    first.month(),
                    first.day()
                );
            }
            if header.end_date.is_empty() {
                header.end_date =
                    format!("{:04}{:02}{:02}", last.year(), last.month(), last.day());
            }
        }

        let lat = es.columns.get_float("LATPOS");
        let lon = es.columns.get_float("LONPOS");
        if let Some(lat) = lat {
            let south = lat.iter().cloned().reduce(f64::min);
            let north = lat.iter().cloned().reduce(f64::max);
            if let (Some(south), Some(north)) = (south, north) {
                if header.south_latitude.is_empty() {
                    header.south_latitude = format!("{:.4}[DEG]", south);
                }
                if header.north_latitude.is_empty() {
                    header.north_latitude = format!("{:.4}[DEG]", north);
                }
            }
        }
        if let Some(lon) = lon {
            let west = lon.iter().cloned().reduce(f64::min);
            let east = lon.iter().cloned().reduce(f64::max);
            if let (Some(west), Some(east)) = (west, east) {
                if header.west_longitude.is_empty() {
                    header.west_longitude = format!("{:.4}[DEG]", west);
                }
                if header.east_longitude.is_empty() {
                    header.east_longitude = format!("{:.4}[DEG]", east);
                }
            }
        }
        Ok(header)
    }

    /// Map one harmonized dataset into the fixed-column block: leading
    /// date/time/position fields, then the spectral columns under the
    /// instrument's SeaBASS prefix. Missing values become the sentinel.
    fn format_data(
        dataset: &Dataset,
        kind: InstrumentKind,
        units: &str,
    ) -> L3Result<(Vec<String>, String, String)> {
        let prefix = kind.seabass_prefix().ok_or_else(|| {
            L3Error::Processing(format!("{} has no SeaBASS field prefix", kind))
        })?;
        let datetimes = Self::sample_datetimes(dataset)?;
        let bands = dataset.columns.band_names();
        let lat = dataset.columns.get_float("LATPOS");
        let lon = dataset.columns.get_float("LONPOS");

        let mut fields = vec![
            "date".to_string(),
            "time".to_string(),
            "lat".to_string(),
            "lon".to_string(),
        ];
        fields.extend(bands.iter().map(|(_, name)| format!("{}{}", prefix, name)));
        let fields_line = fields.join(",");

        let mut unit_items = vec![
            "yyyymmdd".to_string(),
            "hh:mm:ss".to_string(),
            "degrees".to_string(),
            "degrees".to_string(),
        ];
        unit_items.extend(std::iter::repeat(units.to_string()).take(bands.len()));
        let units_line = unit_items.join(",");

        let band_columns: Vec<&Vec<f64>> = bands
            .iter()
            .map(|(_, name)| {
                dataset
                    .columns
                    .get_float(name)
                    .ok_or_else(|| L3Error::MissingDataset(name.clone()))
            })
            .collect::<L3Result<_>>()?;

        let sentinel_for = |v: f64| if v.is_nan() { MISSING_VALUE } else { v };
        let mut rows = Vec::with_capacity(datetimes.len());
        for (i, dt) in datetimes.iter().enumerate() {
            let lat_v = lat.and_then(|v| v.get(i).copied()).unwrap_or(MISSING_VALUE);
            let lon_v = lon.and_then(|v| v.get(i).copied()).unwrap_or(MISSING_VALUE);
            let mut row = format!(
                "{:04}{:02}{:02},{:02}:{:02}:{:02},{:.4},{:.4}",
                dt.year(),
                dt.month(),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second(),
                sentinel_for(lat_v),
                sentinel_for(lon_v),
            );
            for column in &band_columns {
                row.push_str(&format!(",{:.6}", sentinel_for(column[i])));
            }
            rows.push(row);
        }
        Ok((rows, fields_line, units_line))
    }

    fn write_file(
        path: &Path,
        header: &SeaBassHeader,
        fields: &str,
        units: &str,
        rows: &[String],
    ) -> L3Result<()> {
        let mut file = fs::File::create(path)?;
        writeln!(file, "/begin_header")?;
        for (key, value) in [
            ("investigators", &header.investigators),
            ("affiliations", &header.affiliations),
            ("contact", &header.contact),
            ("experiment", &header.experiment),
            ("cruise", &header.cruise),
            ("station", &header.station),
            ("data_file_name", &header.data_file_name),
            ("original_file_name", &header.original_file_name),
            ("documents", &header.documents),
            ("calibration_files", &header.calibration_files),
            ("data_type", &header.data_type),
            ("data_status", &header.data_status),
            ("start_date", &header.start_date),
            ("end_date", &header.end_date),
            ("start_time", &header.start_time),
            ("end_time", &header.end_time),
            ("north_latitude", &header.north_latitude),
            ("south_latitude", &header.south_latitude),
            ("east_longitude", &header.east_longitude),
            ("west_longitude", &header.west_longitude),
            ("water_depth", &header.water_depth),
            ("measurement_depth", &header.measurement_depth),
            ("missing", &header.missing),
            ("delimiter", &header.delimiter),
        ] {
            writeln!(file, "/{}={}", key, value)?;
        }
        if !header.comments.is_empty() {
            writeln!(file, "{}", header.comments)?;
        }
        if !header.other_comments.is_empty() {
            writeln!(file, "{}", header.other_comments)?;
        }
        writeln!(file, "/fields={}", fields)?;
        writeln!(file, "/units={}", units)?;
        writeln!(file, "/end_header")?;
        for row in rows {
            writeln!(file, "{}", row)?;
        }
        Ok(())
    }
}
