use radtide::core::{
    interpolate_gps, interpolate_satnav, interpolate_to_reference, seconds_to_time_tag2,
    select_reference,
};
use radtide::{ColumnTable, Group, InstrumentKind, L3Error, DATETAG, TIMETAG2};

const DATE_TAG: f64 = 2020100.0;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn instrument_table(n: usize, t0: f64, dt: f64, slope: f64) -> ColumnTable {
    let times: Vec<f64> = (0..n).map(|i| t0 + dt * i as f64).collect();
    let mut table = ColumnTable::new();
    table.insert_float(DATETAG, vec![DATE_TAG; n]);
    table.insert_float(
        TIMETAG2,
        times.iter().map(|&t| seconds_to_time_tag2(t)).collect(),
    );
    for (w, offset) in [("500", 0.0), ("505", 10.0)] {
        table.insert_float(w, times.iter().map(|&t| slope * t + offset).collect());
    }
    table
}

#[test]
fn test_reference_selection_picks_80_sample_dataset() {
    init_logging();
    // 100, 80, 120 records: the 80-sample LI stream wins
    assert_eq!(select_reference(100, 80, 120, None), InstrumentKind::Li);
}

#[test]
fn test_all_outputs_share_reference_cardinality() {
    init_logging();
    let es = instrument_table(100, 43200.0, 1.0, 2.0);
    let li = instrument_table(80, 43210.0, 1.0, 3.0);
    let lt = instrument_table(120, 43205.0, 0.9, 4.0);

    let reference = &li;
    let es_sync = interpolate_to_reference(&es, reference, InstrumentKind::Es).unwrap();
    let lt_sync = interpolate_to_reference(&lt, reference, InstrumentKind::Lt).unwrap();

    for table in [&es_sync, &lt_sync] {
        assert_eq!(table.n_rows(), 80);
        assert_eq!(table.get_float(TIMETAG2).unwrap(), reference.get_float(TIMETAG2).unwrap());
        assert_eq!(table.get_float(DATETAG).unwrap(), reference.get_float(DATETAG).unwrap());
    }

    // Linear-in-time channels survive cubic resampling exactly
    let times: Vec<f64> = reference
        .get_float(TIMETAG2)
        .unwrap()
        .iter()
        .map(|&t| radtide::core::time_tag2_to_seconds(t))
        .collect();
    let es_500 = es_sync.get_float("500").unwrap();
    for (i, &t) in times.iter().enumerate() {
        assert!((es_500[i] - 2.0 * t).abs() < 1e-6);
    }
}

#[test]
fn test_nonmonotonic_reference_axis_is_fatal() {
    init_logging();
    let es = instrument_table(30, 43200.0, 1.0, 2.0);
    let mut reference = instrument_table(20, 43205.0, 1.0, 3.0);
    let stamps = reference.get_float_mut(TIMETAG2).unwrap();
    stamps[10] = stamps[9];

    let err = interpolate_to_reference(&es, &reference, InstrumentKind::Es).unwrap_err();
    assert!(matches!(err, L3Error::Monotonicity { axis: "y" }));
}

fn utc_string(seconds: f64) -> String {
    let h = (seconds / 3600.0).floor();
    let m = ((seconds - h * 3600.0) / 60.0).floor();
    let s = seconds - h * 3600.0 - m * 60.0;
    format!("{:02}{:02}{:02}", h as u32, m as u32, s as u32)
}

#[test]
fn test_gps_interpolation_converts_position_first() {
    init_logging();
    let n = 10;
    let mut gps = Group::new("GPS_RAW");
    let times: Vec<f64> = (0..n).map(|i| 43190.0 + 10.0 * i as f64).collect();
    gps.add_dataset("UTCPOS")
        .columns
        .insert_text("NONE", times.iter().map(|&t| utc_string(t)).collect());
    gps.add_dataset("COURSE")
        .columns
        .insert_float("NONE", vec![200.0; n]);
    gps.add_dataset("LATPOS")
        .columns
        .insert_float("NONE", vec![4730.0; n]);
    gps.add_dataset("LONPOS")
        .columns
        .insert_float("NONE", vec![12230.0; n]);
    gps.add_dataset("MAGVAR")
        .columns
        .insert_float("NONE", vec![1.5; n]);
    gps.add_dataset("SPEED")
        .columns
        .insert_float("NONE", vec![6.0; n]);
    gps.add_dataset("LATHEMI")
        .columns
        .insert_text("NONE", vec!["S".to_string(); n]);
    gps.add_dataset("LONHEMI")
        .columns
        .insert_text("NONE", vec!["E".to_string(); n]);

    let reference = instrument_table(8, 43200.0, 5.0, 1.0);
    let group = interpolate_gps(&gps, &reference).unwrap();

    for name in ["COURSE", "LATPOS", "LONPOS", "MAGVAR", "SPEED"] {
        let ds = group.get_dataset(name).unwrap();
        assert_eq!(ds.columns.n_rows(), 8);
        assert_eq!(
            ds.columns.get_float(TIMETAG2).unwrap(),
            reference.get_float(TIMETAG2).unwrap()
        );
    }
    // 4730.0 S -> -47.5 decimal degrees, constant across the window
    let lat = group.get_dataset("LATPOS").unwrap().columns.get_float("NONE").unwrap();
    assert!(lat.iter().all(|&v| (v + 47.5).abs() < 1e-9));
    let lon = group.get_dataset("LONPOS").unwrap().columns.get_float("NONE").unwrap();
    assert!(lon.iter().all(|&v| (v - 122.5).abs() < 1e-9));
}

#[test]
fn test_gps_window_not_covering_reference_fails() {
    init_logging();
    let n = 5;
    let mut gps = Group::new("GPS_RAW");
    let times: Vec<f64> = (0..n).map(|i| 43200.0 + 1.0 * i as f64).collect();
    gps.add_dataset("UTCPOS")
        .columns
        .insert_text("NONE", times.iter().map(|&t| utc_string(t)).collect());
    for name in ["COURSE", "LATPOS", "LONPOS", "MAGVAR", "SPEED"] {
        gps.add_dataset(name)
            .columns
            .insert_float("NONE", vec![1.0; n]);
    }
    gps.add_dataset("LATHEMI")
        .columns
        .insert_text("NONE", vec!["N".to_string(); n]);
    gps.add_dataset("LONHEMI")
        .columns
        .insert_text("NONE", vec!["W".to_string(); n]);

    // Reference extends past the last GPS fix: fail fast, never clamp
    let reference = instrument_table(8, 43200.0, 5.0, 1.0);
    let err = interpolate_gps(&gps, &reference).unwrap_err();
    assert!(matches!(err, L3Error::Extrapolation { .. }));
}

#[test]
fn test_satnav_interpolation_keeps_named_columns() {
    init_logging();
    let n = 20;
    let mut satnav = Group::new("SATNAV_RAW");
    let times: Vec<f64> = (0..n).map(|i| 43195.0 + 3.0 * i as f64).collect();
    satnav.add_dataset("TIMETAG2").columns.insert_float(
        "NONE",
        times.iter().map(|&t| seconds_to_time_tag2(t)).collect(),
    );
    satnav
        .add_dataset("AZIMUTH")
        .columns
        .insert_float("SUN", times.iter().map(|&t| 0.1 * t).collect());
    let heading = satnav.add_dataset("HEADING");
    heading
        .columns
        .insert_float("SHIP_TRUE", vec![90.0; n]);
    heading.columns.insert_float("SAS_TRUE", vec![135.0; n]);
    satnav
        .add_dataset("PITCH")
        .columns
        .insert_float("SAS", vec![0.5; n]);
    satnav
        .add_dataset("POINTING")
        .columns
        .insert_float("ROTATOR", vec![40.0; n]);
    satnav
        .add_dataset("ROLL")
        .columns
        .insert_float("SAS", vec![-0.2; n]);

    let reference = instrument_table(8, 43200.0, 5.0, 1.0);
    let group = interpolate_satnav(&satnav, &reference).unwrap();

    let azimuth = group.get_dataset("AZIMUTH").unwrap();
    let sun = azimuth.columns.get_float("SUN").unwrap();
    assert_eq!(sun.len(), 8);
    // Linear channel reproduced at interior reference times
    for (i, t) in (0..8).map(|i| 43200.0 + 5.0 * i as f64).enumerate() {
        assert!((sun[i] - 0.1 * t).abs() < 1e-6);
    }
    let heading = group.get_dataset("HEADING").unwrap();
    assert!(heading.columns.get_float("SHIP_TRUE").is_some());
    assert!(heading.columns.get_float("SAS_TRUE").is_some());
}
