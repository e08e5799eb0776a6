use radtide::{Root, SeaBassHeader, SeaBassWriter, DATETAG, TIMETAG2};
use std::fs;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Minimal harmonized Level-3 tree: two samples, three bands, position
/// channels attached, one NaN planted in LI to exercise the sentinel.
fn harmonized_root() -> Root {
    let mut root = Root::new();
    root.attributes
        .insert("RAW_FILE_NAME".to_string(), "leg7.raw".to_string());
    root.attributes
        .insert("ES_UNITS".to_string(), "uW/cm^2/nm".to_string());
    root.attributes
        .insert("LI_UNITS".to_string(), "uW/cm^2/nm/sr".to_string());
    root.attributes
        .insert("LT_UNITS".to_string(), "uW/cm^2/nm/sr".to_string());

    let fill = |values: [f64; 2], nan_at: Option<usize>| -> Vec<f64> {
        let mut v = values.to_vec();
        if let Some(i) = nan_at {
            v[i] = f64::NAN;
        }
        v
    };

    let build = |name: &str, nan_at: Option<usize>| {
        let mut columns = radtide::ColumnTable::new();
        columns.insert_float(DATETAG, vec![2020100.0, 2020100.0]);
        columns.insert_float(TIMETAG2, vec![120000000.0, 120001000.0]);
        columns.insert_float("400", fill([1.25, 1.5], None));
        columns.insert_float("405", fill([2.25, 2.5], nan_at));
        columns.insert_float("410", fill([3.25, 3.5], None));
        columns.insert_float("LATPOS", vec![47.51, 47.52]);
        columns.insert_float("LONPOS", vec![-122.51, -122.52]);
        let mut ds = radtide::Dataset::new(name);
        ds.columns = columns;
        ds
    };

    let reference = root.add_group("Reference");
    *reference.add_dataset("ES_hyperspectral") = build("ES_hyperspectral", None);
    let sas = root.add_group("SAS");
    *sas.add_dataset("LI_hyperspectral") = build("LI_hyperspectral", Some(1));
    *sas.add_dataset("LT_hyperspectral") = build("LT_hyperspectral", None);
    root
}

#[test]
fn test_writer_emits_three_files_with_headers() {
    init_logging();
    let root = harmonized_root();
    let dir = tempfile::tempdir().expect("tempdir");
    let header = SeaBassHeader::default();

    let written = SeaBassWriter::write_level3(&root, dir.path(), "leg7_L3", &header)
        .expect("SeaBASS write failed");
    assert_eq!(written.len(), 3);

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["ESleg7_L3.sb", "LIleg7_L3.sb", "LTleg7_L3.sb"]);

    let es_text = fs::read_to_string(&written[0]).unwrap();
    assert!(es_text.starts_with("/begin_header\n"));
    assert!(es_text.contains("/end_header\n"));
    assert!(es_text.contains("/missing=-9999\n"));
    assert!(es_text.contains("/delimiter=comma\n"));
    assert!(es_text.contains("/original_file_name=leg7.raw\n"));
    assert!(es_text.contains("/station=leg7\n"));
    // Extent filled from the data: 2020 day 100 is April 9
    assert!(es_text.contains("/start_date=20200409\n"));
    assert!(es_text.contains("/start_time=12:00:00[GMT]\n"));
    assert!(es_text.contains("/end_time=12:00:01[GMT]\n"));
    assert!(es_text.contains("/north_latitude=47.5200[DEG]\n"));
    assert!(es_text.contains("/west_longitude=-122.5200[DEG]\n"));
}

#[test]
fn test_writer_fields_units_and_rows() {
    init_logging();
    let root = harmonized_root();
    let dir = tempfile::tempdir().expect("tempdir");
    let written =
        SeaBassWriter::write_level3(&root, dir.path(), "leg7_L3", &SeaBassHeader::default())
            .unwrap();

    let es_text = fs::read_to_string(&written[0]).unwrap();
    assert!(es_text.contains("/fields=date,time,lat,lon,Es400,Es405,Es410\n"));
    assert!(es_text.contains(
        "/units=yyyymmdd,hh:mm:ss,degrees,degrees,uW/cm^2/nm,uW/cm^2/nm,uW/cm^2/nm\n"
    ));

    let li_text = fs::read_to_string(&written[1]).unwrap();
    assert!(li_text.contains("/fields=date,time,lat,lon,Lsky400,Lsky405,Lsky410\n"));

    let rows: Vec<&str> = es_text
        .lines()
        .skip_while(|line| *line != "/end_header")
        .skip(1)
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0],
        "20200409,12:00:00,47.5100,-122.5100,1.250000,2.250000,3.250000"
    );

    // Planted NaN in LI row 1 becomes the sentinel
    let li_rows: Vec<&str> = li_text
        .lines()
        .skip_while(|line| *line != "/end_header")
        .skip(1)
        .collect();
    assert!(li_rows[1].contains(",-9999.000000,"));
}

#[test]
fn test_writer_requires_harmonized_groups() {
    init_logging();
    let root = Root::new();
    let dir = tempfile::tempdir().expect("tempdir");
    let err = SeaBassWriter::write_level3(&root, dir.path(), "x", &SeaBassHeader::default())
        .unwrap_err();
    assert!(matches!(err, radtide::L3Error::MissingGroup(_)));
}
