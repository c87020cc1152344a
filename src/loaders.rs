/// CSV loading for the vehicle asset reporter: the trip-info table and the per-vehicle trail files.
/// Date: 2026-10-19

use crate::*;   // To use everything from the crate
use serde::de::DeserializeOwned;

// Functions
//----------------------------------------------------

/// Reads every row of a CSV file into `T`, after checking that all `required_columns` are in the header.
/// Columns not used by `T` are ignored. Cells are trimmed.
/// csv_file: Path to the CSV file
/// required_columns: Header names that must be present
pub fn load_csv<T: DeserializeOwned>(csv_file: &Path, required_columns: &[&'static str]) -> Result<Vec<T>, ReportError> {
    // The path must be given
    if csv_file.as_os_str().is_empty() {
        return Err(ReportError::MissingParameter("csv_file"));
    }

    // Read the CSV file
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(csv_file)
        .map_err(|source| ReportError::Csv { path: csv_file.to_path_buf(), source })?;

    // Column presence check
    let headers = csv_reader
        .headers()
        .map_err(|source| ReportError::Csv { path: csv_file.to_path_buf(), source })?
        .clone();
    for &column in required_columns {
        if !headers.iter().any(|header| header == column) {
            return Err(ReportError::MissingColumn { path: csv_file.to_path_buf(), column });
        }
    }

    // Deserialize all rows, the first malformed row fails the whole file
    let mut rows: Vec<T> = Vec::new();
    for result in csv_reader.deserialize::<T>() {
        let row = result.map_err(|source| ReportError::Csv { path: csv_file.to_path_buf(), source })?;
        rows.push(row);
    }

    return Ok(rows);
}

/// Loads the trip-info table.
/// If a time window is given, only the trips whose `date_time` lies inside it are returned,
/// and the file must have a `date_time` column with valid timestamps.
/// Without a window the timestamps are not looked at.
/// csv_file: Path to the trip-info CSV file
/// time_window: Optional inclusive window to filter by
pub fn load_trip_info(csv_file: &Path, time_window: Option<&TimeWindow>) -> Result<Vec<TripRecord>, ReportError> {
    match time_window {
        Some(window) => {
            info!("{}", window);
            let mut required_columns = TRIP_INFO_COLUMNS.to_vec();
            required_columns.push(TRIP_TIMESTAMP_COLUMN);
            let trips: Vec<TripRecord> = load_csv(csv_file, &required_columns)?;
            let filtered = filter_trips_by_time_window(trips, window)?;
            for trip in &filtered {
                debug!("{:?}", trip);
            }
            Ok(filtered)
        }
        None => load_csv(csv_file, &TRIP_INFO_COLUMNS),
    }
}

/// Keeps the trips whose timestamp lies inside the window, bounds included.
/// Trips without a timestamp are dropped, a malformed timestamp fails the filter.
pub fn filter_trips_by_time_window(trips: Vec<TripRecord>, time_window: &TimeWindow) -> Result<Vec<TripRecord>, ReportError> {
    let mut filtered: Vec<TripRecord> = Vec::new();
    for trip in trips {
        if let Some(date_time) = trip.local_date_time()? {
            if time_window.contains(date_time) {
                filtered.push(trip);
            }
        }
    }
    return Ok(filtered);
}

/// Loads one vehicle trail, keeping the order of the file.
/// Each point gets its position in the file as ordinal.
/// csv_file: Path to the trail CSV file
pub fn load_vehicle_trail(csv_file: &Path) -> Result<Vec<TrailPoint>, ReportError> {
    let mut trail: Vec<TrailPoint> = load_csv(csv_file, &TRAIL_COLUMNS)?;
    for (i, point) in trail.iter_mut().enumerate() {
        point.ordinal = i;
    }
    return Ok(trail);
}

/// Path of the trail file for a vehicle: <vehicle_trails_dir>/<vehicle_number>.csv
pub fn trail_file_path(vehicle_trails_dir: &Path, vehicle_number: &str) -> PathBuf {
    vehicle_trails_dir.join(format!("{}.csv", vehicle_number))
}

/// Checks that the path is an existing file with a ".csv" name
pub fn check_csv_exists(file_path: &Path) -> bool {
    let is_csv = file_path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".csv"));
    return file_path.is_file() && is_csv;
}


// Set up tests here
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    fn trip(vehicle_number: &str, date_time: Option<&str>) -> TripRecord {
        TripRecord::new(vehicle_number, "Acme Logistics", date_time.unwrap_or_default())
    }

    #[test]
    fn filter_keeps_trips_inside_window() {
        let window = TimeWindow::from_epoch(1519843271, 1519846932, IST_OFFSET).unwrap();
        let trips = vec![
            trip("A", Some("20180301001111")),
            trip("B", Some("20180301001000")),
            trip("C", Some("20180301011212")),
            trip("D", None),
            trip("E", Some("20180302000000")),
        ];

        let filtered = filter_trips_by_time_window(trips, &window).unwrap();
        let vehicles: Vec<&str> = filtered.iter().map(|t| t.vehicle_number.as_str()).collect();
        assert_eq!(vehicles, vec!["A", "C"]);
    }

    #[test]
    fn filter_uses_window_offset() {
        // 00:30 UTC on 2018-03-01 is 06:00 at +05:30
        let window = TimeWindow::from_epoch(1519864200, 1519864200, IST_OFFSET).unwrap();
        let filtered = filter_trips_by_time_window(vec![trip("A", Some("20180301060000")), trip("B", Some("20180301003000"))], &window).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].vehicle_number, "A");
    }

    #[test]
    fn load_trip_info_with_and_without_window() {
        let dir = TempDir::new("loaders").unwrap();
        let path = dir.path().join("Trip-Info.csv");
        fs::write(
            &path,
            "trip_id,transporter_name,quantity,vehicle_number,date_time\n\
             1,Acme,10,V1,20180301003000\n\
             2,Acme,11,V2,20180302003000\n",
        )
        .unwrap();

        let all = load_trip_info(&path, None).unwrap();
        assert_eq!(all.len(), 2);

        let window = TimeWindow::from_epoch(1519843271, 1519846932, IST_OFFSET).unwrap();
        let in_range = load_trip_info(&path, Some(&window)).unwrap();
        assert_eq!(in_range.len(), 1);
        assert_eq!(in_range[0].vehicle_number, "V1");
        assert_eq!(in_range[0].transporter_name, "Acme");
    }

    #[test]
    fn load_trip_info_requires_date_time_only_with_window() {
        let dir = TempDir::new("loaders").unwrap();
        let path = dir.path().join("Trip-Info.csv");
        fs::write(&path, "vehicle_number,transporter_name\nV1,Acme\n").unwrap();

        assert_eq!(load_trip_info(&path, None).unwrap().len(), 1);

        let window = TimeWindow::from_epoch(1519843271, 1519846932, IST_OFFSET).unwrap();
        let result = load_trip_info(&path, Some(&window));
        assert!(matches!(result, Err(ReportError::MissingColumn { column: "date_time", .. })));
    }

    #[test]
    fn load_csv_reports_missing_file_and_parameter() {
        let missing = load_trip_info(Path::new("/does/not/exist/Trip-Info.csv"), None);
        assert!(matches!(missing, Err(ReportError::Csv { .. })));

        let empty_path = load_trip_info(Path::new(""), None);
        assert!(matches!(empty_path, Err(ReportError::MissingParameter("csv_file"))));
    }

    #[test]
    fn malformed_timestamp_only_matters_with_window() {
        let dir = TempDir::new("loaders").unwrap();
        let path = dir.path().join("Trip-Info.csv");
        fs::write(&path, "vehicle_number,transporter_name,date_time\nV1,Acme,2018-03-01\nV2,Acme,20180301003000\n").unwrap();

        let all = load_trip_info(&path, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].date_time, "2018-03-01");

        let window = TimeWindow::from_epoch(1519843271, 1519846932, IST_OFFSET).unwrap();
        let result = load_trip_info(&path, Some(&window));
        assert!(matches!(result, Err(ReportError::InvalidTimestamp(_))));
    }

    #[test]
    fn filter_fails_on_malformed_timestamp() {
        let window = TimeWindow::from_epoch(1519843271, 1519846932, IST_OFFSET).unwrap();
        let result = filter_trips_by_time_window(vec![trip("A", Some("20180301003000")), trip("B", Some("yesterday"))], &window);
        assert!(matches!(result, Err(ReportError::InvalidTimestamp(_))));
    }

    #[test]
    fn load_vehicle_trail_keeps_order_and_reads_lenient_cells() {
        let dir = TempDir::new("loaders").unwrap();
        let path = dir.path().join("V1.csv");
        fs::write(
            &path,
            "fk_asset_id,lat,lon,spd,osf,lic_plate_no\n\
             1,12.90,77.60,40,False,KA01AB1234\n\
             1,12.91,77.61,,True,KA01AB1234\n\
             1,12.92,77.62,55.5,1,\n",
        )
        .unwrap();

        let trail = load_vehicle_trail(&path).unwrap();
        assert_eq!(trail.len(), 3);
        assert_eq!(trail.iter().map(|p| p.ordinal).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(!trail[0].osf);
        assert!(trail[1].osf);
        assert!(trail[1].spd.is_nan());
        assert!(trail[2].osf);
        assert_eq!(trail[2].spd, 55.5);
        assert_eq!(trail[2].lic_plate_no, "");
    }

    #[test]
    fn load_vehicle_trail_requires_columns() {
        let dir = TempDir::new("loaders").unwrap();
        let path = dir.path().join("V1.csv");
        fs::write(&path, "lat,lon,spd,lic_plate_no\n12.9,77.6,40,KA01\n").unwrap();

        let result = load_vehicle_trail(&path);
        assert!(matches!(result, Err(ReportError::MissingColumn { column: "osf", .. })));
    }

    #[test]
    fn csv_existence_check() {
        let dir = TempDir::new("loaders").unwrap();
        let csv_path = dir.path().join("V1.csv");
        let txt_path = dir.path().join("V1.txt");
        fs::write(&csv_path, "lat\n").unwrap();
        fs::write(&txt_path, "lat\n").unwrap();

        assert!(check_csv_exists(&csv_path));
        assert!(!check_csv_exists(&txt_path));
        assert!(!check_csv_exists(&dir.path().join("V2.csv")));
        assert!(!check_csv_exists(dir.path()));
    }

    #[test]
    fn trail_file_path_appends_csv() {
        let path = trail_file_path(Path::new("trails"), "V1");
        assert_eq!(path, Path::new("trails").join("V1.csv"));
    }
}
