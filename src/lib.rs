/// Vehicle asset reporter summarises vehicle trips and their GPS trails into a spreadsheet report.
/// Date: 2026-10-19
/// For every vehicle with a trip in the given time window the report holds the distance travelled,
/// the number of trips, the average speed, the transporter and the number of speed violations.
/// Note that a dimensional analysis is not performed in this code using uom (https://crates.io/crates/uom)

/// External crates
use csv;    // CSV reader to read the trip-info and trail files
use uom::{self};    // Units of measurement. Makes sure that the correct units are used for every calculation
use geo;    // Geographical points for the trail coordinates
use time;   // To do time calculations
use time::macros::{format_description, offset};
use std::fmt; // For formatting
use std::path::{Path, PathBuf};
use indexmap::IndexMap; // Keeps vehicles in the order they are first seen
use log::{debug, error, info, warn};
use thiserror::Error;


// Internal modules
pub mod vehicles;
pub use crate::vehicles::*; // Import the vehicles module
pub mod loaders;
pub use crate::loaders::*; // Import the loaders module
pub mod reporters;
pub use crate::reporters::*; // Import the reporters module

// Constants
//----------------------------------------------------
/// Earth radius used by the haversine formula in [km]
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Offset of the trip-info timestamps, Asia/Kolkata (no daylight saving)
pub const IST_OFFSET: time::UtcOffset = offset!(+5:30);

/// Columns the trip-info file must always have
pub const TRIP_INFO_COLUMNS: [&str; 2] = ["vehicle_number", "transporter_name"];

/// Column of the trip-info file that holds the trip time, needed when filtering by time
pub const TRIP_TIMESTAMP_COLUMN: &str = "date_time";

/// Columns every trail file must have
pub const TRAIL_COLUMNS: [&str; 5] = ["lat", "lon", "spd", "osf", "lic_plate_no"];

/// Header row of the report
pub const REPORT_HEADERS: [&str; 6] = [
    "License plate number",
    "Distance",
    "Number of Trips Completed",
    "Average Speed",
    "Transporter Name",
    "Number of Speed Violations",
];


// Structs and enums
//----------------------------------------------------
/// Everything that can go wrong while building a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("the {0} parameter must be provided")]
    MissingParameter(&'static str),
    #[error("error in getting data from {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("the csv file {path:?} must contain a '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("invalid timestamp '{0}', expected YYYYMMDDHHMMSS")]
    InvalidTimestamp(String),
    #[error("epoch time {0} is out of range")]
    InvalidEpoch(i64),
    #[error("no data in this time range {start}::{end}")]
    EmptyTimeRange { start: i64, end: i64 },
    #[error("{0:?} vehicle trail file does not exist")]
    TrailFileMissing(PathBuf),
    #[error("no data available in {0:?}")]
    TrailEmpty(PathBuf),
    #[error("no data to write to the spreadsheet")]
    NothingToWrite,
    #[error("unable to write spreadsheet: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),
}

/// Where a report reads from and writes to
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// The trip-info CSV file
    pub trip_info_file: PathBuf,
    /// Directory with one <vehicle_number>.csv trail file per vehicle
    pub vehicle_trails_dir: PathBuf,
    /// The spreadsheet to write, overwritten if it exists
    pub output_file: PathBuf,
    /// Offset of the trip-info timestamps
    pub utc_offset: time::UtcOffset,
}

impl ReportConfig {
    /// Creates a new report configuration
    pub fn new(trip_info_file: PathBuf, vehicle_trails_dir: PathBuf, output_file: PathBuf, utc_offset: time::UtcOffset) -> ReportConfig {
        ReportConfig {
            trip_info_file,
            vehicle_trails_dir,
            output_file,
            utc_offset,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            trip_info_file: PathBuf::from("Trip-Info.csv"),
            vehicle_trails_dir: PathBuf::from("NU-raw-location-dump/EOL-dump"),
            output_file: PathBuf::from("vehicle_data.xlsx"),
            utc_offset: IST_OFFSET,
        }
    }
}

/// std::Display for ReportConfig
impl fmt::Display for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "trip info: {}, vehicle trails: {}, output: {}, offset: {}",
            self.trip_info_file.display(),
            self.vehicle_trails_dir.display(),
            self.output_file.display(),
            self.utc_offset
        )
    }
}


// Functions
//----------------------------------------------------

/// Calculates the great circle distance between two points in [km] with the haversine formula.
/// Uses an earth radius of 6371.0 km.
/// p1, p2: geo::Point with x as longitude and y as latitude, both in degrees
pub fn haversine_distance_km(p1: geo::Point, p2: geo::Point) -> f64 {
    // To radians
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();
    let delta_lat = lat2 - lat1;
    let delta_lon = (p2.x() - p1.x()).to_radians();

    // Rounding can push a just past 1.0 for nearly antipodal points
    let a = ((delta_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2)).clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    return EARTH_RADIUS_KM * c;
}

/// Calculates the haversine distance between two points and returns the distance in uom::si::f64::Length
pub fn haversine_distance_uom_units(p1: geo::Point, p2: geo::Point) -> uom::si::f64::Length {
    uom::si::f64::Length::new::<uom::si::length::kilometer>(haversine_distance_km(p1, p2))
}

/// Parses a timestamp in the compact format YYYYMMDDHHMMSS, e.g. "20180301001111".
/// The result has no offset, it is a local time.
pub fn parse_compact_timestamp(time_string: &str) -> Result<time::PrimitiveDateTime, ReportError> {
    let format = format_description!("[year][month][day][hour][minute][second]");
    time::PrimitiveDateTime::parse(time_string.trim(), &format)
        .map_err(|_| ReportError::InvalidTimestamp(time_string.to_string()))
}

/// Converts epoch seconds to a date time in the given offset
pub fn epoch_to_offset_date_time(epoch_seconds: i64, offset: time::UtcOffset) -> Result<time::OffsetDateTime, ReportError> {
    let utc = time::OffsetDateTime::from_unix_timestamp(epoch_seconds).map_err(|_| ReportError::InvalidEpoch(epoch_seconds))?;
    return utc.checked_to_offset(offset).ok_or(ReportError::InvalidEpoch(epoch_seconds));
}

/// Converts a compact local timestamp (YYYYMMDDHHMMSS) in the given offset to epoch seconds
/// # Example:
/// ```
/// use vehicle_asset_reporter::*;
/// let epoch = compact_timestamp_to_epoch("20180301001111", IST_OFFSET).unwrap();
/// assert_eq!(epoch, 1519843271);
/// ```
pub fn compact_timestamp_to_epoch(time_string: &str, offset: time::UtcOffset) -> Result<i64, ReportError> {
    let local_time = parse_compact_timestamp(time_string)?;
    return Ok(local_time.assume_offset(offset).unix_timestamp());
}

/// Writes the vehicle summaries to an xlsx file, one row per vehicle under the REPORT_HEADERS header row.
/// Distance is written in [km] and average speed in [km/h].
/// Will overwrite any file at xlsx_file_path.
/// Returns the number of rows written, or ReportError::NothingToWrite if there are no summaries.
pub fn write_summaries_to_xlsx(summaries: &[VehicleSummary], xlsx_file_path: &Path) -> Result<usize, ReportError> {
    if summaries.is_empty() {
        return Err(ReportError::NothingToWrite);
    }

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let header_format = rust_xlsxwriter::Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    // Write the header
    for (col, header) in REPORT_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    // Write the vehicle rows
    for (i, summary) in summaries.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, summary.license_plate_number.as_str())?;
        worksheet.write_number(row, 1, summary.distance.get::<uom::si::length::kilometer>())?;
        worksheet.write_number(row, 2, summary.trips_completed as f64)?;
        worksheet.write_number(row, 3, summary.average_speed)?;
        worksheet.write_string(row, 4, summary.transporter_name.as_str())?;
        worksheet.write_number(row, 5, summary.speed_violations as f64)?;
    }

    workbook.save(xlsx_file_path)?;
    return Ok(summaries.len());
}
