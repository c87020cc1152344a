/// Everything vehicle related for the vehicle asset reporter: trip records, trail points and the per-vehicle summary.
/// Date: 2026-10-19

use crate::*;   // To use everything from the crate
use serde::{Deserialize, Deserializer};

// Structs and Enums
//----------------------------------------------------
/// One row of the trip-info table.
/// Only the columns listed in TRIP_INFO_COLUMNS are read, every other column is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TripRecord {
    /// Vehicle identifier, also the stem of the vehicle trail file name
    pub vehicle_number: String,
    pub transporter_name: String,
    /// Raw `date_time` cell (YYYYMMDDHHMMSS local time), empty if the column is absent.
    /// Only parsed when trips are filtered by time.
    #[serde(default)]
    pub date_time: String,
}

impl TripRecord {
    /// Creates a new trip record
    pub fn new(vehicle_number: &str, transporter_name: &str, date_time: &str) -> TripRecord {
        TripRecord {
            vehicle_number: vehicle_number.to_string(),
            transporter_name: transporter_name.to_string(),
            date_time: date_time.to_string(),
        }
    }

    /// Local time of the trip. None if the cell is empty.
    pub fn local_date_time(&self) -> Result<Option<time::PrimitiveDateTime>, ReportError> {
        if self.date_time.trim().is_empty() {
            return Ok(None);
        }
        return parse_compact_timestamp(&self.date_time).map(Some);
    }
}

/// One GPS fix of a vehicle trail
/// Numeric cells that are empty or not numbers are read as NaN, the aggregation treats them as zero.
#[derive(Debug, Clone, Deserialize)]
pub struct TrailPoint {
    #[serde(deserialize_with = "deserialize_f64_or_nan")]
    pub lat: f64,
    #[serde(deserialize_with = "deserialize_f64_or_nan")]
    pub lon: f64,
    /// Speed in [km/h]
    #[serde(deserialize_with = "deserialize_f64_or_nan")]
    pub spd: f64,
    /// Over-speed flag
    #[serde(deserialize_with = "deserialize_bool_like")]
    pub osf: bool,
    #[serde(default)]
    pub lic_plate_no: String,
    /// Position of the point within its trail, starting at 0
    #[serde(skip)]
    pub ordinal: usize,
}

impl TrailPoint {
    /// Creates a new trail point
    pub fn new(lat: f64, lon: f64, spd: f64, osf: bool, lic_plate_no: &str, ordinal: usize) -> TrailPoint {
        TrailPoint {
            lat,
            lon,
            spd,
            osf,
            lic_plate_no: lic_plate_no.to_string(),
            ordinal,
        }
    }

    /// Position of the fix as a geo::Point (x: longitude, y: latitude)
    pub fn position(&self) -> geo::Point {
        return geo::Point::new(self.lon, self.lat);
    }
}

/// One row of the final report. Built once per vehicle at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSummary {
    pub license_plate_number: String,
    /// Total distance travelled over the trail
    pub distance: uom::si::f64::Length,
    /// Number of in-range trips listed for this vehicle
    pub trips_completed: u64,
    /// Average speed in [km/h]
    pub average_speed: f64,
    pub transporter_name: String,
    pub speed_violations: u64,
}

/// Inclusive time window. Both bounds are held in the same UTC offset as the trip-info data.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimeWindow {
    pub start: time::OffsetDateTime,
    pub end: time::OffsetDateTime,
}

impl TimeWindow {
    /// Creates a window from epoch seconds, converting both bounds to `offset`
    /// start_time: Start of the window in epoch seconds
    /// end_time: End of the window in epoch seconds
    pub fn from_epoch(start_time: i64, end_time: i64, offset: time::UtcOffset) -> Result<TimeWindow, ReportError> {
        let start = epoch_to_offset_date_time(start_time, offset)?;
        let end = epoch_to_offset_date_time(end_time, offset)?;
        return Ok(TimeWindow { start, end });
    }

    /// The UTC offset the window bounds are expressed in
    pub fn offset(&self) -> time::UtcOffset {
        self.start.offset()
    }

    /// Checks if a local (naive) timestamp lies inside the window, bounds included.
    /// The timestamp is interpreted in the window's offset.
    pub fn contains(&self, local_time: time::PrimitiveDateTime) -> bool {
        let localized = local_time.assume_offset(self.offset());
        return localized >= self.start && localized <= self.end;
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Start time: {}, End time: {}", self.start, self.end)
    }
}


// Field deserializers
//----------------------------------------------------
/// Reads a numeric cell, anything that does not parse becomes NaN
fn deserialize_f64_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(s.trim().parse::<f64>().unwrap_or(f64::NAN))
}

/// Reads a boolean-like cell (true/false, 1/0, yes/no in any case). Anything else is false.
fn deserialize_bool_like<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(parse_bool_like(&s))
}

/// Interprets a boolean-like string
pub fn parse_bool_like(value: &str) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" | "1.0" => true,
        _ => false,
    }
}


// Set up tests here
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_like_values() {
        assert!(parse_bool_like("True"));
        assert!(parse_bool_like(" TRUE "));
        assert!(parse_bool_like("1"));
        assert!(parse_bool_like("1.0"));
        assert!(!parse_bool_like("False"));
        assert!(!parse_bool_like("0"));
        assert!(!parse_bool_like(""));
        assert!(!parse_bool_like("maybe"));
    }

    #[test]
    fn trip_date_time_is_parsed_on_demand() {
        let trip = TripRecord::new("V1", "Acme", "20180301001111");
        let expected = parse_compact_timestamp("20180301001111").unwrap();
        assert_eq!(trip.local_date_time().unwrap(), Some(expected));

        assert_eq!(TripRecord::new("V1", "Acme", " ").local_date_time().unwrap(), None);

        let malformed = TripRecord::new("V1", "Acme", "2018-03-01");
        assert!(matches!(malformed.local_date_time(), Err(ReportError::InvalidTimestamp(_))));
    }

    #[test]
    fn trail_point_position_is_lon_lat() {
        let point = TrailPoint::new(12.9, 77.6, 40.0, false, "KA01AB1234", 0);
        let position = point.position();
        assert_eq!(position.x(), 77.6);
        assert_eq!(position.y(), 12.9);
    }

    #[test]
    fn time_window_is_inclusive_and_localized() {
        // 2018-03-01 00:11:11 to 01:12:12 at +05:30
        let window = TimeWindow::from_epoch(1519843271, 1519846932, IST_OFFSET).unwrap();
        assert_eq!(window.offset(), IST_OFFSET);

        let start = parse_compact_timestamp("20180301001111").unwrap();
        let end = parse_compact_timestamp("20180301011212").unwrap();
        let inside = parse_compact_timestamp("20180301003000").unwrap();
        let before = parse_compact_timestamp("20180301001110").unwrap();
        let after = parse_compact_timestamp("20180301011213").unwrap();

        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(window.contains(inside));
        assert!(!window.contains(before));
        assert!(!window.contains(after));
    }

    #[test]
    fn time_window_rejects_out_of_range_epoch() {
        let result = TimeWindow::from_epoch(i64::MAX, i64::MAX, IST_OFFSET);
        assert!(matches!(result, Err(ReportError::InvalidEpoch(_))));
    }
}
