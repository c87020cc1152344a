/// Everything report related for the vehicle asset reporter: trail aggregation and the reporting run.
/// Date: 2026-10-19

use crate::*;   // To use everything from the crate

/// Totals of one vehicle trail
#[derive(Debug, Clone, PartialEq)]
pub struct TrailAggregate {
    /// First non-empty license plate found in the trail
    pub license_plate_number: String,
    pub total_distance: uom::si::f64::Length,
    /// Sum of the speeds in [km/h]
    pub speed_sum: f64,
    /// Number of points in the trail, including the first one
    pub num_points: usize,
    pub speed_violations: u64,
}

impl TrailAggregate {
    /// Average speed over all points of the trail in [km/h]
    pub fn average_speed(&self) -> f64 {
        if self.num_points == 0 {
            return 0.0;
        }
        return self.speed_sum / self.num_points as f64;
    }
}

/// What happened to one trip of the trip-info table
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TripStatus {
    /// First trip of this vehicle, its trail was aggregated
    Summarised,
    /// The vehicle was already summarised in this run, only its trip counter went up
    Counted,
}

/// What a reporting run ended with
#[derive(Debug)]
pub enum ReportOutcome {
    /// The report was written to `path` with `rows` vehicle rows
    Written { path: PathBuf, rows: usize },
    /// Trips were in range but no vehicle produced a row, nothing was written
    NothingToWrite,
    /// The run stopped, nothing was written
    Aborted(ReportError),
}

/// Per-vehicle state kept while a run is in progress
#[derive(Debug)]
struct PendingSummary {
    aggregate: TrailAggregate,
    transporter_name: String,
    trips_completed: u64,
}

/// State of one reporting run.
/// Vehicles are keyed by the license plate of the first row of their trail (their identifier if that is empty)
/// and kept in first-seen order.
#[derive(Debug)]
pub struct AssetReport<'a> {
    config: &'a ReportConfig,
    pending: IndexMap<String, PendingSummary>,
}


// Functions
//----------------------------------------------------

/// Walks a trail in order and sums distance, speed and over-speed flags.
/// Every point after the first adds the haversine distance from the point before it.
/// NaN distances and speeds count as zero.
/// A single point trail has no distance and no violations, its average speed is the speed of that point.
/// trail: The trail points of one vehicle in file order
pub fn aggregate_trail(trail: &[TrailPoint]) -> TrailAggregate {
    // Init totals
    let mut total_distance: f64 = 0.0;
    let mut speed_sum: f64 = 0.0;
    let mut speed_violations: u64 = 0;
    let mut license_plate_number = String::new();

    // Each leg is 2 consecutive points
    for leg in trail.windows(2) {
        let (previous, current) = (&leg[0], &leg[1]);

        let distance = haversine_distance_km(previous.position(), current.position());
        if !distance.is_nan() {
            total_distance += distance;
        }

        if current.osf {
            speed_violations += 1;
        }

        if !current.spd.is_nan() {
            speed_sum += current.spd;
        }

        if license_plate_number.is_empty() && !current.lic_plate_no.is_empty() {
            license_plate_number = current.lic_plate_no.clone();
        }

        debug!("{} -> {}: {:.3} km, spd {}, osf {}", previous.ordinal, current.ordinal, distance, current.spd, current.osf);
    }

    // No pairs, the only point gives speed and plate
    if let [only_point] = trail {
        if !only_point.spd.is_nan() {
            speed_sum = only_point.spd;
        }
        license_plate_number = only_point.lic_plate_no.clone();
    }

    return TrailAggregate {
        license_plate_number,
        total_distance: uom::si::f64::Length::new::<uom::si::length::kilometer>(total_distance),
        speed_sum,
        num_points: trail.len(),
        speed_violations,
    };
}

impl<'a> AssetReport<'a> {
    /// Starts an empty run
    pub fn new(config: &'a ReportConfig) -> AssetReport<'a> {
        AssetReport {
            config,
            pending: IndexMap::new(),
        }
    }

    /// Number of vehicles summarised so far
    pub fn num_vehicles(&self) -> usize {
        self.pending.len()
    }

    /// Handles one trip of the trip-info table.
    /// A vehicle is aggregated from its first trip only, later trips only bump its trip counter.
    /// Errors are about this vehicle only, the run can go on with the next trip.
    pub fn record_trip(&mut self, trip: &TripRecord) -> Result<TripStatus, ReportError> {
        // Find the trail file
        let trail_file = trail_file_path(&self.config.vehicle_trails_dir, &trip.vehicle_number);
        if !check_csv_exists(&trail_file) {
            return Err(ReportError::TrailFileMissing(trail_file));
        }

        let trail = load_vehicle_trail(&trail_file)?;
        let first_point = match trail.first() {
            Some(point) => point,
            None => return Err(ReportError::TrailEmpty(trail_file)),
        };

        // Vehicles are told apart by the plate of the first row, or by their identifier when that plate is empty
        let vehicle_key = if first_point.lic_plate_no.is_empty() {
            trip.vehicle_number.clone()
        } else {
            first_point.lic_plate_no.clone()
        };

        // Already summarised in this run
        if let Some(pending) = self.pending.get_mut(&vehicle_key) {
            pending.trips_completed += 1;
            return Ok(TripStatus::Counted);
        }

        let mut aggregate = aggregate_trail(&trail);
        if aggregate.license_plate_number.is_empty() {
            aggregate.license_plate_number = first_point.lic_plate_no.clone();
        }
        info!(
            "Total distance for vehicle {}: {:.2} km, total over speeds {}",
            trip.vehicle_number,
            aggregate.total_distance.get::<uom::si::length::kilometer>(),
            aggregate.speed_violations
        );

        self.pending.insert(
            vehicle_key,
            PendingSummary {
                aggregate,
                transporter_name: trip.transporter_name.clone(),
                trips_completed: 1,
            },
        );
        return Ok(TripStatus::Summarised);
    }

    /// Ends the run and builds one summary per vehicle, in the order the vehicles were first seen
    pub fn finish(self) -> Vec<VehicleSummary> {
        self.pending
            .into_values()
            .map(|pending| VehicleSummary {
                average_speed: pending.aggregate.average_speed(),
                license_plate_number: pending.aggregate.license_plate_number,
                distance: pending.aggregate.total_distance,
                trips_completed: pending.trips_completed,
                transporter_name: pending.transporter_name,
                speed_violations: pending.aggregate.speed_violations,
            })
            .collect()
    }
}

/// Loads the trips inside the window and summarises every vehicle that has a usable trail.
/// Vehicles with a missing, empty or unreadable trail are logged and skipped.
/// Fails if the trip-info table cannot be read or has no trip inside the window.
pub fn collect_vehicle_summaries(config: &ReportConfig, time_window: &TimeWindow) -> Result<Vec<VehicleSummary>, ReportError> {
    let trips = load_trip_info(&config.trip_info_file, Some(time_window))?;
    if trips.is_empty() {
        return Err(ReportError::EmptyTimeRange {
            start: time_window.start.unix_timestamp(),
            end: time_window.end.unix_timestamp(),
        });
    }

    // Progress bar only when someone is watching
    let progress_bar = if atty::is(atty::Stream::Stderr) {
        indicatif::ProgressBar::new(trips.len() as u64)
    } else {
        indicatif::ProgressBar::hidden()
    };
    if let Ok(style) = indicatif::ProgressStyle::with_template("{bar:40} {pos}/{len} trips {msg}") {
        progress_bar.set_style(style);
    }

    let mut report = AssetReport::new(config);
    for trip in &trips {
        progress_bar.set_message(trip.vehicle_number.clone());
        match report.record_trip(trip) {
            Ok(TripStatus::Summarised) => {}
            Ok(TripStatus::Counted) => debug!("Vehicle {} already summarised, counted trip", trip.vehicle_number),
            Err(e) => warn!("Skipping vehicle {}: {}", trip.vehicle_number, e),
        }
        progress_bar.inc(1);
    }
    progress_bar.finish_and_clear();

    return Ok(report.finish());
}

/// Runs a full report for the trips between start_time and end_time (epoch seconds, inclusive)
/// and writes it to config.output_file.
/// Never fails: every problem is logged and returned as a ReportOutcome.
/// # Example:
/// ```no_run
/// use vehicle_asset_reporter::*;
/// let config = ReportConfig::default();
/// let outcome = vehicle_asset_reporter(&config, 1519843271, 1519846932);
/// ```
pub fn vehicle_asset_reporter(config: &ReportConfig, start_time: i64, end_time: i64) -> ReportOutcome {
    let time_window = match TimeWindow::from_epoch(start_time, end_time, config.utc_offset) {
        Ok(window) => window,
        Err(e) => {
            error!("Error in vehicle_asset_reporter: {}", e);
            return ReportOutcome::Aborted(e);
        }
    };

    let summaries = match collect_vehicle_summaries(config, &time_window) {
        Ok(summaries) => summaries,
        Err(e) => {
            error!("Error in vehicle_asset_reporter: {}", e);
            return ReportOutcome::Aborted(e);
        }
    };

    match write_summaries_to_xlsx(&summaries, &config.output_file) {
        Ok(rows) => {
            info!("Wrote {} vehicle rows to {}", rows, config.output_file.display());
            ReportOutcome::Written { path: config.output_file.clone(), rows }
        }
        Err(ReportError::NothingToWrite) => {
            info!("No data to write to the spreadsheet.");
            ReportOutcome::NothingToWrite
        }
        Err(e) => {
            error!("Error in vehicle_asset_reporter: {}", e);
            ReportOutcome::Aborted(e)
        }
    }
}
