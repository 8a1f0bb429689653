//! End-to-end validation of the wind-yield pipeline
//!
//! Synthetic reanalysis samples with a known climate are pushed through every
//! stage: grid sorting, bilinear interpolation, power-law extrapolation,
//! Weibull fitting and AEP integration.
//!
//! Run tests with: cargo test --test `yield_pipeline`

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;
use wind_yield_core::{
    read_power_curve, read_wind_samples, AepIntegrator, Corner, DirectionConvention, GridCell,
    PowerCurve, SpatialInterpolator, SpeedHistogram, TurbineModel, TurbineSpec,
    VerticalExtrapolator, WeibullFitter, WeibullParams, WindComponents, WindRose, WindSample,
    YieldError, HOURS_PER_YEAR,
};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const LAT_LOW: f64 = 55.5;
const LON_LOW: f64 = 7.75;
const SHEAR: f64 = 0.14;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2015, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Four-corner climate: Weibull(2, 8) speeds at 100 m scaled per corner, a
/// uniform shear exponent and random directions. Rows are emitted newest
/// first to exercise the sorter.
fn synthetic_samples(hours: usize, seed: u64) -> Vec<WindSample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let climate = WeibullParams::new(2.0, 8.0).unwrap();
    let base = climate.sample(&mut rng, hours);
    let ratio_10m = (10.0_f64 / 100.0).powf(SHEAR);

    let mut samples = Vec::with_capacity(4 * hours);
    for (i, corner) in Corner::ALL.iter().enumerate() {
        let factor = 1.0 + 0.02 * i as f64;
        let lat = LAT_LOW + if corner.is_high_lat() { 0.25 } else { 0.0 };
        let lon = LON_LOW + if corner.is_high_lon() { 0.25 } else { 0.0 };
        for hour in (0..hours).rev() {
            let speed_100m = base[hour] * factor;
            let direction: f64 = rng.random_range(0.0..360.0);
            samples.push(WindSample {
                timestamp: start() + Duration::hours(hour as i64),
                latitude: lat,
                longitude: lon,
                at_10m: WindComponents::from_speed_direction(
                    speed_100m * ratio_10m,
                    direction,
                    DirectionConvention::From,
                ),
                at_100m: WindComponents::from_speed_direction(
                    speed_100m,
                    direction,
                    DirectionConvention::From,
                ),
            });
        }
    }
    samples
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEST 1: Full pipeline on a synthetic climate
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_pipeline_recovers_climate_and_energy() {
    let samples = synthetic_samples(4000, 2024);
    let cell = GridCell::from_samples(&samples, DirectionConvention::From).unwrap();
    assert_eq!(cell.lat_low(), LAT_LOW);
    assert_eq!(cell.lon_low(), LON_LOW);
    assert!(cell
        .corner(Corner::HighLatHighLon)
        .timestamps
        .windows(2)
        .all(|w| w[0] < w[1]));

    // Cell center: equal weights, mean corner factor 1.03
    let site = SpatialInterpolator::default()
        .interpolate(&cell, LAT_LOW + 0.125, LON_LOW + 0.125)
        .unwrap();
    assert_eq!(site.len(), 4000);

    let hub = VerticalExtrapolator::default().extrapolate(&site, 100.0).unwrap();
    for alpha in &hub.shear_exponent {
        assert_relative_eq!(*alpha, SHEAR, epsilon = 1e-9);
    }

    let params = WeibullFitter::default().fit(&hub.speed).unwrap();
    assert!((params.shape - 2.0).abs() < 0.15, "shape {}", params.shape);
    assert!(
        (params.scale - 8.0 * 1.03).abs() < 0.4,
        "scale {}",
        params.scale
    );

    let turbine = TurbineModel::analytical(TurbineSpec::nrel_5mw());
    let aep = AepIntegrator::default()
        .compute_nameplate(&turbine, &params, 0.97)
        .unwrap();
    let cf = aep.capacity_factor();
    assert!(cf > 0.2 && cf < 0.7, "capacity factor {cf}");
    assert!(aep.energy_kwh < turbine.spec().annual_rated_energy());
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEST 2: Hub height raises energy monotonically
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_energy_grows_with_hub_height() {
    let samples = synthetic_samples(2000, 7);
    let cell = GridCell::from_samples(&samples, DirectionConvention::From).unwrap();
    let site = SpatialInterpolator::default()
        .interpolate(&cell, LAT_LOW + 0.05, LON_LOW + 0.2)
        .unwrap();
    let turbine = TurbineModel::analytical(TurbineSpec::nrel_5mw());

    let energies: Vec<f64> = [60.0, 90.0, 120.0, 150.0]
        .iter()
        .map(|&height| {
            let series = VerticalExtrapolator::default()
                .extrapolate(&site, height)
                .unwrap();
            let params = WeibullFitter::default().fit(&series.speed).unwrap();
            AepIntegrator::default()
                .compute_nameplate(&turbine, &params, 1.0)
                .unwrap()
                .energy_kwh
        })
        .collect();

    assert!(energies.windows(2).all(|w| w[0] < w[1]), "{energies:?}");
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEST 3: Tabulated and analytical turbines agree
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_tabulated_curve_matches_analytical() {
    let spec = TurbineSpec::nrel_5mw();
    let analytical = TurbineModel::analytical(spec.clone());

    let mut speeds: Vec<f64> = (3..=25).map(f64::from).collect();
    speeds.push(*spec.v_rated());
    speeds.sort_by(f64::total_cmp);
    let curve = PowerCurve::new(speeds.iter().map(|&v| (v, analytical.power(v)))).unwrap();
    let tabulated = TurbineModel::interpolated(spec, curve);

    let params = WeibullParams::new(2.1, 8.5).unwrap();
    let integrator = AepIntegrator::default();
    let exact = integrator.compute_nameplate(&analytical, &params, 1.0).unwrap();
    let table = integrator.compute_nameplate(&tabulated, &params, 1.0).unwrap();

    // Chords of a convex cubic lie above it
    assert!(table.energy_kwh >= exact.energy_kwh);
    assert_relative_eq!(table.energy_kwh, exact.energy_kwh, max_relative = 0.03);
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEST 4: Quadrature accuracy against a closed form
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_constant_power_against_cdf() {
    let spec = TurbineSpec::nrel_5mw();
    let rated = *spec.rated_power();
    let flat = PowerCurve::new([(0.0, rated), (40.0, rated)]).unwrap();
    let turbine = TurbineModel::interpolated(spec, flat);

    for &(shape, scale) in &[(1.5, 6.0), (2.0, 8.0), (3.2, 11.0)] {
        let params = WeibullParams::new(shape, scale).unwrap();
        let aep = AepIntegrator::default()
            .compute(&turbine, &params, 3.0, 25.0, 1.0)
            .unwrap();
        let expected = rated * HOURS_PER_YEAR * (params.cdf(25.0) - params.cdf(3.0));
        assert_relative_eq!(aep.energy_kwh, expected, max_relative = 1e-4);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEST 5: CSV inputs through the pipeline
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_csv_inputs_reach_the_site() {
    let samples = synthetic_samples(48, 99);
    let mut text = String::from("time,latitude,longitude,u10,v10,u100,v100\n");
    for s in &samples {
        text.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            s.timestamp.format("%Y-%m-%d %H:%M:%S"),
            s.latitude,
            s.longitude,
            s.at_10m.u,
            s.at_10m.v,
            s.at_100m.u,
            s.at_100m.v
        ));
    }

    let parsed = read_wind_samples(text.as_bytes()).unwrap();
    assert_eq!(parsed, samples);

    let cell = GridCell::from_samples(&parsed, DirectionConvention::From).unwrap();
    // A site on the north-east corner reproduces that corner exactly
    let site = SpatialInterpolator::default()
        .interpolate(&cell, LAT_LOW + 0.25, LON_LOW + 0.25)
        .unwrap();
    let corner = cell.corner(Corner::HighLatHighLon);
    assert_eq!(site.speed_100m, corner.speed_100m);
    assert_eq!(site.direction_10m, corner.direction_10m);

    let curve = read_power_curve("speed,power\n3,0\n12,5000\n25,5000\n".as_bytes()).unwrap();
    assert_eq!(curve.power(7.5), 2500.0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEST 6: Failures carry stage context
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_missing_corner_and_calm_row_are_reported() {
    let mut samples = synthetic_samples(10, 5);
    samples.retain(|s| !(s.latitude > LAT_LOW && s.longitude > LON_LOW));
    let err = GridCell::from_samples(&samples, DirectionConvention::From).unwrap_err();
    assert_eq!(err.stage(), "input validation");

    let mut samples = synthetic_samples(10, 5);
    for s in samples.iter_mut().filter(|s| s.timestamp == start()) {
        s.at_10m = WindComponents::new(0.0, 0.0);
    }
    let cell = GridCell::from_samples(&samples, DirectionConvention::From).unwrap();
    let site = SpatialInterpolator::default()
        .interpolate(&cell, LAT_LOW + 0.1, LON_LOW + 0.1)
        .unwrap();
    let err = VerticalExtrapolator::default()
        .extrapolate(&site, 90.0)
        .unwrap_err();
    assert!(matches!(err, YieldError::ExtrapolationUndefined { row: 0, .. }));
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEST 7: Presentation tables
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_histogram_and_rose_from_hub_series() {
    let samples = synthetic_samples(3000, 11);
    let cell = GridCell::from_samples(&samples, DirectionConvention::From).unwrap();
    let site = SpatialInterpolator::default()
        .interpolate(&cell, LAT_LOW + 0.2, LON_LOW + 0.1)
        .unwrap();
    let hub = VerticalExtrapolator::default().extrapolate(&site, 120.0).unwrap();
    let params = WeibullFitter::default().fit(&hub.speed).unwrap();

    let hist = SpeedHistogram::new(&hub.speed, 30, &params).unwrap();
    let area: f64 = hist.density.iter().map(|d| d * hist.bin_width()).sum();
    assert_relative_eq!(area, 1.0, epsilon = 1e-9);

    let rose = WindRose::default().tabulate(&hub.speed, &hub.direction).unwrap();
    assert_eq!(rose.samples, 3000);
    let total: f64 = rose.sector_totals().iter().sum();
    assert_relative_eq!(total, 1.0, epsilon = 1e-9);
}
