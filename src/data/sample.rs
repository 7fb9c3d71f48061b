//! Synthetic sweeps for demos, benchmarks and tests.
//!
//! Both generators take a seed and use `StdRng`, so the same seed always gives
//! the same table.

use crate::error::{AnalysisError, AppResult};
use crate::measurement_types::{ColumnSchema, Record, Table};
use crate::validation::is_in_range;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// Node ids of the standard engine-mount and swing-arm bracket layout.
pub const STANDARD_NODES: [u64; 12] = [
    8000001, 8000002, 8000003, 8000004, 8000005, 8000006, 8000007, 8000008, 8000013, 8000014,
    8000015, 8000016,
];

/// A generated table together with its column schema.
#[derive(Debug, Clone)]
pub struct SampleData {
    /// Generated records.
    pub table: Table,
    /// Channel names in column order.
    pub columns: ColumnSchema,
    /// Label to pass on as the source identifier.
    pub source_label: &'static str,
}

/// Damped single-degree-of-freedom response parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SdofParams {
    /// Resonance frequency.
    pub natural_frequency_hz: f64,
    /// Peak response scale.
    pub amplitude: f64,
    /// Damping ratio, between 0 and 1.
    pub damping_ratio: f64,
    /// Relative noise amplitude (fraction of the base response).
    pub noise_level: f64,
}

impl Default for SdofParams {
    fn default() -> Self {
        Self {
            natural_frequency_hz: 50.0,
            amplitude: 1.0,
            damping_ratio: 0.05,
            noise_level: 0.1,
        }
    }
}

/// 0..=300 Hz in 1 Hz steps for every [`STANDARD_NODES`] entry, with
/// lowercase-tagged columns `Node_<id>_tm_{x,y,z}_file_1`.
pub fn mount_sweep(seed: u64) -> AppResult<SampleData> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut names = Vec::with_capacity(STANDARD_NODES.len() * 3);
    for node in STANDARD_NODES {
        for axis in ['x', 'y', 'z'] {
            names.push(format!("Node_{node}_tm_{axis}_file_1"));
        }
    }

    let mut records = Vec::with_capacity(301);
    for step in 0..=300u32 {
        let freq = f64::from(step);
        let mut record = Record::new(freq);
        // one x/y/z triple per node
        for chunk in names.chunks(3) {
            let amplitude =
                (freq * 0.1).sin() * (-freq * 0.01).exp() + rng.gen::<f64>() * 0.1;
            record.insert(chunk[0].clone(), amplitude * 0.8);
            record.insert(chunk[1].clone(), amplitude * 0.6);
            record.insert(chunk[2].clone(), amplitude * 0.4);
        }
        records.push(record);
    }

    Ok(SampleData {
        table: Table::new(records),
        columns: ColumnSchema::new(names)?,
        source_label: "sample_data.csv",
    })
}

/// 400 points over 0–200 Hz of a damped resonance for `Node_1` and `Node_2`,
/// with a secondary resonance near 120 Hz on the Y axis.
pub fn sdof_sweep(params: &SdofParams, seed: u64) -> AppResult<SampleData> {
    if !(params.natural_frequency_hz.is_finite() && params.natural_frequency_hz > 0.0) {
        return Err(AnalysisError::Configuration(
            "natural frequency must be positive and finite".into(),
        ));
    }
    is_in_range(params.damping_ratio, 0.0..=1.0)
        .map_err(|e| AnalysisError::Configuration(format!("damping ratio: {e}")))?;

    const POINTS: usize = 400;
    const MAX_HZ: f64 = 200.0;

    let mut rng = StdRng::seed_from_u64(seed);
    let omega_n = 2.0 * PI * params.natural_frequency_hz;
    let zeta = params.damping_ratio;
    let amp = params.amplitude;

    let mut records = Vec::with_capacity(POINTS);
    for i in 0..POINTS {
        let freq = i as f64 / (POINTS - 1) as f64 * MAX_HZ;
        let ratio = 2.0 * PI * freq / omega_n;
        let denominator = ((1.0 - ratio * ratio).powi(2) + (2.0 * zeta * ratio).powi(2)).sqrt();
        let base = amp / denominator;

        let noise = (rng.gen::<f64>() - 0.5) * params.noise_level * base;
        let second = if freq > 80.0 {
            0.3 * amp / (1.0 + ((freq - 120.0) / 10.0).powi(2))
        } else {
            0.0
        };

        let x = base + noise;
        let y = base * 0.7 + noise * 0.8 + second;
        let z = base * 0.5 + noise * 0.6;

        let mut jitter = || (rng.gen::<f64>() - 0.5) * 0.1;
        records.push(
            Record::new(freq)
                .with_channel("Node_1_X", x)
                .with_channel("Node_1_Y", y)
                .with_channel("Node_1_Z", z)
                .with_channel("Node_2_X", x * 0.8 + jitter())
                .with_channel("Node_2_Y", y * 0.9 + jitter())
                .with_channel("Node_2_Z", z * 0.7 + jitter()),
        );
    }

    let columns = ["Node_1_X", "Node_1_Y", "Node_1_Z", "Node_2_X", "Node_2_Y", "Node_2_Z"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    Ok(SampleData {
        table: Table::new(records),
        columns: ColumnSchema::new(columns)?,
        source_label: "simulated_vibration_data.csv",
    })
}
