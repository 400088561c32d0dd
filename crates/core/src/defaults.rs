//! Built-in baselines.
//!
//! [`baseline`] is an illustrative six-method configuration with round
//! numbers in plausible ranges. It is not a calibrated estimate of any
//! population; real studies load their own [`ModelConfig`].

use indexmap::IndexMap;

use crate::bands::{AgeBand, AgeBands};
use crate::config::ModelConfig;
use crate::matrix::SwitchingMatrix;
use crate::methods::Methods;

/// `(name, efficacy, annual initiation, annual discontinuation)` per method.
const METHODS: [(&str, f64, f64, f64); 5] = [
    ("Pill", 0.945, 0.030, 0.24),
    ("Injectables", 0.983, 0.045, 0.30),
    ("Condoms", 0.946, 0.020, 0.35),
    ("Implants", 0.994, 0.015, 0.10),
    ("IUDs", 0.986, 0.008, 0.08),
];

/// `(label, min age, max age, uptake multiplier, share not using)` per band.
const BANDS: [(&str, u32, u32, f64, f64); 5] = [
    ("<18", 15, 17, 0.4, 0.97),
    ("18-20", 18, 20, 0.8, 0.93),
    ("21-25", 21, 25, 1.0, 0.90),
    ("26-35", 26, 35, 1.1, 0.88),
    (">35", 36, 49, 0.7, 0.92),
];

/// How the using share of the initial mix splits across methods.
const MIX_SPLIT: [f64; 5] = [0.30, 0.35, 0.12, 0.13, 0.10];

/// Annual probability of switching sideways (to injectables, or from
/// injectables to implants).
const SIDEWAYS: f64 = 0.02;

/// Illustrative baseline over 1990 to 2030.
pub fn baseline() -> ModelConfig {
    let mut methods = Methods::new();
    for (name, efficacy, _, _) in METHODS {
        methods.add(name, efficacy).unwrap();
    }

    let bands = AgeBands::new(
        BANDS
            .iter()
            .map(|(label, min, max, _, _)| AgeBand::new(*label, *min, *max))
            .collect(),
    )
    .unwrap();

    let mut matrices = IndexMap::new();
    let mut initial_mix = IndexMap::new();
    for (label, _, _, uptake, none_share) in BANDS {
        matrices.insert(label.to_string(), band_matrix(uptake));
        initial_mix.insert(label.to_string(), band_mix(none_share));
    }

    ModelConfig {
        name: "illustrative".into(),
        start_year: 1990,
        end_year: 2030,
        seed: 1,
        methods,
        bands,
        matrices,
        initial_mix,
    }
}

fn band_matrix(uptake: f64) -> SwitchingMatrix {
    let n = METHODS.len() + 1;
    let mut rows = Vec::with_capacity(n);

    let mut none_row = vec![0.0; n];
    for (i, (_, _, initiation, _)) in METHODS.iter().enumerate() {
        none_row[i + 1] = initiation * uptake;
    }
    none_row[0] = 1.0 - none_row.iter().sum::<f64>();
    rows.push(none_row);

    for (i, (name, _, _, discontinuation)) in METHODS.iter().enumerate() {
        let mut row = vec![0.0; n];
        row[0] = *discontinuation;
        let sideways_to = if *name == "Injectables" {
            // Injectables switch up to implants instead of to themselves.
            METHODS
                .iter()
                .position(|(n, _, _, _)| *n == "Implants")
                .map_or(i + 1, |p| p + 1)
        } else {
            2 // Injectables column
        };
        row[sideways_to] = SIDEWAYS;
        row[i + 1] = 1.0 - row.iter().sum::<f64>();
        rows.push(row);
    }

    SwitchingMatrix::from_rows(rows).unwrap()
}

fn band_mix(none_share: f64) -> Vec<f64> {
    let using = 1.0 - none_share;
    let mut mix = Vec::with_capacity(METHODS.len() + 1);
    mix.push(none_share);
    mix.extend(MIX_SPLIT.iter().map(|s| s * using));
    mix
}

/// Small three-method configuration shared by the test suites.
pub fn tiny() -> ModelConfig {
    let mut methods = Methods::new();
    for (name, efficacy) in [("Pill", 0.945), ("Injectables", 0.983)] {
        methods.add(name, efficacy).unwrap();
    }

    let bands = AgeBands::new(vec![
        AgeBand::new("15-24", 15, 24),
        AgeBand::new("25-49", 25, 49),
    ])
    .unwrap();

    let rows = |rows: [[f64; 3]; 3]| {
        SwitchingMatrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    };
    let mut matrices = IndexMap::new();
    matrices.insert(
        "15-24".to_string(),
        rows([[0.90, 0.05, 0.05], [0.20, 0.75, 0.05], [0.25, 0.05, 0.70]]),
    );
    matrices.insert(
        "25-49".to_string(),
        rows([[0.88, 0.06, 0.06], [0.18, 0.77, 0.05], [0.22, 0.05, 0.73]]),
    );

    let mut initial_mix = IndexMap::new();
    initial_mix.insert("15-24".to_string(), vec![0.90, 0.05, 0.05]);
    initial_mix.insert("25-49".to_string(), vec![0.85, 0.09, 0.06]);

    ModelConfig {
        name: "tiny".into(),
        start_year: 2000,
        end_year: 2010,
        seed: 7,
        methods,
        bands,
        matrices,
        initial_mix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_validates() {
        let config = baseline();
        config.validate().unwrap();
        assert_eq!(config.methods.len(), 6);
        assert_eq!(config.bands.len(), 5);
        let labels: Vec<_> = config.bands.labels().collect();
        assert_eq!(labels, vec!["<18", "18-20", "21-25", "26-35", ">35"]);
    }

    #[test]
    fn tiny_validates() {
        tiny().validate().unwrap();
    }

    #[test]
    fn younger_bands_take_up_less() {
        let config = baseline();
        let none = config.methods.none();
        let pill = crate::methods::MethodName::from("Pill");
        let young = config.transition("<18", &none, &pill).unwrap();
        let mid = config.transition("21-25", &none, &pill).unwrap();
        assert!(young < mid);
    }
}
