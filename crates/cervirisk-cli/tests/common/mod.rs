#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use cervirisk_cli::training::input::{Profile, TrainConfig};

pub const COLUMNS: &[&str] = &[
    "Age",
    "Number of sexual partners",
    "First sexual intercourse",
    "Num of pregnancies",
    "Smokes",
    "Smokes (years)",
    "Smokes (packs/year)",
    "Hormonal Contraceptives",
    "Hormonal Contraceptives (years)",
    "IUD",
    "IUD (years)",
    "STDs",
    "STDs (number)",
    "STDs:HPV",
    "Dx:CIN",
    "Dx:HPV",
    "Dx",
    "Hinselmann",
    "Schiller",
    "Citology",
    "Biopsy",
    "Dx:Cancer",
];

pub const N_ROWS: usize = 160;

pub fn is_positive(r: usize) -> bool {
    r % 8 == 3
}

/// Deterministic survey-shaped CSV: 160 rows, 20 positives, `?` markers in
/// a few columns. Positives are older, have more partners and a prior HPV
/// diagnosis.
pub fn survey_csv() -> String {
    let mut out = COLUMNS
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    for r in 0..N_ROWS {
        let pos = is_positive(r);
        let p = u8::from(pos);
        let age = if pos { 40 + (r * 5) % 15 } else { 18 + (r * 7) % 20 };
        let partners = if r % 13 == 0 {
            "?".to_string()
        } else if pos {
            (3 + r % 4).to_string()
        } else {
            (1 + r % 4).to_string()
        };
        let pregnancies = if r % 17 == 0 { "?".to_string() } else { (r % 5).to_string() };
        let smokes = u8::from(pos || r % 5 == 0);
        let (smokes, smoke_years, packs) = if r % 19 == 0 {
            ("?".to_string(), "?".to_string(), "?".to_string())
        } else {
            (
                smokes.to_string(),
                (smokes as usize * (1 + r % 10)).to_string(),
                format!("{:.1}", smokes as f64 * 0.5 * (r % 4) as f64),
            )
        };
        let hc = r % 2;
        let iud = usize::from(r % 9 == 0);
        let stds = usize::from(r % 6 == 0 || (pos && r % 2 == 1));
        let cin = usize::from(r % 23 == 0);

        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            age,
            partners,
            15 + r % 6,
            pregnancies,
            smokes,
            smoke_years,
            packs,
            hc,
            hc * (r % 7),
            iud,
            iud * (1 + r % 3),
            stds,
            stds * (1 + r % 2),
            0,
            cin,
            p,
            p,
            p,
            u8::from(pos || r % 31 == 0),
            p,
            p,
            p
        );
    }
    out
}

pub fn write_survey_csv(dir: &Path) -> PathBuf {
    let path = dir.join("risk_factors_cervical_cancer.csv");
    fs::write(&path, survey_csv()).expect("failed to write survey csv");
    path
}

/// Baseline profile with a small forest and no HTML report.
pub fn quick_config(data: &Path, output_dir: &Path) -> TrainConfig {
    let mut config = TrainConfig::for_profile(Profile::Baseline);
    config.data = data.to_string_lossy().into_owned();
    config.output_dir = output_dir.to_string_lossy().into_owned();
    config.forest.n_estimators = 25;
    config.write_report = false;
    config
}

/// Tuned profile with a grid small enough for tests.
pub fn quick_tuned_config(data: &Path, output_dir: &Path) -> TrainConfig {
    let json = r#"{
        "profile": "tuned",
        "selection_probe_trees": 20,
        "grid_search": {
            "n_estimators": [10, 20],
            "max_depth": [3],
            "min_samples_split": [2, 7],
            "cv_folds": 3
        }
    }"#;
    let mut config = TrainConfig::from_json_str(json, None).expect("valid tuned config");
    config.data = data.to_string_lossy().into_owned();
    config.output_dir = output_dir.to_string_lossy().into_owned();
    config
}
