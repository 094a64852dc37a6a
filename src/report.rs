//! Result page rendering and saved reports.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::predictor::Prediction;

const BAR_WIDTH: usize = 30;

/// How alarming a category is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Healthy,
    Warning,
    Danger,
}

impl Tier {
    pub fn marker(self) -> &'static str {
        match self {
            Tier::Healthy => "[ok]",
            Tier::Warning => "[!]",
            Tier::Danger => "[!!]",
        }
    }
}

/// Obesity categories in class-index order (sorted dataset labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    InsufficientWeight,
    NormalWeight,
    ObesityTypeI,
    ObesityTypeII,
    ObesityTypeIII,
    OverweightLevelI,
    OverweightLevelII,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::InsufficientWeight,
        Category::NormalWeight,
        Category::ObesityTypeI,
        Category::ObesityTypeII,
        Category::ObesityTypeIII,
        Category::OverweightLevelI,
        Category::OverweightLevelII,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.dataset_label() == label)
    }

    pub fn dataset_label(self) -> &'static str {
        match self {
            Category::InsufficientWeight => "Insufficient_Weight",
            Category::NormalWeight => "Normal_Weight",
            Category::ObesityTypeI => "Obesity_Type_I",
            Category::ObesityTypeII => "Obesity_Type_II",
            Category::ObesityTypeIII => "Obesity_Type_III",
            Category::OverweightLevelI => "Overweight_Level_I",
            Category::OverweightLevelII => "Overweight_Level_II",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::InsufficientWeight => "Insufficient Weight",
            Category::NormalWeight => "Normal Weight",
            Category::ObesityTypeI => "Obesity Type I",
            Category::ObesityTypeII => "Obesity Type II",
            Category::ObesityTypeIII => "Obesity Type III",
            Category::OverweightLevelI => "Overweight Level I",
            Category::OverweightLevelII => "Overweight Level II",
        }
    }

    pub fn tier(self) -> Tier {
        match self {
            Category::InsufficientWeight | Category::NormalWeight => Tier::Healthy,
            Category::OverweightLevelI | Category::OverweightLevelII => Tier::Warning,
            Category::ObesityTypeI | Category::ObesityTypeII | Category::ObesityTypeIII => {
                Tier::Danger
            }
        }
    }
}

/// Resolves a class by its dataset label, falling back to the fixed index
/// order for models trained on unnamed classes.
pub fn resolve(class_name: &str, class_index: usize) -> Option<Category> {
    Category::from_label(class_name).or_else(|| {
        if class_name.is_empty() {
            Category::from_index(class_index)
        } else {
            None
        }
    })
}

fn display_name(class_name: &str, class_index: usize) -> String {
    match resolve(class_name, class_index) {
        Some(category) => category.label().to_string(),
        None if !class_name.is_empty() => class_name.replace('_', " "),
        None => "Unknown".to_string(),
    }
}

fn bar(probability: f64) -> String {
    let filled = (probability.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

/// Text for the result page: BMI, status, confidence and a probability chart.
pub fn render(prediction: &Prediction, classes: &[String]) -> String {
    let category = resolve(&prediction.class_name, prediction.class_index);
    let tier = category.map_or(Tier::Danger, Category::tier);
    let status = category.map_or("Unknown", Category::label);

    let mut out = String::new();
    let _ = writeln!(out, "ANALYSIS RESULT");
    let _ = writeln!(out, "===============");
    let _ = writeln!(out, "Body mass index (BMI): {:.2}", prediction.bmi);
    let _ = writeln!(out, "Status: {} {}", tier.marker(), status);
    let _ = writeln!(out, "Model confidence: {:.2}%", prediction.confidence);
    let _ = writeln!(out, "---");
    let _ = writeln!(out, "Probability per class:");

    let names: Vec<String> = prediction
        .probabilities
        .iter()
        .enumerate()
        .map(|(i, _)| display_name(classes.get(i).map_or("", String::as_str), i))
        .collect();
    let width = names.iter().map(String::len).max().unwrap_or(0);

    for (name, p) in names.iter().zip(&prediction.probabilities) {
        let _ = writeln!(out, "  {name:<width$} |{}| {:>6.2}%", bar(*p), p * 100.0);
    }
    out
}

/// Writes the rendered result under `<dir>/<date>/obesity_check_<time>.txt`.
pub fn save_report(dir: &Path, results: &str, profile: &str) -> Result<PathBuf> {
    let now = chrono::Utc::now();
    let date_dir = dir.join(now.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&date_dir)?;

    let filename = date_dir.join(format!("obesity_check_{}.txt", now.format("%H-%M-%S")));
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&filename)?;

    writeln!(file, "==========================================")?;
    writeln!(file, "OBESITY CHECK RESULTS")?;
    writeln!(file, "Generated: {}", now.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(file, "==========================================")?;
    writeln!(file)?;
    writeln!(file, "USER PROFILE:")?;
    writeln!(file, "{profile}")?;
    writeln!(file)?;
    writeln!(file, "{results}")?;
    writeln!(file, "==========================================")?;

    Ok(filename)
}
