//! Training data loading.
//!
//! The dataset is the raw obesity-levels CSV: one row per person with the
//! sixteen answer columns and an `NObeyesdad` label column. Columns are looked
//! up by header name so extra columns are ignored.

use std::collections::HashMap;
use std::path::Path;

use ndarray::Array2;
use tracing::{debug, info};

use crate::encoder::{Answers, Choice, FeatureSchema, Frequency, Gender, Transport, YesNo};
use crate::error::{AppError, Result};

pub const LABEL_COLUMN: &str = "NObeyesdad";

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub answers: Answers,
    pub label: String,
}

/// Encoded training matrix plus class labels sorted alphabetically.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub features: Array2<f64>,
    pub labels: Vec<usize>,
    pub classes: Vec<String>,
}

/// Splits one CSV line, honouring double-quoted fields.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields.into_iter().map(|f| f.trim().to_string()).collect()
}

struct Columns(HashMap<String, usize>);

impl Columns {
    fn get<'a>(&self, fields: &'a [String], name: &str, line: usize) -> Result<&'a str> {
        let idx = *self.0.get(name).ok_or_else(|| AppError::Csv {
            line: 1,
            message: format!("missing column '{name}'"),
        })?;
        fields.get(idx).map(String::as_str).ok_or_else(|| AppError::Csv {
            line,
            message: format!("row has no value for '{name}'"),
        })
    }

    fn number(&self, fields: &[String], name: &str, line: usize) -> Result<f64> {
        let raw = self.get(fields, name, line)?;
        raw.parse::<f64>().map_err(|_| AppError::Csv {
            line,
            message: format!("'{raw}' is not a number in column '{name}'"),
        })
    }

    fn choice<C: Choice>(&self, fields: &[String], name: &str, line: usize) -> Result<C> {
        let raw = self.get(fields, name, line)?;
        C::from_raw(raw).ok_or_else(|| AppError::Csv {
            line,
            message: format!("unknown value '{raw}' in column '{name}'"),
        })
    }
}

pub fn parse_csv(content: &str) -> Result<Vec<Record>> {
    let mut lines = content.lines().enumerate();
    let header = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => continue,
            Some((_, line)) => break line,
            None => return Err(AppError::EmptyDataset),
        }
    };

    let columns = Columns(
        split_line(header.trim_start_matches('\u{feff}'))
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect(),
    );

    let mut records = Vec::new();
    for (i, line) in lines {
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_line(line);

        let answers = Answers {
            gender: columns.choice::<Gender>(&fields, "Gender", line_no)?,
            age: columns.number(&fields, "Age", line_no)?,
            height: columns.number(&fields, "Height", line_no)?,
            weight: columns.number(&fields, "Weight", line_no)?,
            family_history: columns.choice::<YesNo>(
                &fields,
                "family_history_with_overweight",
                line_no,
            )?,
            high_calorie_food: columns.choice::<YesNo>(&fields, "FAVC", line_no)?,
            vegetables: columns.number(&fields, "FCVC", line_no)?,
            main_meals: columns.number(&fields, "NCP", line_no)?,
            snacking: columns.choice::<Frequency>(&fields, "CAEC", line_no)?,
            smokes: columns.choice::<YesNo>(&fields, "SMOKE", line_no)?,
            water: columns.number(&fields, "CH2O", line_no)?,
            monitors_calories: columns.choice::<YesNo>(&fields, "SCC", line_no)?,
            physical_activity: columns.number(&fields, "FAF", line_no)?,
            screen_time: columns.number(&fields, "TUE", line_no)?,
            alcohol: columns.choice::<Frequency>(&fields, "CALC", line_no)?,
            transport: columns.choice::<Transport>(&fields, "MTRANS", line_no)?,
        };
        let label = columns.get(&fields, LABEL_COLUMN, line_no)?.to_string();

        records.push(Record { answers, label });
    }

    if records.is_empty() {
        return Err(AppError::EmptyDataset);
    }
    debug!(rows = records.len(), "parsed dataset");
    Ok(records)
}

pub fn load_csv(path: &Path) -> Result<Vec<Record>> {
    if !path.exists() {
        return Err(AppError::MissingAsset(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let records = parse_csv(&content)?;
    info!(path = %path.display(), rows = records.len(), "loaded training data");
    Ok(records)
}

/// Encodes records into a feature matrix. Class indices follow the sorted
/// order of the distinct label strings.
pub fn encode(records: &[Record], schema: FeatureSchema) -> Result<TrainingSet> {
    if records.is_empty() {
        return Err(AppError::EmptyDataset);
    }

    let mut classes: Vec<String> = records.iter().map(|r| r.label.clone()).collect();
    classes.sort();
    classes.dedup();

    let width = schema.width();
    let mut features = Array2::<f64>::zeros((records.len(), width));
    let mut labels = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate() {
        let row = schema.encode(&record.answers).map_err(|e| AppError::Csv {
            line: i + 2,
            message: e.to_string(),
        })?;
        for (j, value) in row.into_iter().enumerate() {
            features[[i, j]] = value;
        }
        let class = classes
            .binary_search(&record.label)
            .map_err(|_| AppError::Csv {
                line: i + 2,
                message: format!("label '{}' missing from the class list", record.label),
            })?;
        labels.push(class);
    }

    Ok(TrainingSet {
        features,
        labels,
        classes,
    })
}
