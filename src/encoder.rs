//! Categorical lookup tables, BMI and feature-row assembly.
//!
//! Two row layouts exist. The full layout feeds the single-page form and
//! matches the raw dataset column order with a trailing BMI column. The
//! compact layout is the reduced eleven-column row used by the wizard.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A single-choice answer with a fixed set of options.
pub trait Choice: Copy + Sized + 'static {
    /// Field name used in error messages.
    const FIELD: &'static str;

    fn options() -> &'static [Self];

    fn label(&self) -> &'static str;

    /// Token used for this option in the raw dataset.
    fn raw(&self) -> &'static str;

    /// Case-insensitive match against either the raw dataset token or the label.
    fn from_raw(value: &str) -> Option<Self> {
        let value = value.trim().trim_matches('"');
        Self::options().iter().copied().find(|option| {
            option.raw().eq_ignore_ascii_case(value) || option.label().eq_ignore_ascii_case(value)
        })
    }

    fn parse(value: &str) -> Result<Self> {
        Self::from_raw(value).ok_or_else(|| AppError::UnknownCategory {
            field: Self::FIELD,
            value: value.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn code(self) -> f64 {
        match self {
            Gender::Female => 0.0,
            Gender::Male => 1.0,
        }
    }
}

impl Choice for Gender {
    const FIELD: &'static str = "Gender";

    fn options() -> &'static [Self] {
        &[Gender::Male, Gender::Female]
    }

    fn label(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }

    fn raw(&self) -> &'static str {
        self.label()
    }
}

/// Yes/no answers encode as 0/1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    No,
    Yes,
}

impl YesNo {
    pub fn code(self) -> f64 {
        match self {
            YesNo::No => 0.0,
            YesNo::Yes => 1.0,
        }
    }
}

impl Choice for YesNo {
    const FIELD: &'static str = "yes/no";

    fn options() -> &'static [Self] {
        &[YesNo::No, YesNo::Yes]
    }

    fn label(&self) -> &'static str {
        match self {
            YesNo::No => "No",
            YesNo::Yes => "Yes",
        }
    }

    fn raw(&self) -> &'static str {
        match self {
            YesNo::No => "no",
            YesNo::Yes => "yes",
        }
    }
}

/// Frequency scale shared by snacking (CAEC) and alcohol (CALC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Always,
    Frequently,
    Sometimes,
    Never,
}

impl Frequency {
    /// Code in the full layout (alphabetical order of the dataset tokens).
    pub fn code(self) -> f64 {
        match self {
            Frequency::Always => 0.0,
            Frequency::Frequently => 1.0,
            Frequency::Sometimes => 2.0,
            Frequency::Never => 3.0,
        }
    }

    /// Code in the compact layout, ascending with frequency.
    pub fn compact_code(self) -> f64 {
        match self {
            Frequency::Never => 0.0,
            Frequency::Sometimes => 1.0,
            Frequency::Frequently => 2.0,
            Frequency::Always => 3.0,
        }
    }

    /// Option order used by the compact form.
    pub const ASCENDING: [Frequency; 4] = [
        Frequency::Never,
        Frequency::Sometimes,
        Frequency::Frequently,
        Frequency::Always,
    ];
}

impl Choice for Frequency {
    const FIELD: &'static str = "frequency";

    fn options() -> &'static [Self] {
        &[
            Frequency::Always,
            Frequency::Frequently,
            Frequency::Sometimes,
            Frequency::Never,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            Frequency::Always => "Always",
            Frequency::Frequently => "Frequently",
            Frequency::Sometimes => "Sometimes",
            Frequency::Never => "Never",
        }
    }

    fn raw(&self) -> &'static str {
        match self {
            Frequency::Always => "Always",
            Frequency::Frequently => "Frequently",
            Frequency::Sometimes => "Sometimes",
            Frequency::Never => "no",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    Automobile,
    Bike,
    Motorbike,
    PublicTransportation,
    Walking,
}

impl Transport {
    pub fn code(self) -> f64 {
        match self {
            Transport::Automobile => 0.0,
            Transport::Bike => 1.0,
            Transport::Motorbike => 2.0,
            Transport::PublicTransportation => 3.0,
            Transport::Walking => 4.0,
        }
    }
}

impl Choice for Transport {
    const FIELD: &'static str = "MTRANS";

    fn options() -> &'static [Self] {
        &[
            Transport::Automobile,
            Transport::Bike,
            Transport::Motorbike,
            Transport::PublicTransportation,
            Transport::Walking,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            Transport::Automobile => "Automobile",
            Transport::Bike => "Bike",
            Transport::Motorbike => "Motorbike",
            Transport::PublicTransportation => "Public transportation",
            Transport::Walking => "Walking",
        }
    }

    fn raw(&self) -> &'static str {
        match self {
            Transport::Automobile => "Automobile",
            Transport::Bike => "Bike",
            Transport::Motorbike => "Motorbike",
            Transport::PublicTransportation => "Public_Transportation",
            Transport::Walking => "Walking",
        }
    }
}

/// One user's form answers. Height is in meters, weight in kilograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answers {
    pub gender: Gender,
    pub age: f64,
    pub height: f64,
    pub weight: f64,
    pub family_history: YesNo,
    pub high_calorie_food: YesNo,
    pub vegetables: f64,
    pub main_meals: f64,
    pub snacking: Frequency,
    pub smokes: YesNo,
    pub water: f64,
    pub monitors_calories: YesNo,
    pub physical_activity: f64,
    pub screen_time: f64,
    pub alcohol: Frequency,
    pub transport: Transport,
}

impl Default for Answers {
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            age: 25.0,
            height: 1.70,
            weight: 70.0,
            family_history: YesNo::No,
            high_calorie_food: YesNo::No,
            vegetables: 2.0,
            main_meals: 3.0,
            snacking: Frequency::Always,
            smokes: YesNo::No,
            water: 2.0,
            monitors_calories: YesNo::No,
            physical_activity: 1.0,
            screen_time: 1.0,
            alcohol: Frequency::Always,
            transport: Transport::Automobile,
        }
    }
}

impl Answers {
    pub fn bmi(&self) -> Result<f64> {
        bmi(self.height, self.weight)
    }

    /// Short description used in saved reports.
    pub fn profile(&self) -> String {
        format!(
            "Gender: {}\nAge: {:.0} years\nHeight: {:.2} m\nWeight: {:.1} kg",
            self.gender.label(),
            self.age,
            self.height,
            self.weight
        )
    }
}

/// Weight in kilograms divided by height in meters squared.
pub fn bmi(height_m: f64, weight_kg: f64) -> Result<f64> {
    if !height_m.is_finite() || height_m <= 0.0 {
        return Err(AppError::InvalidInput {
            field: "Height",
            message: format!("height must be positive, got {height_m}"),
        });
    }
    Ok(weight_kg / (height_m * height_m))
}

const FULL_COLUMNS: [&str; 17] = [
    "Gender",
    "Age",
    "Height",
    "Weight",
    "family_history_with_overweight",
    "FAVC",
    "FCVC",
    "NCP",
    "CAEC",
    "SMOKE",
    "CH2O",
    "SCC",
    "FAF",
    "TUE",
    "CALC",
    "MTRANS",
    "BMI",
];

// Age, Height, Weight, FCVC, NCP, CH2O, FAF, TUE, BMI
const FULL_NUMERIC: [usize; 9] = [1, 2, 3, 6, 7, 10, 12, 13, 16];

const COMPACT_COLUMNS: [&str; 11] = [
    "Gender", "Age", "Height", "Weight", "FAVC", "FCVC", "NCP", "CAEC", "FAF", "TUE", "BMI",
];

/// Column layout of the feature row handed to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSchema {
    Full,
    Compact,
}

impl FeatureSchema {
    pub fn name(self) -> &'static str {
        match self {
            FeatureSchema::Full => "full",
            FeatureSchema::Compact => "compact",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            FeatureSchema::Full => &FULL_COLUMNS,
            FeatureSchema::Compact => &COMPACT_COLUMNS,
        }
    }

    pub fn width(self) -> usize {
        self.columns().len()
    }

    /// Indices of the columns that pass through the scaler.
    pub fn numeric_columns(self) -> &'static [usize] {
        match self {
            FeatureSchema::Full => &FULL_NUMERIC,
            // the compact model is fitted on raw values
            FeatureSchema::Compact => &[],
        }
    }

    pub fn encode(self, answers: &Answers) -> Result<Vec<f64>> {
        let bmi = answers.bmi()?;
        let row = match self {
            FeatureSchema::Full => vec![
                answers.gender.code(),
                answers.age,
                answers.height,
                answers.weight,
                answers.family_history.code(),
                answers.high_calorie_food.code(),
                answers.vegetables,
                answers.main_meals,
                answers.snacking.code(),
                answers.smokes.code(),
                answers.water,
                answers.monitors_calories.code(),
                answers.physical_activity,
                answers.screen_time,
                answers.alcohol.code(),
                answers.transport.code(),
                bmi,
            ],
            FeatureSchema::Compact => vec![
                answers.gender.code(),
                answers.age,
                answers.height,
                answers.weight,
                answers.high_calorie_food.code(),
                answers.vegetables,
                answers.main_meals,
                answers.snacking.compact_code(),
                answers.physical_activity,
                answers.screen_time,
                bmi,
            ],
        };
        debug_assert_eq!(row.len(), self.width());
        Ok(row)
    }
}
