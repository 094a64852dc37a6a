//! Terminal form collector.
//!
//! Every prompt reads one line. Empty input takes the default, bad input is
//! explained and asked again, and a closed input stream aborts the form.

use std::io::{BufRead, Write};
use std::sync::LazyLock;

use regex::Regex;

use crate::encoder::{Answers, Choice, Frequency, Gender, Transport, YesNo};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberField {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub integer: bool,
}

impl NumberField {
    const fn new(label: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            label,
            min,
            max,
            default,
            integer: false,
        }
    }

    const fn whole(label: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            label,
            min,
            max,
            default,
            integer: true,
        }
    }

    fn with_default(self, default: Option<f64>) -> Self {
        match default {
            Some(default) => Self { default, ..self },
            None => self,
        }
    }

    fn format(&self, value: f64) -> String {
        if self.integer {
            format!("{value:.0}")
        } else {
            format!("{value}")
        }
    }

    /// Checks a typed value against the field's kind and bounds.
    pub fn validate(&self, value: f64) -> std::result::Result<f64, String> {
        if self.integer && value.fract() != 0.0 {
            return Err("please enter a whole number".to_string());
        }
        if value < self.min || value > self.max {
            return Err(format!(
                "value must be between {} and {}",
                self.format(self.min),
                self.format(self.max)
            ));
        }
        Ok(value)
    }
}

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+(?:[.,]\d+)?$").expect("number pattern compiles"));

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(AppError::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    /// Waits for a button-style answer and returns it lower-cased.
    pub fn button(&mut self, prompt: &str) -> Result<String> {
        Ok(self.ask(prompt)?.to_lowercase())
    }

    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let answer = self.button(&format!("{question} ({hint}): "))?;
            match answer.as_str() {
                "" => return Ok(default),
                a if a.starts_with('y') => return Ok(true),
                a if a.starts_with('n') => return Ok(false),
                _ => self.say("Please answer y or n.")?,
            }
        }
    }

    fn parse_number(&self, raw: &str) -> Option<f64> {
        if !NUMBER.is_match(raw) {
            return None;
        }
        raw.replace(',', ".").parse().ok()
    }

    pub fn number(&mut self, field: NumberField) -> Result<f64> {
        let prompt = format!(
            "{} [{}-{}, default {}]: ",
            field.label,
            field.format(field.min),
            field.format(field.max),
            field.format(field.default)
        );
        loop {
            let raw = self.ask(&prompt)?;
            if raw.is_empty() {
                return Ok(field.default);
            }
            let Some(value) = self.parse_number(&raw) else {
                self.say(&format!("'{raw}' is not a number, use a dot for decimals (e.g. 1.70)."))?;
                continue;
            };
            match field.validate(value) {
                Ok(value) => return Ok(value),
                Err(message) => self.say(&format!("Invalid {}: {message}.", field.label))?,
            }
        }
    }

    /// Single choice from `options`, answered by number or by name.
    pub fn choice<C: Choice + PartialEq>(
        &mut self,
        label: &str,
        options: &[C],
        default: Option<C>,
    ) -> Result<C> {
        let default_idx = default
            .and_then(|d| options.iter().position(|o| *o == d))
            .unwrap_or(0);

        self.say(label)?;
        for (i, option) in options.iter().enumerate() {
            self.say(&format!("  {}. {}", i + 1, option.label()))?;
        }
        let prompt = format!("Choose [1-{}, default {}]: ", options.len(), default_idx + 1);

        loop {
            let raw = self.ask(&prompt)?;
            if raw.is_empty() {
                return Ok(options[default_idx]);
            }
            if let Ok(n) = raw.parse::<usize>() {
                if (1..=options.len()).contains(&n) {
                    return Ok(options[n - 1]);
                }
            } else if let Some(choice) = C::from_raw(&raw).filter(|c| options.contains(c)) {
                return Ok(choice);
            }
            self.say(&format!("'{raw}' is not one of the options."))?;
        }
    }
}

const AGE: NumberField = NumberField::whole("Age (years)", 10.0, 80.0, 25.0);
const HEIGHT: NumberField = NumberField::new("Height (m)", 1.0, 2.5, 1.70);
const WEIGHT: NumberField = NumberField::whole("Weight (kg)", 30.0, 200.0, 70.0);
const FCVC: NumberField = NumberField::new("Vegetable consumption, 1 rarely to 3 always (FCVC)", 1.0, 3.0, 2.0);
const NCP: NumberField = NumberField::new("Main meals per day (NCP)", 1.0, 4.0, 3.0);
const CH2O: NumberField = NumberField::new("Water intake, liters per day (CH2O)", 1.0, 3.0, 2.0);
const FAF: NumberField = NumberField::new("Physical activity, days per week (FAF)", 0.0, 3.0, 1.0);
const TUE: NumberField = NumberField::new("Screen time, hours per day (TUE)", 0.0, 2.0, 1.0);

const COMPACT_AGE: NumberField = NumberField::whole("Age (years)", 1.0, 120.0, 1.0);
const COMPACT_HEIGHT: NumberField = NumberField::new("Height (m)", 0.5, 2.5, 0.5);
const COMPACT_WEIGHT: NumberField = NumberField::new("Weight (kg)", 10.0, 300.0, 10.0);
const COMPACT_FCVC: NumberField = NumberField::whole("Vegetable frequency 1-3", 1.0, 3.0, 1.0);
const COMPACT_NCP: NumberField = NumberField::whole("Meals per day 1-4", 1.0, 4.0, 1.0);
const COMPACT_FAF: NumberField = NumberField::new("Physical activity 0-3", 0.0, 3.0, 0.0);
const COMPACT_TUE: NumberField = NumberField::new("Screen time 0-2", 0.0, 2.0, 0.0);

/// Single-page form collecting every field of the full feature row.
/// `previous` answers, when given, become the defaults.
pub fn full_form<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    previous: Option<&Answers>,
) -> Result<Answers> {
    let prev = |f: fn(&Answers) -> f64| previous.map(f);

    p.say("\n1. Physical data")?;
    let age = p.number(AGE.with_default(prev(|a| a.age)))?;
    let height = p.number(HEIGHT.with_default(prev(|a| a.height)))?;
    let weight = p.number(WEIGHT.with_default(prev(|a| a.weight)))?;
    let gender = p.choice("Gender", Gender::options(), previous.map(|a| a.gender))?;
    let family_history = p.choice(
        "Family history of overweight?",
        YesNo::options(),
        previous.map(|a| a.family_history),
    )?;

    p.say("\n2. Eating habits")?;
    let vegetables = p.number(FCVC.with_default(prev(|a| a.vegetables)))?;
    let main_meals = p.number(NCP.with_default(prev(|a| a.main_meals)))?;
    let water = p.number(CH2O.with_default(prev(|a| a.water)))?;
    let high_calorie_food = p.choice(
        "Frequently eat high-calorie food? (FAVC)",
        YesNo::options(),
        previous.map(|a| a.high_calorie_food),
    )?;
    let snacking = p.choice(
        "How often do you snack between meals? (CAEC)",
        Frequency::options(),
        previous.map(|a| a.snacking),
    )?;
    let alcohol = p.choice(
        "How often do you drink alcohol? (CALC)",
        Frequency::options(),
        previous.map(|a| a.alcohol),
    )?;

    p.say("\n3. Lifestyle and activity")?;
    let smokes = p.choice("Do you smoke? (SMOKE)", YesNo::options(), previous.map(|a| a.smokes))?;
    let monitors_calories = p.choice(
        "Do you monitor your calorie intake? (SCC)",
        YesNo::options(),
        previous.map(|a| a.monitors_calories),
    )?;
    let physical_activity = p.number(FAF.with_default(prev(|a| a.physical_activity)))?;
    let screen_time = p.number(TUE.with_default(prev(|a| a.screen_time)))?;
    let transport = p.choice(
        "Main mode of transport (MTRANS)",
        Transport::options(),
        previous.map(|a| a.transport),
    )?;

    Ok(Answers {
        gender,
        age,
        height,
        weight,
        family_history,
        high_calorie_food,
        vegetables,
        main_meals,
        snacking,
        smokes,
        water,
        monitors_calories,
        physical_activity,
        screen_time,
        alcohol,
        transport,
    })
}

/// Wizard form for the eleven-column compact row. Fields it does not ask for
/// keep their defaults.
pub fn compact_form<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    previous: Option<&Answers>,
) -> Result<Answers> {
    let prev = |f: fn(&Answers) -> f64| previous.map(f);

    let gender = p.choice("Gender", Gender::options(), previous.map(|a| a.gender))?;
    let age = p.number(COMPACT_AGE.with_default(prev(|a| a.age)))?;
    let height = p.number(COMPACT_HEIGHT.with_default(prev(|a| a.height)))?;
    let weight = p.number(COMPACT_WEIGHT.with_default(prev(|a| a.weight)))?;
    let high_calorie_food = p.choice(
        "Frequently eat high-calorie food",
        YesNo::options(),
        previous.map(|a| a.high_calorie_food),
    )?;
    let vegetables = p.number(COMPACT_FCVC.with_default(prev(|a| a.vegetables)))?;
    let main_meals = p.number(COMPACT_NCP.with_default(prev(|a| a.main_meals)))?;
    let snacking = p.choice(
        "Snacking habit",
        &Frequency::ASCENDING,
        previous.map(|a| a.snacking),
    )?;
    let physical_activity = p.number(COMPACT_FAF.with_default(prev(|a| a.physical_activity)))?;
    let screen_time = p.number(COMPACT_TUE.with_default(prev(|a| a.screen_time)))?;

    Ok(Answers {
        gender,
        age,
        height,
        weight,
        high_calorie_food,
        vegetables,
        main_meals,
        snacking,
        physical_activity,
        screen_time,
        ..previous.cloned().unwrap_or_default()
    })
}
