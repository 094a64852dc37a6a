//! Interactive front ends: the single-page form and the page-routed wizard.

use std::io::{BufRead, Write};

use tracing::warn;

use crate::assets::{self, ModelBundle};
use crate::config::Config;
use crate::dataset;
use crate::encoder::{Answers, FeatureSchema};
use crate::error::{AppError, Result};
use crate::form::{self, Prompter};
use crate::predictor::{Prediction, Predictor};
use crate::report;
use crate::router::{Action, Page, Session};

pub struct App<'a> {
    config: &'a Config,
    predictor: Predictor,
}

impl<'a> App<'a> {
    pub fn new(config: &'a Config, predictor: Predictor) -> Self {
        Self { config, predictor }
    }

    fn collect<R: BufRead, W: Write>(
        &self,
        p: &mut Prompter<R, W>,
        previous: Option<&Answers>,
    ) -> Result<Answers> {
        match self.predictor.schema() {
            FeatureSchema::Full => form::full_form(p, previous),
            FeatureSchema::Compact => form::compact_form(p, previous),
        }
    }

    /// Renders the result and, when enabled, saves it next to earlier runs.
    fn show<R: BufRead, W: Write>(
        &self,
        p: &mut Prompter<R, W>,
        answers: &Answers,
        prediction: &Prediction,
    ) -> Result<()> {
        let text = report::render(prediction, self.predictor.classes());
        p.say("")?;
        p.say(&text)?;

        if self.config.save_results {
            match report::save_report(&self.config.results_dir, &text, &answers.profile()) {
                Ok(path) => p.say(&format!("Results saved to: {}", path.display()))?,
                Err(e) => {
                    warn!(error = %e, "could not save results");
                    p.say(&format!("Warning: could not save results to file: {e}"))?;
                }
            }
        }
        Ok(())
    }

    /// One page with every question, then the result underneath. Repeats
    /// until the user declines another analysis.
    pub fn run_form<R: BufRead, W: Write>(&self, p: &mut Prompter<R, W>) -> Result<()> {
        p.say("OBESITY LEVEL EARLY DETECTION")?;
        p.say("=============================")?;
        p.say("Predicts your obesity level from physical data and lifestyle habits.")?;

        let mut last: Option<Answers> = None;
        loop {
            let answers = form::full_form(p, last.as_ref())?;
            let prediction = self.predictor.predict(&answers)?;
            self.show(p, &answers, &prediction)?;
            last = Some(answers);

            p.say(&format!("\n{}", "=".repeat(50)))?;
            if !p.confirm("Analyze again?", false)? {
                p.say("Thank you for using the obesity checker!")?;
                return Ok(());
            }
        }
    }

    /// Start, form and result pages driven by a [`Session`].
    pub fn run_wizard<R: BufRead, W: Write>(&self, p: &mut Prompter<R, W>) -> Result<Session> {
        let mut session = Session::new();

        while !session.is_finished() {
            let action = match session.page() {
                Page::Start => {
                    p.say("\nOBESITY PREDICTION")?;
                    p.say("==================")?;
                    let pressed = p.button("Press Enter to start, q to quit: ")?;
                    if pressed.starts_with('q') {
                        Action::Quit
                    } else {
                        Action::Begin
                    }
                }
                Page::Form => {
                    p.say("\nOBESITY PREDICTION FORM")?;
                    p.say("=======================")?;
                    let pressed =
                        p.button("Press Enter to fill in the form, b to go back, q to quit: ")?;
                    if pressed.starts_with('q') {
                        Action::Quit
                    } else if pressed.starts_with('b') {
                        Action::Back
                    } else {
                        let answers = self.collect(p, session.answers())?;
                        let prediction = self.predictor.predict(&answers)?;
                        Action::Submit(answers, prediction)
                    }
                }
                Page::Result => {
                    let (Some(answers), Some(prediction)) = (session.answers(), session.result())
                    else {
                        return Err(AppError::InvalidTransition {
                            page: Page::Result,
                            action: "show a result",
                        });
                    };
                    self.show(p, answers, prediction)?;
                    let pressed =
                        p.button("\nPress Enter to edit answers, r to start over, q to quit: ")?;
                    if pressed.starts_with('q') {
                        Action::Quit
                    } else if pressed.starts_with('r') {
                        Action::Restart
                    } else {
                        Action::Back
                    }
                }
            };
            session.apply(action)?;
        }

        p.say("Goodbye!")?;
        Ok(session)
    }
}

/// Trains a model from the configured CSV and saves it as the model bundle
/// used by the single-page form. `force` first deletes models cached by
/// dataset hash.
pub fn train<W: Write>(
    config: &Config,
    schema: FeatureSchema,
    force: bool,
    out: &mut W,
) -> Result<ModelBundle> {
    writeln!(out, "TRAINING OBESITY MODEL")?;
    writeln!(out, "======================")?;

    if force {
        let removed = assets::clear_cache(&config.models_dir)?;
        writeln!(out, "Removed {removed} cached model(s)")?;
    }

    let records = dataset::load_csv(&config.dataset_path)?;
    let set = dataset::encode(&records, schema)?;
    let mut bundle = ModelBundle::train(&set, schema, &config.forest)?;
    bundle.data_hash = Some(assets::file_hash(&config.dataset_path)?);
    bundle.save(&config.model_path)?;

    writeln!(out, "Records: {}", records.len())?;
    writeln!(out, "Schema: {} ({} features)", schema.name(), schema.width())?;
    writeln!(out, "Classes: {}", bundle.classes.join(", "))?;
    writeln!(out, "Model saved to: {}", config.model_path.display())?;
    Ok(bundle)
}

/// Loads the saved model bundle for the single-page form. A missing file is
/// explained on `out` and yields `None`.
pub fn load_saved_model<W: Write>(config: &Config, out: &mut W) -> Result<Option<ModelBundle>> {
    match ModelBundle::load(&config.model_path) {
        Ok(bundle) => Ok(Some(bundle)),
        Err(AppError::MissingAsset(path)) => {
            writeln!(out, "ERROR: model file not found at: {}", path.display())?;
            writeln!(out, "Train one first with: obesity-check train")?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
