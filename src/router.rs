//! Start → form → result page flow.
//!
//! The session owns the current page plus whatever the user last submitted,
//! so going back from the result page re-opens the form with the previous
//! answers and the result stays available until the next submit.

use tracing::debug;

use crate::encoder::Answers;
use crate::error::{AppError, Result};
use crate::predictor::Prediction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Start,
    Form,
    Result,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Begin,
    Submit(Answers, Prediction),
    Back,
    Restart,
    Quit,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Begin => "begin",
            Action::Submit(..) => "submit",
            Action::Back => "go back",
            Action::Restart => "restart",
            Action::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    page: Page,
    answers: Option<Answers>,
    result: Option<Prediction>,
    finished: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            page: Page::Start,
            answers: None,
            result: None,
            finished: false,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn answers(&self) -> Option<&Answers> {
        self.answers.as_ref()
    }

    pub fn result(&self) -> Option<&Prediction> {
        self.result.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Applies a button press. Invalid pairs leave the session untouched.
    pub fn apply(&mut self, action: Action) -> Result<Page> {
        if self.finished {
            return Err(AppError::InvalidTransition {
                page: self.page,
                action: action.name(),
            });
        }

        let next = match (self.page, action) {
            (_, Action::Quit) => {
                self.finished = true;
                self.page
            }
            (Page::Start, Action::Begin) => Page::Form,
            (Page::Form, Action::Submit(answers, prediction)) => {
                self.answers = Some(answers);
                self.result = Some(prediction);
                Page::Result
            }
            (Page::Form, Action::Back) => Page::Start,
            (Page::Result, Action::Back) => Page::Form,
            (Page::Result, Action::Restart) => {
                self.answers = None;
                self.result = None;
                Page::Start
            }
            (page, action) => {
                return Err(AppError::InvalidTransition {
                    page,
                    action: action.name(),
                })
            }
        };

        debug!(from = ?self.page, to = ?next, "page transition");
        self.page = next;
        Ok(next)
    }
}
