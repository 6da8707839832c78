//! # Interactive Estimation Form
//!
//! The presentation shell: a single-page terminal form that collects the
//! raw-input fields, previews the body-mass index as soon as it is
//! derivable, and renders the model's estimate on explicit submit.
//!
//! The session is generic over `BufRead`/`Write` so tests can script a whole
//! interaction through in-memory buffers. It holds a shared reference to the
//! already-loaded model and keeps no state between rounds: every submit
//! re-collects and re-encodes from scratch.

use itertools::Itertools;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use thiserror::Error;

use crate::encode;
use crate::input::{HeightUnit, RawInput, Region, Sex, Smoker, body_mass_index};
use crate::model::{ClaimModel, ModelError};

/// Fixed sentence accompanying every rendered estimate.
pub const DISCLAIMER: &str = "The following value is estimated based on historical data and predictive modeling techniques and may not represent the exact amount.";

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Terminal I/O failed: {0}")]
    IoError(#[from] io::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// The two session states. `AwaitingInput` collects a fresh record;
/// `ResultDisplayed` holds the rendered estimate until the user either
/// starts another round or quits.
enum SessionState {
    AwaitingInput,
    ResultDisplayed,
}

pub struct FormSession<'m, R, W> {
    model: &'m ClaimModel,
    reader: R,
    writer: W,
}

impl<'m, R: BufRead, W: Write> FormSession<'m, R, W> {
    pub fn new(model: &'m ClaimModel, reader: R, writer: W) -> Self {
        FormSession {
            model,
            reader,
            writer,
        }
    }

    /// Drives the session until the user quits or input ends. End-of-input
    /// at any prompt is a clean exit, not an error.
    pub fn run(mut self) -> Result<(), FormError> {
        let mut state = SessionState::AwaitingInput;
        loop {
            match state {
                SessionState::AwaitingInput => {
                    let Some(input) = self.collect_input()? else {
                        return Ok(());
                    };
                    self.render_estimate(&input)?;
                    state = SessionState::ResultDisplayed;
                }
                SessionState::ResultDisplayed => {
                    writeln!(self.writer)?;
                    writeln!(
                        self.writer,
                        "Press Enter to estimate again, or type 'q' to quit."
                    )?;
                    self.writer.flush()?;
                    match self.read_line()? {
                        None => return Ok(()),
                        Some(line) if line.trim().eq_ignore_ascii_case("q") => return Ok(()),
                        Some(_) => state = SessionState::AwaitingInput,
                    }
                }
            }
        }
    }

    /// Collects one full record, reprompting on invalid fields. Returns
    /// `None` when input ends mid-form.
    fn collect_input(&mut self) -> Result<Option<RawInput>, FormError> {
        writeln!(self.writer, "Health Insurance Claim Estimation")?;
        writeln!(self.writer, "Please fill in the following details:")?;

        let Some(age) = self.prompt_parsed::<u32>("Age")? else {
            return Ok(None);
        };
        let Some(sex) = self.prompt_parsed::<Sex>("Sex (male/female)")? else {
            return Ok(None);
        };

        let unit_choices = HeightUnit::ALL.iter().join("/");
        let Some(height_unit) =
            self.prompt_parsed::<HeightUnit>(&format!("Height unit ({unit_choices})"))?
        else {
            return Ok(None);
        };
        let Some(height) = self.prompt_measure("Height")? else {
            return Ok(None);
        };
        let Some(weight) = self.prompt_measure("Weight (in kg)")? else {
            return Ok(None);
        };

        // Live preview, from the same formula the encoder uses.
        let bmi = match (height, weight) {
            (Some(h), Some(w)) if h != 0.0 => {
                let value = body_mass_index(height_unit.to_meters(h), w);
                writeln!(self.writer, "BMI: {value:.2}")?;
                Some(value)
            }
            _ => None,
        };

        let Some(children) = self.prompt_parsed::<u32>("Number of children")? else {
            return Ok(None);
        };
        let Some(smoker) = self.prompt_parsed::<Smoker>("Smoker (yes/no)")? else {
            return Ok(None);
        };
        let Some(region) = self.prompt_region()? else {
            return Ok(None);
        };

        Ok(Some(RawInput {
            age,
            sex,
            height,
            height_unit,
            weight,
            children,
            smoker,
            region,
            bmi,
        }))
    }

    fn render_estimate(&mut self, input: &RawInput) -> Result<(), FormError> {
        let vector = match encode::encode(input) {
            Ok(vector) => vector,
            Err(e) => {
                // Invalid input is a form-level condition: report it and let
                // the session continue with a fresh round.
                writeln!(self.writer, "Error: {e}")?;
                return Ok(());
            }
        };

        let charges = self.model.predict(vector.view())?;
        writeln!(self.writer)?;
        writeln!(self.writer, "Estimated Claim Amount: {charges:.2}")?;
        writeln!(self.writer, "{DISCLAIMER}")?;
        Ok(())
    }

    /// Prompts until the line parses, reporting each parse failure. `None`
    /// means end-of-input.
    fn prompt_parsed<T>(&mut self, label: &str) -> Result<Option<T>, FormError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        loop {
            write!(self.writer, "{label}: ")?;
            self.writer.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match line.trim().parse::<T>() {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.writer, "Invalid value for {label}: {e}")?,
            }
        }
    }

    /// Prompts for an optional non-negative measurement. A blank line skips
    /// the field; outer `None` means end-of-input.
    fn prompt_measure(&mut self, label: &str) -> Result<Option<Option<f64>>, FormError> {
        loop {
            write!(self.writer, "{label}: ")?;
            self.writer.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return Ok(Some(None));
            }
            match trimmed.parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => {
                    return Ok(Some(Some(value)));
                }
                Ok(_) => writeln!(
                    self.writer,
                    "Invalid value for {label}: must be a non-negative finite number."
                )?,
                Err(_) => writeln!(
                    self.writer,
                    "Invalid value for {label}: expected a number (or blank to skip)."
                )?,
            }
        }
    }

    /// Prompts for a region. Any name outside the model's vocabulary is
    /// accepted with a notice and proceeds as "no region matched".
    fn prompt_region(&mut self) -> Result<Option<Option<Region>>, FormError> {
        let choices = Region::ALL.iter().join("/");
        write!(self.writer, "Region ({choices}): ")?;
        self.writer.flush()?;
        let Some(line) = self.read_line()? else {
            return Ok(None);
        };
        match Region::parse(&line) {
            Some(region) => Ok(Some(Some(region))),
            None => {
                writeln!(
                    self.writer,
                    "Region '{}' is not one of the known regions; proceeding without a region match.",
                    line.trim()
                )?;
                Ok(Some(None))
            }
        }
    }

    fn read_line(&mut self) -> Result<Option<String>, FormError> {
        let mut buffer = String::new();
        if self.reader.read_line(&mut buffer)? == 0 {
            return Ok(None);
        }
        Ok(Some(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DecisionTree, ModelConfig, TreeNode};
    use std::io::Cursor;

    /// A constant-output ensemble: one leaf tree, so every valid record
    /// estimates to base_score + learning_rate * leaf.
    fn constant_model(leaf: f64) -> ClaimModel {
        ClaimModel {
            config: ModelConfig {
                num_features: 11,
                base_score: 1000.0,
                learning_rate: 1.0,
            },
            trees: vec![DecisionTree {
                nodes: vec![TreeNode::Leaf { value: leaf }],
            }],
        }
    }

    fn run_session(model: &ClaimModel, script: &str) -> String {
        let mut output = Vec::new();
        FormSession::new(model, Cursor::new(script), &mut output)
            .run()
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn full_round_previews_bmi_and_renders_the_estimate() {
        let model = constant_model(234.5);
        let script = "30\nfemale\nmeters\n1.75\n70\n2\nno\nnortheast\nq\n";
        let output = run_session(&model, script);

        assert!(output.contains("BMI: 22.86"));
        assert!(output.contains("Estimated Claim Amount: 1234.50"));
        assert!(output.contains(DISCLAIMER));
    }

    #[test]
    fn invalid_fields_are_reprompted_not_fatal() {
        let model = constant_model(0.0);
        let script = "forty\n30\nother\nmale\nmeters\n1.8\n80\n0\nmaybe\nyes\nsouthwest\nq\n";
        let output = run_session(&model, script);

        assert!(output.contains("Invalid value for Age"));
        assert!(output.contains("Invalid value for Sex"));
        assert!(output.contains("Invalid value for Smoker"));
        assert!(output.contains("Estimated Claim Amount: 1000.00"));
    }

    #[test]
    fn unknown_region_is_accepted_with_a_notice() {
        let model = constant_model(0.0);
        let script = "30\nmale\nmeters\n1.8\n80\n0\nno\natlantis\nq\n";
        let output = run_session(&model, script);

        assert!(output.contains("'atlantis' is not one of the known regions"));
        assert!(output.contains("Estimated Claim Amount: 1000.00"));
    }

    #[test]
    fn skipped_measurements_without_bmi_report_invalid_input() {
        let model = constant_model(0.0);
        // Height and weight both blank: BMI is underivable, so submit must
        // surface the invalid-input condition and the session must go on.
        let script = "30\nmale\nmeters\n\n\n0\nno\nsoutheast\nq\n";
        let output = run_session(&model, script);

        assert!(output.contains("Body-mass index could not be derived"));
        assert!(!output.contains("Estimated Claim Amount:"));
    }

    #[test]
    fn end_of_input_mid_form_exits_cleanly() {
        let model = constant_model(0.0);
        let script = "30\nfemale\n";
        let output = run_session(&model, script);

        assert!(output.contains("Height unit"));
        assert!(!output.contains("Estimated Claim Amount:"));
    }

    #[test]
    fn enter_starts_another_round() {
        let model = constant_model(0.0);
        let script = "30\nmale\nmeters\n1.8\n80\n0\nno\nsoutheast\n\n\
                      45\nfemale\ncentimeters\n162\n55\n1\nyes\nnorthwest\nq\n";
        let output = run_session(&model, script);

        assert_eq!(output.matches("Estimated Claim Amount: 1000.00").count(), 2);
    }
}
