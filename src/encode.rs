//! # Feature Encoding Module
//!
//! This module is the exclusive bridge between a raw user-input record and
//! the numeric vector the trained model consumes. It mirrors the strict
//! canonical-order discipline of a design matrix: the column order below is
//! the implicit contract the model's training run established, and every
//! prediction must reproduce it exactly.
//!
//! - Canonical Order: `[age, bmi, children, sex_female, sex_male,
//!   region_southeast, region_southwest, region_northwest, region_northeast,
//!   smoker_no, smoker_yes]`. Reordering columns silently corrupts every
//!   prediction, so the order lives in one place and is covered by tests.
//! - Validation First: a negative or non-finite height/weight is rejected
//!   before any arithmetic. The UI clamps its own inputs, but direct callers
//!   of the library get the same guarantee.
//! - Total over the valid domain: encoding only fails when BMI is required
//!   but underivable and the caller supplied none.

use ndarray::{ArrayView1, aview1};
use thiserror::Error;

use crate::input::{RawInput, Region, Sex, Smoker};

/// Number of columns the model was trained against.
pub const FEATURE_COUNT: usize = 11;

/// The fixed-order numeric encoding of one `RawInput`. Exists only for the
/// duration of a single prediction call.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Borrowed `ndarray` view for the model's prediction call.
    #[inline]
    pub fn view(&self) -> ArrayView1<'_, f64> {
        aview1(&self.0)
    }

    /// The resolved body-mass index carried in the vector.
    #[inline]
    pub fn bmi(&self) -> f64 {
        self.0[1]
    }
}

/// Invalid-input conditions a direct caller can produce. The interactive
/// form prevents all of these through its own prompting.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("The supplied {field} ({value}) is negative. Measurements must be non-negative.")]
    NegativeMeasure { field: &'static str, value: f64 },
    #[error("The supplied {field} ({value}) is not a finite number.")]
    NonFiniteMeasure { field: &'static str, value: f64 },
    #[error(
        "Body-mass index could not be derived (height or weight missing, or height is zero) and no precomputed value was supplied."
    )]
    MissingBodyMass,
}

fn check_measure(field: &'static str, value: f64) -> Result<(), EncodeError> {
    if !value.is_finite() {
        return Err(EncodeError::NonFiniteMeasure { field, value });
    }
    if value < 0.0 {
        return Err(EncodeError::NegativeMeasure { field, value });
    }
    Ok(())
}

/// Encodes a raw input record into the model's 11-column feature vector.
///
/// Deterministic and side-effect free. BMI is recomputed from height and
/// weight whenever both are present and height is non-zero, overriding any
/// caller-supplied value; otherwise the caller's value is used unchanged.
pub fn encode(input: &RawInput) -> Result<FeatureVector, EncodeError> {
    if let Some(height) = input.height {
        check_measure("height", height)?;
    }
    if let Some(weight) = input.weight {
        check_measure("weight", weight)?;
    }
    if let Some(bmi) = input.bmi {
        check_measure("bmi", bmi)?;
    }

    let height_m = input.height.map(|h| input.height_unit.to_meters(h));

    let bmi = match (height_m, input.weight) {
        (Some(h), Some(w)) if h != 0.0 => crate::input::body_mass_index(h, w),
        _ => input.bmi.ok_or(EncodeError::MissingBodyMass)?,
    };

    // Binary complements: exactly one of each pair is set, by construction.
    let sex_female = if input.sex == Sex::Female { 1.0 } else { 0.0 };
    let sex_male = 1.0 - sex_female;
    let smoker_no = if input.smoker == Smoker::No { 1.0 } else { 0.0 };
    let smoker_yes = 1.0 - smoker_no;

    // Unmatched region (None) leaves the ordinal at 0 and all four flags
    // unset. Deliberate fallback, not an error: the model was trained with
    // this degrade for out-of-vocabulary regions.
    let ordinal = input.region.map_or(0, Region::ordinal);
    let region_southeast = if ordinal == 1 { 1.0 } else { 0.0 };
    let region_southwest = if ordinal == 2 { 1.0 } else { 0.0 };
    let region_northwest = if ordinal == 3 { 1.0 } else { 0.0 };
    let region_northeast = if ordinal == 4 { 1.0 } else { 0.0 };

    Ok(FeatureVector([
        f64::from(input.age),
        bmi,
        f64::from(input.children),
        sex_female,
        sex_male,
        region_southeast,
        region_southwest,
        region_northwest,
        region_northeast,
        smoker_no,
        smoker_yes,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::HeightUnit;
    use approx::assert_relative_eq;

    fn base_input() -> RawInput {
        RawInput {
            age: 30,
            sex: Sex::Female,
            height: Some(1.75),
            height_unit: HeightUnit::Meters,
            weight: Some(70.0),
            children: 2,
            smoker: Smoker::No,
            region: Some(Region::Northeast),
            bmi: None,
        }
    }

    #[test]
    fn reference_scenario_produces_the_documented_vector() {
        let vector = encode(&base_input()).unwrap();
        let expected_bmi = 70.0 / (1.75 * 1.75);
        assert_relative_eq!(expected_bmi, 22.857142857142858, max_relative = 1e-12);
        assert_eq!(
            vector.as_slice(),
            &[30.0, expected_bmi, 2.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0]
        );
        assert_eq!(vector.as_slice().len(), FEATURE_COUNT);
    }

    #[test]
    fn derived_bmi_overrides_any_caller_supplied_value() {
        let mut input = base_input();
        input.bmi = Some(99.0);
        let vector = encode(&input).unwrap();
        assert_relative_eq!(vector.bmi(), 70.0 / (1.75 * 1.75));
    }

    #[test]
    fn caller_bmi_survives_when_height_is_missing_or_zero() {
        let mut input = base_input();
        input.height = None;
        input.bmi = Some(24.5);
        assert_relative_eq!(encode(&input).unwrap().bmi(), 24.5);

        let mut input = base_input();
        input.height = Some(0.0);
        input.bmi = Some(24.5);
        assert_relative_eq!(encode(&input).unwrap().bmi(), 24.5);

        let mut input = base_input();
        input.weight = None;
        input.bmi = Some(24.5);
        assert_relative_eq!(encode(&input).unwrap().bmi(), 24.5);
    }

    #[test]
    fn missing_and_underivable_bmi_fails_fast() {
        let mut input = base_input();
        input.height = None;
        input.bmi = None;
        assert!(matches!(
            encode(&input),
            Err(EncodeError::MissingBodyMass)
        ));
    }

    #[test]
    fn equivalent_heights_in_all_units_agree_within_tolerance() {
        let meters = encode(&base_input()).unwrap().bmi();

        let mut cm = base_input();
        cm.height = Some(175.0);
        cm.height_unit = HeightUnit::Centimeters;
        let centimeters = encode(&cm).unwrap().bmi();

        let mut ft = base_input();
        ft.height = Some(1.75 / 0.3048);
        ft.height_unit = HeightUnit::Feet;
        let feet = encode(&ft).unwrap().bmi();

        assert!((meters - centimeters).abs() < 1e-9);
        assert!((meters - feet).abs() < 1e-9);
    }

    #[test]
    fn sex_and_smoker_flags_are_exclusive_complements() {
        for (sex, smoker) in [
            (Sex::Male, Smoker::Yes),
            (Sex::Male, Smoker::No),
            (Sex::Female, Smoker::Yes),
            (Sex::Female, Smoker::No),
        ] {
            let mut input = base_input();
            input.sex = sex;
            input.smoker = smoker;
            let v = encode(&input).unwrap();
            let s = v.as_slice();
            assert_eq!(s[3] + s[4], 1.0, "sex flags must sum to one");
            assert_eq!(s[9] + s[10], 1.0, "smoker flags must sum to one");
        }
    }

    #[test]
    fn each_known_region_sets_exactly_its_own_flag() {
        for region in Region::ALL {
            let mut input = base_input();
            input.region = Some(region);
            let v = encode(&input).unwrap();
            let flags = &v.as_slice()[5..9];
            assert_eq!(flags.iter().sum::<f64>(), 1.0);
            assert_eq!(flags[usize::from(region.ordinal()) - 1], 1.0);
        }
    }

    #[test]
    fn unmatched_region_leaves_all_four_flags_zero() {
        let mut input = base_input();
        input.region = Region::parse("unknown");
        assert_eq!(input.region, None);
        let v = encode(&input).unwrap();
        assert_eq!(&v.as_slice()[5..9], &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn negative_and_non_finite_measures_are_rejected() {
        let mut input = base_input();
        input.weight = Some(-70.0);
        assert!(matches!(
            encode(&input),
            Err(EncodeError::NegativeMeasure { field: "weight", .. })
        ));

        let mut input = base_input();
        input.height = Some(f64::NAN);
        assert!(matches!(
            encode(&input),
            Err(EncodeError::NonFiniteMeasure { field: "height", .. })
        ));
    }
}
