// ========================================================================================
//                             High-Level Data Contracts
// ========================================================================================

// This file is ONLY for the raw-input record and its categorical vocabulary.
// Encoding logic lives in encode.rs; nothing here touches the model.

use std::fmt;
use std::str::FromStr;

/// Exact conversion factor; the model was trained against heights normalized
/// with this constant, so it must not be approximated.
pub const FEET_TO_METERS: f64 = 0.3048;

/// Body-mass index: weight in kilograms over height in meters squared.
///
/// This is the single definition shared by the form's live preview and the
/// encoder's recomputation, so the displayed value and the value inside the
/// feature vector can never drift apart.
#[inline]
pub fn body_mass_index(height_m: f64, weight_kg: f64) -> f64 {
    weight_kg / (height_m * height_m)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Smoker {
    Yes,
    No,
}

/// The four regions the model was trained on. An input region outside this
/// vocabulary is represented as `None` at the `RawInput` level and encodes
/// to "no region matched" rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Southeast,
    Southwest,
    Northwest,
    Northeast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightUnit {
    Meters,
    Centimeters,
    Feet,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::Southeast,
        Region::Southwest,
        Region::Northwest,
        Region::Northeast,
    ];

    /// Ordinal in the fixed training-time table. Slot order in the feature
    /// vector follows these values exactly.
    #[inline]
    pub fn ordinal(self) -> u8 {
        match self {
            Region::Southeast => 1,
            Region::Southwest => 2,
            Region::Northwest => 3,
            Region::Northeast => 4,
        }
    }

    /// Parses a region name. Unknown names yield `None` instead of an error:
    /// the encoder treats them as "no region matched", which the trained
    /// model expects for out-of-vocabulary regions.
    pub fn parse(s: &str) -> Option<Region> {
        match s.trim().to_ascii_lowercase().as_str() {
            "southeast" => Some(Region::Southeast),
            "southwest" => Some(Region::Southwest),
            "northwest" => Some(Region::Northwest),
            "northeast" => Some(Region::Northeast),
            _ => None,
        }
    }
}

impl HeightUnit {
    pub const ALL: [HeightUnit; 3] = [
        HeightUnit::Meters,
        HeightUnit::Centimeters,
        HeightUnit::Feet,
    ];

    /// Converts a magnitude expressed in this unit to meters.
    #[inline]
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            HeightUnit::Meters => value,
            HeightUnit::Centimeters => value / 100.0,
            HeightUnit::Feet => value * FEET_TO_METERS,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

impl fmt::Display for Smoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Smoker::Yes => write!(f, "yes"),
            Smoker::No => write!(f, "no"),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Southeast => write!(f, "southeast"),
            Region::Southwest => write!(f, "southwest"),
            Region::Northwest => write!(f, "northwest"),
            Region::Northeast => write!(f, "northeast"),
        }
    }
}

impl fmt::Display for HeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeightUnit::Meters => write!(f, "meters"),
            HeightUnit::Centimeters => write!(f, "centimeters"),
            HeightUnit::Feet => write!(f, "feet"),
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            other => Err(format!(
                "Invalid sex '{other}'. Expected 'male' or 'female'."
            )),
        }
    }
}

impl FromStr for Smoker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Smoker::Yes),
            "no" => Ok(Smoker::No),
            other => Err(format!(
                "Invalid smoker status '{other}'. Expected 'yes' or 'no'."
            )),
        }
    }
}

impl FromStr for HeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meters" => Ok(HeightUnit::Meters),
            "centimeters" => Ok(HeightUnit::Centimeters),
            "feet" => Ok(HeightUnit::Feet),
            other => Err(format!(
                "Invalid height unit '{other}'. Expected 'meters', 'centimeters', or 'feet'."
            )),
        }
    }
}

/// One prediction request's worth of raw user input. Ephemeral: built by the
/// shell (or a batch record), handed to the encoder, then dropped.
///
/// `age` and `children` are unsigned by construction, so negative values are
/// unrepresentable. `height`/`weight` stay optional floats and are validated
/// by the encoder. A caller-supplied `bmi` is display-grade only: the encoder
/// recomputes it whenever height and weight allow.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInput {
    pub age: u32,
    pub sex: Sex,
    pub height: Option<f64>,
    pub height_unit: HeightUnit,
    pub weight: Option<f64>,
    pub children: u32,
    pub smoker: Smoker,
    pub region: Option<Region>,
    pub bmi: Option<f64>,
}
