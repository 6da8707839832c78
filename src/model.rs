//! # Trained Model Artifact
//!
//! The self-contained, pre-trained gradient-boosted regression ensemble.
//! This module owns the artifact's human-readable TOML format, its load-time
//! validation, and the inference call. Nothing here trains anything: the
//! artifact is produced elsewhere and consumed read-only.
//!
//! - Fail at startup, not per request: `load` validates the whole node
//!   table before returning, so a corrupt artifact can never surface as a
//!   mid-session panic.
//! - Read-only after load: `predict` takes `&self` and the struct holds no
//!   interior mutability, so one loaded model is safe to share across any
//!   number of concurrent prediction calls.

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Structural parameters saved at training time. `num_features` is the
/// arity contract every prediction input is checked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub num_features: usize,
    /// The ensemble's initial prediction before any tree contributions.
    pub base_score: f64,
    /// Scale applied to the summed tree outputs.
    pub learning_rate: f64,
}

/// One node of a decision tree. Children reference positions in the owning
/// tree's node table and are stored strictly after their parent, which is
/// what makes traversal provably terminate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree, rooted at node 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Routes one feature row to a leaf. Indices were validated at load, so
    /// the walk is plain array indexing.
    fn output(&self, features: ArrayView1<f64>) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[feature] <= threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// The top-level, self-contained, trained model artifact. This is the
/// structure that gets saved to and loaded from a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimModel {
    pub config: ModelConfig,
    pub trees: Vec<DecisionTree>,
}

/// Custom error type for model loading, saving, and prediction.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read or write model file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML model file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize model to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Feature vector has {found} columns, but the model was trained on {expected}.")]
    FeatureCountMismatch { found: usize, expected: usize },
    #[error("Model declares zero features; the artifact is unusable.")]
    NoFeatures,
    #[error("Tree {tree} is empty. Every tree needs at least a root leaf.")]
    EmptyTree { tree: usize },
    #[error(
        "Tree {tree}, node {node}: split references feature {feature}, but the model only has {num_features} features."
    )]
    FeatureIndexOutOfRange {
        tree: usize,
        node: usize,
        feature: usize,
        num_features: usize,
    },
    #[error(
        "Tree {tree}, node {node}: child index {child} is invalid. Children must lie inside the node table and strictly after their parent."
    )]
    ChildIndexInvalid { tree: usize, node: usize, child: usize },
}

impl ClaimModel {
    /// Saves the model to a file in a human-readable TOML format.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        Ok(())
    }

    /// Loads and validates a model artifact. Validation failure here is the
    /// intended startup-fatal path: callers must refuse to serve input forms
    /// on error rather than deferring the failure to a prediction call.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let toml_string = fs::read_to_string(path)?;
        let model: ClaimModel = toml::from_str(&toml_string)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.config.num_features == 0 {
            return Err(ModelError::NoFeatures);
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ModelError::EmptyTree { tree: t });
            }
            for (n, node) in tree.nodes.iter().enumerate() {
                if let TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } = *node
                {
                    if feature >= self.config.num_features {
                        return Err(ModelError::FeatureIndexOutOfRange {
                            tree: t,
                            node: n,
                            feature,
                            num_features: self.config.num_features,
                        });
                    }
                    for child in [left, right] {
                        if child <= n || child >= tree.nodes.len() {
                            return Err(ModelError::ChildIndexInvalid {
                                tree: t,
                                node: n,
                                child,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Predicts the claim amount for one encoded feature row.
    ///
    /// Fast and non-iterative: routes the row through every tree and sums
    /// the leaf outputs onto the base score.
    pub fn predict(&self, features: ArrayView1<f64>) -> Result<f64, ModelError> {
        if features.len() != self.config.num_features {
            return Err(ModelError::FeatureCountMismatch {
                found: features.len(),
                expected: self.config.num_features,
            });
        }

        let tree_sum: f64 = self.trees.iter().map(|tree| tree.output(features)).sum();
        Ok(self.config.base_score + self.config.learning_rate * tree_sum)
    }

    /// Predicts one value per row of a feature matrix.
    pub fn predict_batch(&self, rows: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        if rows.ncols() != self.config.num_features {
            return Err(ModelError::FeatureCountMismatch {
                found: rows.ncols(),
                expected: self.config.num_features,
            });
        }

        let mut predictions = Array1::zeros(rows.nrows());
        for (i, row) in rows.rows().into_iter().enumerate() {
            let tree_sum: f64 = self.trees.iter().map(|tree| tree.output(row)).sum();
            predictions[i] = self.config.base_score + self.config.learning_rate * tree_sum;
        }
        Ok(predictions)
    }
}
