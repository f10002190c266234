//! Classifier backends.
//!
//! The pipeline only needs two capabilities: fit a model on a feature matrix
//! and integer labels ([`ClassifierTrainer`]), and ask a fitted model for
//! per-class probabilities ([`Classifier`]).
//!
//! The default backend is a bagged forest of `linfa-trees` decision trees.
//! Each tree is grown on a bootstrap sample of the rows and a random subset of
//! `sqrt(d)` feature columns; class probabilities are the fraction of trees
//! voting for each class. All randomness comes from one seeded generator, so
//! identical inputs always yield an identical forest.

use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::{PipelineConfig, DEFAULT_SEED};
use crate::error::{Result, VigilError};

/// A fitted model.
pub trait Classifier: Send + Sync {
    /// Number of classes the probabilities cover.
    fn n_classes(&self) -> usize;

    /// Probability of each class index for one feature row.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>>;

    /// Most probable class index; ties go to the lower index.
    fn predict_class(&self, features: &[f64]) -> Result<usize> {
        let proba = self.predict_proba(features)?;
        let mut best = 0;
        for (index, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = index;
            }
        }
        Ok(best)
    }
}

/// Fits fresh models.
pub trait ClassifierTrainer: Send + Sync {
    /// Fit on `records` (one row per sample) and `targets` (class indices below `n_classes`).
    fn fit(
        &self,
        records: &Array2<f64>,
        targets: &Array1<usize>,
        n_classes: usize,
    ) -> Result<Box<dyn Classifier>>;
}

/// Fraction of rows in `records` whose predicted class equals the target.
pub fn accuracy(
    model: &dyn Classifier,
    records: &Array2<f64>,
    targets: &Array1<usize>,
) -> Result<f64> {
    if records.nrows() == 0 {
        return Err(VigilError::InsufficientData(
            "Cannot score a model on an empty partition".into(),
        ));
    }

    let mut correct = 0usize;
    for (row, target) in records.outer_iter().zip(targets.iter()) {
        let features = row.to_vec();
        if model.predict_class(&features)? == *target {
            correct += 1;
        }
    }
    Ok(correct as f64 / records.nrows() as f64)
}

/// Random forest hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            seed: DEFAULT_SEED,
        }
    }
}

impl From<&PipelineConfig> for ForestParams {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            n_trees: config.n_trees.max(1),
            max_depth: config.max_depth,
            seed: config.seed,
        }
    }
}

/// Trainer for [`RandomForest`].
#[derive(Debug, Clone, Default)]
pub struct RandomForestTrainer {
    params: ForestParams,
}

impl RandomForestTrainer {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Fit a forest and return it as a concrete type.
    pub fn fit_forest(
        &self,
        records: &Array2<f64>,
        targets: &Array1<usize>,
        n_classes: usize,
    ) -> Result<RandomForest> {
        let rows = records.nrows();
        let cols = records.ncols();

        if rows == 0 || cols == 0 {
            return Err(VigilError::InsufficientData(format!(
                "Cannot fit a forest on a {}x{} matrix",
                rows, cols
            )));
        }
        if targets.len() != rows {
            return Err(VigilError::Classifier(format!(
                "Got {} targets for {} rows",
                targets.len(),
                rows
            )));
        }
        if let Some(bad) = targets.iter().find(|t| **t >= n_classes) {
            return Err(VigilError::Classifier(format!(
                "Target {} out of range for {} classes",
                bad, n_classes
            )));
        }

        let subspace = ((cols as f64).sqrt().round() as usize).clamp(1, cols);
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut trees = Vec::with_capacity(self.params.n_trees);

        for _ in 0..self.params.n_trees.max(1) {
            let sample: Vec<usize> = (0..rows).map(|_| rng.random_range(0..rows)).collect();
            let mut columns = rand::seq::index::sample(&mut rng, cols, subspace).into_vec();
            columns.sort_unstable();

            let x = records.select(Axis(0), &sample).select(Axis(1), &columns);
            let y = targets.select(Axis(0), &sample);
            let dataset = Dataset::new(x, y);

            let tree = DecisionTree::<f64, usize>::params()
                .max_depth(self.params.max_depth)
                .fit(&dataset)
                .map_err(|e| VigilError::Classifier(format!("Decision tree fit failed: {}", e)))?;

            trees.push(ForestTree { tree, columns });
        }

        debug!(
            trees = trees.len(),
            rows,
            cols,
            subspace,
            n_classes,
            "Fitted random forest"
        );

        Ok(RandomForest {
            trees,
            n_features: cols,
            n_classes,
        })
    }
}

impl ClassifierTrainer for RandomForestTrainer {
    fn fit(
        &self,
        records: &Array2<f64>,
        targets: &Array1<usize>,
        n_classes: usize,
    ) -> Result<Box<dyn Classifier>> {
        Ok(Box::new(self.fit_forest(records, targets, n_classes)?))
    }
}

struct ForestTree {
    tree: DecisionTree<f64, usize>,
    columns: Vec<usize>,
}

/// Bagged decision-tree ensemble.
pub struct RandomForest {
    trees: Vec<ForestTree>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl Classifier for RandomForest {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.n_features {
            return Err(VigilError::Classifier(format!(
                "Expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }

        let row = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| VigilError::Classifier(e.to_string()))?;

        let mut votes = vec![0usize; self.n_classes];
        for member in &self.trees {
            let x = row.select(Axis(1), &member.columns);
            let predicted: Array1<usize> = member.tree.predict(&x);
            if let Some(slot) = predicted.iter().next().and_then(|c| votes.get_mut(*c)) {
                *slot += 1;
            }
        }

        let total = self.trees.len().max(1) as f64;
        Ok(votes.into_iter().map(|v| v as f64 / total).collect())
    }
}
