//! Label encoding.
//!
//! Class names are encoded by ascending lexicographic order, so the encoding
//! only depends on the set of names seen, never on their order or
//! multiplicity in the training data.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VigilError};

/// Label of the impaired class.
pub const LABEL_DRUNK: &str = "drunk";

/// Label of the baseline class.
pub const LABEL_SOBER: &str = "sober";

/// Collections scanned for training, in scan order.
pub const TRAINING_LABELS: [&str; 2] = [LABEL_DRUNK, LABEL_SOBER];

/// Bidirectional mapping between class names and integer codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpace {
    classes: Vec<String>,
}

impl LabelSpace {
    /// An unfitted label space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit on `labels` and return their encodings.
    ///
    /// Replaces any previous fit. Fails with `InsufficientData` for an empty input.
    pub fn fit<S: AsRef<str>>(&mut self, labels: &[S]) -> Result<Vec<usize>> {
        if labels.is_empty() {
            return Err(VigilError::InsufficientData(
                "Cannot fit a label space on zero labels".into(),
            ));
        }

        let distinct: BTreeSet<&str> = labels.iter().map(|l| l.as_ref()).collect();
        self.classes = distinct.into_iter().map(str::to_string).collect();

        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    /// Build an already-fitted label space from `labels`.
    pub fn fitted<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        let mut space = Self::new();
        space.fit(labels)?;
        Ok(space)
    }

    pub fn is_fitted(&self) -> bool {
        !self.classes.is_empty()
    }

    /// Integer code of `name`.
    pub fn encode(&self, name: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(name))
            .map_err(|_| VigilError::UnknownLabel(name.to_string()))
    }

    /// Class name of `index`.
    pub fn decode(&self, index: usize) -> Result<&str> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| VigilError::UnknownLabel(format!("#{}", index)))
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class names in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_is_lexicographic() {
        let mut space = LabelSpace::new();
        let encoded = space.fit(&["sober", "drunk", "sober"]).unwrap();

        assert_eq!(encoded, vec![1, 0, 1]);
        assert_eq!(space.encode("drunk").unwrap(), 0);
        assert_eq!(space.encode("sober").unwrap(), 1);
        assert_eq!(space.decode(0).unwrap(), "drunk");
        assert_eq!(space.decode(1).unwrap(), "sober");
    }

    #[test]
    fn test_fit_independent_of_order() {
        let a = LabelSpace::fitted(&["drunk", "sober"]).unwrap();
        let b = LabelSpace::fitted(&["sober", "sober", "drunk", "drunk"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_refit_replaces_previous() {
        let mut space = LabelSpace::fitted(&["drunk", "sober"]).unwrap();
        space.fit(&["sober"]).unwrap();
        assert_eq!(space.len(), 1);
        assert_eq!(space.encode("sober").unwrap(), 0);
        assert!(matches!(
            space.encode("drunk"),
            Err(VigilError::UnknownLabel(_))
        ));
    }

    #[test]
    fn test_unfitted_queries_fail() {
        let space = LabelSpace::new();
        assert!(!space.is_fitted());
        assert!(matches!(
            space.encode("drunk"),
            Err(VigilError::UnknownLabel(_))
        ));
        assert!(matches!(space.decode(0), Err(VigilError::UnknownLabel(_))));
    }

    #[test]
    fn test_fit_empty_is_insufficient() {
        let mut space = LabelSpace::new();
        let empty: [&str; 0] = [];
        assert!(matches!(
            space.fit(&empty),
            Err(VigilError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_training_labels_sorted() {
        let space = LabelSpace::fitted(&TRAINING_LABELS).unwrap();
        assert_eq!(space.classes(), &["drunk".to_string(), "sober".to_string()]);
    }
}
