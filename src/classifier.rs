use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier expects {expected} features, got {got}")]
    BadShape { expected: usize, got: usize },
}

/// Outcome of a single binary classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// 0 = negative class, 1 = positive class.
    pub label: u8,
    /// Probability of the positive class, in [0.0, 1.0].
    pub probability: f64,
}

/// Unified inference seam: one trained model per disease type, read-only at
/// inference time.
pub trait Classifier: Send + Sync {
    /// Score a single ordered feature vector.
    fn predict(&self, input: &[f64]) -> Result<Prediction, ClassifierError>;

    fn num_features(&self) -> usize;

    /// False for placeholder artifacts that were never fitted.
    fn is_trained(&self) -> bool;
}

/// Logistic-regression model deserialized from a `<type>_model.json`
/// artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub trained: bool,
}

impl LogisticModel {
    /// Placeholder with all-zero coefficients. Still serves predictions
    /// (probability 0.5 for every input), matching the behavior of starting
    /// the service before any model has been fitted.
    pub fn untrained(num_features: usize) -> Self {
        Self {
            weights: vec![0.0; num_features],
            intercept: 0.0,
            trained: false,
        }
    }

    fn decision(&self, input: &[f64]) -> f64 {
        let dot: f64 = self
            .weights
            .iter()
            .zip(input.iter())
            .map(|(w, x)| w * x)
            .sum();
        self.intercept + dot
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticModel {
    fn predict(&self, input: &[f64]) -> Result<Prediction, ClassifierError> {
        if input.len() != self.weights.len() {
            return Err(ClassifierError::BadShape {
                expected: self.weights.len(),
                got: input.len(),
            });
        }

        let probability = sigmoid(self.decision(input));
        let label = u8::from(probability >= 0.5);

        Ok(Prediction { label, probability })
    }

    fn num_features(&self) -> usize {
        self.weights.len()
    }

    fn is_trained(&self) -> bool {
        self.trained
    }
}
