//! Held-out evaluation: accuracy, confusion matrix, per-class scores.

use std::fmt;

use super::{Classifier, FeatureMatrix};
use crate::domain::error::SigtraderError;

pub const CLASS_LABELS: [&str; 2] = ["No Buy", "Buy"];

#[derive(Debug, Clone, PartialEq)]
pub struct ClassReport {
    pub label: &'static str,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelEvaluation {
    pub accuracy: f64,
    /// `confusion[actual][predicted]`.
    pub confusion: [[usize; 2]; 2],
    pub classes: [ClassReport; 2],
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl ModelEvaluation {
    pub fn from_predictions(actual: &[u8], predicted: &[u8]) -> Result<Self, SigtraderError> {
        if actual.len() != predicted.len() {
            return Err(SigtraderError::Model {
                reason: format!(
                    "{} labels but {} predictions",
                    actual.len(),
                    predicted.len()
                ),
            });
        }

        let mut confusion = [[0usize; 2]; 2];
        for (&a, &p) in actual.iter().zip(predicted) {
            confusion[usize::from(a == 1)][usize::from(p == 1)] += 1;
        }

        let correct = confusion[0][0] + confusion[1][1];
        let class = |c: usize| {
            let tp = confusion[c][c];
            let predicted_c = confusion[0][c] + confusion[1][c];
            let support = confusion[c][0] + confusion[c][1];
            let precision = ratio(tp, predicted_c);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassReport {
                label: CLASS_LABELS[c],
                precision,
                recall,
                f1,
                support,
            }
        };

        Ok(ModelEvaluation {
            accuracy: ratio(correct, actual.len()),
            confusion,
            classes: [class(0), class(1)],
        })
    }

    /// Mean (precision, recall, f1) across classes, optionally weighted by
    /// support.
    pub fn average(&self, weighted: bool) -> (f64, f64, f64) {
        let total = self.support();
        let weight = |c: &ClassReport| {
            if !weighted {
                0.5
            } else if total == 0 {
                0.0
            } else {
                c.support as f64 / total as f64
            }
        };
        self.classes.iter().fold((0.0, 0.0, 0.0), |(p, r, f), c| {
            let w = weight(c);
            (p + w * c.precision, r + w * c.recall, f + w * c.f1)
        })
    }

    pub fn support(&self) -> usize {
        self.classes.iter().map(|c| c.support).sum()
    }

    /// Text report: per-class precision/recall/f1/support, then accuracy and
    /// macro/weighted averages.
    pub fn classification_report(&self) -> String {
        let total = self.support();
        let mut out = format!(
            "{:>12} {:>9} {:>9} {:>9} {:>9}\n\n",
            "", "precision", "recall", "f1-score", "support"
        );
        for c in &self.classes {
            out.push_str(&format!(
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
                c.label, c.precision, c.recall, c.f1, c.support
            ));
        }
        out.push('\n');
        out.push_str(&format!(
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}\n",
            "accuracy", "", "", self.accuracy, total
        ));

        for (name, weighted) in [("macro avg", false), ("weighted avg", true)] {
            let (precision, recall, f1) = self.average(weighted);
            out.push_str(&format!(
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
                name, precision, recall, f1, total
            ));
        }
        out
    }
}

impl fmt::Display for ModelEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;
        writeln!(f, "Classification Report:")?;
        write!(f, "{}", self.classification_report())?;
        writeln!(f, "Confusion Matrix:")?;
        writeln!(f, "  [[{} {}]", self.confusion[0][0], self.confusion[0][1])?;
        write!(f, "   [{} {}]]", self.confusion[1][0], self.confusion[1][1])
    }
}

pub fn evaluate_model(
    model: &dyn Classifier,
    x_test: &FeatureMatrix,
    y_test: &[u8],
) -> Result<ModelEvaluation, SigtraderError> {
    let predicted = model.predict(x_test)?;
    ModelEvaluation::from_predictions(y_test, &predicted)
}
