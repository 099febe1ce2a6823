//! Classification metrics: accuracy, ROC AUC, confusion matrix, per-class report

use std::fmt;

/// Binary confusion matrix, wins are the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_wins: usize,
    pub false_wins: usize,
    pub true_losses: usize,
    pub false_losses: usize,
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_predictions(predicted: &[bool], actual: &[bool]) -> Self {
        let mut matrix = Self::new();
        for (&p, &a) in predicted.iter().zip(actual.iter()) {
            matrix.update(p, a);
        }
        matrix
    }

    pub fn update(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.true_wins += 1,
            (true, false) => self.false_wins += 1,
            (false, false) => self.true_losses += 1,
            (false, true) => self.false_losses += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_wins + self.false_wins + self.true_losses + self.false_losses
    }

    pub fn accuracy(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            (self.true_wins + self.true_losses) as f64 / self.total() as f64
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "              pred lose  pred win")?;
        writeln!(
            f,
            "actual lose   {:>9}  {:>8}",
            self.true_losses, self.false_wins
        )?;
        write!(
            f,
            "actual win    {:>9}  {:>8}",
            self.false_losses, self.true_wins
        )
    }
}

/// Fraction of predictions that match
pub fn accuracy(predicted: &[bool], actual: &[bool]) -> f64 {
    ConfusionMatrix::from_predictions(predicted, actual).accuracy()
}

/// Area under the ROC curve via the rank-sum statistic, with tied scores sharing their
/// average rank. `None` when only one class is present.
pub fn roc_auc(scores: &[f32], actual: &[bool]) -> Option<f64> {
    let positives = actual.iter().filter(|&&y| y).count();
    let negatives = actual.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // ranks are 1-based; the tied block i..=j shares the mean rank
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if actual[idx] {
                positive_rank_sum += rank;
            }
        }
        i = j + 1;
    }

    let p = positives as f64;
    let u = positive_rank_sum - p * (p + 1.0) / 2.0;
    Some(u / (p * negatives as f64))
}

/// Mean and population standard deviation
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Precision / recall / F1 for one class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub label: &'static str,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn new(label: &'static str, hits: usize, predicted: usize, support: usize) -> Self {
        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let precision = ratio(hits, predicted);
        let recall = ratio(hits, support);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassMetrics {
            label,
            precision,
            recall,
            f1,
            support,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub lose: ClassMetrics,
    pub win: ClassMetrics,
    pub accuracy: f64,
}

impl ClassificationReport {
    pub fn from_confusion(m: &ConfusionMatrix) -> Self {
        ClassificationReport {
            lose: ClassMetrics::new(
                "lose",
                m.true_losses,
                m.true_losses + m.false_losses,
                m.true_losses + m.false_wins,
            ),
            win: ClassMetrics::new(
                "win",
                m.true_wins,
                m.true_wins + m.false_wins,
                m.true_wins + m.false_losses,
            ),
            accuracy: m.accuracy(),
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>8} {:>10} {:>8} {:>8} {:>8}", "", "precision", "recall", "f1", "support")?;
        for c in [&self.lose, &self.win] {
            writeln!(
                f,
                "{:>8} {:>10.3} {:>8.3} {:>8.3} {:>8}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        write!(
            f,
            "{:>8} {:>10} {:>8} {:>8.3} {:>8}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.lose.support + self.win.support
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_auc_perfect_and_inverted() {
        let y = [false, false, true, true];
        assert_approx_eq!(roc_auc(&[0.1, 0.2, 0.8, 0.9], &y).unwrap(), 1.0);
        assert_approx_eq!(roc_auc(&[0.9, 0.8, 0.2, 0.1], &y).unwrap(), 0.0);
    }

    #[test]
    fn test_auc_ties_count_half() {
        let y = [false, true];
        assert_approx_eq!(roc_auc(&[0.5, 0.5], &y).unwrap(), 0.5);

        // one positive ties a negative, one ranks above everything
        let y = [false, false, true, true];
        assert_approx_eq!(roc_auc(&[0.1, 0.6, 0.6, 0.9], &y).unwrap(), 0.875);
    }

    #[test]
    fn test_auc_single_class() {
        assert!(roc_auc(&[0.2, 0.7], &[true, true]).is_none());
    }

    #[test]
    fn test_confusion_and_report() {
        let predicted = [true, true, false, false, true];
        let actual = [true, false, false, true, true];
        let m = ConfusionMatrix::from_predictions(&predicted, &actual);
        assert_eq!(m.true_wins, 2);
        assert_eq!(m.false_wins, 1);
        assert_eq!(m.true_losses, 1);
        assert_eq!(m.false_losses, 1);
        assert_approx_eq!(m.accuracy(), 0.6);
        assert_approx_eq!(accuracy(&predicted, &actual), 0.6);

        let report = ClassificationReport::from_confusion(&m);
        assert_approx_eq!(report.win.precision, 2.0 / 3.0);
        assert_approx_eq!(report.win.recall, 2.0 / 3.0);
        assert_eq!(report.win.support, 3);
        assert_approx_eq!(report.lose.precision, 0.5);
        assert_approx_eq!(report.lose.recall, 0.5);
        assert_eq!(report.lose.support, 2);
    }

    #[test]
    fn test_report_without_predicted_wins() {
        let m = ConfusionMatrix::from_predictions(&[false, false], &[true, false]);
        let report = ClassificationReport::from_confusion(&m);
        assert_eq!(report.win.precision, 0.0);
        assert_eq!(report.win.f1, 0.0);
        assert!(report.to_string().contains("accuracy"));
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[0.5, 0.7, 0.9]);
        assert_approx_eq!(mean, 0.7);
        assert_approx_eq!(std, (0.08f64 / 3.0).sqrt());
    }
}
