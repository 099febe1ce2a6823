//! Candidate catalogue: a named preprocessing step plus a hyperparameter grid

use crate::model::{
    ClassWeight, ClassifierParams, LogisticParams, NeuralNetParams, Penalty, PipelineSpec,
    Preprocessing,
};

/// One model family and the configurations to search over
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub preprocessing: Preprocessing,
    pub grid: Vec<ClassifierParams>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, preprocessing: Preprocessing, grid: Vec<ClassifierParams>) -> Self {
        Candidate {
            name: name.into(),
            preprocessing,
            grid,
        }
    }

    /// Pipelines in grid order
    pub fn specs(&self) -> Vec<PipelineSpec> {
        self.grid
            .iter()
            .map(|&classifier| PipelineSpec {
                preprocessing: self.preprocessing,
                classifier,
            })
            .collect()
    }
}

const CLASS_WEIGHTS: [ClassWeight; 2] = [ClassWeight::Uniform, ClassWeight::Balanced];

pub fn logistic_regression() -> Candidate {
    let mut grid = Vec::new();
    for penalty in [Penalty::L1, Penalty::L2] {
        for strength in [0.001, 0.01, 0.1] {
            for class_weight in CLASS_WEIGHTS {
                grid.push(ClassifierParams::Logistic(LogisticParams {
                    penalty,
                    strength,
                    class_weight,
                    ..LogisticParams::default()
                }));
            }
        }
    }
    Candidate::new("logistic_regression", Preprocessing::Standardize, grid)
}

pub fn neural_net() -> Candidate {
    let mut grid = Vec::new();
    for hidden in [8, 16] {
        for learning_rate in [0.05, 0.1] {
            for epochs in [200, 400] {
                for class_weight in CLASS_WEIGHTS {
                    grid.push(ClassifierParams::NeuralNet(NeuralNetParams {
                        hidden,
                        learning_rate,
                        epochs,
                        class_weight,
                    }));
                }
            }
        }
    }
    Candidate::new("neural_net", Preprocessing::Standardize, grid)
}

/// All candidates in declaration order; ties in selection go to the earlier entry
pub fn catalogue() -> Vec<Candidate> {
    vec![logistic_regression(), neural_net()]
}

/// Fixed pipeline the evaluation report cross-validates as a baseline
pub fn baseline() -> PipelineSpec {
    PipelineSpec {
        preprocessing: Preprocessing::Standardize,
        classifier: ClassifierParams::Logistic(LogisticParams::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_order_and_sizes() {
        let candidates = catalogue();
        let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["logistic_regression", "neural_net"]);
        assert_eq!(candidates[0].grid.len(), 12);
        assert_eq!(candidates[1].grid.len(), 16);
    }

    #[test]
    fn test_specs_carry_preprocessing() {
        let candidate = logistic_regression();
        let specs = candidate.specs();
        assert_eq!(specs.len(), candidate.grid.len());
        assert!(specs
            .iter()
            .all(|s| s.preprocessing == Preprocessing::Standardize));
        assert_eq!(specs[0].classifier, candidate.grid[0]);
    }
}
