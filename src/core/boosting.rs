//! Gradient-boosted regression trees
//!
//! Squared-error boosting: start from the target mean, then repeatedly fit a
//! depth-limited regression tree to the residuals and add a shrunken copy of
//! its prediction.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::ModelError;

/// Node of a fitted regression tree
#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: ArrayView1<f64>) -> f64 {
        match self {
            Node::Leaf(value) => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }
}

/// Best split found for a node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Reduction in sum of squared errors
    gain: f64,
}

/// Least-squares regression tree
#[derive(Debug, Clone)]
pub struct RegressionTree {
    root: Node,
}

impl RegressionTree {
    /// Fit a tree on the rows listed in `indices`
    pub fn fit(x: ArrayView2<f64>, y: &[f64], indices: &[usize], max_depth: usize) -> Self {
        Self {
            root: Self::build(x, y, indices.to_vec(), max_depth),
        }
    }

    pub fn predict(&self, row: ArrayView1<f64>) -> f64 {
        self.root.predict(row)
    }

    fn build(x: ArrayView2<f64>, y: &[f64], indices: Vec<usize>, depth: usize) -> Node {
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len().max(1) as f64;
        if depth == 0 || indices.len() < 2 {
            return Node::Leaf(mean);
        }

        let Some(split) = Self::best_split(x, y, &indices) else {
            return Node::Leaf(mean);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[[i, split.feature]] <= split.threshold);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(Self::build(x, y, left, depth - 1)),
            right: Box::new(Self::build(x, y, right, depth - 1)),
        }
    }

    /// Scan every feature for the threshold with the largest SSE reduction
    fn best_split(x: ArrayView2<f64>, y: &[f64], indices: &[usize]) -> Option<SplitCandidate> {
        let n = indices.len() as f64;
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let parent_score = total_sum * total_sum / n;

        let mut best: Option<SplitCandidate> = None;

        for feature in 0..x.ncols() {
            let mut order = indices.to_vec();
            order.sort_by(|&a, &b| {
                x[[a, feature]]
                    .partial_cmp(&x[[b, feature]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_sum = 0.0;
            for k in 0..order.len() - 1 {
                left_sum += y[order[k]];
                let current = x[[order[k], feature]];
                let next = x[[order[k + 1], feature]];
                if current == next {
                    continue;
                }

                let left_n = (k + 1) as f64;
                let right_n = n - left_n;
                let right_sum = total_sum - left_sum;
                // SSE reduction = sum²_L/n_L + sum²_R/n_R - sum²/n
                let gain = left_sum * left_sum / left_n + right_sum * right_sum / right_n
                    - parent_score;

                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (current + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// Gradient boosting regressor with squared-error loss
#[derive(Debug, Clone)]
pub struct GradientBoostingRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    init: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    pub fn new(n_estimators: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self {
            n_estimators,
            learning_rate,
            max_depth,
            init: 0.0,
            trees: Vec::new(),
        }
    }

    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<(), ModelError> {
        if x.nrows() != y.len() {
            return Err(ModelError::ShapeMismatch {
                rows: x.nrows(),
                targets: y.len(),
            });
        }
        if y.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let target = y.to_vec();
        let indices: Vec<usize> = (0..target.len()).collect();

        self.init = target.iter().sum::<f64>() / target.len() as f64;
        self.trees.clear();

        let mut predictions = vec![self.init; target.len()];
        for _ in 0..self.n_estimators {
            let residuals: Vec<f64> = target
                .iter()
                .zip(&predictions)
                .map(|(t, p)| t - p)
                .collect();

            let tree = RegressionTree::fit(x, &residuals, &indices, self.max_depth);
            for (i, prediction) in predictions.iter_mut().enumerate() {
                *prediction += self.learning_rate * tree.predict(x.row(i));
            }
            self.trees.push(tree);
        }

        Ok(())
    }

    pub fn predict(&self, row: ArrayView1<f64>) -> f64 {
        self.init
            + self
                .trees
                .iter()
                .map(|tree| self.learning_rate * tree.predict(row))
                .sum::<f64>()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Shuffle row indices with a seeded RNG and split off a hold-out set
///
/// Returns (train, test). The test set has `ceil(n * test_fraction)` rows.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let n_test = n_test.min(n);
    let train = indices.split_off(n_test);
    (train, indices)
}

/// Root mean squared error
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    Some(mse.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_tree_single_split() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = [1.0, 1.0, 1.0, 5.0, 5.0, 5.0];
        let indices: Vec<usize> = (0..6).collect();

        let tree = RegressionTree::fit(x.view(), &y, &indices, 1);

        assert!((tree.predict(array![2.0].view()) - 1.0).abs() < 1e-9);
        assert!((tree.predict(array![11.0].view()) - 5.0).abs() < 1e-9);
        // Threshold sits halfway between 3 and 10
        assert!((tree.predict(array![6.4].view()) - 1.0).abs() < 1e-9);
        assert!((tree.predict(array![6.6].view()) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_tree_constant_feature_is_leaf() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = [1.0, 2.0, 3.0];
        let tree = RegressionTree::fit(x.view(), &y, &[0, 1, 2], 3);
        assert!((tree.predict(array![1.0].view()) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_boosting_beats_mean() {
        // position ≈ grid with a little noise from laps
        let n = 40;
        let mut x = Array2::<f64>::zeros((n, 2));
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let grid = (i % 20 + 1) as f64;
            x[[i, 0]] = grid;
            x[[i, 1]] = 50.0 + (i % 7) as f64;
            y.push(grid);
        }
        let y = ndarray::Array1::from(y);

        let mut model = GradientBoostingRegressor::new(100, 0.1, 3);
        model.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.n_trees(), 100);

        let predictions: Vec<f64> = (0..n).map(|i| model.predict(x.row(i))).collect();
        let mean = y.mean().unwrap();
        let model_rmse = rmse(y.as_slice().unwrap(), &predictions).unwrap();
        let mean_rmse = rmse(y.as_slice().unwrap(), &vec![mean; n]).unwrap();

        assert!(model_rmse < mean_rmse / 4.0);
        assert!(model.predict(array![1.0, 55.0].view()) < model.predict(array![20.0, 55.0].view()));
    }

    #[test]
    fn test_boosting_rejects_bad_input() {
        let x = Array2::<f64>::zeros((0, 4));
        let y = ndarray::Array1::<f64>::zeros(0);
        let mut model = GradientBoostingRegressor::new(10, 0.1, 3);
        assert!(matches!(
            model.fit(x.view(), y.view()),
            Err(ModelError::EmptyTrainingSet)
        ));

        let x = Array2::<f64>::zeros((3, 4));
        let y = ndarray::Array1::<f64>::zeros(2);
        assert!(matches!(
            model.fit(x.view(), y.view()),
            Err(ModelError::ShapeMismatch { rows: 3, targets: 2 })
        ));
    }

    #[test]
    fn test_train_test_split() {
        let (train, test) = train_test_split(10, 0.3, 42);
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);

        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort();
        assert_eq!(all, (0..10).collect::<Vec<_>>());

        // Same seed, same split
        assert_eq!(train_test_split(10, 0.3, 42), (train, test));
    }

    #[test]
    fn test_train_test_split_without_holdout() {
        let (train, test) = train_test_split(5, 0.0, 7);
        assert_eq!(train.len(), 5);
        assert!(test.is_empty());
    }

    #[test]
    fn test_rmse() {
        assert!((rmse(&[1.0, 2.0], &[1.0, 4.0]).unwrap() - 2f64.sqrt()).abs() < 1e-9);
        assert_eq!(rmse(&[], &[]), None);
        assert_eq!(rmse(&[1.0], &[1.0, 2.0]), None);
    }
}
