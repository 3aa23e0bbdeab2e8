//! Depth-limited regression trees used as boosting stages.
//!
//! Nodes live in a flat arena; node 0 is the root. A split sends a row left
//! when `row[feature] <= threshold`.

use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

/// A tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
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

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    improvement: f64,
}

impl RegressionTree {
    /// Fits a tree to `targets`. Leaves predict the mean target of their rows.
    ///
    /// Callers guarantee that `features` and `targets` are non-empty, of equal
    /// length and rectangular.
    #[must_use]
    pub fn fit(features: &[Vec<f64>], targets: &[f64], config: &TreeConfig) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let rows: Vec<usize> = (0..targets.len()).collect();
        tree.grow(features, targets, rows, 0, config);
        tree
    }

    /// Predicts a single row. Missing feature columns route right.
    #[must_use]
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes.get(id) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    id = match row.get(*feature) {
                        Some(x) if x <= threshold => *left,
                        _ => *right,
                    };
                }
                None => return 0.0,
            }
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the number of levels below the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, id: usize) -> usize {
        match self.nodes.get(id) {
            Some(Node::Split { left, right, .. }) => {
                1 + self.depth_from(*left).max(self.depth_from(*right))
            }
            _ => 0,
        }
    }

    /// Checks that every split references a valid feature and valid children.
    ///
    /// # Errors
    ///
    /// Returns a description of the first inconsistency found.
    pub fn validate(&self, width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= width {
                        return Err(format!("node {id} splits on feature {feature} of {width}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {id} has a non-finite threshold"));
                    }
                    // Children are always appended after their parent.
                    if *left <= id || *right <= id || *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {id} has invalid children"));
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {id} has a non-finite value"));
                    }
                }
            }
        }
        Ok(())
    }

    fn grow(
        &mut self,
        features: &[Vec<f64>],
        targets: &[f64],
        rows: Vec<usize>,
        depth: usize,
        config: &TreeConfig,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: mean(targets, &rows),
        });

        if depth >= config.max_depth || rows.len() < config.min_samples_split {
            return id;
        }

        let Some(split) = best_split(features, targets, &rows, config.min_samples_leaf) else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| features[i][split.feature] <= split.threshold);

        let left = self.grow(features, targets, left_rows, depth + 1, config);
        let right = self.grow(features, targets, right_rows, depth + 1, config);

        if let Some(node) = self.nodes.get_mut(id) {
            *node = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
        }
        id
    }
}

fn mean(targets: &[f64], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|&i| targets[i]).sum::<f64>() / rows.len() as f64
}

/// Finds the split with the largest Friedman improvement
/// `n_l * n_r / n * (mean_l - mean_r)^2`.
///
/// Ties keep the earliest candidate, i.e. the lowest feature index and then the
/// lowest threshold. Returns `None` for pure nodes and nodes with no valid
/// split.
fn best_split(
    features: &[Vec<f64>],
    targets: &[f64],
    rows: &[usize],
    min_samples_leaf: usize,
) -> Option<Split> {
    let n = rows.len();
    let first = *rows.first()?;
    let width = features[first].len();

    let total: f64 = rows.iter().map(|&i| targets[i]).sum();
    let node_mean = total / n as f64;
    if rows.iter().all(|&i| (targets[i] - node_mean).abs() <= f64::EPSILON * node_mean.abs()) {
        return None;
    }

    let min_leaf = min_samples_leaf.max(1);
    let mut order = rows.to_vec();
    let mut best: Option<Split> = None;

    for feature in 0..width {
        order.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

        let mut left_sum = 0.0;
        for (pos, pair) in order.windows(2).enumerate() {
            let (current, next) = (pair[0], pair[1]);
            left_sum += targets[current];

            let left_n = pos + 1;
            let right_n = n - left_n;
            if left_n < min_leaf || right_n < min_leaf {
                continue;
            }

            let lo = features[current][feature];
            let hi = features[next][feature];
            if hi <= lo {
                continue;
            }

            let diff = left_sum / left_n as f64 - (total - left_sum) / right_n as f64;
            let improvement = (left_n * right_n) as f64 / n as f64 * diff * diff;

            if best.is_none_or(|b| improvement > b.improvement) {
                // Adjacent floats have no midpoint strictly below `hi`.
                let mid = lo + (hi - lo) / 2.0;
                best = Some(Split {
                    feature,
                    threshold: if mid < hi { mid } else { lo },
                    improvement,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const CONFIG: TreeConfig = TreeConfig {
        max_depth: 3,
        min_samples_split: 2,
        min_samples_leaf: 1,
    };

    #[test]
    fn test_step_function_is_learned_exactly() {
        let features: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i)]).collect();
        let targets: Vec<f64> = (0..10).map(|i| if i < 5 { 1.0 } else { 9.0 }).collect();

        let tree = RegressionTree::fit(&features, &targets, &CONFIG);

        assert_eq!(tree.depth(), 1);
        assert!(matches!(
            tree.nodes()[0],
            Node::Split { feature: 0, threshold, .. } if (threshold - 4.5).abs() < 1e-12
        ));
        assert!((tree.predict_row(&[2.0]) - 1.0).abs() < 1e-12);
        assert!((tree.predict_row(&[7.0]) - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_picks_informative_feature() {
        // Feature 0 is noise, feature 1 determines the target.
        let features = vec![
            vec![1.0, 0.0],
            vec![0.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
        ];
        let targets = vec![10.0, 10.0, 20.0, 20.0];

        let tree = RegressionTree::fit(&features, &targets, &CONFIG);
        assert!(matches!(tree.nodes()[0], Node::Split { feature: 1, .. }));
    }

    #[test]
    fn test_pure_node_is_a_leaf() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let targets = vec![5.0, 5.0, 5.0];

        let tree = RegressionTree::fit(&features, &targets, &CONFIG);
        assert_eq!(tree.nodes().len(), 1);
        assert!((tree.predict_row(&[100.0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_depth_is_limited() {
        let features: Vec<Vec<f64>> = (0..64).map(|i| vec![f64::from(i)]).collect();
        let targets: Vec<f64> = (0..64).map(|i| f64::from(i * i)).collect();

        for max_depth in 1..=4 {
            let config = TreeConfig { max_depth, ..CONFIG };
            let tree = RegressionTree::fit(&features, &targets, &config);
            assert_eq!(tree.depth(), max_depth);
            assert!(tree.validate(1).is_ok());
        }
    }

    #[test]
    fn test_min_samples_leaf() {
        let features: Vec<Vec<f64>> = (0..4).map(|i| vec![f64::from(i)]).collect();
        let targets = vec![0.0, 0.0, 0.0, 100.0];

        let config = TreeConfig {
            max_depth: 1,
            min_samples_split: 2,
            min_samples_leaf: 2,
        };
        let tree = RegressionTree::fit(&features, &targets, &config);
        assert!(matches!(
            tree.nodes()[0],
            Node::Split { threshold, .. } if (threshold - 1.5).abs() < 1e-12
        ));
    }

    #[test]
    fn test_constant_features_cannot_split() {
        let features = vec![vec![3.0], vec![3.0], vec![3.0]];
        let targets = vec![1.0, 2.0, 3.0];

        let tree = RegressionTree::fit(&features, &targets, &CONFIG);
        assert_eq!(tree.nodes().len(), 1);
        assert!((tree.predict_row(&[3.0]) - 2.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_predictions_stay_within_target_range(
            rows in proptest::collection::vec(
                (proptest::collection::vec(-100.0_f64..100.0, 3), -1e4_f64..1e4),
                2..40,
            ),
            max_depth in 1_usize..5,
        ) {
            let (features, targets): (Vec<Vec<f64>>, Vec<f64>) = rows.into_iter().unzip();
            let config = TreeConfig { max_depth, ..CONFIG };
            let tree = RegressionTree::fit(&features, &targets, &config);

            let lo = targets.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = targets.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(tree.depth() <= max_depth);
            prop_assert!(tree.validate(3).is_ok());
            for row in &features {
                let p = tree.predict_row(row);
                prop_assert!(p >= lo - 1e-6 && p <= hi + 1e-6);
            }
        }
    }

    #[test]
    fn test_validate_rejects_bad_feature_index() {
        let features: Vec<Vec<f64>> = (0..4).map(|i| vec![0.0, f64::from(i)]).collect();
        let targets = vec![1.0, 1.0, 5.0, 5.0];

        let tree = RegressionTree::fit(&features, &targets, &CONFIG);
        assert!(tree.validate(2).is_ok());
        assert!(tree.validate(1).is_err());
    }
}
