//! CART regression tree
//!
//! Nodes are stored flat in pre-order. A split sends a row left when
//! `features[feature] <= threshold`, otherwise right. Splits are chosen to
//! minimise the summed squared error of the two children.

use crate::error::{ForecastError, Result};

/// Growth limits for a regression tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// Maximum depth, unbounded when `None`
    pub max_depth: Option<usize>,
    /// Minimum rows a node needs before it may split
    pub min_samples_split: usize,
    /// Minimum rows on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// A single node in the tree
#[derive(Debug, Clone, PartialEq)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    sse: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Fitted regression tree
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
}

impl RegressionTree {
    /// Fit a tree on the rows of `x` selected by `indices` (repeats allowed)
    pub fn fit(x: &[Vec<f64>], y: &[f64], indices: &[usize], params: &TreeParams) -> Result<Self> {
        if indices.is_empty() {
            return Err(ForecastError::Training(
                "Cannot fit a tree on zero rows".to_string(),
            ));
        }

        let n_features = x.first().map(Vec::len).unwrap_or(0);
        let mut tree = Self {
            nodes: Vec::new(),
            n_features,
        };
        tree.grow(x, y, indices.to_vec(), 0, params);

        Ok(tree)
    }

    /// Predict the target for one feature vector
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Number of nodes, leaves included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: Vec<usize>,
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let node = self.nodes.len();
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64;
        self.nodes.push(TreeNode::Leaf { value: mean });

        let depth_reached = params.max_depth.map_or(false, |max| depth >= max);
        if depth_reached || indices.len() < params.min_samples_split {
            return node;
        }

        let parent_sse: f64 = indices.iter().map(|&i| (y[i] - mean).powi(2)).sum();
        if parent_sse <= f64::EPSILON {
            return node;
        }

        let Some(split) = self.best_split(x, y, &indices, params) else {
            return node;
        };
        if split.sse >= parent_sse {
            return node;
        }

        let left = self.grow(x, y, split.left, depth + 1, params);
        let right = self.grow(x, y, split.right, depth + 1, params);
        self.nodes[node] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        node
    }

    fn best_split(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        params: &TreeParams,
    ) -> Option<BestSplit> {
        let n = indices.len();
        let min_leaf = params.min_samples_leaf.max(1);
        if n < 2 * min_leaf {
            return None;
        }

        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();

        let mut best: Option<(usize, f64, f64)> = None;
        let mut sorted = indices.to_vec();

        for feature in 0..self.n_features {
            sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 1..n {
                let prev = sorted[k - 1];
                left_sum += y[prev];
                left_sq += y[prev] * y[prev];

                if k < min_leaf || n - k < min_leaf {
                    continue;
                }

                let lo = x[prev][feature];
                let hi = x[sorted[k]][feature];
                if lo >= hi {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / k as f64)
                    + (right_sq - right_sum * right_sum / (n - k) as f64);

                if best.map_or(true, |(_, _, best_sse)| sse < best_sse) {
                    best = Some((feature, (lo + hi) / 2.0, sse));
                }
            }
        }

        let (feature, threshold, sse) = best?;
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| x[i][feature] <= threshold);

        Some(BestSplit {
            feature,
            threshold,
            sse,
            left,
            right,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_learns_step_function() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| if i < 10 { 5.0 } else { 50.0 }).collect();
        let indices: Vec<usize> = (0..20).collect();

        let tree = RegressionTree::fit(&x, &y, &indices, &TreeParams::default()).unwrap();
        assert_eq!(tree.predict(&[3.0]), 5.0);
        assert_eq!(tree.predict(&[15.0]), 50.0);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64, 1.0]).collect();
        let y = vec![7.0; 5];
        let indices: Vec<usize> = (0..5).collect();

        let tree = RegressionTree::fit(&x, &y, &indices, &TreeParams::default()).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict(&[100.0, 0.0]), 7.0);
    }

    #[test]
    fn test_depth_limit() {
        let x: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let indices: Vec<usize> = (0..8).collect();
        let params = TreeParams {
            max_depth: Some(0),
            ..TreeParams::default()
        };

        let tree = RegressionTree::fit(&x, &y, &indices, &params).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict(&[0.0]), 3.5);
    }
}
