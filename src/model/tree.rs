//! Gradient-boosted regression trees stored as JSON.
//!
//! Nodes are addressed by index within their tree; node 0 is the root. Split
//! nodes send an observation left when `x[feature] <= threshold`. Children
//! must have larger indices than their parent, which keeps every walk finite.

use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};

use super::Regressor;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Leaf {
        leaf: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn validate(&self, index: usize, n_features: Option<usize>) -> anyhow::Result<()> {
        ensure!(!self.nodes.is_empty(), "tree {index} has no nodes");
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                for child in [*left, *right] {
                    ensure!(
                        child > i && child < self.nodes.len(),
                        "tree {index} node {i} has invalid child {child}"
                    );
                }
                if let Some(n) = n_features {
                    ensure!(
                        *feature < n,
                        "tree {index} node {i} splits on feature {feature} of {n}"
                    );
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, row: &[f64]) -> anyhow::Result<f64> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { leaf }) => return Ok(*leaf),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let Some(x) = row.get(*feature) else {
                        bail!("split on feature {feature} but row has {} values", row.len());
                    };
                    idx = if *x <= *threshold { *left } else { *right };
                }
                None => bail!("node index {idx} out of range"),
            }
        }
    }
}

fn default_learning_rate() -> f64 {
    1.0
}

/// Additive tree ensemble: `base_score + learning_rate * sum(tree(x))`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_score: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub n_features: Option<usize>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub trees: Vec<RegressionTree>,
}

impl TreeEnsemble {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.trees.is_empty(), "tree ensemble has no trees");
        if let (Some(n), Some(names)) = (self.n_features, &self.feature_names) {
            ensure!(
                n == names.len(),
                "n_features is {n} but {} feature names are listed",
                names.len()
            );
        }
        let n = self.n_features();
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, n)?;
        }
        Ok(())
    }
}

impl Regressor for TreeEnsemble {
    fn kind(&self) -> &'static str {
        "tree_ensemble"
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
            .or_else(|| self.feature_names.as_ref().map(Vec::len))
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_row(&self, row: &[f64]) -> anyhow::Result<f64> {
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.evaluate(row)?;
        }
        Ok(self.base_score + self.learning_rate * sum)
    }
}
