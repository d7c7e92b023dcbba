//! Run configuration.
//!
//! Provides serde-based TOML configuration parsing for a benchmark run: a
//! `[run]` table with the sweep parameters and one `[[algorithm]]` table
//! per algorithm instance, tagged by `kind`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use djmatch_algorithms::{
    Aggregate, BatchIterativeGreedy, BatchNodeCentered, DisjointMatching, DynamicGreedy,
    InvariantGreedy, IterativeGreedy, KEdgeColoring, MatchingConfig, NodeCentered, QueueKind,
    RunMode,
};

/// Root configuration for a djmatch run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub run: MatchingConfig,

    #[serde(default, rename = "algorithm")]
    pub algorithms: Vec<AlgorithmSpec>,
}

/// One configured algorithm instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlgorithmSpec {
    Greedy {
        #[serde(default)]
        local_swaps: bool,
    },
    BatchGreedy {
        #[serde(default)]
        local_swaps: bool,
    },
    NodeCentered {
        aggregate: Aggregate,
        threshold: f64,
    },
    BatchNodeCentered {
        aggregate: Aggregate,
        threshold: f64,
    },
    KEdgeColoring {
        #[serde(default = "default_true")]
        common_color: bool,
        #[serde(default)]
        rotate_long: bool,
        #[serde(default)]
        post_process: bool,
    },
    DynKEdgeColoring {
        #[serde(default = "default_true")]
        common_color: bool,
        #[serde(default)]
        rotate_long: bool,
        #[serde(default)]
        post_process: bool,
        #[serde(default)]
        improved_post_processing: bool,
        #[serde(default = "default_filter_threshold")]
        filter_threshold: f64,
        mode: RunMode,
        #[serde(default = "default_hybrid_threshold")]
        hybrid_threshold: f64,
    },
    DynGreedy {
        #[serde(default = "default_recursion_depth")]
        recursion_depth: u32,
        #[serde(default)]
        post_process: bool,
        #[serde(default)]
        improved_post_processing: bool,
        #[serde(default = "default_filter_threshold")]
        filter_threshold: f64,
        #[serde(default = "default_random_samples")]
        random_samples: usize,
    },
    InvariantGreedy {
        #[serde(default)]
        queue: QueueKind,
    },
}

fn default_true() -> bool {
    true
}

fn default_filter_threshold() -> f64 {
    2.0
}

fn default_hybrid_threshold() -> f64 {
    1.0
}

fn default_recursion_depth() -> u32 {
    1
}

fn default_random_samples() -> usize {
    3
}

impl RunConfig {
    /// Loads a configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(content).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validates parameter ranges before any algorithm runs.
    pub fn validate(&self) -> Result<()> {
        if self.algorithms.is_empty() {
            bail!("Configuration declares no algorithms");
        }
        if self.run.all_bs.is_empty() {
            bail!("all_bs must name at least one number of matchings");
        }
        for &b in &self.run.all_bs {
            if b == 0 || b > 64 {
                bail!("b = {b} is out of range [1, 64]");
            }
        }
        for spec in &self.algorithms {
            match spec {
                AlgorithmSpec::NodeCentered { threshold, .. }
                | AlgorithmSpec::BatchNodeCentered { threshold, .. } => {
                    if !(0.0..=1.0).contains(threshold) {
                        bail!("node-centered threshold {threshold} is out of range [0, 1]");
                    }
                }
                AlgorithmSpec::DynGreedy {
                    filter_threshold,
                    post_process,
                    improved_post_processing,
                    ..
                } => {
                    if *filter_threshold < 1.0 {
                        bail!("filter_threshold {filter_threshold} must be at least 1");
                    }
                    if *improved_post_processing && !post_process {
                        bail!("improved_post_processing requires post_process");
                    }
                }
                AlgorithmSpec::DynKEdgeColoring {
                    filter_threshold,
                    hybrid_threshold,
                    post_process,
                    improved_post_processing,
                    mode,
                    ..
                } => {
                    if *filter_threshold < 1.0 {
                        bail!("filter_threshold {filter_threshold} must be at least 1");
                    }
                    if *hybrid_threshold < 0.0 {
                        bail!("hybrid_threshold {hybrid_threshold} must be nonnegative");
                    }
                    if *improved_post_processing && !post_process {
                        bail!("improved_post_processing requires post_process");
                    }
                    if *mode == RunMode::Static {
                        bail!("dyn_k_edge_coloring mode must be dynamic or hybrid");
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Instantiates the configured algorithms.
    pub fn build_algorithms(&self) -> Vec<Box<dyn DisjointMatching>> {
        self.algorithms
            .iter()
            .map(|spec| {
                let algo: Box<dyn DisjointMatching> = match *spec {
                    AlgorithmSpec::Greedy { local_swaps } => {
                        Box::new(IterativeGreedy::new(local_swaps))
                    }
                    AlgorithmSpec::BatchGreedy { local_swaps } => {
                        Box::new(BatchIterativeGreedy::new(local_swaps))
                    }
                    AlgorithmSpec::NodeCentered {
                        aggregate,
                        threshold,
                    } => Box::new(NodeCentered::new(aggregate, threshold)),
                    AlgorithmSpec::BatchNodeCentered {
                        aggregate,
                        threshold,
                    } => Box::new(BatchNodeCentered::new(aggregate, threshold)),
                    AlgorithmSpec::KEdgeColoring {
                        common_color,
                        rotate_long,
                        post_process,
                    } => Box::new(KEdgeColoring::new(
                        RunMode::Static,
                        common_color,
                        rotate_long,
                        post_process,
                        false,
                        1.0,
                        1.0,
                    )),
                    AlgorithmSpec::DynKEdgeColoring {
                        common_color,
                        rotate_long,
                        post_process,
                        improved_post_processing,
                        filter_threshold,
                        mode,
                        hybrid_threshold,
                    } => Box::new(KEdgeColoring::new(
                        mode,
                        common_color,
                        rotate_long,
                        post_process,
                        improved_post_processing,
                        hybrid_threshold,
                        filter_threshold,
                    )),
                    AlgorithmSpec::DynGreedy {
                        recursion_depth,
                        post_process,
                        improved_post_processing,
                        filter_threshold,
                        random_samples,
                    } => Box::new(DynamicGreedy::new(
                        recursion_depth,
                        post_process,
                        improved_post_processing,
                        filter_threshold,
                        random_samples,
                    )),
                    AlgorithmSpec::InvariantGreedy { queue } => {
                        Box::new(InvariantGreedy::new(queue))
                    }
                };
                algo
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let content = r#"
[run]
all_bs = [2, 4]
seed = 7
sanity_check = true
count_coloring_ops = true

[[algorithm]]
kind = "greedy"
local_swaps = true

[[algorithm]]
kind = "invariant_greedy"
queue = "bucket"

[[algorithm]]
kind = "dyn_greedy"
recursion_depth = 2
post_process = true
improved_post_processing = true
filter_threshold = 1.5
random_samples = 0

[[algorithm]]
kind = "node_centered"
aggregate = "b_sum"
threshold = 0.2

[[algorithm]]
kind = "dyn_k_edge_coloring"
mode = "hybrid"
hybrid_threshold = 0.5
post_process = true
"#;
        let config = RunConfig::from_toml_str(content).unwrap();
        assert_eq!(config.run.all_bs, vec![2, 4]);
        assert_eq!(config.run.seed, 7);
        assert!(config.run.sanity_check);
        assert_eq!(config.algorithms.len(), 5);

        let algos = config.build_algorithms();
        assert_eq!(algos[0].name(), "GreedyIt-local");
        assert_eq!(algos[1].name(), "batch-invariant-greedy-bq");
        assert_eq!(algos[2].name(), "dynamic-greedy-2-p+-ft1.50");
        assert_eq!(algos[3].name(), "NodeCentered-B_SUM-0.2");
        assert_eq!(algos[4].name(), "k-EdgeColoring-h-0.50-ft2.00-p");
    }

    #[test]
    fn test_defaults() {
        let content = r#"
[[algorithm]]
kind = "greedy"
"#;
        let config = RunConfig::from_toml_str(content).unwrap();
        assert_eq!(config.run.all_bs, vec![1]);
        assert_eq!(config.run.seed, 123);
        assert!(!config.run.sanity_check);
    }

    #[test]
    fn test_reject_no_algorithms() {
        assert!(RunConfig::from_toml_str("[run]\nall_bs = [1]\n").is_err());
    }

    #[test]
    fn test_reject_unknown_kind() {
        let content = r#"
[[algorithm]]
kind = "gpa"
"#;
        assert!(RunConfig::from_toml_str(content).is_err());
    }

    #[test]
    fn test_reject_out_of_range_parameters() {
        let bad_b = r#"
[run]
all_bs = [0]

[[algorithm]]
kind = "greedy"
"#;
        assert!(RunConfig::from_toml_str(bad_b).is_err());

        let bad_threshold = r#"
[[algorithm]]
kind = "node_centered"
aggregate = "sum"
threshold = 1.5
"#;
        assert!(RunConfig::from_toml_str(bad_threshold).is_err());

        let bad_filter = r#"
[[algorithm]]
kind = "dyn_greedy"
filter_threshold = 0.5
"#;
        assert!(RunConfig::from_toml_str(bad_filter).is_err());
    }
}
