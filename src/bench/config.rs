//! Declarative benchmark matrix: lane tiers, each with its own iteration range.
//!
//! The default table keeps `lanes * iterations` within 2^13..=2^17 for every
//! tier so lane-parallel strategies are compared at matched total work. A
//! matrix file (TOML or YAML) may replace the tiers, the quick points, or both.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::core::schema::BenchConfig;
use crate::{BenchError, BenchResult};

/// Iteration counts run for one lane tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Iterations {
    /// `2^min_log2 ..= 2^max_log2`, ascending.
    PowersOfTwo { min_log2: u32, max_log2: u32 },
    /// Explicit counts, in the given order.
    Explicit(Vec<u64>),
}

impl Iterations {
    pub fn values(&self) -> Vec<u64> {
        match self {
            Iterations::PowersOfTwo { min_log2, max_log2 } => {
                (*min_log2..=*max_log2).map(|k| 1u64 << k).collect()
            }
            Iterations::Explicit(list) => list.clone(),
        }
    }
}

/// A lane count and the iterations to sweep at that lane count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    pub lanes: u64,
    pub iterations: Iterations,
}

impl Tier {
    pub fn powers_of_two(lanes: u64, min_log2: u32, max_log2: u32) -> Self {
        Tier {
            lanes,
            iterations: Iterations::PowersOfTwo { min_log2, max_log2 },
        }
    }

    pub fn explicit(lanes: u64, iterations: Vec<u64>) -> Self {
        Tier {
            lanes,
            iterations: Iterations::Explicit(iterations),
        }
    }

    fn configs(&self) -> impl Iterator<Item = BenchConfig> + '_ {
        self.iterations
            .values()
            .into_iter()
            .map(move |iterations| BenchConfig::new(self.lanes, iterations))
    }
}

/// Tier table plus the representative points used by quick mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixSpec {
    pub tiers: Vec<Tier>,
    pub quick: Vec<BenchConfig>,
}

impl Default for MatrixSpec {
    fn default() -> Self {
        MatrixSpec {
            tiers: default_tiers(),
            quick: default_quick_configs(),
        }
    }
}

/// 1, 4 and 16 lanes, each spanning 2^13..=2^17 total ops.
pub fn default_tiers() -> Vec<Tier> {
    vec![
        Tier::powers_of_two(1, 13, 17),
        Tier::powers_of_two(4, 11, 15),
        Tier::powers_of_two(16, 9, 13),
    ]
}

/// One point per default tier, all at 2^13 total ops.
pub fn default_quick_configs() -> Vec<BenchConfig> {
    vec![
        BenchConfig::new(1, 8192),
        BenchConfig::new(4, 2048),
        BenchConfig::new(16, 512),
    ]
}

impl MatrixSpec {
    /// Expand the tier table, tier order then iteration order.
    pub fn expand(&self) -> ConfigurationMatrix {
        ConfigurationMatrix::from_configs(self.tiers.iter().flat_map(|t| t.configs()))
    }

    pub fn quick_matrix(&self) -> ConfigurationMatrix {
        ConfigurationMatrix::from_configs(self.quick.iter().copied())
    }
}

/// Ordered, duplicate-free list of configs. Row order of the final report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigurationMatrix {
    configs: Vec<BenchConfig>,
}

impl ConfigurationMatrix {
    /// Keep the first occurrence of each config.
    pub fn from_configs(configs: impl IntoIterator<Item = BenchConfig>) -> Self {
        let mut seen = HashSet::new();
        let configs = configs.into_iter().filter(|c| seen.insert(*c)).collect();
        ConfigurationMatrix { configs }
    }

    pub fn single(config: BenchConfig) -> Self {
        ConfigurationMatrix {
            configs: vec![config],
        }
    }

    pub fn configs(&self) -> &[BenchConfig] {
        &self.configs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BenchConfig> {
        self.configs.iter()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl<'a> IntoIterator for &'a ConfigurationMatrix {
    type Item = &'a BenchConfig;
    type IntoIter = std::slice::Iter<'a, BenchConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.configs.iter()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTier {
    lanes: u64,
    #[serde(default)]
    min_log2: Option<u32>,
    #[serde(default)]
    max_log2: Option<u32>,
    #[serde(default)]
    iterations: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMatrix {
    #[serde(default, rename = "tier")]
    tiers: Vec<RawTier>,
    #[serde(default)]
    quick: Option<Vec<BenchConfig>>,
}

impl RawTier {
    fn into_tier(self, idx: usize) -> BenchResult<Tier> {
        let bad = |msg: String| BenchError::Message(format!("tier {}: {msg}", idx + 1));
        if self.lanes == 0 {
            return Err(bad("lanes must be a positive integer".into()));
        }
        match (self.min_log2, self.max_log2, self.iterations) {
            (Some(min), Some(max), None) => {
                if min > max {
                    return Err(bad(format!("min_log2 ({min}) exceeds max_log2 ({max})")));
                }
                if max >= 64 {
                    return Err(bad(format!("max_log2 ({max}) must be below 64")));
                }
                Ok(Tier::powers_of_two(self.lanes, min, max))
            }
            (None, None, Some(list)) => {
                if list.is_empty() {
                    return Err(bad("iterations list is empty".into()));
                }
                if list.contains(&0) {
                    return Err(bad("iterations must be positive integers".into()));
                }
                Ok(Tier::explicit(self.lanes, list))
            }
            _ => Err(bad(
                "give either both min_log2 and max_log2, or an iterations list".into(),
            )),
        }
    }
}

fn parse_matrix(raw: RawMatrix) -> BenchResult<MatrixSpec> {
    let mut spec = MatrixSpec::default();
    if !raw.tiers.is_empty() {
        spec.tiers = raw
            .tiers
            .into_iter()
            .enumerate()
            .map(|(i, t)| t.into_tier(i))
            .collect::<BenchResult<Vec<_>>>()?;
    }
    if let Some(quick) = raw.quick {
        for c in &quick {
            c.validate()
                .map_err(|e| BenchError::Message(format!("quick point ({c}): {e}")))?;
        }
        spec.quick = quick;
    }
    Ok(spec)
}

/// Parse a TOML matrix description. Sections left out keep their defaults.
pub fn matrix_spec_from_toml(s: &str) -> BenchResult<MatrixSpec> {
    let raw: RawMatrix = toml::from_str(s).map_err(|e| BenchError::Message(e.to_string()))?;
    parse_matrix(raw)
}

/// Parse a YAML matrix description. Sections left out keep their defaults.
pub fn matrix_spec_from_yaml(s: &str) -> BenchResult<MatrixSpec> {
    let raw: RawMatrix =
        serde_yaml::from_str(s).map_err(|e| BenchError::Message(e.to_string()))?;
    parse_matrix(raw)
}

/// Load a matrix file; `.yaml`/`.yml` are read as YAML, anything else as TOML.
pub fn load_matrix_spec(path: &Path) -> BenchResult<MatrixSpec> {
    let s = std::fs::read_to_string(path).map_err(|e| {
        BenchError::Message(format!("failed to read matrix file {}: {e}", path.display()))
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if is_yaml {
        matrix_spec_from_yaml(&s)
    } else {
        matrix_spec_from_toml(&s)
    };
    parsed.map_err(|e| BenchError::Message(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matrix_order_and_size() {
        let matrix = MatrixSpec::default().expand();
        assert_eq!(matrix.len(), 15);

        let first: Vec<_> = matrix.iter().take(5).copied().collect();
        assert_eq!(
            first,
            vec![
                BenchConfig::new(1, 1 << 13),
                BenchConfig::new(1, 1 << 14),
                BenchConfig::new(1, 1 << 15),
                BenchConfig::new(1, 1 << 16),
                BenchConfig::new(1, 1 << 17),
            ]
        );
        assert_eq!(matrix.configs()[5], BenchConfig::new(4, 1 << 11));
        assert_eq!(matrix.configs()[14], BenchConfig::new(16, 1 << 13));
    }

    #[test]
    fn test_default_matrix_total_ops_in_range() {
        for config in &MatrixSpec::default().expand() {
            let ops = config.total_ops();
            assert!(
                ((1 << 13)..=(1 << 17)).contains(&ops),
                "{config} has {ops} total ops"
            );
        }
    }

    #[test]
    fn test_default_matrix_has_no_duplicates() {
        let matrix = MatrixSpec::default().expand();
        let unique: HashSet<_> = matrix.iter().collect();
        assert_eq!(unique.len(), matrix.len());
    }

    #[test]
    fn test_expansion_dedupes_keeping_first_occurrence() {
        let spec = MatrixSpec {
            tiers: vec![
                Tier::explicit(4, vec![512, 256, 512]),
                Tier::powers_of_two(1, 8, 9),
                Tier::explicit(4, vec![256, 1024]),
            ],
            quick: default_quick_configs(),
        };
        let configs: Vec<_> = spec.expand().iter().copied().collect();
        assert_eq!(
            configs,
            vec![
                BenchConfig::new(4, 512),
                BenchConfig::new(4, 256),
                BenchConfig::new(1, 256),
                BenchConfig::new(1, 512),
                BenchConfig::new(4, 1024),
            ]
        );
    }

    #[test]
    fn test_quick_matrix_defaults() {
        let quick: Vec<_> = MatrixSpec::default().quick_matrix().iter().copied().collect();
        assert_eq!(
            quick,
            vec![
                BenchConfig::new(1, 8192),
                BenchConfig::new(4, 2048),
                BenchConfig::new(16, 512),
            ]
        );
    }

    #[test]
    fn test_toml_overrides_tiers_only() {
        let spec = matrix_spec_from_toml(
            r#"
[[tier]]
lanes = 2
min_log2 = 3
max_log2 = 4

[[tier]]
lanes = 8
iterations = [10, 20]
"#,
        )
        .unwrap();
        assert_eq!(
            spec.tiers,
            vec![Tier::powers_of_two(2, 3, 4), Tier::explicit(8, vec![10, 20])]
        );
        assert_eq!(spec.quick, default_quick_configs());
        assert_eq!(spec.expand().len(), 4);
    }

    #[test]
    fn test_yaml_overrides_quick_only() {
        let spec = matrix_spec_from_yaml(
            "quick:\n  - { lanes: 2, iterations: 64 }\n  - { lanes: 8, iterations: 16 }\n",
        )
        .unwrap();
        assert_eq!(spec.tiers, default_tiers());
        assert_eq!(
            spec.quick,
            vec![BenchConfig::new(2, 64), BenchConfig::new(8, 16)]
        );
    }

    #[test]
    fn test_invalid_tiers_rejected() {
        let cases = [
            "[[tier]]\nlanes = 0\nmin_log2 = 1\nmax_log2 = 2\n",
            "[[tier]]\nlanes = 1\nmin_log2 = 5\nmax_log2 = 2\n",
            "[[tier]]\nlanes = 1\nmin_log2 = 5\n",
            "[[tier]]\nlanes = 1\niterations = []\n",
            "[[tier]]\nlanes = 1\niterations = [4, 0]\n",
            "[[tier]]\nlanes = 1\nmin_log2 = 1\nmax_log2 = 70\n",
            "quick = [{ lanes = 0, iterations = 4 }]\n",
        ];
        for case in cases {
            assert!(matrix_spec_from_toml(case).is_err(), "accepted: {case}");
        }
    }

    #[test]
    fn test_load_matrix_spec_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("matrix.yml");
        std::fs::write(&yaml, "tier:\n  - lanes: 3\n    iterations: [7]\n").unwrap();
        let spec = load_matrix_spec(&yaml).unwrap();
        assert_eq!(spec.expand().configs(), &[BenchConfig::new(3, 7)]);

        let missing = dir.path().join("nope.toml");
        let err = load_matrix_spec(&missing).unwrap_err();
        assert!(err.to_string().contains("failed to read matrix file"));
    }
}
