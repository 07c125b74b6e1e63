use serde::{Deserialize, Serialize};

/// Hyperparameters of the genetic distance measure and speciation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneticDistanceParameters {
    /// Distance below which a genome joins an existing species.
    pub threshold: f64,
    pub excess_constant: f64,
    pub disjoint_constant: f64,
    pub weight_bias_constant: f64,
    /// Genomes whose largest node id reaches this value have their excess and
    /// disjoint counts normalized by it.
    pub large_genome_size: usize,
    pub interspecies_mating_rate: f64,
}

impl Default for GeneticDistanceParameters {
    fn default() -> Self {
        GeneticDistanceParameters {
            threshold: 3.0,
            excess_constant: 1.0,
            disjoint_constant: 1.0,
            weight_bias_constant: 0.4,
            large_genome_size: 20,
            interspecies_mating_rate: 0.001,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MutationParameters {
    pub permutation_rate: f64,
    pub random_weight_rate: f64,
    pub new_connection_rate: f64,
    pub split_connection_rate: f64,
    /// Species with an offspring quota above this keep their best member
    /// verbatim.
    pub large_species: usize,
}

impl Default for MutationParameters {
    fn default() -> Self {
        MutationParameters {
            permutation_rate: 0.8,
            random_weight_rate: 0.1,
            new_connection_rate: 0.05,
            split_connection_rate: 0.03,
            large_species: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrossoverParameters {
    pub crossover_rate: f64,
    /// Chance that a gene disabled in either parent stays disabled in the
    /// child.
    pub disable_connection_rate: f64,
}

impl Default for CrossoverParameters {
    fn default() -> Self {
        CrossoverParameters {
            crossover_rate: 0.75,
            disable_connection_rate: 0.75,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HarnessParameters {
    /// Interaction limit per episode.
    pub max_steps: usize,
    /// Episodes averaged into one score.
    pub episodes: usize,
    /// Exponent applied to the mean episode return; shapes selection
    /// pressure.
    pub score_exponent: f64,
}

impl Default for HarnessParameters {
    fn default() -> Self {
        HarnessParameters {
            max_steps: 200,
            episodes: 1,
            score_exponent: 1.0,
        }
    }
}

/// All engine parameters, grouped the way they are consumed. Deserializable
/// from a config file; missing keys are a deserialization error, and
/// [`NeatConfig::validate`] rejects values that cannot drive a run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NeatConfig {
    pub genetic_distance: GeneticDistanceParameters,
    pub mutation: MutationParameters,
    pub crossover: CrossoverParameters,
    pub harness: HarnessParameters,
}

#[derive(thiserror::Error, miette::Diagnostic, Debug)]
pub enum ConfigError {
    #[error("parameter `{0}` is not finite")]
    NotFinite(&'static str),
    #[error("rate `{name}` must lie in [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[error("`{0}` must be at least 1")]
    ZeroCount(&'static str),
}

impl NeatConfig {
    /// Configuration errors are fatal at startup; nothing downstream checks
    /// parameters again.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("genetic_distance.threshold", self.genetic_distance.threshold),
            (
                "genetic_distance.excess_constant",
                self.genetic_distance.excess_constant,
            ),
            (
                "genetic_distance.disjoint_constant",
                self.genetic_distance.disjoint_constant,
            ),
            (
                "genetic_distance.weight_bias_constant",
                self.genetic_distance.weight_bias_constant,
            ),
            ("harness.score_exponent", self.harness.score_exponent),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite(name));
            }
        }

        let rates = [
            (
                "genetic_distance.interspecies_mating_rate",
                self.genetic_distance.interspecies_mating_rate,
            ),
            ("mutation.permutation_rate", self.mutation.permutation_rate),
            (
                "mutation.random_weight_rate",
                self.mutation.random_weight_rate,
            ),
            (
                "mutation.new_connection_rate",
                self.mutation.new_connection_rate,
            ),
            (
                "mutation.split_connection_rate",
                self.mutation.split_connection_rate,
            ),
            ("crossover.crossover_rate", self.crossover.crossover_rate),
            (
                "crossover.disable_connection_rate",
                self.crossover.disable_connection_rate,
            ),
        ];
        for (name, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }

        if self.harness.max_steps == 0 {
            return Err(ConfigError::ZeroCount("harness.max_steps"));
        }
        if self.harness.episodes == 0 {
            return Err(ConfigError::ZeroCount("harness.episodes"));
        }

        Ok(())
    }
}
