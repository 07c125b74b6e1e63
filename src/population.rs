use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::context::{ConfigError, NeatConfig};
use crate::environment::Environment;
use crate::fitness;
use crate::genome::{BaseNodes, Genome};
use crate::harness::{self, HarnessError};
use crate::reproduction;
use crate::speciation::{self, SpeciesRep};
use crate::state::InnovationRecord;

/// Summary of one evolved generation.
#[derive(Debug, Clone)]
pub struct GenerationStats {
    pub generation: usize,
    pub species_count: usize,
    pub best_score: f64,
    pub mean_score: f64,
}

/// A population of genomes plus the state that carries between generations:
/// the shared base nodes, the innovation history, the species
/// representatives and the seeded random stream.
pub struct Population {
    pub genomes: Vec<Genome>,
    pub base_nodes: BaseNodes,
    pub generation: usize,
    /// Best genome and raw score seen over the whole run.
    pub champion: Option<(Genome, f64)>,
    config: NeatConfig,
    innovation_record: InnovationRecord,
    species_reps: Vec<SpeciesRep>,
    rng: SmallRng,
}

impl Population {
    /// Seeded population of fully connected starter genomes. All randomness
    /// of the run flows from `seed`, so identical seeds and identical
    /// environment behavior reproduce a run exactly.
    pub fn new(
        config: NeatConfig,
        input_size: usize,
        output_size: usize,
        population_size: usize,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if population_size == 0 {
            return Err(ConfigError::ZeroCount("population_size"));
        }
        if output_size == 0 {
            return Err(ConfigError::ZeroCount("output_size"));
        }

        let mut rng = SmallRng::seed_from_u64(seed);
        let base_nodes = BaseNodes::new(input_size, output_size);
        let mut innovation_record = InnovationRecord::new();
        let genomes = (0..population_size)
            .map(|_| Genome::initial(&base_nodes, &mut rng, &mut innovation_record))
            .collect();

        Ok(Population {
            genomes,
            base_nodes,
            generation: 0,
            champion: None,
            config,
            innovation_record,
            species_reps: Vec::new(),
            rng,
        })
    }

    /// Score the current genomes, then breed their replacement.
    ///
    /// One full pass of the engine: harness, speciation against the carried
    /// representatives, fitness sharing, reproduction. The new generation
    /// replaces the old one in place and is structurally validated; a
    /// violation there is a bug and aborts with a diagnostic. With `render`
    /// set, every environment step is mirrored to [`Environment::render`].
    pub fn evolve<E>(
        &mut self,
        envs: &mut [E],
        render: bool,
    ) -> Result<GenerationStats, HarnessError>
    where
        E: Environment + Send,
    {
        let scores = harness::evaluate_networks(
            &self.genomes,
            &self.base_nodes,
            envs,
            &self.config.harness,
            render,
        )?;

        for (genome, &score) in self.genomes.iter().zip(&scores) {
            let improved = self
                .champion
                .as_ref()
                .map_or(true, |&(_, best)| score > best);
            if improved {
                self.champion = Some((genome.clone(), score));
            }
        }

        let species_ids = speciation::speciate(
            &self.genomes,
            &mut self.species_reps,
            &self.innovation_record,
            &self.config.genetic_distance,
        );
        let probs = fitness::normalise(&scores, &species_ids);
        let next = reproduction::reproduce(
            &self.genomes,
            &scores,
            &species_ids,
            &probs,
            &self.base_nodes,
            &mut self.innovation_record,
            &self.config,
            &mut self.rng,
        );

        for (index, genome) in next.iter().enumerate() {
            if let Err(error) = genome.validate(&self.base_nodes, &self.innovation_record) {
                panic!(
                    "structural invariant violated in generation {}, genome {index}: {error}",
                    self.generation + 1
                );
            }
        }

        let species_count = {
            let mut ids = species_ids;
            ids.sort_unstable();
            ids.dedup();
            ids.len()
        };
        let best_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_score = scores.iter().sum::<f64>() / scores.len() as f64;

        self.genomes = next;
        self.generation += 1;

        let stats = GenerationStats {
            generation: self.generation,
            species_count,
            best_score,
            mean_score,
        };
        log::info!(
            "generation {} - species: {} - best: {:.3} - mean: {:.3}",
            stats.generation,
            stats.species_count,
            stats.best_score,
            stats.mean_score
        );
        Ok(stats)
    }

    pub fn config(&self) -> &NeatConfig {
        &self.config
    }

    pub fn innovation_record(&self) -> &InnovationRecord {
        &self.innovation_record
    }
}

#[cfg(test)]
mod tests {
    use super::Population;
    use crate::context::NeatConfig;

    #[test]
    fn new_population_is_fully_wired() {
        let population = Population::new(NeatConfig::default(), 3, 2, 20, 0).unwrap();
        assert_eq!(population.genomes.len(), 20);
        for genome in &population.genomes {
            // 3 inputs x 2 outputs + bias x 2 outputs.
            assert_eq!(genome.len(), 8);
            assert!(genome
                .validate(&population.base_nodes, population.innovation_record())
                .is_ok());
        }
    }

    #[test]
    fn invalid_configurations_are_fatal() {
        let mut config = NeatConfig::default();
        config.harness.max_steps = 0;
        assert!(Population::new(config, 2, 1, 10, 0).is_err());
        assert!(Population::new(NeatConfig::default(), 2, 1, 0, 0).is_err());
    }
}
