use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::{Rng, RngCore};

use crate::context::NeatConfig;
use crate::genome::{BaseNodes, Genome};
use crate::state::InnovationRecord;

/// Offspring quota per species: the species' raw-score share of the
/// population size, ceiled, then nudged by ±1 at random until the quotas sum
/// to the population size exactly. Only species with a positive quota are
/// eligible for adjustment, so quotas never go negative.
pub(crate) fn allocate_quotas(
    scores: &[f64],
    species_ids: &[usize],
    species: &[usize],
    target: usize,
    rng: &mut dyn RngCore,
) -> Vec<usize> {
    let total: f64 = scores.iter().sum();
    let mut quotas: Vec<usize> = species
        .iter()
        .map(|&s| {
            let species_total: f64 = scores
                .iter()
                .zip(species_ids)
                .filter(|&(_, &id)| id == s)
                .map(|(&score, _)| score)
                .sum();
            ((species_total / (total + f64::EPSILON)) * target as f64).ceil() as usize
        })
        .collect();

    // A zero score total ceils every quota to zero and the adjustment loop
    // could never reach the target; allocate by species size instead.
    if quotas.iter().sum::<usize>() == 0 {
        quotas = species
            .iter()
            .map(|&s| species_ids.iter().filter(|&&id| id == s).count())
            .collect();
    }

    loop {
        let sum: usize = quotas.iter().sum();
        if sum == target {
            break;
        }
        let eligible: Vec<usize> = (0..quotas.len()).filter(|&i| quotas[i] > 0).collect();
        let chosen = eligible[rng.random_range(0..eligible.len())];
        if sum < target {
            quotas[chosen] += 1;
        } else {
            quotas[chosen] -= 1;
        }
    }
    quotas
}

/// Draw one of `candidates`, weighted by `weights`. Weights that cannot form
/// a distribution (all zero, negative, non-finite) fall back to a uniform
/// draw.
fn weighted_choice(candidates: &[usize], weights: &[f64], rng: &mut dyn RngCore) -> usize {
    match WeightedIndex::new(weights) {
        Ok(dist) => candidates[dist.sample(rng)],
        Err(_) => candidates[rng.random_range(0..candidates.len())],
    }
}

/// Build the next generation.
///
/// Quotas are allocated per species; a species with a quota above the
/// elitism threshold keeps its best-scoring member verbatim. The remaining
/// slots are filled by score-weighted parent selection, crossover (with an
/// occasional interspecies mate) or a direct copy, then mutation. The result
/// has exactly as many genomes as `population`.
pub fn reproduce(
    population: &[Genome],
    scores: &[f64],
    species_ids: &[usize],
    shared_probs: &[f64],
    base: &BaseNodes,
    record: &mut InnovationRecord,
    config: &NeatConfig,
    rng: &mut dyn RngCore,
) -> Vec<Genome> {
    let mut species: Vec<usize> = species_ids.to_vec();
    species.sort_unstable();
    species.dedup();

    let quotas = allocate_quotas(scores, species_ids, &species, population.len(), rng);

    let mut next = Vec::with_capacity(population.len());
    for (&s, &quota) in species.iter().zip(&quotas) {
        let members: Vec<usize> = (0..population.len())
            .filter(|&i| species_ids[i] == s)
            .collect();
        let member_probs: Vec<f64> = members.iter().map(|&i| shared_probs[i]).collect();

        let elitism = quota > config.mutation.large_species;
        log::debug!(
            "species {s}: quota {quota} over {} members, elite kept: {elitism}",
            members.len()
        );

        let mut remaining = quota;
        if elitism {
            // Elitism: the best raw scorer of a large species survives
            // untouched. Ties go to the earliest member.
            let mut best = members[0];
            for &i in &members[1..] {
                if scores[i] > scores[best] {
                    best = i;
                }
            }
            next.push(population[best].clone());
            remaining -= 1;
        }

        for _ in 0..remaining {
            let parent_a = weighted_choice(&members, &member_probs, rng);

            let mut child = if rng.random::<f64>() < config.crossover.crossover_rate {
                let parent_b = if rng.random::<f64>()
                    < config.genetic_distance.interspecies_mating_rate
                    && species.len() > 1
                {
                    let outsiders: Vec<usize> = (0..population.len())
                        .filter(|&i| species_ids[i] != s)
                        .collect();
                    let outsider_probs: Vec<f64> =
                        outsiders.iter().map(|&i| shared_probs[i]).collect();
                    weighted_choice(&outsiders, &outsider_probs, rng)
                } else {
                    weighted_choice(&members, &member_probs, rng)
                };
                population[parent_a].crossover(&population[parent_b], &config.crossover, rng)
            } else {
                population[parent_a].clone()
            };

            child.mutate(base, &config.mutation, rng, record);
            next.push(child);
        }
    }

    log::debug!(
        "reproduced {} genomes across {} species",
        next.len(),
        species.len()
    );
    next
}
