use crate::context::GeneticDistanceParameters;
use crate::genome::{common_partition, Genome};
use crate::state::InnovationRecord;

/// Connection view of a species representative: the directions and weights
/// of the genome that founded the species. Representatives survive between
/// generations, keeping species identities stable.
#[derive(Debug, Clone)]
pub struct SpeciesRep {
    pub directions: Vec<(usize, usize)>,
    pub weights: Vec<f64>,
}

impl SpeciesRep {
    pub fn from_genome(genome: &Genome) -> Self {
        SpeciesRep {
            directions: genome.directions.clone(),
            weights: genome.weights.clone(),
        }
    }
}

/// Assign a species to every genome, in population order.
///
/// Each genome takes the index of the first representative within the
/// distance threshold; a genome matching none founds a new species and is
/// appended as its representative. `reps` carries over from the previous
/// generation and only ever grows.
pub fn speciate(
    population: &[Genome],
    reps: &mut Vec<SpeciesRep>,
    record: &InnovationRecord,
    params: &GeneticDistanceParameters,
) -> Vec<usize> {
    let mut species = Vec::with_capacity(population.len());
    for genome in population {
        let matched = reps.iter().position(|rep| {
            genetic_distance(
                &genome.directions,
                &genome.weights,
                &rep.directions,
                &rep.weights,
                record,
                params,
            ) < params.threshold
        });
        match matched {
            Some(index) => species.push(index),
            None => {
                species.push(reps.len());
                reps.push(SpeciesRep::from_genome(genome));
            }
        }
    }
    species
}

/// Genetic distance between two connection sets.
///
/// Common edges contribute their mean absolute weight difference. Uncommon
/// edges are classified by innovation id against the other side's maximum:
/// below it they are disjoint, at or above it excess, and with no uncommon
/// edges on the other side everything counts as excess. Large genomes
/// (measured by their largest node id) have the structural terms normalized.
pub fn genetic_distance(
    a_directions: &[(usize, usize)],
    a_weights: &[f64],
    b_directions: &[(usize, usize)],
    b_weights: &[f64],
    record: &InnovationRecord,
    params: &GeneticDistanceParameters,
) -> f64 {
    let (common, uncommon_a, uncommon_b) = common_partition(a_directions, b_directions);

    let weight_difference = if common.is_empty() {
        0.0
    } else {
        common
            .iter()
            .map(|&(index_a, index_b)| (a_weights[index_a] - b_weights[index_b]).abs())
            .sum::<f64>()
            / common.len() as f64
    };

    let lookup = |direction: (usize, usize)| {
        record.innovation_id(direction).unwrap_or_else(|| {
            panic!("connection {direction:?} missing from the innovation history")
        })
    };
    let ids_a: Vec<usize> = uncommon_a.iter().map(|&i| lookup(a_directions[i])).collect();
    let ids_b: Vec<usize> = uncommon_b.iter().map(|&i| lookup(b_directions[i])).collect();

    let mut disjoint = 0usize;
    let mut excess = 0usize;
    let mut classify = |ids: &[usize], other_max: Option<usize>| match other_max {
        Some(max) => {
            for &id in ids {
                if id < max {
                    disjoint += 1;
                } else {
                    excess += 1;
                }
            }
        }
        None => excess += ids.len(),
    };
    classify(&ids_a, ids_b.iter().copied().max());
    classify(&ids_b, ids_a.iter().copied().max());

    let largest_node = a_directions
        .iter()
        .chain(b_directions)
        .flat_map(|&(src, dst)| [src, dst])
        .max()
        .unwrap_or(1)
        .max(1);

    let c1 = params.excess_constant;
    let c2 = params.disjoint_constant;
    let c3 = params.weight_bias_constant;
    if largest_node < params.large_genome_size {
        c1 * excess as f64 + c2 * disjoint as f64 + c3 * weight_difference
    } else {
        let n = largest_node as f64;
        c1 * excess as f64 / n + c2 * disjoint as f64 / n + c3 * weight_difference
    }
}
