use std::collections::{BTreeSet, HashSet};

use rand::{Rng, RngCore};
use rand_distr::StandardNormal;

use crate::context::{CrossoverParameters, MutationParameters};
use crate::state::InnovationRecord;

/// The fixed node set every genome in a population shares: inputs, one bias
/// node and outputs, consecutively numbered from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseNodes {
    pub input_nodes: Vec<usize>,
    pub bias_node: usize,
    pub output_nodes: Vec<usize>,
}

impl BaseNodes {
    pub fn new(input_size: usize, output_size: usize) -> Self {
        BaseNodes {
            input_nodes: (0..input_size).collect(),
            bias_node: input_size,
            output_nodes: (input_size + 1..input_size + 1 + output_size).collect(),
        }
    }

    pub fn is_input(&self, node: usize) -> bool {
        self.input_nodes.contains(&node)
    }

    /// Position of `node` in the input order, if it is an input.
    pub fn input_index(&self, node: usize) -> Option<usize> {
        self.input_nodes.iter().position(|&n| n == node)
    }

    pub fn is_base(&self, node: usize) -> bool {
        self.is_input(node) || node == self.bias_node || self.output_nodes.contains(&node)
    }

    pub fn max_output(&self) -> usize {
        self.output_nodes.iter().copied().max().unwrap_or(self.bias_node)
    }
}

#[derive(thiserror::Error, miette::Diagnostic, Debug)]
pub enum GenomeError {
    #[error("duplicate connection ({0}, {1})")]
    DuplicateConnection(usize, usize),
    #[error("connection ({0}, {1}) targets an input or the bias node")]
    ConnectionIntoBase(usize, usize),
    #[error("connection ({0}, {1}) is not present in the innovation history")]
    UnregisteredConnection(usize, usize),
    #[error("node {0} is neither a base node nor the result of a recorded split")]
    OrphanNode(usize),
}

/// One candidate network, stored as parallel arrays over its connections.
///
/// The array position is the gene order; it is never sorted and directions
/// are unique. Destinations are never inputs or the bias node. Node identity
/// and the input/output/bias partition live in [`BaseNodes`], shared by the
/// whole population.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Genome {
    pub directions: Vec<(usize, usize)>,
    pub weights: Vec<f64>,
    pub enabled: Vec<bool>,
}

impl Genome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fully connected starter genome: every input and the bias node wired
    /// to every output, weights uniform in [-1, 1), every edge registered.
    pub fn initial(
        base: &BaseNodes,
        rng: &mut dyn RngCore,
        record: &mut InnovationRecord,
    ) -> Self {
        let mut genome = Genome::new();
        for &input in &base.input_nodes {
            for &output in &base.output_nodes {
                record.connection_id(input, output);
                genome.push((input, output), rng.random_range(-1.0..1.0), true);
            }
        }
        for &output in &base.output_nodes {
            record.connection_id(base.bias_node, output);
            genome.push((base.bias_node, output), rng.random_range(-1.0..1.0), true);
        }
        genome
    }

    pub fn len(&self) -> usize {
        self.directions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    pub fn contains(&self, direction: (usize, usize)) -> bool {
        self.directions.contains(&direction)
    }

    pub fn push(&mut self, direction: (usize, usize), weight: f64, enabled: bool) {
        self.directions.push(direction);
        self.weights.push(weight);
        self.enabled.push(enabled);
    }

    /// Every node id referenced by some connection, in ascending order.
    pub fn referenced_nodes(&self) -> BTreeSet<usize> {
        self.directions.iter().flat_map(|&(src, dst)| [src, dst]).collect()
    }

    /// Check the structural invariants. A violation is a bug in the engine,
    /// not a recoverable state; the caller aborts with a diagnostic naming
    /// the genome and generation.
    pub fn validate(
        &self,
        base: &BaseNodes,
        record: &InnovationRecord,
    ) -> Result<(), GenomeError> {
        let mut seen = HashSet::with_capacity(self.len());
        for &(src, dst) in &self.directions {
            if !seen.insert((src, dst)) {
                return Err(GenomeError::DuplicateConnection(src, dst));
            }
            if base.is_input(dst) || dst == base.bias_node {
                return Err(GenomeError::ConnectionIntoBase(src, dst));
            }
            if !record.contains_connection((src, dst)) {
                return Err(GenomeError::UnregisteredConnection(src, dst));
            }
        }
        for node in self.referenced_nodes() {
            if !base.is_base(node) && !record.is_split_node(node) {
                return Err(GenomeError::OrphanNode(node));
            }
        }
        Ok(())
    }

    /// Recombine with `other`.
    ///
    /// Common genes keep this parent's direction order; weight and enabled
    /// state come from either parent with even odds, and a gene disabled in
    /// either parent has a chance to stay disabled in the child. Uncommon
    /// genes of both sides each survive an independent coin flip.
    pub fn crossover(
        &self,
        other: &Genome,
        params: &CrossoverParameters,
        rng: &mut dyn RngCore,
    ) -> Genome {
        let (common, uncommon_a, uncommon_b) =
            common_partition(&self.directions, &other.directions);

        let mut child = Genome::new();
        for &(index_a, index_b) in &common {
            let (weight, mut enabled) = if rng.random_bool(0.5) {
                (self.weights[index_a], self.enabled[index_a])
            } else {
                (other.weights[index_b], other.enabled[index_b])
            };
            if (!self.enabled[index_a] || !other.enabled[index_b])
                && rng.random::<f64>() < params.disable_connection_rate
            {
                enabled = false;
            }
            child.push(self.directions[index_a], weight, enabled);
        }
        for index in uncommon_a {
            if rng.random_bool(0.5) {
                child.push(self.directions[index], self.weights[index], self.enabled[index]);
            }
        }
        for index in uncommon_b {
            if rng.random_bool(0.5) {
                child.push(other.directions[index], other.weights[index], other.enabled[index]);
            }
        }
        child
    }

    /// Apply the mutation steps in their fixed order: weight perturbation,
    /// weight reset, add-connection, split-connection. Any step may leave
    /// the genome unchanged.
    pub fn mutate(
        &mut self,
        base: &BaseNodes,
        params: &MutationParameters,
        rng: &mut dyn RngCore,
        record: &mut InnovationRecord,
    ) {
        self.perturb_weights(params.permutation_rate, rng);
        self.reset_weights(params.random_weight_rate, rng);
        if rng.random::<f64>() < params.new_connection_rate {
            self.add_connection(base, rng, record);
        }
        if rng.random::<f64>() < params.split_connection_rate {
            self.split_connection(base, rng, record);
        }
    }

    fn perturb_weights(&mut self, rate: f64, rng: &mut dyn RngCore) {
        for weight in &mut self.weights {
            let draw = rng.random::<f64>();
            if draw < rate / 2.0 {
                *weight *= 1.01;
            } else if draw < rate {
                *weight *= 0.99;
            }
        }
    }

    fn reset_weights(&mut self, rate: f64, rng: &mut dyn RngCore) {
        for weight in &mut self.weights {
            if rng.random::<f64>() < rate {
                *weight = rng.sample::<f64, _>(StandardNormal);
            }
        }
    }

    /// Wire a new edge between two currently known nodes. Candidates exclude
    /// inputs and the bias node as destinations and anything already
    /// connected; self-loops are allowed.
    fn add_connection(
        &mut self,
        base: &BaseNodes,
        rng: &mut dyn RngCore,
        record: &mut InnovationRecord,
    ) {
        let mut nodes = self.referenced_nodes();
        nodes.extend(base.input_nodes.iter().copied());
        nodes.extend(base.output_nodes.iter().copied());
        nodes.insert(base.bias_node);

        let candidates: Vec<(usize, usize)> = nodes
            .iter()
            .flat_map(|&src| {
                nodes
                    .iter()
                    .filter(|&&dst| !base.is_input(dst) && dst != base.bias_node)
                    .map(move |&dst| (src, dst))
            })
            .filter(|&direction| !self.contains(direction))
            .collect();

        if candidates.is_empty() {
            return;
        }
        let direction = candidates[rng.random_range(0..candidates.len())];
        record.connection_id(direction.0, direction.1);
        let weight = rng.sample::<f64, _>(StandardNormal) * 0.1;
        self.push(direction, weight, true);
    }

    /// Split a random connection: the edge is disabled and bridged through a
    /// new node, with a unit-weight lead-in and the original weight on the
    /// way out.
    fn split_connection(
        &mut self,
        base: &BaseNodes,
        rng: &mut dyn RngCore,
        record: &mut InnovationRecord,
    ) {
        if self.is_empty() {
            return;
        }
        let index = rng.random_range(0..self.len());
        let (src, dst) = self.directions[index];
        let node = record.record_split(src, dst, base);
        // The id can already occur here when the same edge was split in an
        // ancestor; splitting again would duplicate the bridge edges.
        if self.referenced_nodes().contains(&node) {
            return;
        }

        self.enabled[index] = false;
        let weight = self.weights[index];
        record.connection_id(src, node);
        self.push((src, node), 1.0, true);
        record.connection_id(node, dst);
        self.push((node, dst), weight, true);
    }
}

/// Partition two direction arrays into the indices of common genes (paired
/// `(index_in_a, index_in_b)`) and the uncommon indices of each side.
pub(crate) fn common_partition(
    a: &[(usize, usize)],
    b: &[(usize, usize)],
) -> (Vec<(usize, usize)>, Vec<usize>, Vec<usize>) {
    let mut common = Vec::new();
    let mut uncommon_a = Vec::new();
    for (index_a, direction) in a.iter().enumerate() {
        match b.iter().position(|other| other == direction) {
            Some(index_b) => common.push((index_a, index_b)),
            None => uncommon_a.push(index_a),
        }
    }
    let uncommon_b = (0..b.len()).filter(|&index| !a.contains(&b[index])).collect();
    (common, uncommon_a, uncommon_b)
}
