use crate::genome::{BaseNodes, Genome};

use super::nn::{NetworkError, NeuralNetwork};

/// Evaluator for possibly cyclic genomes.
///
/// Outputs are computed by depth-first recursion from each output node.
/// Every edge on the current call path is refused on re-entry, which breaks
/// cycles at their second traversal instead of preprocessing the graph, so
/// evaluation is total on any genome. Disabled edges never contribute, and a
/// node with no incoming contribution activates to `sigmoid(0) = 0.5`.
/// Results are memoised nowhere: the edge-ignore rule makes node outputs
/// path-dependent.
pub struct RecurrentNetwork<'n> {
    genome: &'n Genome,
    base: &'n BaseNodes,
    // Edges on the current call path, by gene index.
    on_path: Vec<bool>,
}

impl<'n> RecurrentNetwork<'n> {
    fn node_output(&mut self, node: usize, inputs: &[f64]) -> f64 {
        // Input nodes are placeholders for the network input.
        if let Some(index) = self.base.input_index(node) {
            return inputs[index];
        }
        // The bias node always outputs 1.
        if node == self.base.bias_node {
            return 1.0;
        }

        let mut sum = 0.0;
        for gene in 0..self.genome.len() {
            let (src, dst) = self.genome.directions[gene];
            if dst != node || !self.genome.enabled[gene] || self.on_path[gene] {
                continue;
            }
            self.on_path[gene] = true;
            sum += self.genome.weights[gene] * self.node_output(src, inputs);
            self.on_path[gene] = false;
        }
        sigmoid(sum)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl<'n> NeuralNetwork<'n> for RecurrentNetwork<'n> {
    fn new(genome: &'n Genome, base: &'n BaseNodes) -> Result<Self, NetworkError> {
        Ok(RecurrentNetwork {
            genome,
            base,
            on_path: vec![false; genome.len()],
        })
    }

    fn activate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        if inputs.len() != self.base.input_nodes.len() {
            return Err(NetworkError::InvalidInput(
                "Number of inputs is not correct".into(),
            ));
        }

        self.on_path.iter_mut().for_each(|flag| *flag = false);
        let outputs = self.base.output_nodes.clone();
        Ok(outputs
            .into_iter()
            .map(|output| self.node_output(output, inputs))
            .collect())
    }
}
