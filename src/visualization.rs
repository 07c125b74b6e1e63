use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;

use crate::genome::{BaseNodes, Genome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Input,
    Bias,
    Hidden,
    Output,
}

/// Creates a petgraph graph from a genome, for inspection and rendering.
/// Node weights carry the node id and kind, edge weights the connection
/// weight and enabled flag.
pub fn generate_graph(
    genome: &Genome,
    base: &BaseNodes,
) -> StableGraph<(usize, NodeKind), (f64, bool)> {
    let mut graph = StableGraph::new();
    // Index node id -> graph id
    let mut ids: HashMap<usize, NodeIndex> = HashMap::new();

    for &node in &base.input_nodes {
        ids.insert(node, graph.add_node((node, NodeKind::Input)));
    }
    ids.insert(
        base.bias_node,
        graph.add_node((base.bias_node, NodeKind::Bias)),
    );
    for &node in &base.output_nodes {
        ids.insert(node, graph.add_node((node, NodeKind::Output)));
    }
    for node in genome.referenced_nodes() {
        ids.entry(node)
            .or_insert_with(|| graph.add_node((node, NodeKind::Hidden)));
    }

    for (index, &(src, dst)) in genome.directions.iter().enumerate() {
        graph.add_edge(ids[&src], ids[&dst], (genome.weights[index], genome.enabled[index]));
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::{generate_graph, NodeKind};
    use crate::genome::{BaseNodes, Genome};

    #[test]
    fn graph_mirrors_the_genome() {
        let base = BaseNodes::new(2, 1);
        let mut genome = Genome::new();
        genome.push((0, 3), 0.5, true);
        genome.push((4, 3), -1.0, false);

        let graph = generate_graph(&genome, &base);
        // 2 inputs, bias, output, one hidden node referenced by the edges.
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph
            .node_weights()
            .any(|&(id, kind)| id == 4 && kind == NodeKind::Hidden));
    }
}
