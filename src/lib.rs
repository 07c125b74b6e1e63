//! NEAT (NeuroEvolution of Augmenting Topologies) engine.
//!
//! Evolves a population of sparse, possibly cyclic networks by crossover and
//! mutation, scored by running each network as the policy of an episodic
//! reinforcement-learning agent. Structural changes are aligned across the
//! population through a global innovation history, and speciation with
//! fitness sharing protects new topologies long enough to be evaluated.

pub mod context;
pub mod environment;
pub mod fitness;
pub mod genome;
pub mod harness;
pub mod nn;
pub mod population;
pub mod reproduction;
pub mod speciation;
pub mod state;
pub mod visualization;
