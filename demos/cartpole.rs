//! Evolves a cart-pole balancing policy.
//!
//! Simulates cartpole dynamics using Euler integration. The network takes 4
//! inputs: cart x, cart velocity, pole angle, and pole angular velocity, and
//! picks one of two force directions to keep the pole balanced. Episode
//! return is the number of steps the pole stays up.

use neat_rl::context::NeatConfig;
use neat_rl::environment::{EnvError, Environment, Observation};
use neat_rl::population::Population;

const POPULATION_SIZE: usize = 100;
const GENERATIONS: usize = 30;

struct CartPole {
    x: f64,
    x_dot: f64,
    theta: f64,
    theta_dot: f64,
    // Physics parameters.
    dt: f64,
    gravity: f64,
    mass_cart: f64,
    mass_pole: f64,
    pole_length: f64, // half-length of pole
    force_mag: f64,
}

impl CartPole {
    fn new() -> Self {
        CartPole {
            x: 0.0,
            x_dot: 0.0,
            theta: 0.05,
            theta_dot: 0.0,
            dt: 0.02,
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            pole_length: 0.5,
            force_mag: 10.0,
        }
    }

    fn observation(&self) -> Observation {
        vec![self.x, self.x_dot, self.theta, self.theta_dot]
    }
}

impl Environment for CartPole {
    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.x = 0.0;
        self.x_dot = 0.0;
        self.theta = 0.05;
        self.theta_dot = 0.0;
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<(Observation, f64, bool), EnvError> {
        let force = if action == 0 {
            self.force_mag
        } else {
            -self.force_mag
        };

        let costheta = self.theta.cos();
        let sintheta = self.theta.sin();
        let temp = (force + self.mass_pole * self.pole_length * self.theta_dot.powi(2) * sintheta)
            / (self.mass_cart + self.mass_pole);
        let theta_acc = (self.gravity * sintheta - costheta * temp)
            / (self.pole_length
                * (4.0 / 3.0
                    - self.mass_pole * costheta.powi(2) / (self.mass_cart + self.mass_pole)));
        let x_acc =
            temp - self.mass_pole * self.pole_length * theta_acc * costheta
                / (self.mass_cart + self.mass_pole);

        self.x += self.dt * self.x_dot;
        self.x_dot += self.dt * x_acc;
        self.theta += self.dt * self.theta_dot;
        self.theta_dot += self.dt * theta_acc;

        let done = self.x.abs() > 2.4 || self.theta.abs() > 0.20944;
        Ok((self.observation(), 1.0, done))
    }

    fn close(&mut self) {}
}

fn main() {
    let mut config = NeatConfig::default();
    config.harness.max_steps = 500;

    let mut population =
        Population::new(config, 4, 2, POPULATION_SIZE, 42).expect("valid configuration");
    let mut envs: Vec<CartPole> = (0..POPULATION_SIZE).map(|_| CartPole::new()).collect();

    for _ in 0..GENERATIONS {
        let stats = population.evolve(&mut envs, false).expect("evaluation failed");
        println!(
            "generation {:>3}  species {:>3}  best {:>7.1}  mean {:>7.1}",
            stats.generation, stats.species_count, stats.best_score, stats.mean_score
        );
    }

    if let Some((_, score)) = &population.champion {
        println!("champion balanced for {score:.0} steps");
    }
}
