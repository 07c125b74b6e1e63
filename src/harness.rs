use rayon::prelude::*;

use crate::context::HarnessParameters;
use crate::environment::{EnvError, Environment};
use crate::genome::{BaseNodes, Genome};
use crate::nn::nn::{select_action, NetworkError, NeuralNetwork};
use crate::nn::recurrent::RecurrentNetwork;

#[derive(thiserror::Error, miette::Diagnostic, Debug)]
pub enum HarnessError {
    #[error("population has {genomes} genomes but {envs} environments")]
    EnvironmentMismatch { genomes: usize, envs: usize },
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Average episode return for every genome, raised to the score exponent.
///
/// Each genome is scored in the environment at the same index. Scoring never
/// touches the innovation history and draws no randomness, so the per-pair
/// work runs on the rayon pool; environment errors surface unchanged. A NaN
/// score collapses to zero so the selection sampler stays defined.
pub fn evaluate_networks<E>(
    genomes: &[Genome],
    base: &BaseNodes,
    envs: &mut [E],
    params: &HarnessParameters,
    render: bool,
) -> Result<Vec<f64>, HarnessError>
where
    E: Environment + Send,
{
    if genomes.len() != envs.len() {
        return Err(HarnessError::EnvironmentMismatch {
            genomes: genomes.len(),
            envs: envs.len(),
        });
    }

    genomes
        .par_iter()
        .zip(envs.par_iter_mut())
        .map(|(genome, env)| {
            let mut total = 0.0;
            for _ in 0..params.episodes {
                total += episode_reward(genome, base, env, params.max_steps, render)?;
            }
            let score = (total / params.episodes as f64).powf(params.score_exponent);
            Ok(if score.is_nan() { 0.0 } else { score })
        })
        .collect()
}

fn episode_reward<E: Environment>(
    genome: &Genome,
    base: &BaseNodes,
    env: &mut E,
    max_steps: usize,
    render: bool,
) -> Result<f64, HarnessError> {
    let mut network = RecurrentNetwork::new(genome, base)?;
    let mut observation = env.reset()?;
    let mut episode_reward = 0.0;

    for _ in 0..max_steps {
        let output = network.activate(&observation)?;
        let action = select_action(&output);
        let (next, reward, done) = env.step(action)?;
        observation = next;

        if render {
            env.render();
        }

        episode_reward += reward;
        if done {
            break;
        }
    }

    env.close();
    Ok(episode_reward)
}

#[cfg(test)]
mod tests {
    use super::evaluate_networks;
    use crate::context::HarnessParameters;
    use crate::environment::{EnvError, Environment, Observation};
    use crate::genome::{BaseNodes, Genome};

    /// Pays a fixed reward per step and ends after a set number of steps.
    struct FixedReward {
        reward: f64,
        horizon: usize,
        steps: usize,
        episodes_closed: usize,
    }

    impl FixedReward {
        fn new(reward: f64, horizon: usize) -> Self {
            FixedReward {
                reward,
                horizon,
                steps: 0,
                episodes_closed: 0,
            }
        }
    }

    impl Environment for FixedReward {
        fn reset(&mut self) -> Result<Observation, EnvError> {
            self.steps = 0;
            Ok(vec![0.0])
        }

        fn step(&mut self, _action: usize) -> Result<(Observation, f64, bool), EnvError> {
            self.steps += 1;
            Ok((vec![0.0], self.reward, self.steps >= self.horizon))
        }

        fn close(&mut self) {
            self.episodes_closed += 1;
        }
    }

    struct Failing;

    impl Environment for Failing {
        fn reset(&mut self) -> Result<Observation, EnvError> {
            Err(EnvError::Reset("backend gone".into()))
        }

        fn step(&mut self, _action: usize) -> Result<(Observation, f64, bool), EnvError> {
            unreachable!()
        }

        fn close(&mut self) {}
    }

    fn params(max_steps: usize, episodes: usize, score_exponent: f64) -> HarnessParameters {
        HarnessParameters {
            max_steps,
            episodes,
            score_exponent,
        }
    }

    #[test]
    fn scores_average_episode_returns() {
        let base = BaseNodes::new(1, 1);
        let genomes = vec![Genome::new(), Genome::new()];
        let mut envs = vec![FixedReward::new(1.0, 5), FixedReward::new(2.0, 5)];

        let scores =
            evaluate_networks(&genomes, &base, &mut envs, &params(10, 3, 1.0), false).unwrap();
        assert_eq!(scores, vec![5.0, 10.0]);
        assert_eq!(envs[0].episodes_closed, 3);
        assert_eq!(envs[1].episodes_closed, 3);
    }

    #[test]
    fn episodes_are_cut_off_at_max_steps() {
        let base = BaseNodes::new(1, 1);
        let genomes = vec![Genome::new()];
        let mut envs = vec![FixedReward::new(1.0, 1000)];

        let scores =
            evaluate_networks(&genomes, &base, &mut envs, &params(7, 1, 1.0), false).unwrap();
        assert_eq!(scores, vec![7.0]);
    }

    #[test]
    fn score_exponent_shapes_the_result() {
        let base = BaseNodes::new(1, 1);
        let genomes = vec![Genome::new()];
        let mut envs = vec![FixedReward::new(1.0, 3)];

        let scores =
            evaluate_networks(&genomes, &base, &mut envs, &params(10, 1, 2.0), false).unwrap();
        assert_eq!(scores, vec![9.0]);
    }

    #[test]
    fn nan_scores_collapse_to_zero() {
        let base = BaseNodes::new(1, 1);
        let genomes = vec![Genome::new()];
        // Negative mean return under a fractional exponent is NaN.
        let mut envs = vec![FixedReward::new(-1.0, 4)];

        let scores =
            evaluate_networks(&genomes, &base, &mut envs, &params(10, 1, 0.5), false).unwrap();
        assert_eq!(scores, vec![0.0]);
    }

    #[test]
    fn env_failures_surface() {
        let base = BaseNodes::new(1, 1);
        let genomes = vec![Genome::new()];
        let mut envs = vec![Failing];

        let result = evaluate_networks(&genomes, &base, &mut envs, &params(10, 1, 1.0), false);
        assert!(result.is_err());
    }

    #[test]
    fn mismatched_env_count_is_an_error() {
        let base = BaseNodes::new(1, 1);
        let genomes = vec![Genome::new(), Genome::new()];
        let mut envs = vec![FixedReward::new(1.0, 2)];

        let result = evaluate_networks(&genomes, &base, &mut envs, &params(10, 1, 1.0), false);
        assert!(result.is_err());
    }
}
