//! Episodic environment capability implemented by simulation backends.

/// Observation vector handed back by an environment; its length must match
/// the number of input nodes of the population being evaluated.
pub type Observation = Vec<f64>;

#[derive(thiserror::Error, miette::Diagnostic, Debug)]
pub enum EnvError {
    #[error("environment reset failed: {0}")]
    Reset(String),
    #[error("environment step failed: {0}")]
    Step(String),
}

/// An episodic simulator. The engine owns the handle exclusively while
/// scoring a genome, never retries a failed call, and calls [`close`] once at
/// the end of every episode.
///
/// [`close`]: Environment::close
pub trait Environment {
    /// Start a new episode and return the first observation.
    fn reset(&mut self) -> Result<Observation, EnvError>;

    /// Apply a discrete action, returning the next observation, the reward
    /// for the transition and whether the episode finished.
    fn step(&mut self, action: usize) -> Result<(Observation, f64, bool), EnvError>;

    /// Release per-episode resources.
    fn close(&mut self);

    /// Rendering hook, invoked each step when the harness runs with
    /// rendering on.
    fn render(&mut self) {}
}
