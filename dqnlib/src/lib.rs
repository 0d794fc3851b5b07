//! # Linear Deep Q-Learning Library
//!
//! A Deep Q-Network core with a single fully-connected layer as the Q-function
//! approximator, together with the schedules and the training-step driver that
//! surround it.

use std::cell::RefCell;

use rand::{rngs::StdRng, SeedableRng};

pub mod dqn;
pub mod io;
pub mod types;

thread_local! {
    /// Seed used by [`create_rng`] and [`dqn::load_torch_seed`].
    /// Random generators are seeded from entropy while this is `None`.
    pub static RANDOM_SEED: RefCell<Option<u64>> = const { RefCell::new(None) };
}

/// Create a random number generator, seeded from [`RANDOM_SEED`] if present.
pub fn create_rng() -> StdRng {
    RANDOM_SEED.with_borrow(|seed| match seed {
        Some(seed) => StdRng::seed_from_u64(*seed),
        None => StdRng::from_entropy(),
    })
}

/// Set the thread local [`RANDOM_SEED`].
pub fn set_random_seed(seed: Option<u64>) {
    RANDOM_SEED.with_borrow_mut(|value| *value = seed);
}

/// Errors produced by the Q-function approximator and its surroundings.
#[derive(Debug)]
pub enum DqnError {
    /// Q-values were requested from a network name that doesn't exist.
    InvalidNetwork(String),
    /// Per-example size of a state doesn't match the network input size.
    ShapeMismatch { expected: i64, found: i64 },
    /// A batch without any examples, which has no defined mean loss.
    EmptyBatch,
    /// Configuration values that cannot describe a valid model.
    BadConfig(String),
    Torch(tch::TchError),
    Io(std::io::Error),
}

impl std::error::Error for DqnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DqnError::Torch(e) => Some(e),
            DqnError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for DqnError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DqnError::InvalidNetwork(name) => write!(f, "Incorrect network type: {}", name),
            DqnError::ShapeMismatch { expected, found } => write!(
                f,
                "State size mismatch: expected {} features per example, found {}",
                expected, found
            ),
            DqnError::EmptyBatch => write!(f, "Empty batch"),
            DqnError::BadConfig(reason) => write!(f, "Bad config: {}", reason),
            DqnError::Torch(e) => write!(f, "Torch error: {}", e),
            DqnError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl From<tch::TchError> for DqnError {
    fn from(value: tch::TchError) -> Self {
        DqnError::Torch(value)
    }
}

impl From<std::io::Error> for DqnError {
    fn from(value: std::io::Error) -> Self {
        DqnError::Io(value)
    }
}
