//! Environment interface consumed by the Q-function.
use super::*;

/// Shape of a single observation frame: `(height, width, channels)`.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct ObservationShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl ObservationShape {
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Number of input features once `history` frames are stacked along the channel axis
    /// and flattened.
    pub fn input_size(&self, history: usize) -> usize {
        self.height * self.width * self.channels * history
    }
}

impl From<(usize, usize, usize)> for ObservationShape {
    fn from(value: (usize, usize, usize)) -> Self {
        let (height, width, channels) = value;
        Self::new(height, width, channels)
    }
}

/// What the Q-function needs to know about the environment it is trained on.
///
/// Observations themselves are produced by the caller as tensors of shape
/// `[batch, height, width, channels * history]`.
pub trait Environment {
    /// Shape of a single observation frame.
    fn observation_shape(&self) -> ObservationShape;
    /// Size of the discrete action space.
    fn num_actions(&self) -> usize;
}

/// Fixed environment description, for callers that only know the shapes.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct EnvironmentSpec {
    pub observation_shape: ObservationShape,
    pub num_actions: usize,
}

impl Environment for EnvironmentSpec {
    fn observation_shape(&self) -> ObservationShape {
        self.observation_shape
    }

    fn num_actions(&self) -> usize {
        self.num_actions
    }
}
