//! Deep Q-Learning Module
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};
use tch::{
    nn::{self, OptimizerConfig},
    Kind, Reduction, Tensor,
};

use crate::{
    create_rng,
    types::{ActionIndex, Value},
    DqnError, RANDOM_SEED,
};

mod environment;
pub use self::environment::{Environment, EnvironmentSpec, ObservationShape};

mod model;
pub use self::model::LinearModel;

mod q_function;
pub use self::q_function::{bellman_targets, calc_loss, LinearQFunction, NetworkKind};

mod schedule;
pub use self::schedule::{LinearExploration, LinearSchedule};

mod training;
pub use self::training::{Trainer, TrainerSettings, TransitionBatch};


/// Seed libtorch using the [`RANDOM_SEED`] variable if present.
pub fn load_torch_seed() {
    RANDOM_SEED.with_borrow(|seed| {
        if let Some(seed) = seed {
            tch::manual_seed(*seed as i64);
        }
    });
}
