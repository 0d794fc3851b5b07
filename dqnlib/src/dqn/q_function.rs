//! The linear Q-function approximator: Q-network, target network, TD loss and optimizer.
use std::str::FromStr;

use super::*;

/// Selects one of the two networks held by [`LinearQFunction`].
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    /// The network that is trained by the optimizer.
    QNetwork,
    /// The lagging copy used for bootstrapped targets.
    TargetNetwork,
}

impl NetworkKind {
    pub fn name(&self) -> &'static str {
        match self {
            NetworkKind::QNetwork => "q_network",
            NetworkKind::TargetNetwork => "target_network",
        }
    }
}

impl FromStr for NetworkKind {
    type Err = DqnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "q_network" => Ok(NetworkKind::QNetwork),
            "target_network" => Ok(NetworkKind::TargetNetwork),
            _ => Err(DqnError::InvalidNetwork(s.to_string())),
        }
    }
}

impl std::fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Q-network and target network sharing one architecture but never their parameters.
pub struct LinearQFunction {
    /// Primary model. This model will be trained.
    q_network: LinearModel,
    /// The target model that will be updated occasionally from the primary model.
    target_network: LinearModel,
    /// Optimizer for the primary model.
    opt: nn::Optimizer,
    /// Discount factor in the Q function.
    gamma: f64,
    num_actions: i64,
}

impl LinearQFunction {
    /// Create both networks with independently sampled weights, plus an Adam optimizer over
    /// the Q-network parameters.
    ///
    /// The input to the networks is a `height * width` image with
    /// `channels * state_history` channels.
    pub fn new<E: Environment + ?Sized>(
        env: &E,
        state_history: usize,
        gamma: f64,
        lr: f64,
        device: tch::Device,
    ) -> Result<Self, DqnError> {
        let input_size = env.observation_shape().input_size(state_history);
        Self::with_sizes(input_size, env.num_actions(), gamma, lr, device)
    }

    /// Same as [`LinearQFunction::new`] with explicit input and output sizes.
    pub fn with_sizes(
        input_size: usize,
        num_actions: usize,
        gamma: f64,
        lr: f64,
        device: tch::Device,
    ) -> Result<Self, DqnError> {
        if input_size == 0 {
            return Err(DqnError::BadConfig("input size must be positive".into()));
        }
        if num_actions == 0 {
            return Err(DqnError::BadConfig("action space is empty".into()));
        }
        // Torch requires i64 for sizes.
        let to_i64 = |x: usize| {
            i64::try_from(x).map_err(|_| DqnError::BadConfig(format!("size {x} is too large")))
        };
        let input_size = to_i64(input_size)?;
        let num_actions = to_i64(num_actions)?;

        load_torch_seed();
        let q_network = LinearModel::new(device, input_size, num_actions);
        let mut target_network = LinearModel::new(device, input_size, num_actions);
        target_network.vs.freeze();
        let opt = Self::build_optimizer(&q_network, lr)?;

        log::debug!(
            "Initialized linear Q-function: {} inputs, {} actions, gamma = {}",
            input_size,
            num_actions,
            gamma
        );

        Ok(Self {
            q_network,
            target_network,
            opt,
            gamma,
            num_actions,
        })
    }

    /// Adam over the Q-network only. The target network is never registered.
    fn build_optimizer(q_network: &LinearModel, lr: f64) -> Result<nn::Optimizer, DqnError> {
        Ok(nn::Adam::default().build(&q_network.vs, lr)?)
    }

    /// Replace the optimizer with a fresh Adam instance (moment estimates are reset).
    pub fn add_optimizer(&mut self, lr: f64) -> Result<(), DqnError> {
        self.opt = Self::build_optimizer(&self.q_network, lr)?;
        Ok(())
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn num_actions(&self) -> i64 {
        self.num_actions
    }

    pub fn input_size(&self) -> i64 {
        self.q_network.input_size()
    }

    pub fn network(&self, kind: NetworkKind) -> &LinearModel {
        match kind {
            NetworkKind::QNetwork => &self.q_network,
            NetworkKind::TargetNetwork => &self.target_network,
        }
    }

    /// Returns Q values for all actions.
    ///
    /// `state` is `[B, H, W, C]` (any trailing layout works as long as it flattens to the
    /// input size). Output is `[B, num_actions]`.
    pub fn q_values(&self, state: &Tensor, kind: NetworkKind) -> Result<Tensor, DqnError> {
        let network = self.network(kind);
        if state.dim() < 2 {
            return Err(DqnError::ShapeMismatch {
                expected: network.input_size(),
                found: state.numel() as i64,
            });
        }
        if state.size()[0] == 0 {
            return Err(DqnError::EmptyBatch);
        }
        // Flatten each example but keep the batch axis.
        let flat = state.flatten(1, -1);
        let found = flat.size()[1];
        if found != network.input_size() {
            return Err(DqnError::ShapeMismatch {
                expected: network.input_size(),
                found,
            });
        }
        Ok(network.forward(&flat.to_kind(Kind::Float)))
    }

    /// String keyed variant of [`LinearQFunction::q_values`].
    /// Accepts `"q_network"` and `"target_network"`.
    pub fn get_q_values(&self, state: &Tensor, network: &str) -> Result<Tensor, DqnError> {
        self.q_values(state, network.parse()?)
    }

    /// Copy all Q-network weights into the target network.
    pub fn update_target(&mut self) -> Result<(), DqnError> {
        self.target_network.copy_from(&self.q_network)?;
        log::debug!("Target network synchronized");
        Ok(())
    }

    /// TD loss for this step with this function's discount factor. See [`calc_loss`].
    pub fn calc_loss(
        &self,
        q_values: &Tensor,
        target_q_values: &Tensor,
        actions: &Tensor,
        rewards: &Tensor,
        done_mask: &Tensor,
    ) -> Tensor {
        calc_loss(
            q_values,
            target_q_values,
            actions,
            rewards,
            done_mask,
            self.gamma,
        )
    }

    pub fn set_lr(&mut self, lr: f64) {
        self.opt.set_lr(lr);
    }

    /// Backpropagate the loss and update the Q-network.
    /// Gradients are clipped to the given norm if `clip` is present.
    pub fn backward_step(&mut self, loss: &Tensor, clip: Option<f64>) {
        if let Some(clip) = clip {
            self.opt.backward_step_clip_norm(loss, clip);
        } else {
            self.opt.backward_step(loss);
        }
    }

    /// Greedy action for each state in the batch, computed without gradients.
    pub fn best_actions(&self, state: &Tensor) -> Result<Tensor, DqnError> {
        let _guard = tch::no_grad_guard();
        Ok(self.q_values(state, NetworkKind::QNetwork)?.argmax(1, false))
    }
}

/// Bellman targets:
/// - `Q_samp(s) = r` if done
/// - `Q_samp(s) = r + gamma * max_a' Q_target(s', a')` otherwise
///
/// The result is detached from the graph.
pub fn bellman_targets(
    target_q_values: &Tensor,
    rewards: &Tensor,
    done_mask: &Tensor,
    gamma: f64,
) -> Tensor {
    tch::no_grad(|| {
        let rewards = rewards.to_kind(Kind::Float);
        let done = done_mask.to_kind(Kind::Bool);
        let (best, _) = target_q_values.detach().max_dim(1, false);
        let bootstrapped = &rewards + best.to_kind(Kind::Float) * gamma;
        // Select instead of multiplying by the mask, so non-finite target values of
        // terminal transitions cannot leak into the sample.
        rewards.where_self(&done, &bootstrapped)
    })
}

/// Mean squared error between the Bellman targets and `Q(s, a)` of the taken actions.
///
/// - `q_values`: [B, A], estimates of the current network.
/// - `target_q_values`: [B, A], estimates of the target network for the successor states.
/// - `actions`: [B], taken actions.
/// - `rewards`: [B], received rewards.
/// - `done_mask`: [B], true (or 1) where the transition ended the episode.
///
/// Gradient only flows through `q_values`. The batch must not be empty,
/// [`LinearQFunction::q_values`] rejects such batches.
pub fn calc_loss(
    q_values: &Tensor,
    target_q_values: &Tensor,
    actions: &Tensor,
    rewards: &Tensor,
    done_mask: &Tensor,
    gamma: f64,
) -> Tensor {
    let q_samp = bellman_targets(target_q_values, rewards, done_mask, gamma);
    let actions = actions.to_kind(Kind::Int64).unsqueeze(1);
    let q_sa = q_values.gather(1, &actions, false).squeeze_dim(1);
    q_sa.mse_loss(&q_samp, Reduction::Mean)
}
