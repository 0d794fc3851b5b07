use super::*;

/// A minibatch of transitions, as supplied by the replay memory of the caller.
pub struct TransitionBatch {
    /// [B, H, W, C] where C is the channel count times the state history.
    pub states: Tensor,
    /// [B], index of the taken action for each state.
    pub actions: Tensor,
    /// [B], reward of the taken action.
    pub rewards: Tensor,
    /// [B, H, W, C], the state reached after the action.
    pub next_states: Tensor,
    /// [B], true where the transition ended the episode.
    pub done_mask: Tensor,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrainerSettings {
    /// Gradients are clipped to this norm if present.
    pub gradient_clip: Option<f64>,
    /// Number of environment steps between two target network updates.
    /// The target is synchronized at every step `t` divisible by this period, whether or
    /// not a training step runs at `t`.
    pub target_update_period: usize,
    /// Steps before the first training step.
    pub learning_start: usize,
    /// Train once every `learning_freq` steps.
    pub learning_freq: usize,
}

/// Drives training steps of a [`LinearQFunction`]: learning rate schedule, gradient
/// clipping and periodic target network updates.
pub struct Trainer {
    qf: LinearQFunction,
    lr_schedule: LinearSchedule,
    settings: TrainerSettings,
}

impl Trainer {
    /// The target network starts as an exact copy of the Q-network.
    pub fn new(
        mut qf: LinearQFunction,
        lr_schedule: LinearSchedule,
        settings: TrainerSettings,
    ) -> Result<Self, DqnError> {
        if settings.target_update_period == 0 || settings.learning_freq == 0 {
            return Err(DqnError::BadConfig(
                "target_update_period and learning_freq must be positive".into(),
            ));
        }
        qf.update_target()?;
        qf.set_lr(lr_schedule.value());
        Ok(Self {
            qf,
            lr_schedule,
            settings,
        })
    }

    pub fn q_function(&self) -> &LinearQFunction {
        &self.qf
    }

    pub fn into_q_function(self) -> LinearQFunction {
        self.qf
    }

    pub fn lr(&self) -> f64 {
        self.lr_schedule.value()
    }

    /// Whether the caller should run a training step at environment step `t`.
    pub fn is_learning_step(&self, t: usize) -> bool {
        t > self.settings.learning_start && t % self.settings.learning_freq == 0
    }

    /// Whether the target network is synchronized at environment step `t`.
    pub fn is_target_update_step(&self, t: usize) -> bool {
        t % self.settings.target_update_period == 0
    }

    /// Advance the trainer to environment step `t`.
    ///
    /// Trains on the batch produced by `sample` if `t` is a learning step, then updates the
    /// target network if `t` is a target update step. Returns the loss if training ran.
    pub fn step<F>(&mut self, t: usize, sample: F) -> Result<Option<Value>, DqnError>
    where
        F: FnOnce() -> TransitionBatch,
    {
        let loss = if self.is_learning_step(t) {
            Some(self.train_step(t, &sample())?)
        } else {
            None
        };
        if self.is_target_update_step(t) {
            self.qf.update_target()?;
            log::info!("[{t}] Target network updated. lr: {:.6}", self.lr());
        }
        Ok(loss)
    }

    /// Run one optimization step on the given batch and return the loss.
    ///
    /// This doesn't touch the target network, see [`Trainer::step`].
    pub fn train_step(&mut self, t: usize, batch: &TransitionBatch) -> Result<Value, DqnError> {
        let lr = self.lr_schedule.update(t);
        self.qf.set_lr(lr);

        let q_values = self.qf.q_values(&batch.states, NetworkKind::QNetwork)?;
        let target_q_values = tch::no_grad(|| {
            self.qf
                .q_values(&batch.next_states, NetworkKind::TargetNetwork)
        })?;
        let loss = self.qf.calc_loss(
            &q_values,
            &target_q_values,
            &batch.actions,
            &batch.rewards,
            &batch.done_mask,
        );
        self.qf.backward_step(&loss, self.settings.gradient_clip);
        let loss = loss.double_value(&[]);
        log::debug!("[{t}] Loss: {loss:.4}, lr: {lr:.6}");
        Ok(loss)
    }

    /// Epsilon-greedy action for a single state `[H, W, C]` or a batch of one.
    pub fn select_action(
        &self,
        state: &Tensor,
        exploration: &mut LinearExploration,
    ) -> Result<ActionIndex, DqnError> {
        let state = if state.dim() == 3 {
            state.unsqueeze(0)
        } else {
            state.shallow_clone()
        };
        let best = self.qf.best_actions(&state)?.int64_value(&[0]);
        Ok(exploration.get_action(best))
    }
}
