//! Linear schedules for the learning rate and the exploration rate.
use super::*;

/// Linearly interpolates from `begin` to `end` over `nsteps` steps, then stays at `end`.
#[derive(Clone, Debug)]
pub struct LinearSchedule {
    pub begin: f64,
    pub end: f64,
    pub nsteps: usize,
    /// Current value, updated by [`LinearSchedule::update`].
    value: Option<f64>,
}

impl LinearSchedule {
    pub fn new(begin: f64, end: f64, nsteps: usize) -> Self {
        Self {
            begin,
            end,
            nsteps,
            value: None,
        }
    }

    /// Value of the schedule at step `t`.
    pub fn value_at(&self, t: usize) -> f64 {
        if t >= self.nsteps {
            self.end
        } else {
            let alpha = t as f64 / self.nsteps as f64;
            self.begin + (self.end - self.begin) * alpha
        }
    }

    pub fn update(&mut self, t: usize) -> f64 {
        let value = self.value_at(t);
        self.value = Some(value);
        value
    }

    /// Current value. Equals `begin` until the first update.
    pub fn value(&self) -> f64 {
        self.value.unwrap_or(self.begin)
    }
}

/// Epsilon-greedy exploration with a linearly decaying epsilon.
pub struct LinearExploration {
    schedule: LinearSchedule,
    num_actions: usize,
    rng: StdRng,
}

impl LinearExploration {
    /// This will use the thread local RANDOM_SEED variable if it's not None.
    ///
    /// Fails if the action space is empty.
    pub fn new(
        num_actions: usize,
        eps_begin: f64,
        eps_end: f64,
        nsteps: usize,
    ) -> Result<Self, DqnError> {
        if num_actions == 0 {
            return Err(DqnError::BadConfig("action space is empty".into()));
        }
        Ok(Self {
            schedule: LinearSchedule::new(eps_begin, eps_end, nsteps),
            num_actions,
            rng: create_rng(),
        })
    }

    pub fn from_env<E: Environment + ?Sized>(
        env: &E,
        eps_begin: f64,
        eps_end: f64,
        nsteps: usize,
    ) -> Result<Self, DqnError> {
        Self::new(env.num_actions(), eps_begin, eps_end, nsteps)
    }

    pub fn epsilon(&self) -> f64 {
        self.schedule.value()
    }

    pub fn update(&mut self, t: usize) -> f64 {
        self.schedule.update(t)
    }

    /// Returns a random action with probability epsilon, `best_action` otherwise.
    pub fn get_action(&mut self, best_action: ActionIndex) -> ActionIndex {
        if self.rng.gen::<f64>() < self.epsilon() {
            self.rng.gen_range(0..self.num_actions) as ActionIndex
        } else {
            best_action
        }
    }
}
