//! Input/Output module.
//!
//! Reads the hyperparameter configuration of a linear DQN from YAML or JSON files.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dqn::{
    Environment, EnvironmentSpec, LinearExploration, LinearQFunction, LinearSchedule, Trainer,
    TrainerSettings,
};
use crate::DqnError;


/// Hyperparameters of a linear DQN.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DqnConfig {
    pub name: Option<String>,
    /// Environment shapes, if fixed by the config.
    #[serde(default)]
    pub environment: Option<EnvironmentSpec>,
    /// Number of stacked frames in a state.
    pub state_history: usize,
    /// Discount factor in the Q function.
    pub gamma: f64,

    pub batch_size: usize,
    pub nsteps_train: usize,
    pub learning_start: usize,
    pub learning_freq: usize,
    pub target_update_freq: usize,
    /// Gradients are clipped to this norm if present.
    #[serde(default)]
    pub clip_val: Option<f64>,

    pub lr_begin: f64,
    pub lr_end: f64,
    pub lr_nsteps: usize,

    pub eps_begin: f64,
    pub eps_end: f64,
    pub eps_nsteps: usize,
}

impl DqnConfig {
    /// Read the config from a file. `.json` files are parsed as JSON, everything else as YAML.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self, DqnError> {
        use std::io::{Error, ErrorKind};

        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let config: Self = if is_json {
            serde_json::from_str(&content).map_err(|e| {
                Error::new(ErrorKind::InvalidData, format!("Failed to parse config JSON: {e}"))
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                Error::new(ErrorKind::InvalidData, format!("Failed to parse config YAML: {e}"))
            })?
        };
        config.validate()?;
        log::info!(
            "Loaded config {} from {}",
            config.name.as_deref().unwrap_or("-"),
            path.display()
        );
        Ok(config)
    }

    /// Check the values that can't be expressed by the types alone.
    pub fn validate(&self) -> Result<(), DqnError> {
        let bad = |reason: &str| Err(DqnError::BadConfig(reason.to_string()));
        if !(0.0..=1.0).contains(&self.gamma) {
            return bad("gamma must be in [0, 1]");
        }
        if self.state_history == 0 {
            return bad("state_history must be positive");
        }
        if self.batch_size == 0 {
            return bad("batch_size must be positive");
        }
        if self.learning_freq == 0 || self.target_update_freq == 0 {
            return bad("learning_freq and target_update_freq must be positive");
        }
        if self.lr_begin <= 0.0 || self.lr_end <= 0.0 {
            return bad("learning rates must be positive");
        }
        if !(0.0..=1.0).contains(&self.eps_begin) || !(0.0..=1.0).contains(&self.eps_end) {
            return bad("exploration rates must be in [0, 1]");
        }
        if let Some(env) = &self.environment {
            let shape = env.observation_shape;
            if shape.height == 0 || shape.width == 0 || shape.channels == 0 {
                return bad("observation shape must not have empty dimensions");
            }
            if env.num_actions == 0 {
                return bad("num_actions must be positive");
            }
        }
        if let Some(clip) = self.clip_val {
            if clip <= 0.0 {
                return bad("clip_val must be positive");
            }
        }
        Ok(())
    }

    /// Environment shapes given in the config.
    pub fn environment(&self) -> Result<EnvironmentSpec, DqnError> {
        self.environment.ok_or_else(|| {
            DqnError::BadConfig("config doesn't describe the environment".to_string())
        })
    }

    pub fn lr_schedule(&self) -> LinearSchedule {
        LinearSchedule::new(self.lr_begin, self.lr_end, self.lr_nsteps)
    }

    pub fn exploration<E: Environment + ?Sized>(
        &self,
        env: &E,
    ) -> Result<LinearExploration, DqnError> {
        LinearExploration::from_env(env, self.eps_begin, self.eps_end, self.eps_nsteps)
    }

    pub fn trainer_settings(&self) -> TrainerSettings {
        TrainerSettings {
            gradient_clip: self.clip_val,
            target_update_period: self.target_update_freq,
            learning_start: self.learning_start,
            learning_freq: self.learning_freq,
        }
    }

    /// Build the Q-function for the given environment.
    pub fn build_q_function<E: Environment + ?Sized>(
        &self,
        env: &E,
        device: tch::Device,
    ) -> Result<LinearQFunction, DqnError> {
        LinearQFunction::new(env, self.state_history, self.gamma, self.lr_begin, device)
    }

    /// Build the Q-function and the trainer driving it.
    pub fn build_trainer<E: Environment + ?Sized>(
        &self,
        env: &E,
        device: tch::Device,
    ) -> Result<Trainer, DqnError> {
        let qf = self.build_q_function(env, device)?;
        Trainer::new(qf, self.lr_schedule(), self.trainer_settings())
    }
}
