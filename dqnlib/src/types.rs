//! Primitive data types.

/// Data type for action indices.
/// Has to be i64 because of Torch.
pub type ActionIndex = i64;
/// Data type for rewards.
pub type Reward = f32;
/// Data type for scalar values read back from tensors (losses, Q-values).
pub type Value = f64;
