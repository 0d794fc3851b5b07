use super::*;

/// A single fully-connected layer mapping flattened states to one value per action.
///
/// Each model owns its own [`nn::VarStore`], so two models never share parameter storage.
pub struct LinearModel {
    pub vs: nn::VarStore,
    linear: nn::Linear,
    input_size: i64,
    output_size: i64,
}

impl LinearModel {
    /// Create a model with freshly sampled weights.
    pub fn new(device: tch::Device, input_size: i64, output_size: i64) -> Self {
        let vs = nn::VarStore::new(device);
        let root = &vs.root();
        let linear = nn::linear(root / "linear", input_size, output_size, Default::default());
        Self {
            vs,
            linear,
            input_size,
            output_size,
        }
    }

    pub fn input_size(&self) -> i64 {
        self.input_size
    }

    pub fn output_size(&self) -> i64 {
        self.output_size
    }

    /// Forward pass on already flattened input.
    /// [B, N] -> [B, M] where N is the input size and M is the output size.
    pub fn forward(&self, input: &Tensor) -> Tensor {
        input.apply(&self.linear)
    }

    /// Copies parameters from another model.
    pub fn copy_from(&mut self, other: &LinearModel) -> Result<(), tch::TchError> {
        self.vs.copy(&other.vs)
    }

    /// Weight matrix of the layer, [M, N].
    pub fn weight(&self) -> &Tensor {
        &self.linear.ws
    }

    /// Bias vector of the layer, [M].
    pub fn bias(&self) -> Option<&Tensor> {
        self.linear.bs.as_ref()
    }
}
