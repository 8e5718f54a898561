//! Frozen Elo feed-forward network
//!
//! Architecture: Input(10) → Hidden1(64) → ReLU
//!                         → Hidden2(32) → ReLU
//!                         → Output(1)   → Sigmoid

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::activation::{relu, sigmoid};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::features::FEATURE_DIM;
use crate::{Result, TennisError};

/// Scores a normalized feature vector with a value in (0, 1)
///
/// Implementations must be deterministic and keep no state between calls.
/// Predictors are shared across threads, so scorers must be `Send + Sync`.
pub trait ScoringModel: Send + Sync {
    fn score(&self, features: &[f32; FEATURE_DIM]) -> Result<f32>;
}

/// Layer sizes for the network
#[derive(Debug, Clone)]
pub struct EloNetConfig {
    pub input_dim: usize,
    pub hidden_dims: [usize; 2],
}

impl Default for EloNetConfig {
    fn default() -> Self {
        EloNetConfig {
            input_dim: FEATURE_DIM,
            hidden_dims: [64, 32],
        }
    }
}

#[derive(Module, Debug)]
pub struct EloNet<B: Backend> {
    hidden1: Linear<B>,
    hidden2: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> EloNet<B> {
    /// Create a network with freshly initialised weights
    pub fn new(device: &B::Device, config: EloNetConfig) -> Self {
        let [h1, h2] = config.hidden_dims;
        EloNet {
            hidden1: LinearConfig::new(config.input_dim, h1).init(device),
            hidden2: LinearConfig::new(h1, h2).init(device),
            output: LinearConfig::new(h2, 1).init(device),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Normalized features [batch, input_dim]
    ///
    /// # Returns
    /// Win probability for the first player [batch, 1]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.hidden1.forward(x));
        let x = relu(self.hidden2.forward(x));
        sigmoid(self.output.forward(x))
    }

    /// Save model to file
    pub fn save(&self, path: &str) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), path.into())
            .map_err(|e| TennisError::Model(format!("Failed to save {}: {}", path, e)))
    }

    /// Load model from file
    pub fn load(device: &B::Device, path: &str, config: EloNetConfig) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(path.into(), device)
            .map_err(|e| TennisError::Model(format!("Failed to load {}: {}", path, e)))?;

        let model = Self::new(device, config);
        Ok(model.load_record(record))
    }
}

/// Weights of one `Linear` layer copied out of burn's parameter storage
///
/// `weight` is row-major `[d_input, d_output]`, matching burn's layout.
#[derive(Debug, Clone, PartialEq)]
struct DenseLayer {
    weight: Vec<f32>,
    bias: Vec<f32>,
    d_input: usize,
    d_output: usize,
}

impl DenseLayer {
    fn from_linear<B: Backend>(linear: &Linear<B>) -> Result<Self> {
        let weight = linear.weight.val();
        let [d_input, d_output] = weight.dims();
        let weight = tensor_values(weight.into_data())?;
        let bias = match &linear.bias {
            Some(bias) => tensor_values(bias.val().into_data())?,
            None => vec![0.0; d_output],
        };

        if weight.len() != d_input * d_output || bias.len() != d_output {
            return Err(TennisError::Model(format!(
                "Layer shape mismatch: {} weights and {} biases for {}x{}",
                weight.len(),
                bias.len(),
                d_input,
                d_output
            )));
        }

        Ok(DenseLayer {
            weight,
            bias,
            d_input,
            d_output,
        })
    }

    /// `input · weight + bias`
    fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut out = self.bias.clone();
        for (x, row) in input.iter().zip(self.weight.chunks_exact(self.d_output)) {
            for (o, w) in out.iter_mut().zip(row) {
                *o += x * w;
            }
        }
        out
    }
}

fn tensor_values(data: burn::tensor::TensorData) -> Result<Vec<f32>> {
    data.convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| TennisError::Model(format!("Failed to read weights: {:?}", e)))
}

/// [`ScoringModel`] evaluating a frozen [`EloNet`]
///
/// Weights are copied out of the burn module once, so the scorer is plain
/// immutable data and can be shared between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct EloScorer {
    hidden1: DenseLayer,
    hidden2: DenseLayer,
    output: DenseLayer,
}

impl EloScorer {
    /// Freeze a network's current weights
    pub fn from_network<B: Backend>(model: &EloNet<B>) -> Result<Self> {
        let scorer = EloScorer {
            hidden1: DenseLayer::from_linear(&model.hidden1)?,
            hidden2: DenseLayer::from_linear(&model.hidden2)?,
            output: DenseLayer::from_linear(&model.output)?,
        };

        if scorer.hidden1.d_input != FEATURE_DIM
            || scorer.hidden2.d_input != scorer.hidden1.d_output
            || scorer.output.d_input != scorer.hidden2.d_output
            || scorer.output.d_output != 1
        {
            return Err(TennisError::Model(format!(
                "Unexpected topology {} → {} → {} → {}",
                scorer.hidden1.d_input,
                scorer.hidden1.d_output,
                scorer.hidden2.d_output,
                scorer.output.d_output
            )));
        }
        Ok(scorer)
    }

    /// Load weights from a burn record
    pub fn load<B: Backend>(device: &B::Device, path: &str) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let model = EloNet::<B>::load(device, path, EloNetConfig::default())?;
        let scorer = Self::from_network(&model)?;
        log::info!("Loaded model weights from {}.mpk", path);
        Ok(scorer)
    }
}

impl ScoringModel for EloScorer {
    fn score(&self, features: &[f32; FEATURE_DIM]) -> Result<f32> {
        let mut x = self.hidden1.forward(features);
        x.iter_mut().for_each(|v| *v = v.max(0.0));
        let mut x = self.hidden2.forward(&x);
        x.iter_mut().for_each(|v| *v = v.max(0.0));
        let logits = self.output.forward(&x);

        match logits.first() {
            Some(z) if z.is_finite() => Ok(1.0 / (1.0 + (-z).exp())),
            Some(z) => Err(TennisError::Model(format!("Non-finite model output {}", z))),
            None => Err(TennisError::Model("Empty model output".to_string())),
        }
    }
}
