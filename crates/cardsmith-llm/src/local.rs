//! Local pipeline backend
//!
//! Runs a causal language model exported to ONNX in-process with tract and
//! tokenizes with the HuggingFace `tokenizers` crate. The model directory
//! must contain `model.onnx` and `tokenizer.json`. No network access happens
//! once the files are on disk.
//!
//! Decoding is autoregressive without a KV cache: each step feeds the most
//! recent `max_context_tokens` tokens and reads the logits of the last
//! position. Only the newly generated text is returned, never the prompt.

use crate::BackendError;
use cardsmith_domain::{GenerationOptions, ModelBackend};
use rand::distributions::{Distribution, WeightedIndex};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;
use tracing::{debug, info};
use tract_onnx::prelude::*;

/// ONNX graph file inside the model directory
pub const MODEL_FILE: &str = "model.onnx";

/// Tokenizer file inside the model directory
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// End-of-sequence tokens tried when none is configured
const WELL_KNOWN_EOS: [&str; 3] = ["</s>", "<|endoftext|>", "<|eot_id|>"];

type Plan = TypedRunnableModel<TypedModel>;

/// In-process causal LM backend
pub struct LocalPipelineBackend {
    model_dir: PathBuf,
    plan: Plan,
    tokenizer: Tokenizer,
    eos_id: Option<u32>,
    feeds_attention_mask: bool,
    max_context_tokens: usize,
}

impl LocalPipelineBackend {
    /// Load model and tokenizer from `model_dir`
    ///
    /// # Errors
    ///
    /// Returns `ModelLoad` when either file is missing or unreadable, or the
    /// graph does not take one (input ids) or two (ids and attention mask)
    /// inputs.
    pub fn load(
        model_dir: &Path,
        eos_token: Option<&str>,
        max_context_tokens: usize,
    ) -> Result<Self, BackendError> {
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            BackendError::ModelLoad(format!("{}: {}", tokenizer_path.display(), e))
        })?;

        let optimized = tract_onnx::onnx()
            .model_for_path(&model_path)
            .map_err(|e| BackendError::ModelLoad(format!("{}: {}", model_path.display(), e)))?
            .into_optimized()
            .map_err(|e| BackendError::ModelLoad(format!("Optimize: {}", e)))?;

        let feeds_attention_mask = match optimized.inputs.len() {
            1 => false,
            2 => true,
            n => {
                return Err(BackendError::ModelLoad(format!(
                    "Expected 1 or 2 model inputs, found {}",
                    n
                )))
            }
        };

        let plan = optimized
            .into_runnable()
            .map_err(|e| BackendError::ModelLoad(format!("Build runnable: {}", e)))?;

        let eos_id = resolve_eos(&tokenizer, eos_token);
        info!(model_dir = %model_dir.display(), ?eos_id, "Loaded local model");

        Ok(Self {
            model_dir: model_dir.to_path_buf(),
            plan,
            tokenizer,
            eos_id,
            feeds_attention_mask,
            max_context_tokens: max_context_tokens.max(1),
        })
    }

    fn next_token_logits(&self, context: &[u32]) -> Result<Vec<f32>, BackendError> {
        let len = context.len();
        let ids: Vec<i64> = context.iter().map(|&id| id as i64).collect();

        let ids = tract_ndarray::Array2::from_shape_vec((1, len), ids)
            .map_err(|e| BackendError::Other(format!("Input ids shape: {}", e)))?;
        let mut inputs: TVec<TValue> = tvec!(Tensor::from(ids).into());
        if self.feeds_attention_mask {
            let mask = tract_ndarray::Array2::<i64>::ones((1, len));
            inputs.push(Tensor::from(mask).into());
        }

        let outputs = self
            .plan
            .run(inputs)
            .map_err(|e| BackendError::Other(format!("Inference failed: {}", e)))?;
        let logits = outputs
            .first()
            .ok_or_else(|| BackendError::Other("Model produced no output".to_string()))?;
        let view = logits
            .to_array_view::<f32>()
            .map_err(|e| BackendError::Other(format!("Logits: {}", e)))?;

        // [batch, seq, vocab]
        let shape = view.shape();
        if shape.len() != 3 || shape[1] == 0 {
            return Err(BackendError::Other(format!("Unexpected logits shape: {:?}", shape)));
        }
        let last = view.slice(tract_ndarray::s![0, shape[1] - 1, ..]);
        Ok(last.iter().copied().collect())
    }
}

fn resolve_eos(tokenizer: &Tokenizer, configured: Option<&str>) -> Option<u32> {
    match configured {
        Some(token) => tokenizer.token_to_id(token),
        None => WELL_KNOWN_EOS
            .iter()
            .find_map(|token| tokenizer.token_to_id(token)),
    }
}

/// Most recent `window` tokens of `ids`
fn context_window(ids: &[u32], window: usize) -> &[u32] {
    &ids[ids.len().saturating_sub(window)..]
}

fn argmax(logits: &[f32]) -> Option<usize> {
    logits
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(index, _)| index)
}

/// Softmax of `logits / temperature`, shifted by the max for stability
fn softmax_with_temperature(logits: &[f32], temperature: f32) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits
        .iter()
        .map(|&l| ((l - max) / temperature).exp())
        .collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn pick_token(logits: &[f32], temperature: f32) -> Result<u32, BackendError> {
    let greedy = || {
        argmax(logits)
            .map(|i| i as u32)
            .ok_or_else(|| BackendError::Other("Empty logits".to_string()))
    };
    if temperature <= 0.0 {
        return greedy();
    }

    let weights = softmax_with_temperature(logits, temperature);
    match WeightedIndex::new(&weights) {
        Ok(dist) => Ok(dist.sample(&mut rand::thread_rng()) as u32),
        // Degenerate distribution (all zero or NaN): fall back to greedy
        Err(_) => greedy(),
    }
}

impl ModelBackend for LocalPipelineBackend {
    type Error = BackendError;

    fn generate_text(&self, prompt: &str, options: &GenerationOptions) -> Result<String, Self::Error> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| BackendError::Other(format!("Tokenize: {}", e)))?;
        let mut ids: Vec<u32> = encoding.get_ids().to_vec();
        let prompt_len = ids.len();

        for _ in 0..options.max_tokens {
            let context = context_window(&ids, self.max_context_tokens);
            let logits = self.next_token_logits(context)?;
            let next = pick_token(&logits, options.temperature)?;
            if Some(next) == self.eos_id {
                break;
            }
            ids.push(next);
        }

        debug!(
            prompt_tokens = prompt_len,
            generated_tokens = ids.len() - prompt_len,
            "Local generation finished"
        );

        self.tokenizer
            .decode(&ids[prompt_len..], true)
            .map_err(|e| BackendError::Other(format!("Decode: {}", e)))
    }

    fn describe(&self) -> String {
        format!("local:{}", self.model_dir.display())
    }
}
