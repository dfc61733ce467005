use std::path::{Path, PathBuf};
use std::sync::Mutex;

use once_cell::sync::OnceCell;
use ort::session::Session;
use ort::value::TensorRef;
use tokenizers::Tokenizer;
use tracing::{info, warn};

use memorybridge_core::error::MemoryBridgeError;

use super::{reject_empty, EmbeddingService};
use crate::similarity::l2_normalize;

/// The process-wide local model. Loaded by whichever caller gets there first;
/// concurrent first callers block until that load finishes.
static LOCAL_MODEL: OnceCell<OnnxModel> = OnceCell::new();

/// A loaded sentence-transformer: ONNX session plus its tokenizer.
struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dimensions: usize,
    model_dir: PathBuf,
}

// ort::Session is Send + Sync internally (uses Arc<SharedSessionInner>).
unsafe impl Send for OnnxModel {}
unsafe impl Sync for OnnxModel {}

impl OnnxModel {
    fn load(model_dir: &Path) -> Result<Self, MemoryBridgeError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            return Err(MemoryBridgeError::Embedding(format!(
                "ONNX model not found at {}",
                model_path.display()
            )));
        }
        if !tokenizer_path.exists() {
            return Err(MemoryBridgeError::Embedding(format!(
                "Tokenizer not found at {}",
                tokenizer_path.display()
            )));
        }

        info!(model = %model_path.display(), "Loading local sentence-transformer model");

        let session = Session::builder()
            .map_err(|e| MemoryBridgeError::Embedding(format!("ONNX session builder: {}", e)))?
            .with_intra_threads(1)
            .map_err(|e| MemoryBridgeError::Embedding(format!("ONNX set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| MemoryBridgeError::Embedding(format!("ONNX load model: {}", e)))?;

        // Output is [batch, seq_len, hidden_dim]; the last axis is the width.
        let dimensions = session
            .outputs()
            .first()
            .and_then(|out| out.dtype().tensor_shape())
            .and_then(|shape| shape.last().copied())
            .map(|d| if d > 0 { d as usize } else { 384 })
            .unwrap_or(384);

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            MemoryBridgeError::Embedding(format!("Failed to load tokenizer: {}", e))
        })?;

        info!(dimensions, "Local model loaded");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions,
            model_dir: model_dir.to_path_buf(),
        })
    }

    /// Tokenize, run inference, mean-pool over the attention mask and
    /// L2-normalize.
    fn embed_sync(&self, text: &str) -> Result<Vec<f32>, MemoryBridgeError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| MemoryBridgeError::Embedding(format!("Tokenization failed: {}", e)))?;

        let to_i64 = |values: &[u32]| values.iter().map(|&v| v as i64).collect::<Vec<i64>>();
        let input_ids = to_i64(encoding.get_ids());
        let attention_mask = to_i64(encoding.get_attention_mask());
        let token_type_ids = to_i64(encoding.get_type_ids());
        let seq_len = input_ids.len();

        let shape_err = |name: &str, e: ndarray::ShapeError| {
            MemoryBridgeError::Embedding(format!("{} array: {}", name, e))
        };
        let ids_array = ndarray::Array2::from_shape_vec((1, seq_len), input_ids)
            .map_err(|e| shape_err("input_ids", e))?;
        let mask_array = ndarray::Array2::from_shape_vec((1, seq_len), attention_mask.clone())
            .map_err(|e| shape_err("attention_mask", e))?;
        let type_array = ndarray::Array2::from_shape_vec((1, seq_len), token_type_ids)
            .map_err(|e| shape_err("token_type_ids", e))?;

        let tensor_err =
            |e: ort::Error| MemoryBridgeError::Embedding(format!("ONNX tensor: {}", e));
        let ids_ref = TensorRef::from_array_view(&ids_array).map_err(tensor_err)?;
        let mask_ref = TensorRef::from_array_view(&mask_array).map_err(tensor_err)?;
        let type_ref = TensorRef::from_array_view(&type_array).map_err(tensor_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| MemoryBridgeError::Embedding(format!("Session lock poisoned: {}", e)))?;
        let outputs = session
            .run(ort::inputs![ids_ref, mask_ref, type_ref])
            .map_err(|e| MemoryBridgeError::Embedding(format!("ONNX inference failed: {}", e)))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| MemoryBridgeError::Embedding(format!("Extract embeddings: {}", e)))?;

        let shape_dims: Vec<i64> = shape.iter().copied().collect();
        let hidden_dim = match shape_dims.last() {
            Some(&last) if shape_dims.len() >= 2 && last > 0 => last as usize,
            _ => {
                return Err(MemoryBridgeError::Embedding(format!(
                    "Unexpected output shape: {:?}",
                    shape_dims
                )))
            }
        };

        let mut pooled = vec![0.0f32; hidden_dim];
        let mut count = 0.0f32;
        for (tok_idx, &mask_val) in attention_mask.iter().enumerate() {
            if mask_val > 0 {
                let offset = tok_idx * hidden_dim;
                let Some(token) = data.get(offset..offset + hidden_dim) else {
                    break;
                };
                for (acc, v) in pooled.iter_mut().zip(token) {
                    *acc += v;
                }
                count += 1.0;
            }
        }
        if count > 0.0 {
            for val in &mut pooled {
                *val /= count;
            }
        }

        l2_normalize(&mut pooled);
        Ok(pooled)
    }
}

/// CPU embedding service over a sentence-transformer ONNX export
/// (e.g. all-MiniLM-L6-v2).
///
/// The model directory must contain `model.onnx` and `tokenizer.json`.
/// Nothing is loaded at construction; the first `embed` call loads the shared
/// model. A failed load is returned to that caller and retried on the next
/// call.
#[derive(Debug, Clone)]
pub struct LocalEmbeddingService {
    model_dir: PathBuf,
    dimensions_hint: usize,
}

impl LocalEmbeddingService {
    pub fn new(model_dir: impl Into<PathBuf>, dimensions_hint: usize) -> Self {
        Self {
            model_dir: model_dir.into(),
            dimensions_hint,
        }
    }

    /// Load the shared model now instead of on first use.
    pub fn warm_up(&self) -> Result<(), MemoryBridgeError> {
        self.model().map(|_| ())
    }

    /// True once any `LocalEmbeddingService` has loaded the shared model.
    pub fn is_loaded() -> bool {
        LOCAL_MODEL.get().is_some()
    }

    fn model(&self) -> Result<&'static OnnxModel, MemoryBridgeError> {
        let model = LOCAL_MODEL.get_or_try_init(|| OnnxModel::load(&self.model_dir))?;
        if model.model_dir != self.model_dir {
            warn!(
                requested = %self.model_dir.display(),
                loaded = %model.model_dir.display(),
                "Local model already loaded from another directory; reusing it"
            );
        }
        Ok(model)
    }
}

impl EmbeddingService for LocalEmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryBridgeError> {
        reject_empty(text)?;
        let service = self.clone();
        let text_owned = text.to_string();

        // Model loading and inference are CPU-bound.
        tokio::task::spawn_blocking(move || service.model()?.embed_sync(&text_owned))
            .await
            .map_err(|e| MemoryBridgeError::Embedding(format!("Embedding task panicked: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        LOCAL_MODEL
            .get()
            .map(|m| m.dimensions)
            .unwrap_or(self.dimensions_hint)
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}
