//! ONNX Runtime query embedder for sentence-transformers models.
//!
//! Loads the same offline model the corpus was indexed with, so query vectors
//! land in the corpus embedding space. The model directory must contain
//! `tokenizer.json` and either `model.onnx` or `onnx/model.onnx`.

use std::path::{Path, PathBuf};

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::TextEmbedder;

/// Default token limit for MiniLM-class models.
pub const DEFAULT_MAX_TOKENS: usize = 256;

const FALLBACK_DIM: usize = 384;

/// Mean-pooled, L2-normalised sentence embeddings.
pub struct Embedder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
    /// BERT/MiniLM exports take `token_type_ids`; MPNet exports do not.
    token_types: bool,
}

impl Embedder {
    /// Load the embedding model from `model_dir`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        Self::load_with_max_tokens(model_dir, DEFAULT_MAX_TOKENS)
    }

    /// Load with a custom truncation length.
    pub fn load_with_max_tokens(model_dir: &Path, max_tokens: usize) -> anyhow::Result<Self> {
        let model_path = locate_model(model_dir)?;
        let tokenizer_path = model_dir.join("tokenizer.json");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(FALLBACK_DIM);
        let token_types = declares_token_types(session.inputs().iter().map(|i| i.name()));

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: max_tokens,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams::default()));

        info!(dim, max_tokens, token_types, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session,
            tokenizer,
            dim,
            token_types,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed a batch of texts, one normalised vector per input.
    pub fn embed_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch_size = texts.len();
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let row = i * seq_len;
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();
            for j in 0..ids.len() {
                input_ids[row + j] = ids[j] as i64;
                attention_mask[row + j] = mask[j] as i64;
                token_type_ids[row + j] = types[j] as i64;
            }
        }

        let shape = [batch_size as i64, seq_len as i64];
        let mut inputs = ort::inputs![
            "input_ids" => Tensor::from_array((shape, input_ids.into_boxed_slice()))?,
            "attention_mask" => Tensor::from_array((shape, attention_mask.clone().into_boxed_slice()))?,
        ];
        if self.token_types {
            inputs.push((
                "token_type_ids".into(),
                Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?.into(),
            ));
        }
        let outputs = self.session.run(inputs)?;

        // Token embeddings: [batch_size, seq_len, dim].
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3
                && dims[0] as usize == batch_size
                && dims[1] as usize == seq_len
                && dims[2] as usize == self.dim,
            "unexpected output shape: {dims:?}, expected [{batch_size}, {seq_len}, {}]",
            self.dim
        );

        debug!(batch_size, seq_len, "embedded batch");
        Ok(mean_pool(output_data, &attention_mask, batch_size, seq_len, self.dim))
    }
}

impl TextEmbedder for Embedder {
    fn embed(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedding model returned no vector"))
    }
}

fn declares_token_types<'a>(mut input_names: impl Iterator<Item = &'a str>) -> bool {
    input_names.any(|name| name == "token_type_ids")
}

/// Find the ONNX file at the top level or in an `onnx/` subdirectory.
fn locate_model(model_dir: &Path) -> anyhow::Result<PathBuf> {
    [model_dir.join("model.onnx"), model_dir.join("onnx").join("model.onnx")]
        .into_iter()
        .find(|p| p.exists())
        .ok_or_else(|| anyhow::anyhow!("model.onnx not found in {model_dir:?}"))
}

/// Attention-masked mean over tokens, then L2 normalisation.
fn mean_pool(
    token_embeddings: &[f32],
    attention_mask: &[i64],
    batch_size: usize,
    seq_len: usize,
    dim: usize,
) -> Vec<Vec<f32>> {
    (0..batch_size)
        .map(|i| {
            let mut pooled = vec![0.0f32; dim];
            let mut tokens = 0.0f32;
            for j in 0..seq_len {
                if attention_mask[i * seq_len + j] == 0 {
                    continue;
                }
                let offset = (i * seq_len + j) * dim;
                for (p, &v) in pooled.iter_mut().zip(&token_embeddings[offset..offset + dim]) {
                    *p += v;
                }
                tokens += 1.0;
            }
            if tokens > 0.0 {
                pooled.iter_mut().for_each(|p| *p /= tokens);
            }
            normalize(&mut pooled);
            pooled
        })
        .collect()
}

/// L2-normalize a vector in place.
fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Last output dimension of the ONNX model, when static.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}
