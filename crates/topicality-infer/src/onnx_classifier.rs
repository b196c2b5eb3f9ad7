//! ONNX-based sentence classifier using FinBERT-tone.
//!
//! Loads a sequence-classification ONNX export, its tokenizer and the
//! `config.json` label map. Requires the `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::collections::BTreeMap;
    use std::path::Path;

    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use tokenizers::Tokenizer;
    use topicality_core::{Error, Result};
    use tracing::{debug, info};

    use crate::classifier::{LabelScores, SentimentClassifier, SentimentLabel};

    /// Maximum sequence length for the model.
    const MAX_SEQ_LEN: usize = 512;

    /// FinBERT-tone output order when `config.json` carries no label map.
    const DEFAULT_LABELS: [SentimentLabel; 3] = [
        SentimentLabel::Neutral,
        SentimentLabel::Positive,
        SentimentLabel::Negative,
    ];

    #[derive(Deserialize)]
    struct ModelConfig {
        #[serde(default)]
        id2label: BTreeMap<String, String>,
    }

    /// ONNX sentiment classifier.
    pub struct OnnxClassifier {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        /// Output logit index → label; `None` for labels we do not track.
        labels: Vec<Option<SentimentLabel>>,
    }

    impl OnnxClassifier {
        /// Load a model from the given directory.
        ///
        /// Expects:
        /// - `model_dir/model.onnx`: the ONNX model file
        /// - `model_dir/tokenizer.json`: the HuggingFace tokenizer
        /// - `model_dir/config.json`: optional, for `id2label`
        pub fn load(model_dir: &Path) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(Error::Classifier(format!(
                    "Model not found: {}",
                    model_path.display()
                )));
            }
            if !tokenizer_path.exists() {
                return Err(Error::Classifier(format!(
                    "Tokenizer not found: {}",
                    tokenizer_path.display()
                )));
            }

            let labels = load_labels(&model_dir.join("config.json"))?;

            // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime.so
            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| Error::Classifier(format!("Failed to create session builder: {}", e)))?
                .with_intra_threads(1)
                .map_err(|e| Error::Classifier(format!("Failed to set threads: {}", e)))?
                .commit_from_file(&model_path)
                .map_err(|e| Error::Classifier(format!("Failed to load ONNX model: {}", e)))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| Error::Classifier(format!("Failed to load tokenizer: {}", e)))?;

            info!(
                "ONNX classifier loaded: {} labels, model={}",
                labels.len(),
                model_path.display()
            );

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                labels,
            })
        }

        fn infer(&self, text: &str) -> Result<LabelScores> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| Error::Classifier(format!("Tokenization failed: {}", e)))?;

            let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            let ids: Vec<i64> = encoding.get_ids()[..seq_len].iter().map(|&v| v as i64).collect();
            let mask: Vec<i64> = encoding.get_attention_mask()[..seq_len]
                .iter()
                .map(|&v| v as i64)
                .collect();
            let type_ids = vec![0i64; seq_len];

            let tensor = |data: Vec<i64>| {
                Tensor::from_array(([1usize, seq_len], data))
                    .map_err(|e| Error::Classifier(format!("Failed to build input tensor: {}", e)))
            };
            let inputs = ort::inputs![tensor(ids)?, tensor(mask)?, tensor(type_ids)?];

            let mut session = self.session.lock();
            let outputs = session
                .run(inputs)
                .map_err(|e| Error::Classifier(format!("ONNX inference failed: {}", e)))?;

            // Logits: [1, num_labels]
            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| Error::Classifier(format!("Failed to extract logits: {}", e)))?;
            let width = shape.last().copied().unwrap_or(0) as usize;
            if width == 0 || data.len() < width {
                return Err(Error::Classifier(format!("Unexpected logits shape: {:?}", shape)));
            }

            let probs = softmax(Array1::from_iter(data[..width].iter().map(|&v| v as f64)));
            let mut scores = LabelScores::new();
            for (idx, p) in probs.iter().enumerate() {
                if let Some(Some(label)) = self.labels.get(idx) {
                    *scores.entry(*label).or_insert(0.0) += p;
                }
            }
            debug!("Classified {} tokens", seq_len);
            Ok(scores)
        }
    }

    fn load_labels(config_path: &Path) -> Result<Vec<Option<SentimentLabel>>> {
        if !config_path.exists() {
            return Ok(DEFAULT_LABELS.iter().copied().map(Some).collect());
        }
        let text = std::fs::read_to_string(config_path)
            .map_err(|e| Error::for_file(config_path, e))?;
        let config: ModelConfig =
            serde_json::from_str(&text).map_err(|e| Error::for_file(config_path, e))?;
        if config.id2label.is_empty() {
            return Ok(DEFAULT_LABELS.iter().copied().map(Some).collect());
        }

        let mut indexed = Vec::new();
        for (id, name) in &config.id2label {
            let idx: usize = id.parse().map_err(|_| {
                Error::Classifier(format!("Bad id2label key {:?} in {}", id, config_path.display()))
            })?;
            indexed.push((idx, SentimentLabel::parse(name)));
        }
        let width = indexed.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
        let mut labels = vec![None; width];
        for (idx, label) in indexed {
            labels[idx] = label;
        }
        Ok(labels)
    }

    fn softmax(logits: Array1<f64>) -> Array1<f64> {
        let max = logits.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let exp = logits.mapv(|v| (v - max).exp());
        let sum = exp.sum();
        exp / sum
    }

    impl SentimentClassifier for OnnxClassifier {
        fn classify(&self, texts: &[&str]) -> Result<Vec<LabelScores>> {
            if texts.is_empty() {
                return Err(Error::EmptyClassifierInput);
            }
            // Sequential; the worker pool already runs one model per thread
            texts.iter().map(|t| self.infer(t)).collect()
        }

        fn name(&self) -> &str {
            "onnx-finbert"
        }
    }

}

#[cfg(feature = "onnx")]
pub use inner::OnnxClassifier;
