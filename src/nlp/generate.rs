//! Generative model seam used by the cluster summariser.

use std::sync::Arc;

use anyhow::Result;

use crate::config::Settings;

/// Trait for generation backends.
///
/// The real backend samples, so output is not deterministic across calls
/// with the same prompt. Responses are bounded at 256 new tokens.
pub trait Generator: Send + Sync {
    fn generate(&self, system: &str, user: &str) -> Result<String>;
}

#[cfg(feature = "summaries")]
mod llama {
    use std::path::Path;

    use anyhow::Result;
    use llama_cpp_rs::{LLama, LLamaContextParams, LLamaModel, TokenId};

    use super::Generator;

    const MAX_NEW_TOKENS: usize = 256;

    /// Local GGUF model driven through llama.cpp. Loaded once per process.
    pub struct LlamaGenerator {
        ctx: LLama,
    }

    impl LlamaGenerator {
        pub fn load(model_path: &Path) -> Result<Self> {
            let model = LLamaModel::load_from_file(model_path, Default::default())?;
            let ctx_params = LLamaContextParams::default();
            let ctx = LLama::new(model, ctx_params)?;
            Ok(Self { ctx })
        }
    }

    impl Generator for LlamaGenerator {
        fn generate(&self, system: &str, user: &str) -> Result<String> {
            let prompt = format!("<|system|>\n{system}\n<|user|>\n{user}\n<|assistant|>\n");
            let tokens: Vec<TokenId> = self.ctx.model().tokenize(&prompt, true)?;
            let response = self.ctx.evaluate(&tokens, None, MAX_NEW_TOKENS, None)?;
            Ok(response)
        }
    }
}

/// Fallback generator when no local model is compiled in: answers the
/// summary contract directly from the keyword line embedded in the prompt,
/// so the downstream JSON parsing path stays exercised.
pub struct TemplateGenerator;

impl Generator for TemplateGenerator {
    fn generate(&self, _system: &str, user: &str) -> Result<String> {
        let keywords = user
            .lines()
            .find_map(|line| line.trim().strip_prefix("Keywords: "))
            .unwrap_or("");
        let leading: Vec<&str> = keywords
            .split(", ")
            .filter(|k| !k.is_empty())
            .take(3)
            .collect();
        let title = if leading.is_empty() {
            "General feedback".to_string()
        } else {
            leading.join(" / ")
        };
        let description = if leading.is_empty() {
            "Reviews without a dominant theme.".to_string()
        } else {
            format!("Reviews centred on {}.", leading.join(", "))
        };
        Ok(serde_json::json!({ "title": title, "description": description }).to_string())
    }
}

#[cfg(feature = "summaries")]
pub fn load(settings: &Settings) -> Result<Arc<dyn Generator>> {
    Ok(Arc::new(llama::LlamaGenerator::load(&settings.gen_model_path)?))
}

#[cfg(not(feature = "summaries"))]
pub fn load(_settings: &Settings) -> Result<Arc<dyn Generator>> {
    Ok(Arc::new(TemplateGenerator))
}

#[cfg(test)]
mod tests {
    use super::{Generator, TemplateGenerator};

    #[test]
    fn template_output_is_valid_json() {
        let response = TemplateGenerator
            .generate("system", "Keywords: battery, charge, life\nSample reviews: []")
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["title"], "battery / charge / life");
    }
}
