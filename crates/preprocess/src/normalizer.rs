//! Lexical normalizer: language identification and tone restoration
//!
//! Vietnamese typed without diacritics ("hoc phi thac si") loses most of its
//! meaning for retrieval, so queries identified as Vietnamese with a low
//! tone-mark density go through the tone-restoration model. Normalization
//! failure is never fatal: on any model error the original text passes
//! through unchanged with language marked unknown.

use std::sync::Arc;

use advisor_config::NormalizerConfig;
use advisor_core::DetectedLanguage;
use once_cell::sync::Lazy;

use crate::providers::{LanguageIdentifier, ToneRestorer};

/// Characters carrying Vietnamese tone or vowel marks
static VIETNAMESE_MARKED: Lazy<std::collections::HashSet<char>> = Lazy::new(|| {
    "àáảãạăằắẳẵặâầấẩẫậèéẻẽẹêềếểễệìíỉĩịòóỏõọôồốổỗộơờớởỡợùúủũụưừứửữựỳýỷỹỵđ\
     ÀÁẢÃẠĂẰẮẲẴẶÂẦẤẨẪẬÈÉẺẼẸÊỀẾỂỄỆÌÍỈĨỊÒÓỎÕỌÔỒỐỔỖỘƠỜỚỞỠỢÙÚỦŨỤƯỪỨỬỮỰỲÝỶỸỴĐ"
        .chars()
        .collect()
});

/// Ratio of marked characters among alphabetic characters
pub fn tone_mark_density(text: &str) -> f32 {
    let mut alphabetic = 0usize;
    let mut marked = 0usize;
    for c in text.chars() {
        if c.is_alphabetic() {
            alphabetic += 1;
            if VIETNAMESE_MARKED.contains(&c) {
                marked += 1;
            }
        }
    }
    if alphabetic == 0 {
        return 0.0;
    }
    marked as f32 / alphabetic as f32
}

/// Normalizer output
#[derive(Debug, Clone)]
pub struct NormalizedQuery {
    /// Normalized text (tone-restored when applicable)
    pub text: String,
    /// Detected language
    pub language: DetectedLanguage,
    /// A model failed and the original text was passed through
    pub degraded: bool,
}

/// Lexical normalizer
pub struct LexicalNormalizer {
    identifier: Arc<dyn LanguageIdentifier>,
    restorer: Arc<dyn ToneRestorer>,
    config: NormalizerConfig,
}

impl LexicalNormalizer {
    pub fn new(
        identifier: Arc<dyn LanguageIdentifier>,
        restorer: Arc<dyn ToneRestorer>,
        config: NormalizerConfig,
    ) -> Self {
        Self {
            identifier,
            restorer,
            config,
        }
    }

    /// Normalize one query
    pub async fn normalize(&self, text: &str) -> NormalizedQuery {
        let identified = match self.identifier.identify(text).await {
            Ok(id) if id.confidence >= self.config.min_language_confidence => id,
            Ok(id) => {
                tracing::debug!(
                    code = %id.code,
                    confidence = id.confidence,
                    "language identification below confidence floor"
                );
                return NormalizedQuery {
                    text: text.to_string(),
                    language: DetectedLanguage::Unknown,
                    degraded: true,
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, "language identification failed, passing through");
                return NormalizedQuery {
                    text: text.to_string(),
                    language: DetectedLanguage::Unknown,
                    degraded: true,
                };
            }
        };

        let language = DetectedLanguage::Known(identified.code.clone());

        let needs_restoration = identified.code == self.config.target_language
            && tone_mark_density(text) < self.config.tone_density_threshold;

        if !needs_restoration {
            return NormalizedQuery {
                text: text.to_string(),
                language,
                degraded: false,
            };
        }

        match self.restorer.restore(text).await {
            Ok(restored) => {
                tracing::debug!(original = text, restored = %restored, "tone marks restored");
                NormalizedQuery {
                    text: restored,
                    language,
                    degraded: false,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "tone restoration failed, passing through");
                NormalizedQuery {
                    text: text.to_string(),
                    language,
                    degraded: true,
                }
            }
        }
    }
}
