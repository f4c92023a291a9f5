//! The pipeline orchestrator.
//!
//! One ingestion request walks the state machine
//! Received -> Fetching -> Extracting -> Structuring -> CacheWrite ->
//! SimilarityCheck -> Done, with raw-text, image, and video inputs
//! entering at Structuring. Any stage failure terminates the run with the
//! stage name and a short diagnostic; the orchestrator never recovers
//! across stages (that choice belongs to the calling application).
//! Cache and index failures are downgraded, never terminal.

use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{FingerprintCache, MemoryCache};
use crate::config::PipelineConfig;
use crate::embedding::{EmbeddingClient, GoogleEmbeddingClient};
use crate::error::{BuildError, PipelineFailure};
use crate::extract;
use crate::fetch::{DirectFetcher, Fetcher, ProxyFetcher};
use crate::llm::{GenerativeClient, GoogleClient, TokenUsage};
use crate::model::{CanonicalRecipe, FetchMethod, RecipeInput, SimilarityMatch};
use crate::ocr::OcrClient;
use crate::preprocess;
use crate::rewrite::{ScalingRewriter, SubstitutionRewriter};
use crate::similarity::{MemoryIndex, SimilarityIndex};
use crate::structure::StructuringEngine;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Fetching,
    Extracting,
    Structuring,
    CacheWrite,
    SimilarityCheck,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Fetching => "fetch",
            Stage::Extracting => "extract",
            Stage::Structuring => "structure",
            Stage::CacheWrite => "cache_write",
            Stage::SimilarityCheck => "similarity",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Wall-clock duration of one completed stage.
#[derive(Debug, Clone)]
pub struct StageTiming {
    pub stage: Stage,
    pub millis: u64,
}

/// Result envelope for one successful ingestion.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub recipe: CanonicalRecipe,
    /// How the HTML was obtained; None for non-URL inputs
    pub fetch_method: Option<FetchMethod>,
    /// True when the structuring engine was bypassed by a cache hit
    pub cache_hit: bool,
    /// Advisory near-duplicate, if one cleared the threshold
    pub similar: Option<SimilarityMatch>,
    /// Total metered usage across model calls in this run
    pub usage: TokenUsage,
    pub timings: Vec<StageTiming>,
}

pub struct RecipePipeline {
    fetcher: Fetcher,
    engine: StructuringEngine,
    generative: Arc<dyn GenerativeClient>,
    embeddings: Arc<dyn EmbeddingClient>,
    cache: Arc<dyn FingerprintCache>,
    index: Arc<dyn SimilarityIndex>,
    ocr: Option<OcrClient>,
    similarity_threshold: f32,
    max_prompt_chars: usize,
}

impl RecipePipeline {
    pub fn builder() -> RecipePipelineBuilder {
        RecipePipelineBuilder::default()
    }

    /// Rewriter for ingredient substitutions, sharing this pipeline's
    /// model client and prompt ceiling.
    pub fn substitution_rewriter(&self) -> SubstitutionRewriter {
        SubstitutionRewriter::new(Arc::clone(&self.generative), self.max_prompt_chars)
    }

    /// Rewriter for serving-size scaling, sharing this pipeline's model
    /// client and prompt ceiling.
    pub fn scaling_rewriter(&self) -> ScalingRewriter {
        ScalingRewriter::new(Arc::clone(&self.generative), self.max_prompt_chars)
    }

    /// Run one ingestion request through the pipeline.
    pub async fn ingest(&self, input: RecipeInput) -> Result<PipelineOutcome, PipelineFailure> {
        let kind = input.kind();
        info!("ingesting {} input", kind);

        let mut timings = Vec::new();
        let mut usage = TokenUsage::default();
        let mut fetch_method = None;

        // Inputs with a stable identity get read-before-compute caching;
        // ephemeral image uploads have none.
        let fingerprint = match &input {
            RecipeInput::Url(url) => Some(preprocess::fingerprint_url(url)),
            RecipeInput::RawText(text) | RecipeInput::Video(text) => {
                Some(preprocess::fingerprint_text(text))
            }
            RecipeInput::Image(_) | RecipeInput::Images(_) => None,
        };

        if let Some(fp) = &fingerprint {
            match self.cache.get(fp).await {
                Ok(Some(entry)) => {
                    debug!("cache hit for fingerprint {}", fp);
                    return Ok(PipelineOutcome {
                        recipe: entry.recipe,
                        fetch_method: None,
                        cache_hit: true,
                        similar: None,
                        usage,
                        timings,
                    });
                }
                Ok(None) => {}
                // Non-fatal: downgrade to always-recompute
                Err(e) => warn!("cache read failed, recomputing: {}", e),
            }
        }

        // Fetching and Extracting apply to URL inputs only.
        let (source_text, source_url) = match &input {
            RecipeInput::Url(url) => {
                let start = Instant::now();
                let fetched = self
                    .fetcher
                    .fetch(url)
                    .await
                    .map_err(|e| PipelineFailure::new(Stage::Fetching, e.message))?;
                timings.push(StageTiming {
                    stage: Stage::Fetching,
                    millis: start.elapsed().as_millis() as u64,
                });
                fetch_method = Some(fetched.method);

                let start = Instant::now();
                let content = extract::extract(&fetched.html);
                let text = if content.is_empty() {
                    // Nothing recognizable; hand the model the page text
                    extract::body_text(&fetched.html)
                } else {
                    content.combined()
                };
                timings.push(StageTiming {
                    stage: Stage::Extracting,
                    millis: start.elapsed().as_millis() as u64,
                });

                (text, Some(url.clone()))
            }
            RecipeInput::RawText(text) => (preprocess::normalize_text(text), None),
            RecipeInput::Video(transcript) => (preprocess::normalize_text(transcript), None),
            RecipeInput::Image(source) => (self.transcribe(std::slice::from_ref(source)).await?, None),
            RecipeInput::Images(sources) => (self.transcribe(sources).await?, None),
        };

        if source_text.trim().is_empty() {
            return Err(PipelineFailure::new(
                Stage::Structuring,
                "no text to structure",
            ));
        }

        // Structuring
        let start = Instant::now();
        let outcome = self
            .engine
            .structure(&source_text, kind)
            .await
            .map_err(|e| PipelineFailure::new(Stage::Structuring, e.to_string()))?;
        timings.push(StageTiming {
            stage: Stage::Structuring,
            millis: start.elapsed().as_millis() as u64,
        });
        usage.add(outcome.usage);

        let mut recipe = outcome.recipe;
        recipe.source_url = source_url;

        // CacheWrite: best-effort optimization, skipped without a
        // fingerprint, downgraded on store failure.
        if let Some(fp) = &fingerprint {
            let start = Instant::now();
            if let Err(e) = self.cache.put(fp, recipe.clone()).await {
                warn!("cache write failed, result not reusable: {}", e);
            }
            timings.push(StageTiming {
                stage: Stage::CacheWrite,
                millis: start.elapsed().as_millis() as u64,
            });
        } else {
            debug!("no stable fingerprint for {} input, skipping cache write", kind);
        }

        // SimilarityCheck: advisory; embedding or index trouble means
        // "no match found", never a failed pipeline.
        let start = Instant::now();
        let similar = self.find_near_duplicate(&mut recipe).await;
        timings.push(StageTiming {
            stage: Stage::SimilarityCheck,
            millis: start.elapsed().as_millis() as u64,
        });

        Ok(PipelineOutcome {
            recipe,
            fetch_method,
            cache_hit: false,
            similar,
            usage,
            timings,
        })
    }

    async fn transcribe(
        &self,
        sources: &[crate::ocr::ImageSource],
    ) -> Result<String, PipelineFailure> {
        let Some(ocr) = &self.ocr else {
            return Err(PipelineFailure::new(
                Stage::Structuring,
                "image input requires an OCR client",
            ));
        };
        ocr.transcribe_all(sources)
            .await
            .map_err(|e| PipelineFailure::new(Stage::Structuring, e.to_string()))
    }

    async fn find_near_duplicate(&self, recipe: &mut CanonicalRecipe) -> Option<SimilarityMatch> {
        let vector = match self.embeddings.embed(&recipe.embedding_text()).await {
            Ok(v) => v,
            Err(e) => {
                warn!("embedding failed, skipping similarity check: {}", e);
                return None;
            }
        };
        recipe.embedding = Some(vector.clone());

        match self
            .index
            .find_similar(&vector, self.similarity_threshold)
            .await
        {
            Ok(found) => {
                if let Some(m) = &found {
                    info!(
                        "near-duplicate candidate \"{}\" at similarity {:.2}",
                        m.recipe.title, m.similarity
                    );
                }
                found
            }
            Err(e) => {
                warn!("similarity query failed, reporting no match: {}", e);
                None
            }
        }
    }
}

/// Builder for assembling a pipeline with explicit, injected dependencies.
///
/// Every external collaborator can be replaced with a test double; absent
/// ones are constructed from configuration.
#[derive(Default)]
pub struct RecipePipelineBuilder {
    config: Option<PipelineConfig>,
    generative: Option<Arc<dyn GenerativeClient>>,
    embeddings: Option<Arc<dyn EmbeddingClient>>,
    cache: Option<Arc<dyn FingerprintCache>>,
    index: Option<Arc<dyn SimilarityIndex>>,
    ocr: Option<OcrClient>,
}

impl RecipePipelineBuilder {
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn generative(mut self, client: Arc<dyn GenerativeClient>) -> Self {
        self.generative = Some(client);
        self
    }

    pub fn embeddings(mut self, client: Arc<dyn EmbeddingClient>) -> Self {
        self.embeddings = Some(client);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn FingerprintCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn index(mut self, index: Arc<dyn SimilarityIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn ocr(mut self, ocr: OcrClient) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn build(self) -> Result<RecipePipeline, BuildError> {
        let config = self.config.unwrap_or_default();
        let timeout = Duration::from_secs(config.timeout_secs);

        let proxy = if config.proxy.is_configured() {
            // is_configured guarantees both fields
            let endpoint = config.proxy.endpoint.clone().ok_or_else(|| {
                BuildError::Builder("proxy endpoint missing".to_string())
            })?;
            let api_key = config.proxy.api_key.clone().ok_or_else(|| {
                BuildError::Builder("proxy api_key missing".to_string())
            })?;
            Some(ProxyFetcher::new(endpoint, api_key, Some(timeout)))
        } else {
            None
        };
        let fetcher = Fetcher::new(DirectFetcher::new(Some(timeout)), proxy);

        let generative: Arc<dyn GenerativeClient> = match self.generative {
            Some(client) => client,
            None => Arc::new(GoogleClient::new(&config.gemini, timeout)?),
        };
        let embeddings: Arc<dyn EmbeddingClient> = match self.embeddings {
            Some(client) => client,
            None => Arc::new(GoogleEmbeddingClient::new(&config.gemini, timeout)?),
        };

        let engine = StructuringEngine::new(Arc::clone(&generative), config.max_prompt_chars);

        Ok(RecipePipeline {
            fetcher,
            engine,
            generative,
            embeddings,
            cache: self.cache.unwrap_or_else(|| Arc::new(MemoryCache::new())),
            index: self.index.unwrap_or_else(|| Arc::new(MemoryIndex::new())),
            ocr: self.ocr,
            similarity_threshold: config.similarity_threshold,
            max_prompt_chars: config.max_prompt_chars,
        })
    }
}
