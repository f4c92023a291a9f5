//! Embedding-based near-duplicate detection.
//!
//! Advisory only: a match above the threshold means "did you mean this
//! already-imported recipe?", never a hard constraint. The caller always
//! retains the option to force-create a new entry.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::error::IndexError;
use crate::model::{CanonicalRecipe, SimilarityMatch};

/// Vector index over stored recipe embeddings.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Best match at or above `min_similarity`, if any. Below threshold
    /// the system behaves as if no match exists.
    async fn find_similar(
        &self,
        embedding: &[f32],
        min_similarity: f32,
    ) -> Result<Option<SimilarityMatch>, IndexError>;

    /// Top `k` matches, descending by similarity.
    async fn find_top_matches(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SimilarityMatch>, IndexError>;

    /// Store a recipe (which must carry its embedding) for later queries.
    async fn add(&self, recipe: CanonicalRecipe) -> Result<(), IndexError>;
}

/// Cosine similarity of two vectors, 0.0 for mismatched dimensions or
/// zero-magnitude inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// In-process index doing a linear cosine scan.
///
/// Fine for the volumes one household imports; a pgvector-style store
/// slots in behind the same trait.
#[derive(Default)]
pub struct MemoryIndex {
    recipes: RwLock<Vec<CanonicalRecipe>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        MemoryIndex::default()
    }

    fn scan(&self, embedding: &[f32]) -> Result<Vec<SimilarityMatch>, IndexError> {
        let recipes = self
            .recipes
            .read()
            .map_err(|e| IndexError(format!("index lock poisoned: {}", e)))?;

        let mut matches: Vec<SimilarityMatch> = recipes
            .iter()
            .filter_map(|recipe| {
                let stored = recipe.embedding.as_deref()?;
                Some(SimilarityMatch {
                    similarity: cosine_similarity(embedding, stored),
                    recipe: recipe.clone(),
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(matches)
    }
}

#[async_trait]
impl SimilarityIndex for MemoryIndex {
    async fn find_similar(
        &self,
        embedding: &[f32],
        min_similarity: f32,
    ) -> Result<Option<SimilarityMatch>, IndexError> {
        let matches = self.scan(embedding)?;
        Ok(matches
            .into_iter()
            .next()
            .filter(|m| m.similarity >= min_similarity))
    }

    async fn find_top_matches(
        &self,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SimilarityMatch>, IndexError> {
        let mut matches = self.scan(embedding)?;
        matches.truncate(k);
        Ok(matches)
    }

    async fn add(&self, recipe: CanonicalRecipe) -> Result<(), IndexError> {
        if recipe.embedding.is_none() {
            return Err(IndexError(
                "recipe has no embedding to index".to_string(),
            ));
        }
        let mut recipes = self
            .recipes
            .write()
            .map_err(|e| IndexError(format!("index lock poisoned: {}", e)))?;
        recipes.push(recipe);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_with_embedding(title: &str, embedding: Vec<f32>) -> CanonicalRecipe {
        CanonicalRecipe {
            title: title.to_string(),
            embedding: Some(embedding),
            ..Default::default()
        }
    }

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vec![0.5, 0.2, -0.3];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_dimension_mismatch_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_find_similar_respects_threshold() {
        let index = MemoryIndex::new();
        // ~0.9 similarity with the query below
        index
            .add(recipe_with_embedding("Close", vec![0.9, 0.436]))
            .await
            .unwrap();

        let query = vec![1.0, 0.0];
        let found = index.find_similar(&query, 0.55).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().recipe.title, "Close");

        // Same stored recipe, threshold raised past its similarity
        let none = index.find_similar(&query, 0.95).await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_below_threshold_behaves_as_no_match() {
        let index = MemoryIndex::new();
        // ~0.3 similarity with [1, 0]
        index
            .add(recipe_with_embedding("Far", vec![0.3, 0.954]))
            .await
            .unwrap();

        let found = index.find_similar(&[1.0, 0.0], 0.55).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_top_matches_descending() {
        let index = MemoryIndex::new();
        index
            .add(recipe_with_embedding("A", vec![1.0, 0.0]))
            .await
            .unwrap();
        index
            .add(recipe_with_embedding("B", vec![0.7, 0.714]))
            .await
            .unwrap();
        index
            .add(recipe_with_embedding("C", vec![0.0, 1.0]))
            .await
            .unwrap();

        let matches = index.find_top_matches(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].recipe.title, "A");
        assert_eq!(matches[1].recipe.title, "B");
        assert!(matches[0].similarity >= matches[1].similarity);
    }

    #[tokio::test]
    async fn test_add_requires_embedding() {
        let index = MemoryIndex::new();
        let bare = CanonicalRecipe {
            title: "No vector".to_string(),
            ..Default::default()
        };
        assert!(index.add(bare).await.is_err());
    }
}
