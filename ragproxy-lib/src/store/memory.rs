use std::collections::BinaryHeap;

use parking_lot::RwLock;
use tracing::debug;

use crate::embed::Embedding;
use crate::store::{DocumentRecord, SearchResult, VectorStore};
use crate::{Error, Result};

/// In-memory vector store.
///
/// Uses brute-force cosine similarity search over records kept in insertion
/// order. Suitable for small datasets (< 10k documents).
///
/// Writers take an exclusive lock and append whole records, readers take a
/// shared lock, so a search never observes a half-inserted document.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

struct Inner {
    records: Vec<DocumentRecord>,
    /// Dimension fixed at construction, survives `clear`
    declared: Option<usize>,
    /// Dimension currently enforced
    dimension: Option<usize>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    ///
    /// The dimension is taken from the first inserted embedding.
    #[must_use]
    pub fn new() -> Self {
        Self::from_inner(None)
    }

    /// Create a new empty store that only accepts `dimension`-length vectors.
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self::from_inner(Some(dimension))
    }

    fn from_inner(declared: Option<usize>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: Vec::new(),
                declared,
                dimension: declared,
            }),
        }
    }

    /// Snapshot of the stored texts, in insertion order.
    #[must_use]
    pub fn documents(&self) -> Vec<String> {
        self.inner
            .read()
            .records
            .iter()
            .map(|r| r.text().to_string())
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorStore for MemoryStore {
    fn insert(&self, documents: &[&str], embeddings: &[Embedding]) -> Result<()> {
        if documents.len() != embeddings.len() {
            return Err(Error::InvalidInput(format!(
                "{} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            )));
        }

        let mut inner = self.inner.write();

        // validate the whole batch before touching the records
        let mut dimension = inner.dimension;
        for embedding in embeddings {
            validate_vector(embedding)?;
            match dimension {
                Some(expected) if expected != embedding.len() => {
                    return Err(Error::DimensionMismatch {
                        expected,
                        actual: embedding.len(),
                    });
                }
                Some(_) => {}
                None => dimension = Some(embedding.len()),
            }
        }

        inner.dimension = dimension;
        inner.records.extend(
            documents
                .iter()
                .zip(embeddings)
                .map(|(text, embedding)| DocumentRecord::new(text.to_string(), embedding.clone())),
        );

        debug!(added = documents.len(), total = inner.records.len(), "inserted documents");
        Ok(())
    }

    fn search_scored(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let inner = self.inner.read();

        if inner.records.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        validate_vector(query)?;
        if let Some(expected) = inner.dimension
            && expected != query.len()
        {
            return Err(Error::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }

        let mut results = BinaryHeap::with_capacity(inner.records.len());

        for (position, record) in inner.records.iter().enumerate() {
            results.push(SearchResult {
                text: record.text().to_string(),
                score: cosine_similarity(query, record.embedding()),
                position,
            });
        }

        Ok(results
            .into_sorted_vec()
            .into_iter()
            .rev()
            .take(top_k)
            .collect())
    }

    fn dimension(&self) -> Option<usize> {
        self.inner.read().dimension
    }

    fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    fn clear(&self) {
        let mut inner = self.inner.write();
        inner.records.clear();
        inner.dimension = inner.declared;
    }
}

fn validate_vector(v: &[f32]) -> Result<()> {
    if v.is_empty() {
        return Err(Error::InvalidInput("embedding has no dimensions".to_string()));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::InvalidInput(
            "embedding contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction, or 0 when
/// either vector has zero magnitude. Accumulates in `f64` so squares of
/// large finite `f32` components cannot overflow.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f64 = a.iter().zip(b).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum();
    let norm_a: f64 = a.iter().map(|&x| f64::from(x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|&x| f64::from(x).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = (dot / norm_a / norm_b).clamp(-1.0, 1.0) as f32;
    // fold -0.0 into 0.0 so equal scores compare equal under total_cmp
    if similarity == 0.0 { 0.0 } else { similarity }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three orthogonal unit vectors, "Document 1" to "Document 3"
    fn unit_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.add("Document 1", &[1.0, 0.0, 0.0]).unwrap();
        store.add("Document 2", &[0.0, 1.0, 0.0]).unwrap();
        store.add("Document 3", &[0.0, 0.0, 1.0]).unwrap();
        store
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &a);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_ignores_magnitude() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![10.0, 20.0, 30.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_large_components() {
        let exact = cosine_similarity(&[1.0, 0.0], &[1e20, 0.0]);
        let diagonal = cosine_similarity(&[1.0, 0.0], &[0.5, 0.5]);
        assert!((exact - 1.0).abs() < 1e-6);
        assert!(exact > diagonal);

        let big = [3e19, 4e19];
        assert!((cosine_similarity(&big, &big) - 1.0).abs() < 1e-6);

        let max = [f32::MAX, f32::MAX];
        assert!((cosine_similarity(&max, &max) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_large_magnitude_document_ranks_by_direction() {
        let store = MemoryStore::new();
        store.add("diagonal", &[0.5, 0.5]).unwrap();
        store.add("aligned", &[1e20, 0.0]).unwrap();

        let results = store.search_scored(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].text, "aligned");
        assert!(results.iter().all(|r| r.score.is_finite()));
    }

    #[test]
    fn test_cosine_similarity_zero_magnitude() {
        let zero = vec![0.0, 0.0, 0.0];
        let a = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&zero, &a), 0.0);
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_add_and_len() {
        let store = MemoryStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.dimension(), None);

        let store = unit_store();
        assert_eq!(store.len(), 3);
        assert!(!store.is_empty());
        assert_eq!(store.dimension(), Some(3));
        assert_eq!(store.documents(), vec!["Document 1", "Document 2", "Document 3"]);
    }

    #[test]
    fn test_exact_match_ranks_first() {
        let store = unit_store();
        let results = store.search(&[1.0, 0.0, 0.0], 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], "Document 1");
    }

    #[test]
    fn test_search_returns_sorted() {
        let store = MemoryStore::new();

        // Query will be [1, 0, 0]
        store
            .insert(
                &["far away", "very close", "medium"],
                &[
                    vec![0.0, 1.0, 0.0], // orthogonal to query
                    vec![1.0, 0.0, 0.0], // identical to query
                    vec![0.5, 0.5, 0.0], // somewhat similar
                ],
            )
            .unwrap();

        let results = store.search_scored(&[1.0, 0.0, 0.0], 3).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].text, "very close");
        assert_eq!(results[0].position, 1);
        assert_eq!(results[1].text, "medium");
        assert_eq!(results[2].text, "far away");
        assert!(results[0].score > results[1].score);
        assert!(results[1].score > results[2].score);
    }

    #[test]
    fn test_search_respects_k() {
        let store = MemoryStore::new();
        store
            .insert(
                &["a", "b", "c"],
                &[vec![1.0, 0.0], vec![0.9, 0.1], vec![0.8, 0.2]],
            )
            .unwrap();

        let results = store.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results, vec!["a", "b"]);
    }

    #[test]
    fn test_search_k_larger_than_store() {
        let store = unit_store();
        let results = store.search(&[1.0, 0.0, 0.0], 100).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_search_k_zero_is_empty() {
        let store = unit_store();
        assert!(store.search(&[1.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_empty_search() {
        let store = MemoryStore::new();
        for k in [0, 1, 5, 100] {
            assert!(store.search(&[1.0, 0.0], k).unwrap().is_empty());
        }
    }

    #[test]
    fn test_empty_store_ignores_query_dimension() {
        let store = MemoryStore::with_dimension(3);
        assert!(store.search(&[1.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_repeated_search_is_identical() {
        let store = MemoryStore::new();
        store
            .insert(
                &["a", "b", "c", "d"],
                &[
                    vec![0.3, 0.7],
                    vec![0.9, 0.1],
                    vec![0.3, 0.7],
                    vec![-0.5, 0.5],
                ],
            )
            .unwrap();

        let first = store.search(&[0.6, 0.4], 4).unwrap();
        let second = store.search(&[0.6, 0.4], 4).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let store = MemoryStore::new();
        store
            .insert(
                &["first", "best", "second", "third"],
                &[
                    vec![0.0, 1.0],
                    vec![1.0, 0.0],
                    vec![0.0, 2.0],
                    vec![0.0, 3.0],
                ],
            )
            .unwrap();

        // "first", "second" and "third" all score 0.0 against the query
        let results = store.search(&[1.0, 0.0], 4).unwrap();
        assert_eq!(results, vec!["best", "first", "second", "third"]);

        // truncation happens after tie-breaking
        let results = store.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results, vec!["best", "first"]);
    }

    #[test]
    fn test_zero_query_returns_insertion_order() {
        let store = unit_store();
        let results = store.search_scored(&[0.0, 0.0, 0.0], 3).unwrap();

        assert!(results.iter().all(|r| r.score == 0.0));
        let texts: Vec<_> = results.into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["Document 1", "Document 2", "Document 3"]);
    }

    #[test]
    fn test_add_dimension_mismatch_leaves_store_unchanged() {
        let store = unit_store();
        let err = store.add("Document 4", &[1.0, 0.0]).unwrap_err();

        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_batch_with_bad_dimension_is_rejected_whole() {
        let store = MemoryStore::new();
        let err = store
            .insert(&["a", "b"], &[vec![1.0, 0.0], vec![1.0, 0.0, 0.0]])
            .unwrap_err();

        assert!(matches!(err, Error::DimensionMismatch { .. }));
        assert!(store.is_empty());
        assert_eq!(store.dimension(), None);
    }

    #[test]
    fn test_search_dimension_mismatch() {
        let store = unit_store();
        let err = store.search(&[1.0, 0.0], 2).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_declared_dimension_enforced_on_first_add() {
        let store = MemoryStore::with_dimension(4);
        assert_eq!(store.dimension(), Some(4));
        assert!(store.add("short", &[1.0, 0.0]).is_err());
        assert!(store.add("right", &[1.0, 0.0, 0.0, 0.0]).is_ok());
    }

    #[test]
    fn test_rejects_malformed_vectors() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.add("empty", &[]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.add("nan", &[f32::NAN, 1.0]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.insert(&["a", "b"], &[vec![1.0]]),
            Err(Error::InvalidInput(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear() {
        let store = unit_store();
        assert_eq!(store.len(), 3);

        store.clear();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.dimension(), None);

        // a cleared store accepts a new dimension
        store.add("two dims", &[1.0, 0.0]).unwrap();
        assert_eq!(store.dimension(), Some(2));
    }

    #[test]
    fn test_clear_keeps_declared_dimension() {
        let store = MemoryStore::with_dimension(2);
        store.add("a", &[1.0, 0.0]).unwrap();
        store.clear();
        assert_eq!(store.dimension(), Some(2));
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryStore::new());
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..50 {
                        store.add(&format!("w{w}-{i}"), &[1.0, i as f32]).unwrap();
                    }
                })
            })
            .collect();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let results = store.search_scored(&[1.0, 0.0], 10).unwrap();
                        assert!(results.len() <= 10);
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 200);
    }
}
