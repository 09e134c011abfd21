//! # Matching Tests
//!
//! Normalization and substitution matching through the public API, plus the
//! query embedding cache in front of a provider.

mod test_helpers;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pantry_match::cache::{CachedEmbedder, DEFAULT_MAX_ENTRIES};
    use pantry_match::embedding::EmbeddingProvider;
    use pantry_match::matcher::Matcher;
    use pantry_match::normalizer::{clean, clean_list};
    use pantry_match::substitutions::substitutes_of;

    use crate::test_helpers::StubProvider;

    #[test]
    fn test_raw_phrases_match_after_cleaning() {
        let user = clean_list(&["Basmati Rice", "2 Onions", "1 cup Dahi"]);
        let recipe = clean_list(&["2 cups rice", "1 onion, chopped", "1 cup curd", "salt"]);
        assert_eq!(recipe, vec!["rice", "onion chopped", "curd", "salt"]);

        let result = Matcher::default().match_ingredients(&user, &recipe);
        // "basmati rice" contains "rice"; "onions" does not overlap "onion chopped"
        assert_eq!(result.present, vec!["rice", "curd(sub->dahi)"]);
        assert_eq!(result.missing, vec!["onion chopped", "salt"]);
        assert_eq!(result.match_count(), 2);
        assert_eq!(result.present_terms(), vec!["rice", "curd"]);
    }

    #[test]
    fn test_substitution_lookup_cleans_its_input() {
        let subs = substitutes_of("  2 tbsp GHEE ");
        assert!(subs.contains("clarified butter"));
        assert!(subs.contains("butter"));
        assert!(substitutes_of("saffron").is_empty());
    }

    #[test]
    fn test_clean_is_stable_on_its_own_output() {
        for phrase in ["250 ml Coconut milk (thick)", "3/4 cup sugar", "Salt & pepper"] {
            let once = clean(phrase);
            assert_eq!(clean(&once), once);
        }
    }

    #[test]
    fn test_cached_embedder_serves_repeated_queries() {
        let stub = Arc::new(StubProvider::new().with("rice, dal", [1.0, 0.0]));
        let cached = CachedEmbedder::new(stub.clone(), Duration::from_secs(60));

        let first = cached.encode("rice, dal").unwrap();
        let second = cached.encode("rice, dal").unwrap();
        assert_eq!(first, vec![1.0, 0.0]);
        assert_eq!(first, second);
        assert_eq!(stub.calls(), 1);

        // batches bypass the cache
        cached.encode_batch(&["rice, dal"]).unwrap();
        assert_eq!(stub.calls(), 2);

        let stats = cached.cache().stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert_eq!(cached.name(), "stub");
        assert_eq!(cached.dimensions(), 2);
    }

    #[test]
    fn test_cached_embedder_with_zero_ttl_stores_nothing() {
        let stub = Arc::new(StubProvider::new());
        let cached = CachedEmbedder::new(stub.clone(), Duration::ZERO);

        for i in 0..1000 {
            cached.encode(&format!("rice {}", i)).unwrap();
        }
        cached.encode("rice 0").unwrap();

        assert!(cached.cache().is_empty());
        assert_eq!(stub.calls(), 1001);
        assert_eq!(cached.cache().stats().misses, 0);
    }

    #[test]
    fn test_cached_embedder_stays_bounded() {
        let stub = Arc::new(StubProvider::new());
        let cached = CachedEmbedder::new(stub, Duration::from_secs(60));

        for i in 0..(DEFAULT_MAX_ENTRIES + 50) {
            cached.encode(&format!("dal {}", i)).unwrap();
        }
        assert_eq!(cached.cache().len(), DEFAULT_MAX_ENTRIES);
    }
}
