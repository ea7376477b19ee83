//! 难度分类：缓存优先，未命中时查询外部服务，查询之间限速

use std::time::Duration;

use crate::constants::CLASSIFY_LOG_EVERY;
use crate::services::difficulty_lookup::DifficultyLookup;
use crate::store::{Store, StoreError};
use crate::tracker::types::{problem_slug, Catalog, Difficulty, DifficultyMap};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyReport {
    pub processed: usize,
    pub cache_hits: usize,
    pub lookups: usize,
    pub lookup_failures: usize,
}

/// 对整份题单重新分桶。每次加载题单都完整重建，不做增量更新。
///
/// 查询失败或数据缺失时按 `medium` 处理且不写缓存；
/// 每次真正访问网络的查询之后等待 `pacing`。
pub async fn classify<L: DifficultyLookup>(
    catalog: &Catalog,
    store: &Store,
    lookup: &L,
    pacing: Duration,
) -> Result<(DifficultyMap, ClassifyReport), StoreError> {
    let mut cache = store.load_difficulty_cache()?;
    let mut map = DifficultyMap::new();
    let mut report = ClassifyReport::default();
    let total = catalog.total_problems();

    tracing::info!(total, cached = cache.len(), "Building difficulty map");

    for problem_id in catalog.problems() {
        report.processed += 1;

        if map.difficulty_of(problem_id).is_some() {
            tracing::debug!(problem_id, "Duplicate problem in catalog, keeping first placement");
            continue;
        }

        let slug = problem_slug(problem_id);
        let difficulty = match cache.get(slug) {
            Some(cached) => {
                report.cache_hits += 1;
                *cached
            }
            None => {
                report.lookups += 1;
                let outcome = lookup.lookup(slug).await;
                let reached_network = outcome
                    .as_ref()
                    .map(|_| true)
                    .unwrap_or_else(|e| e.reached_network());

                let difficulty = match outcome {
                    Ok(found) => {
                        store.put_cached_difficulty(slug, found)?;
                        cache.insert(slug.to_string(), found);
                        found
                    }
                    Err(e) => {
                        report.lookup_failures += 1;
                        tracing::warn!(slug, error = %e, "Difficulty lookup failed, defaulting to medium");
                        Difficulty::Medium
                    }
                };

                if reached_network {
                    tokio::time::sleep(pacing).await;
                }
                difficulty
            }
        };

        map.insert(problem_id, difficulty);

        if report.processed % CLASSIFY_LOG_EVERY == 0 {
            tracing::info!(
                processed = report.processed,
                total,
                lookups = report.lookups,
                "Classification progress"
            );
        }
    }

    tracing::info!(
        easy = map.bucket(Difficulty::Easy).len(),
        medium = map.bucket(Difficulty::Medium).len(),
        hard = map.bucket(Difficulty::Hard).len(),
        cache_hits = report.cache_hits,
        lookups = report.lookups,
        lookup_failures = report.lookup_failures,
        "Difficulty map created"
    );

    Ok((map, report))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use tempfile::tempdir;

    use super::*;
    use crate::services::difficulty_lookup::LookupError;

    /// 记录调用次数的假查询服务
    #[derive(Default)]
    pub(crate) struct CountingLookup {
        pub answers: HashMap<String, Difficulty>,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<String>>,
    }

    impl CountingLookup {
        pub(crate) fn with(answers: &[(&str, Difficulty)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(slug, d)| (slug.to_string(), *d))
                    .collect(),
                ..Default::default()
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DifficultyLookup for CountingLookup {
        async fn lookup(&self, slug: &str) -> Result<Difficulty, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(slug.to_string());
            self.answers
                .get(slug)
                .copied()
                .ok_or_else(|| LookupError::Network("unreachable".to_string()))
        }
    }

    struct DisabledLookup;

    impl DifficultyLookup for DisabledLookup {
        async fn lookup(&self, _slug: &str) -> Result<Difficulty, LookupError> {
            Err(LookupError::Disabled)
        }
    }

    const PACING: Duration = Duration::from_millis(1);

    fn open_store(dir: &tempfile::TempDir) -> Store {
        Store::open(dir.path().join("db").to_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn warm_cache_needs_no_lookups() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.put_cached_difficulty("two-sum", Difficulty::Easy).unwrap();
        store.put_cached_difficulty("n-queens", Difficulty::Hard).unwrap();
        let (catalog, _) =
            Catalog::parse(r#"{"cat1": ["https://x/two-sum", "https://x/n-queens"]}"#).unwrap();
        let lookup = CountingLookup::default();

        let (map, report) = classify(&catalog, &store, &lookup, PACING).await.unwrap();

        assert_eq!(lookup.calls(), 0);
        assert_eq!(report.cache_hits, 2);
        assert_eq!(map.bucket(Difficulty::Easy), &["https://x/two-sum".to_string()]);
        assert!(map.bucket(Difficulty::Medium).is_empty());
        assert_eq!(map.bucket(Difficulty::Hard), &["https://x/n-queens".to_string()]);
    }

    #[tokio::test]
    async fn second_run_is_identical_and_offline() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let (catalog, _) = Catalog::parse(
            r#"{"arrays": ["https://x/two-sum/", "https://x/3sum"], "graphs": ["https://x/word-ladder"]}"#,
        )
        .unwrap();
        let lookup = CountingLookup::with(&[
            ("two-sum", Difficulty::Easy),
            ("3sum", Difficulty::Medium),
            ("word-ladder", Difficulty::Hard),
        ]);

        let (first, _) = classify(&catalog, &store, &lookup, PACING).await.unwrap();
        assert_eq!(lookup.calls(), 3);
        assert_eq!(
            *lookup.seen.lock().unwrap(),
            vec!["two-sum", "3sum", "word-ladder"]
        );

        let (second, report) = classify(&catalog, &store, &lookup, PACING).await.unwrap();
        assert_eq!(lookup.calls(), 3);
        assert_eq!(report.lookups, 0);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_lookup_defaults_to_medium_without_caching() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let (catalog, _) = Catalog::parse(r#"{"c": ["https://x/mystery"]}"#).unwrap();
        let lookup = CountingLookup::default();

        let (map, report) = classify(&catalog, &store, &lookup, PACING).await.unwrap();

        assert_eq!(map.difficulty_of("https://x/mystery"), Some(Difficulty::Medium));
        assert_eq!(report.lookup_failures, 1);
        assert_eq!(store.get_cached_difficulty("mystery").unwrap(), None);
    }

    #[tokio::test]
    async fn every_problem_lands_in_exactly_one_bucket() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.put_cached_difficulty("a", Difficulty::Easy).unwrap();
        let (catalog, _) = Catalog::parse(
            r#"{"one": ["https://x/a", "https://x/b"], "two": ["https://x/a", "https://x/c"]}"#,
        )
        .unwrap();
        let lookup = CountingLookup::with(&[("b", Difficulty::Hard), ("c", Difficulty::Easy)]);

        let (map, _) = classify(&catalog, &store, &lookup, PACING).await.unwrap();

        assert_eq!(map.len(), 3);
        let total: usize = Difficulty::ALL.iter().map(|d| map.bucket(*d).len()).sum();
        assert_eq!(total, 3);
        assert_eq!(
            map.bucket(Difficulty::Easy),
            &["https://x/a".to_string(), "https://x/c".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn network_lookups_are_paced() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let (catalog, _) =
            Catalog::parse(r#"{"c": ["https://x/a", "https://x/b", "https://x/c"]}"#).unwrap();
        // b 查询失败但已访问网络，同样需要等待
        let lookup = CountingLookup::with(&[("a", Difficulty::Easy), ("c", Difficulty::Hard)]);
        let pacing = Duration::from_millis(100);

        let start = tokio::time::Instant::now();
        classify(&catalog, &store, &lookup, pacing).await.unwrap();

        assert_eq!(lookup.calls(), 3);
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn cache_hits_are_not_paced() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        for slug in ["a", "b", "c"] {
            store.put_cached_difficulty(slug, Difficulty::Medium).unwrap();
        }
        let (catalog, _) =
            Catalog::parse(r#"{"c": ["https://x/a", "https://x/b", "https://x/c"]}"#).unwrap();
        let lookup = CountingLookup::default();

        let start = tokio::time::Instant::now();
        classify(&catalog, &store, &lookup, Duration::from_millis(100))
            .await
            .unwrap();

        assert_eq!(lookup.calls(), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_lookup_is_not_paced() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let (catalog, _) = Catalog::parse(r#"{"c": ["https://x/a", "https://x/b"]}"#).unwrap();

        let start = tokio::time::Instant::now();
        let (map, report) = classify(&catalog, &store, &DisabledLookup, Duration::from_millis(100))
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(report.lookup_failures, 2);
        assert_eq!(map.bucket(Difficulty::Medium).len(), 2);
    }
}
