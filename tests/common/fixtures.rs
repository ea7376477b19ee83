use serde_json::{json, Value};

use problem_tracker::store::Store;
use problem_tracker::tracker::types::Difficulty;

/// 预先写入难度缓存，测试中无需访问外部服务
pub fn seed_difficulties(store: &Store, entries: &[(&str, Difficulty)]) {
    for (slug, difficulty) in entries {
        store
            .put_cached_difficulty(slug, *difficulty)
            .expect("seed difficulty cache");
    }
}

pub fn problem_url(slug: &str) -> String {
    format!("https://leetcode.com/problems/{slug}/")
}

/// 生成 easy/medium/hard 各若干道题的题单，并把难度写入缓存
pub fn seed_catalog(store: &Store, easy: usize, medium: usize, hard: usize) -> Value {
    let mut entries = Vec::new();
    let mut categories = serde_json::Map::new();

    for (name, difficulty, count) in [
        ("Arrays", Difficulty::Easy, easy),
        ("Graphs", Difficulty::Medium, medium),
        ("Dynamic Programming", Difficulty::Hard, hard),
    ] {
        let slugs: Vec<String> = (0..count)
            .map(|i| format!("{}-{i}", difficulty.as_str()))
            .collect();
        for slug in &slugs {
            entries.push((slug.clone(), difficulty));
        }
        categories.insert(
            name.to_string(),
            Value::Array(slugs.iter().map(|s| Value::String(problem_url(s))).collect()),
        );
    }

    let borrowed: Vec<(&str, Difficulty)> =
        entries.iter().map(|(s, d)| (s.as_str(), *d)).collect();
    seed_difficulties(store, &borrowed);

    json!({ "result": Value::Object(categories) })
}
