//! 分层随机抽题：按难度从未完成题目中无放回抽取

use std::collections::HashSet;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::constants::{
    SESSION_EASY_TARGET, SESSION_HARD_TARGET, SESSION_MEDIUM_TARGET, UNLOCK_EASY_REQUIRED,
    UNLOCK_MEDIUM_REQUIRED,
};
use crate::tracker::types::{CurrentSession, Difficulty, DifficultyMap, ProgressRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProblem {
    pub url: String,
    pub difficulty: Difficulty,
}

pub fn tier_target(difficulty: Difficulty) -> usize {
    match difficulty {
        Difficulty::Easy => SESSION_EASY_TARGET,
        Difficulty::Medium => SESSION_MEDIUM_TARGET,
        Difficulty::Hard => SESSION_HARD_TARGET,
    }
}

/// 该难度下尚未完成的题目（跳过、待复习的题目仍然可选）
pub fn available_problems<'a>(
    map: &'a DifficultyMap,
    progress: &ProgressRecord,
    difficulty: Difficulty,
) -> Vec<&'a String> {
    let completed: HashSet<&str> = progress.completed.iter().map(String::as_str).collect();
    map.bucket(difficulty)
        .iter()
        .filter(|p| !completed.contains(p.as_str()))
        .collect()
}

/// 生成新会话并整体替换 `current_session`。
///
/// 按 easy、medium、hard 顺序各抽至多 20/8/2 道，不足时全取。
/// 困难题解锁条件只作提示，这里不做限制。
pub fn generate_session<R: Rng + ?Sized>(
    map: &DifficultyMap,
    progress: &mut ProgressRecord,
    rng: &mut R,
) -> Vec<SessionProblem> {
    let mut selected = Vec::new();

    for difficulty in Difficulty::ALL {
        let available = available_problems(map, progress, difficulty);
        let picked = available
            .choose_multiple(rng, tier_target(difficulty))
            .map(|url| SessionProblem {
                url: (*url).clone(),
                difficulty,
            });
        selected.extend(picked);
    }

    progress.current_session = CurrentSession {
        problems: selected.iter().map(|p| p.url.clone()).collect(),
        generated_at: Some(Utc::now()),
        ..CurrentSession::default()
    };

    selected
}

/// 从同难度可选池中均匀抽取一道替换题
pub fn pick_replacement<R: Rng + ?Sized>(
    map: &DifficultyMap,
    progress: &ProgressRecord,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<String> {
    available_problems(map, progress, difficulty)
        .choose(rng)
        .map(|url| (*url).clone())
}

pub fn can_select_hard_problems(session: &CurrentSession) -> bool {
    session.easy_completed >= UNLOCK_EASY_REQUIRED
        && session.medium_completed >= UNLOCK_MEDIUM_REQUIRED
}
