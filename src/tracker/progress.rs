//! 进度变更与查询：完成、跳过、标记复习，以及会话/全局统计视图

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::constants::{PROGRESS_REQUIRED_KEYS, UNLOCK_EASY_REQUIRED, UNLOCK_MEDIUM_REQUIRED};
use crate::tracker::selector::{can_select_hard_problems, pick_replacement, SessionProblem};
use crate::tracker::types::{Difficulty, DifficultyMap, ProgressRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipOutcome {
    /// 已跳过或已完成，记录未变
    Rejected,
    Skipped { replacement: Option<SessionProblem> },
}

/// 标记完成。已完成或难度未知时返回 false，记录保持不变。
pub fn mark_complete(progress: &mut ProgressRecord, map: &DifficultyMap, problem_id: &str) -> bool {
    if progress.is_completed(problem_id) {
        return false;
    }
    let Some(difficulty) = map.difficulty_of(problem_id) else {
        return false;
    };

    let was_in_session = progress.current_session.contains(problem_id);
    progress.skipped.retain(|p| p != problem_id);
    progress.completed.push(problem_id.to_string());
    progress.global_stats.record(difficulty);
    if was_in_session {
        progress.current_session.record(difficulty);
    }
    true
}

/// 标记跳过并抽取同难度替换题；若该题在本次会话中则原位替换
pub fn mark_skip<R: Rng + ?Sized>(
    progress: &mut ProgressRecord,
    map: &DifficultyMap,
    problem_id: &str,
    rng: &mut R,
) -> SkipOutcome {
    if progress.is_skipped(problem_id) || progress.is_completed(problem_id) {
        return SkipOutcome::Rejected;
    }
    progress.skipped.push(problem_id.to_string());

    let Some(difficulty) = map.difficulty_of(problem_id) else {
        return SkipOutcome::Skipped { replacement: None };
    };
    let Some(replacement) = pick_replacement(map, progress, difficulty, rng) else {
        return SkipOutcome::Skipped { replacement: None };
    };

    let session = &mut progress.current_session;
    if let Some(pos) = session.problems.iter().position(|p| p == problem_id) {
        session.problems[pos] = replacement.clone();
        if !session.replaced.iter().any(|p| p == problem_id) {
            session.replaced.push(problem_id.to_string());
        }
    }

    SkipOutcome::Skipped {
        replacement: Some(SessionProblem {
            url: replacement,
            difficulty,
        }),
    }
}

/// 幂等地加入复习列表，返回是否新加入
pub fn mark_revisit(progress: &mut ProgressRecord, problem_id: &str) -> bool {
    if progress.is_revisit(problem_id) {
        return false;
    }
    progress.revisit.push(problem_id.to_string());
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierCounts {
    pub total: u32,
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub total: u32,
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
    pub total_problems: usize,
    pub generated_at: Option<DateTime<Utc>>,
    pub can_unlock_hard: bool,
    pub needs_easy: u32,
    pub needs_medium: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub global: TierCounts,
    pub session: SessionView,
    pub skipped: usize,
    pub revisit: usize,
}

pub fn progress_view(progress: &ProgressRecord) -> ProgressView {
    let global = &progress.global_stats;
    let session = &progress.current_session;

    ProgressView {
        global: TierCounts {
            total: global.total_completed,
            easy: global.easy_completed,
            medium: global.medium_completed,
            hard: global.hard_completed,
        },
        session: SessionView {
            total: session.total_completed,
            easy: session.easy_completed,
            medium: session.medium_completed,
            hard: session.hard_completed,
            total_problems: session.problems.len(),
            generated_at: session.generated_at,
            can_unlock_hard: can_select_hard_problems(session),
            needs_easy: UNLOCK_EASY_REQUIRED.saturating_sub(session.easy_completed),
            needs_medium: UNLOCK_MEDIUM_REQUIRED.saturating_sub(session.medium_completed),
        },
        skipped: progress.skipped.len(),
        revisit: progress.revisit.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Skipped,
    Revisit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletedScope {
    Session,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyFilter {
    All,
    Only(Difficulty),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct InvalidQuery {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for ListKind {
    type Err = InvalidQuery;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skipped" => Ok(ListKind::Skipped),
            "revisit" => Ok(ListKind::Revisit),
            _ => Err(InvalidQuery {
                kind: "list type",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for CompletedScope {
    type Err = InvalidQuery;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session" => Ok(CompletedScope::Session),
            "global" => Ok(CompletedScope::Global),
            _ => Err(InvalidQuery {
                kind: "scope",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for DifficultyFilter {
    type Err = InvalidQuery;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(DifficultyFilter::All);
        }
        s.parse::<Difficulty>()
            .map(DifficultyFilter::Only)
            .map_err(|_| InvalidQuery {
                kind: "difficulty",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemEntry {
    pub url: String,
    pub is_revisit: bool,
}

fn entry(progress: &ProgressRecord, url: &str) -> ProblemEntry {
    ProblemEntry {
        url: url.to_string(),
        is_revisit: progress.is_revisit(url),
    }
}

pub fn list(progress: &ProgressRecord, kind: ListKind) -> Vec<ProblemEntry> {
    let source = match kind {
        ListKind::Skipped => &progress.skipped,
        ListKind::Revisit => &progress.revisit,
    };
    source.iter().map(|url| entry(progress, url)).collect()
}

/// 已完成题目，按范围与难度过滤，保持完成顺序
pub fn completed(
    progress: &ProgressRecord,
    map: &DifficultyMap,
    scope: CompletedScope,
    filter: DifficultyFilter,
) -> Vec<ProblemEntry> {
    progress
        .completed
        .iter()
        .filter(|url| match scope {
            CompletedScope::Session => progress.current_session.contains(url),
            CompletedScope::Global => true,
        })
        .filter(|url| match filter {
            DifficultyFilter::All => true,
            DifficultyFilter::Only(d) => map.difficulty_of(url) == Some(d),
        })
        .map(|url| entry(progress, url))
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("import must be a JSON object")]
    NotAnObject,
    #[error("missing required key: {0}")]
    MissingKey(&'static str),
    #[error("invalid progress document: {0}")]
    Invalid(#[from] serde_json::Error),
}

pub fn export(progress: &ProgressRecord) -> Result<Value, serde_json::Error> {
    serde_json::to_value(progress)
}

/// 校验五个顶层字段都存在后整体解析；任何失败都不产生部分导入
pub fn parse_import(document: Value) -> Result<ProgressRecord, ImportError> {
    let obj = document.as_object().ok_or(ImportError::NotAnObject)?;
    if let Some(missing) = PROGRESS_REQUIRED_KEYS
        .iter()
        .find(|key| !obj.contains_key(**key))
    {
        return Err(ImportError::MissingKey(*missing));
    }
    Ok(serde_json::from_value(document)?)
}
