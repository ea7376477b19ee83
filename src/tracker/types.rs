//! 题目、难度、题单与进度记录的数据类型

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty label: {0}")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(UnknownDifficulty(s.to_string())),
        }
    }
}

/// 题目标识的最后一段路径（去掉末尾斜杠），作为难度缓存的键
pub fn problem_slug(problem_id: &str) -> &str {
    let trimmed = problem_id.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("catalog must be a JSON object of category -> [problem]")]
    NotAnObject,
    #[error("category '{0}' must be an array of problem identifiers")]
    InvalidCategory(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub problems: Vec<String>,
}

/// 用户上传的题单：分类名 -> 有序题目列表，保持输入顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub categories: Vec<Category>,
}

impl Catalog {
    /// 解析原始 JSON；若存在 `result` 包装则先解包。
    /// 返回题单以及需要持久化的快照（解包后的对象）。
    pub fn parse(raw: &str) -> Result<(Catalog, Value), CatalogError> {
        Catalog::from_value(serde_json::from_str(raw)?)
    }

    pub fn from_value(data: Value) -> Result<(Catalog, Value), CatalogError> {
        let snapshot = match data {
            Value::Object(mut obj) => match obj.remove("result") {
                Some(inner) => inner,
                None => Value::Object(obj),
            },
            _ => return Err(CatalogError::NotAnObject),
        };
        let catalog = Catalog::from_snapshot(&snapshot)?;
        Ok((catalog, snapshot))
    }

    pub fn from_snapshot(snapshot: &Value) -> Result<Catalog, CatalogError> {
        let obj: &Map<String, Value> = snapshot.as_object().ok_or(CatalogError::NotAnObject)?;
        let mut categories = Vec::with_capacity(obj.len());
        for (name, entries) in obj {
            let items = entries
                .as_array()
                .ok_or_else(|| CatalogError::InvalidCategory(name.clone()))?;
            let mut problems = Vec::with_capacity(items.len());
            for item in items {
                let id = item
                    .as_str()
                    .ok_or_else(|| CatalogError::InvalidCategory(name.clone()))?;
                problems.push(id.to_string());
            }
            categories.push(Category {
                name: name.clone(),
                problems,
            });
        }
        Ok(Catalog { categories })
    }

    /// 按分类顺序遍历全部题目标识
    pub fn problems(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .flat_map(|c| c.problems.iter().map(String::as_str))
    }

    pub fn total_problems(&self) -> usize {
        self.categories.iter().map(|c| c.problems.len()).sum()
    }
}

/// 按难度划分的题目桶，附带 题目 -> 难度 的反向索引。
/// 两者一起构建，构建后不再修改。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DifficultyMap {
    easy: Vec<String>,
    medium: Vec<String>,
    hard: Vec<String>,
    index: HashMap<String, Difficulty>,
}

impl DifficultyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已存在的题目保持首次分类结果，返回 false
    pub fn insert(&mut self, problem_id: &str, difficulty: Difficulty) -> bool {
        if self.index.contains_key(problem_id) {
            return false;
        }
        self.index.insert(problem_id.to_string(), difficulty);
        self.bucket_mut(difficulty).push(problem_id.to_string());
        true
    }

    pub fn bucket(&self, difficulty: Difficulty) -> &[String] {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    fn bucket_mut(&mut self, difficulty: Difficulty) -> &mut Vec<String> {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }

    pub fn difficulty_of(&self, problem_id: &str) -> Option<Difficulty> {
        self.index.get(problem_id).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, Difficulty)> for DifficultyMap {
    fn from_iter<I: IntoIterator<Item = (S, Difficulty)>>(iter: I) -> Self {
        let mut map = DifficultyMap::new();
        for (id, difficulty) in iter {
            map.insert(id.as_ref(), difficulty);
        }
        map
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub easy_completed: u32,
    pub medium_completed: u32,
    pub hard_completed: u32,
    pub total_completed: u32,
}

impl GlobalStats {
    pub fn record(&mut self, difficulty: Difficulty) {
        match difficulty {
            Difficulty::Easy => self.easy_completed += 1,
            Difficulty::Medium => self.medium_completed += 1,
            Difficulty::Hard => self.hard_completed += 1,
        }
        self.total_completed += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentSession {
    pub problems: Vec<String>,
    pub easy_completed: u32,
    pub medium_completed: u32,
    pub hard_completed: u32,
    pub total_completed: u32,
    #[serde(default, with = "session_timestamp")]
    pub generated_at: Option<DateTime<Utc>>,
    /// 因跳过而被原位替换出本次会话的题目
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replaced: Vec<String>,
}

impl CurrentSession {
    pub fn record(&mut self, difficulty: Difficulty) {
        match difficulty {
            Difficulty::Easy => self.easy_completed += 1,
            Difficulty::Medium => self.medium_completed += 1,
            Difficulty::Hard => self.hard_completed += 1,
        }
        self.total_completed += 1;
    }

    /// 本次会话生成时包含过的题目（含被跳过替换掉的）
    pub fn contains(&self, problem_id: &str) -> bool {
        self.problems.iter().any(|p| p == problem_id)
            || self.replaced.iter().any(|p| p == problem_id)
    }
}

/// 单个用户的持久化进度记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub completed: Vec<String>,
    pub skipped: Vec<String>,
    pub revisit: Vec<String>,
    pub global_stats: GlobalStats,
    pub current_session: CurrentSession,
}

impl ProgressRecord {
    pub fn is_completed(&self, problem_id: &str) -> bool {
        self.completed.iter().any(|p| p == problem_id)
    }

    pub fn is_skipped(&self, problem_id: &str) -> bool {
        self.skipped.iter().any(|p| p == problem_id)
    }

    pub fn is_revisit(&self, problem_id: &str) -> bool {
        self.revisit.iter().any(|p| p == problem_id)
    }
}

/// generated_at 以 RFC 3339 写出；读取时兼容旧格式 `%Y-%m-%d %H:%M:%S`
mod session_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(&raw, LEGACY_FORMAT)
            .map(|naive| Some(naive.and_utc()))
            .map_err(|_| de::Error::custom(format!("invalid generated_at timestamp: {raw}")))
    }
}
