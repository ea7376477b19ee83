/// 每次生成会话时各难度的抽题目标数
pub const SESSION_EASY_TARGET: usize = 20;
pub const SESSION_MEDIUM_TARGET: usize = 8;
pub const SESSION_HARD_TARGET: usize = 2;

/// 解锁困难题所需的本次会话完成数（仅作提示，不参与抽题）
pub const UNLOCK_EASY_REQUIRED: u32 = 20;
pub const UNLOCK_MEDIUM_REQUIRED: u32 = 3;

/// 外部难度查询之间的默认间隔（毫秒）
pub const DEFAULT_LOOKUP_PACING_MS: u64 = 100;

/// 外部难度查询默认超时（秒）
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;

/// 分类进度日志的输出间隔（题数）
pub const CLASSIFY_LOG_EVERY: usize = 10;

/// 未携带 x-user-id 时使用的默认用户
pub const DEFAULT_USER_ID: &str = "local";

/// 用户标识最大长度
pub const MAX_USER_ID_LEN: usize = 128;

/// 用户锁表超过该数量时清理空闲的锁
pub const USER_LOCK_PRUNE_THRESHOLD: usize = 256;

/// 导入进度时必须存在的顶层字段
pub const PROGRESS_REQUIRED_KEYS: &[&str] = &[
    "completed",
    "skipped",
    "revisit",
    "global_stats",
    "current_session",
];
