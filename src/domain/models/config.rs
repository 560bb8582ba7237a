use serde::{Deserialize, Serialize};

/// Main configuration structure for the lifelog router
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// IANA timezone used for every "today" computation
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Rate limiting configuration for the reasoning service
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry policy configuration for the reasoning service
    #[serde(default)]
    pub retry: RetryConfig,

    /// Reasoning service configuration
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Classification thresholds
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Scope gate and direct-answer configuration
    #[serde(default)]
    pub scope: ScopeConfig,

    /// Ingestion loop configuration
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Lifelog API configuration
    #[serde(default)]
    pub lifelog_api: LifelogApiConfig,

    /// Notification sink configuration
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Journal handler definitions, in registration order
    #[serde(default = "default_handlers")]
    pub handlers: Vec<HandlerConfig>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            reasoning: ReasoningConfig::default(),
            routing: RoutingConfig::default(),
            scope: ScopeConfig::default(),
            ingestion: IngestionConfig::default(),
            lifelog_api: LifelogApiConfig::default(),
            notifications: NotificationConfig::default(),
            handlers: default_handlers(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".lifelog/lifelog.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation for log files: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Requests per second allowed
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
}

const fn default_requests_per_second() -> f64 {
    5.0
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_initial_backoff_ms() -> u64 {
    1000
}

const fn default_max_backoff_ms() -> u64 {
    10_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Reasoning service (Claude Messages API) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReasoningConfig {
    /// API base URL
    #[serde(default = "default_reasoning_base_url")]
    pub base_url: String,

    /// API key; falls back to `ANTHROPIC_API_KEY` when unset
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Output token cap per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Overall deadline for one classification, retries included
    #[serde(default = "default_classification_timeout_secs")]
    pub classification_timeout_secs: u64,

    /// HTTP timeout for a single request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_reasoning_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

const fn default_max_tokens() -> u32 {
    1000
}

const fn default_classification_timeout_secs() -> u64 {
    30
}

const fn default_request_timeout_secs() -> u64 {
    20
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            base_url: default_reasoning_base_url(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            classification_timeout_secs: default_classification_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Classification thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RoutingConfig {
    /// Minimum confidence for a tool-selected handler to be dispatched,
    /// and below which a tool-based decision becomes out of scope
    #[serde(default = "default_dispatch_threshold")]
    pub dispatch_threshold: f64,

    /// Confidence assigned to handlers matched by the keyword fallback
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,
}

const fn default_dispatch_threshold() -> f64 {
    0.7
}

const fn default_fallback_confidence() -> f64 {
    0.6
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            dispatch_threshold: default_dispatch_threshold(),
            fallback_confidence: default_fallback_confidence(),
        }
    }
}

/// Scope gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScopeConfig {
    /// When false every no-tool result is treated as in scope
    #[serde(default = "default_true")]
    pub enable_scope_check: bool,

    /// Allow synthesizing direct answers for in-scope text
    #[serde(default = "default_true")]
    pub allow_direct_answers: bool,

    /// Also allow direct answers for the ambient feed
    #[serde(default)]
    pub direct_answers_for_ambient: bool,

    /// Topics that are always in scope (case-insensitive substrings)
    #[serde(default)]
    pub in_scope_topics: Vec<String>,

    /// Topics that are always out of scope (case-insensitive substrings)
    #[serde(default = "default_out_of_scope_topics")]
    pub out_of_scope_topics: Vec<String>,

    /// System instruction for direct-answer synthesis
    #[serde(default = "default_direct_answer_prompt")]
    pub direct_answer_system_prompt: String,
}

const fn default_true() -> bool {
    true
}

fn default_out_of_scope_topics() -> Vec<String> {
    ["weather", "news", "stock price", "sports score"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_direct_answer_prompt() -> String {
    "You are a personal automation assistant. You help the user with their own tracking, \
     health, fitness, nutrition and productivity goals. Answer briefly and concretely."
        .to_string()
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            enable_scope_check: true,
            allow_direct_answers: true,
            direct_answers_for_ambient: false,
            in_scope_topics: Vec::new(),
            out_of_scope_topics: default_out_of_scope_topics(),
            direct_answer_system_prompt: default_direct_answer_prompt(),
        }
    }
}

/// Ingestion loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IngestionConfig {
    /// Sleep between polling cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum events requested per poll
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Width of the polling window; overlapping windows are expected
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: i64,

    /// Multiplier applied to the poll interval after a failed cycle
    #[serde(default = "default_failure_backoff_multiplier")]
    pub failure_backoff_multiplier: u32,
}

const fn default_poll_interval_secs() -> u64 {
    2
}

const fn default_batch_size() -> u32 {
    10
}

const fn default_lookback_minutes() -> i64 {
    30
}

const fn default_failure_backoff_multiplier() -> u32 {
    2
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            batch_size: default_batch_size(),
            lookback_minutes: default_lookback_minutes(),
            failure_backoff_multiplier: default_failure_backoff_multiplier(),
        }
    }
}

/// Lifelog API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LifelogApiConfig {
    /// API base URL
    #[serde(default = "default_lifelog_base_url")]
    pub base_url: String,

    /// API key; falls back to `LIFELOG_API_KEY` when unset
    #[serde(default)]
    pub api_key: Option<String>,

    /// HTTP timeout in seconds
    #[serde(default = "default_lifelog_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_lifelog_base_url() -> String {
    "https://api.limitless.ai/v1".to_string()
}

const fn default_lifelog_timeout_secs() -> u64 {
    15
}

impl Default for LifelogApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_lifelog_base_url(),
            api_key: None,
            timeout_secs: default_lifelog_timeout_secs(),
        }
    }
}

/// Notification sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NotificationConfig {
    /// Chat webhook URL; notifications are only logged when unset
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Capacity of the channel between dispatcher and sink
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

const fn default_channel_capacity() -> usize {
    64
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Definition of one journal handler
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct HandlerConfig {
    /// Unique routing key
    pub name: String,

    /// Description shown to the reasoning service
    #[serde(default)]
    pub description: String,

    /// Case-insensitive trigger substrings, in priority order
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Case-insensitive question regexes
    #[serde(default)]
    pub question_patterns: Vec<String>,

    /// Recurring tasks as `name` + local `HH:MM`
    #[serde(default)]
    pub scheduled_tasks: Vec<ScheduledTaskConfig>,

    /// Disabled handlers are not registered
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// A scheduled task declared in configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ScheduledTaskConfig {
    pub name: String,
    /// Local time, `HH:MM`
    pub at: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn task(name: &str, at: &str) -> ScheduledTaskConfig {
    ScheduledTaskConfig {
        name: name.to_string(),
        at: at.to_string(),
    }
}

fn default_handlers() -> Vec<HandlerConfig> {
    vec![
        HandlerConfig {
            name: "nutrition".to_string(),
            description: "Logs meals, drinks and hydration; answers macro and food questions."
                .to_string(),
            keywords: strings(&[
                "log that", "log this", "track this", "track that",
                "check macros", "macro check", "nutrition summary",
                "what should i eat", "meal ideas", "dinner ideas",
                "smoothie", "breakfast", "lunch", "dinner", "snack",
                "drank", "water", "hydration",
            ]),
            question_patterns: strings(&[
                r"how much (protein|calories|carbs|fat|fiber)",
                r"what (should|can|would|do) (i|you) (eat|have|suggest|recommend)",
                r"(eat|have) for (breakfast|lunch|dinner)",
                r"what.*(nutrition|macro|food).*today",
                r"did i (hit|reach|meet)",
                r"(macro|nutrition|food) (summary|totals|check)",
                r"how (much|many).*water",
            ]),
            scheduled_tasks: vec![
                task("morning_supplements", "07:00"),
                task("daily_summary", "20:00"),
                task("evening_supplements", "21:00"),
            ],
            enabled: true,
        },
        HandlerConfig {
            name: "workout".to_string(),
            description: "Logs workouts, rides, runs and lifts; answers training questions."
                .to_string(),
            keywords: strings(&[
                "workout", "exercise", "trained", "worked out",
                "peloton", "ride", "run", "ran",
                "cycling", "biking", "strength",
                "log workout", "finished workout",
            ]),
            question_patterns: strings(&[
                r"how (much|many|long).*work",
                r"what.*exercise",
                r"did i.*workout",
                r"(workout|exercise) (summary|stats|totals)",
            ]),
            scheduled_tasks: Vec::new(),
            enabled: true,
        },
        HandlerConfig {
            name: "sleep".to_string(),
            description: "Logs sleep duration, bedtime and quality, and answers sleep questions."
                .to_string(),
            keywords: strings(&[
                "slept", "sleep", "woke up", "wake up",
                "went to bed", "bedtime", "sleep hours",
                "sleep quality", "sleep score",
            ]),
            question_patterns: strings(&[
                r"how (much|long).*sleep",
                r"did i.*sleep",
                r"sleep (hours|duration|time)",
                r"what.*sleep.*(score|quality)",
            ]),
            scheduled_tasks: Vec::new(),
            enabled: true,
        },
        HandlerConfig {
            name: "health".to_string(),
            description: "Logs weight, bowel movements and electrolytes; answers health questions."
                .to_string(),
            keywords: strings(&[
                "bowel movement", "went to bathroom",
                "weighed", "weight", "weigh myself", "current weight",
                "took electrolytes", "electrolytes", "took supplements",
            ]),
            question_patterns: strings(&[
                r"how (much|many).*(weight|bowel)",
                r"what.*weight",
                r"did i.*(weight|bowel|electrolyte)",
                r"(weight|bowel|health).*(summary|stats|totals)",
            ]),
            scheduled_tasks: Vec::new(),
            enabled: true,
        },
    ]
}
