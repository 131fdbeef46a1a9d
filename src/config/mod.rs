use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Capacity of the queue between the tokenizer thread and the parser.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Buffer size of listeners created through `Parser::subscribe`.
pub const DEFAULT_LISTENER_CAPACITY: usize = 64;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ParserConfig {
    pub stream_mode: StreamMode,
    pub queue_capacity: usize,
    pub listener_capacity: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            stream_mode: StreamMode::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            listener_capacity: DEFAULT_LISTENER_CAPACITY,
        }
    }
}

impl ParserConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// How tokens travel from the tokenizer to the tree builder.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    /// Tokenizer on its own thread behind a bounded queue.
    #[default]
    Threaded,
    /// Tokens pulled from the tokenizer on the calling thread.
    Inline,
}

impl FromStr for StreamMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "threaded" => Ok(StreamMode::Threaded),
            "inline" => Ok(StreamMode::Inline),
            _ => Err(format!("invalid stream_mode: {value}")),
        }
    }
}
