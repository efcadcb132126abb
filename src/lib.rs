pub mod calculation;
pub mod calculator;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod listeners;
pub mod operations;
pub mod repl;
pub mod shell;
pub mod storage;
pub mod utils;

pub use calculation::Calculation;
pub use calculator::Calculator;
pub use error::{CalcError, CalcResult};
pub use events::{CalculationEvent, CalculationListener, ListenerFailure, ListenerId, NotificationHub};
pub use history::History;
pub use operations::{Operation, OperationRegistry};
pub use shell::Shell;
pub use storage::{CsvHistoryStore, HistoryStore};

/// Calculator version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory name under the platform config/data dirs
pub const APP_DIR: &str = "calcshell";

/// Default configuration file name
pub const CONFIG_FILE: &str = "config.toml";

/// Persisted calculation history
pub const HISTORY_FILE: &str = "calculator_history.csv";

/// Line-editor input history
pub const INPUT_HISTORY_FILE: &str = "input_history.txt";

pub const LOG_FILE: &str = "calculator.log";

/// Default cap on stored calculations
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Prompt prefix
pub const PROMPT_PREFIX: &str = "calc";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
