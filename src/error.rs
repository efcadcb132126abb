use thiserror::Error;

pub type CalcResult<T> = Result<T, CalcError>;

#[derive(Error, Debug)]
pub enum CalcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown operation: {name}")]
    UnknownOperation { name: String },

    #[error("Division by zero in {operation}")]
    DivisionByZero { operation: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Value {value} exceeds maximum allowed magnitude {limit}")]
    ValueOutOfBounds { value: f64, limit: f64 },

    #[error("Invalid number: '{input}'")]
    InvalidInput { input: String },

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Listener '{listener}' failed: {message}")]
    Listener { listener: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Command error: {message}")]
    Command { message: String },

    #[error("REPL error: {message}")]
    Repl { message: String },
}

impl CalcError {
    pub fn unknown_operation<S: Into<String>>(name: S) -> Self {
        Self::UnknownOperation { name: name.into() }
    }

    pub fn division_by_zero<S: Into<String>>(operation: S) -> Self {
        Self::DivisionByZero {
            operation: operation.into(),
        }
    }

    pub fn invalid_operation<S: Into<String>>(message: S) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    pub fn out_of_bounds(value: f64, limit: f64) -> Self {
        Self::ValueOutOfBounds { value, limit }
    }

    pub fn invalid_input<S: Into<String>>(input: S) -> Self {
        Self::InvalidInput {
            input: input.into(),
        }
    }

    pub fn listener<S: Into<String>, M: Into<String>>(listener: S, message: M) -> Self {
        Self::Listener {
            listener: listener.into(),
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn command<S: Into<String>>(message: S) -> Self {
        Self::Command {
            message: message.into(),
        }
    }

    pub fn repl<S: Into<String>>(message: S) -> Self {
        Self::Repl {
            message: message.into(),
        }
    }

    /// Returns true if this error is recoverable in REPL mode
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CalcError::UnknownOperation { .. }
                | CalcError::DivisionByZero { .. }
                | CalcError::InvalidOperation { .. }
                | CalcError::ValueOutOfBounds { .. }
                | CalcError::InvalidInput { .. }
                | CalcError::NothingToUndo
                | CalcError::NothingToRedo
                | CalcError::Listener { .. }
                | CalcError::Storage { .. }
                | CalcError::Command { .. }
                | CalcError::Csv(_)
        )
    }

    /// Returns true if this error should cause the REPL to exit
    pub fn is_fatal(&self) -> bool {
        matches!(self, CalcError::Repl { .. })
    }

    /// Short label used when rendering the error at the prompt
    pub fn category(&self) -> &'static str {
        match self {
            CalcError::UnknownOperation { .. }
            | CalcError::DivisionByZero { .. }
            | CalcError::InvalidOperation { .. }
            | CalcError::ValueOutOfBounds { .. } => "Operation Error",
            CalcError::InvalidInput { .. } => "Validation Error",
            CalcError::NothingToUndo | CalcError::NothingToRedo => "History",
            CalcError::Storage { .. } | CalcError::Csv(_) | CalcError::Io(_) => "Storage Error",
            CalcError::Config { .. } => "Configuration Error",
            _ => "Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_recoverable() {
        assert!(CalcError::division_by_zero("divide").is_recoverable());
        assert!(CalcError::unknown_operation("sqrt").is_recoverable());
        assert!(CalcError::NothingToUndo.is_recoverable());
        assert!(!CalcError::NothingToRedo.is_fatal());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(CalcError::repl("terminal closed").is_fatal());
        assert!(!CalcError::config("bad").is_recoverable());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            CalcError::unknown_operation("sqrt").to_string(),
            "Unknown operation: sqrt"
        );
        assert_eq!(
            CalcError::invalid_input("abc").to_string(),
            "Invalid number: 'abc'"
        );
        assert_eq!(CalcError::out_of_bounds(2e10, 1e10).category(), "Operation Error");
    }
}
