use crate::calculator::Calculator;
use crate::commands::{CommandOutput, CommandRegistry, Input};
use crate::config::Config;
use crate::error::{CalcError, CalcResult};
use crate::listeners::{AutoSaveListener, LoggingListener};
use crate::repl::ReplEngine;
use crate::storage::{CsvHistoryStore, HistoryStore};
use crate::utils::parse_operand;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

/// A calculator session: the calculator, its persistent store and the
/// command table, shared by the REPL, `-c` and script modes.
pub struct Shell {
    config: Config,
    calculator: Calculator,
    commands: CommandRegistry,
    store: Arc<dyn HistoryStore>,
}

impl Shell {
    pub async fn new(config: Config) -> CalcResult<Self> {
        let store: Arc<dyn HistoryStore> = Arc::new(CsvHistoryStore::new(config.history_file()));
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Arc<dyn HistoryStore>) -> CalcResult<Self> {
        let mut calculator = Calculator::new(config.calculator.clone())?;
        calculator.subscribe(Box::new(LoggingListener::new(log::logger())));
        if config.calculator.auto_save {
            calculator.subscribe(Box::new(AutoSaveListener::new(Arc::clone(&store))));
        }

        if config.repl.load_history_on_start && store.exists() {
            match store.load() {
                Ok(records) => calculator.load_history(records),
                Err(e) => warn!("Could not load history from {}: {}", store.location(), e),
            }
        }

        info!("Calculator initialized");
        Ok(Self {
            config,
            calculator,
            commands: CommandRegistry::new(),
            store,
        })
    }

    pub fn run_repl(&mut self) -> CalcResult<()> {
        let mut repl = ReplEngine::new(&self.config)?;
        repl.run_interactive(self)
    }

    /// Execute one line of input. A bare operation name is an error here;
    /// only the REPL prompts for missing operands.
    pub fn execute_command(&mut self, line: &str) -> CalcResult<CommandOutput> {
        let input = self.parse(line)?;
        self.execute_input(input)
    }

    pub fn parse(&self, line: &str) -> CalcResult<Input> {
        self.commands.parse(line, self.calculator.operations())
    }

    pub fn execute_input(&mut self, input: Input) -> CalcResult<CommandOutput> {
        match input {
            Input::Empty => Ok(CommandOutput::Unit),
            Input::Help => Ok(self.help()),
            Input::Exit => Ok(CommandOutput::Exit),
            Input::Builtin { name, args } => self.commands.execute_command(
                &name,
                &mut self.calculator,
                self.store.as_ref(),
                &args,
            ),
            Input::Calculate { operation, a, b } => {
                let calculation = self.calculator.calculate(&operation, a, b)?;
                Ok(CommandOutput::Calculation(calculation))
            }
            Input::Operation(name) => Err(CalcError::command(format!(
                "{} needs two operands: {} <a> <b>",
                name, name
            ))),
        }
    }

    /// Calculate from operand text typed at a prompt
    pub fn calculate_from_text(&mut self, operation: &str, a: &str, b: &str) -> CalcResult<CommandOutput> {
        let a = parse_operand(a)?;
        let b = parse_operand(b)?;
        self.execute_input(Input::Calculate {
            operation: operation.to_string(),
            a,
            b,
        })
    }

    pub async fn execute_script(&mut self, script_path: &Path) -> CalcResult<()> {
        let content = fs::read_to_string(script_path).await?;

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }

            match self.execute_command(line) {
                Ok(CommandOutput::Exit) => break,
                Ok(output) => {
                    self.print_output(&output);
                    self.report_warnings();
                }
                Err(e) => {
                    eprintln!("Error on line {}: {}", line_num + 1, e);
                    if !e.is_recoverable() {
                        return Err(e);
                    }
                }
            }
        }

        Ok(())
    }

    fn help(&self) -> CommandOutput {
        let mut entries: Vec<(String, String)> = self
            .calculator
            .operations()
            .iter()
            .map(|(name, op)| {
                (
                    format!("{} <a> <b>", name),
                    format!("{} (infix: a {} b)", op.description(), op.symbol()),
                )
            })
            .collect();

        entries.extend(
            self.commands
                .list_commands()
                .into_iter()
                .map(|cmd| (cmd.usage.clone(), cmd.description.clone())),
        );
        entries.push(("help".to_string(), "Display this help message".to_string()));
        entries.push(("exit".to_string(), "Exit the application".to_string()));
        CommandOutput::Help(entries)
    }

    fn print_output(&self, output: &CommandOutput) {
        let text = output.to_display_string(self.config.calculator.precision);
        if !text.is_empty() {
            println!("{}", text);
        }
    }

    /// Print and drain listener failures from the last calculation
    pub fn report_warnings(&mut self) -> Vec<String> {
        let messages: Vec<String> = self
            .calculator
            .take_warnings()
            .into_iter()
            .map(|failure| failure.into_error().to_string())
            .collect();
        for message in &messages {
            eprintln!("Warning: {}", message);
        }
        messages
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    pub fn calculator_mut(&mut self) -> &mut Calculator {
        &mut self.calculator
    }

    pub fn store(&self) -> &dyn HistoryStore {
        self.store.as_ref()
    }

    /// Get session configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
