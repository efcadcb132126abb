use crate::calculation::Calculation;
use crate::calculator::Calculator;
use crate::error::{CalcError, CalcResult};
use crate::operations::OperationRegistry;
use crate::storage::{CsvHistoryStore, HistoryStore};
use crate::utils::{expand_path, format_number, parse_operand, plural};
use log::info;
use regex::Regex;
use std::collections::BTreeMap;

pub type CommandFn = fn(&mut Calculator, &dyn HistoryStore, &[String]) -> CalcResult<CommandOutput>;

/// Result of one command, rendered by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Calculation(Calculation),
    History(Vec<Calculation>),
    Message(String),
    Help(Vec<(String, String)>),
    Exit,
    Unit,
}

impl CommandOutput {
    /// Plain-text rendering, numbers shown with `precision` decimals
    pub fn to_display_string(&self, precision: u32) -> String {
        match self {
            CommandOutput::Calculation(calc) => format!("Result: {}", format_calculation(calc, precision)),
            CommandOutput::History(records) if records.is_empty() => {
                "No calculations in history.".to_string()
            }
            CommandOutput::History(records) => records
                .iter()
                .enumerate()
                .map(|(i, calc)| format!("{}. {}", i + 1, format_calculation(calc, precision)))
                .collect::<Vec<_>>()
                .join("\n"),
            CommandOutput::Message(message) => message.clone(),
            CommandOutput::Help(entries) => {
                let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
                entries
                    .iter()
                    .map(|(name, description)| format!("  {:width$}  {}", name, description, width = width))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            CommandOutput::Exit | CommandOutput::Unit => String::new(),
        }
    }
}

pub fn format_calculation(calc: &Calculation, precision: u32) -> String {
    format!(
        "{} {} {} = {}",
        format_number(calc.operand_a(), precision.max(6)),
        calc.operation(),
        format_number(calc.operand_b(), precision.max(6)),
        format_number(calc.result(), precision)
    )
}

/// A parsed line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Empty,
    Help,
    Exit,
    /// A registered utility command with its arguments
    Builtin { name: String, args: Vec<String> },
    /// An operation name with both operands, in prefix or infix form
    Calculate { operation: String, a: f64, b: f64 },
    /// An operation name with no operands; the REPL prompts for them
    Operation(String),
}

pub struct CommandInfo {
    pub name: String,
    pub description: String,
    pub usage: String,
    pub handler: CommandFn,
}

pub struct CommandRegistry {
    commands: BTreeMap<String, CommandInfo>,
    infix: Regex,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            commands: BTreeMap::new(),
            infix: Regex::new(r"^(\S+?)\s*(%of|abs_diff|root|//|[-+*/^%])\s*(\S+)$")
                .expect("infix pattern is valid"),
        };

        registry.register_builtin_commands();
        registry
    }

    pub fn register_command(&mut self, info: CommandInfo) {
        self.commands.insert(info.name.clone(), info);
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn execute_command(
        &self,
        name: &str,
        calculator: &mut Calculator,
        store: &dyn HistoryStore,
        args: &[String],
    ) -> CalcResult<CommandOutput> {
        if let Some(cmd) = self.commands.get(name) {
            (cmd.handler)(calculator, store, args)
        } else {
            Err(CalcError::command(format!("Unknown command: {}", name)))
        }
    }

    pub fn list_commands(&self) -> Vec<&CommandInfo> {
        self.commands.values().collect()
    }

    /// Classify a line of input
    pub fn parse(&self, line: &str, operations: &OperationRegistry) -> CalcResult<Input> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Input::Empty);
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let head = parts[0].to_lowercase();
        let args = &parts[1..];

        match head.as_str() {
            "help" => return Ok(Input::Help),
            "exit" | "quit" => return Ok(Input::Exit),
            _ => {}
        }

        if self.has_command(&head) {
            return Ok(Input::Builtin {
                name: head,
                args: args.iter().map(|s| s.to_string()).collect(),
            });
        }

        if operations.contains(&head) {
            return match args {
                [] => Ok(Input::Operation(head)),
                [a, b] => Ok(Input::Calculate {
                    operation: head,
                    a: parse_operand(a)?,
                    b: parse_operand(b)?,
                }),
                _ => Err(CalcError::command(format!(
                    "{} takes exactly two operands: {} <a> <b>",
                    head, head
                ))),
            };
        }

        if let Some(captures) = self.infix.captures(line) {
            if let Some(operation) = operations.resolve_symbol(&captures[2]) {
                return Ok(Input::Calculate {
                    operation: operation.to_string(),
                    a: parse_operand(&captures[1])?,
                    b: parse_operand(&captures[3])?,
                });
            }
        }

        Err(CalcError::command(format!(
            "Unknown command: '{}'. Type 'help' for available commands.",
            parts[0]
        )))
    }

    fn register_builtin_commands(&mut self) {
        self.register_command(CommandInfo {
            name: "history".to_string(),
            description: "Display calculation history".to_string(),
            usage: "history".to_string(),
            handler: |calculator, _, _| Ok(CommandOutput::History(calculator.history().view())),
        });

        self.register_command(CommandInfo {
            name: "clear".to_string(),
            description: "Clear calculation history".to_string(),
            usage: "clear".to_string(),
            handler: |calculator, _, _| {
                calculator.clear_history();
                Ok(CommandOutput::Message("History cleared successfully.".to_string()))
            },
        });

        self.register_command(CommandInfo {
            name: "undo".to_string(),
            description: "Undo the last calculation".to_string(),
            usage: "undo".to_string(),
            handler: |calculator, _, _| {
                calculator.undo()?;
                Ok(CommandOutput::Message("Undo successful.".to_string()))
            },
        });

        self.register_command(CommandInfo {
            name: "redo".to_string(),
            description: "Redo the last undone calculation".to_string(),
            usage: "redo".to_string(),
            handler: |calculator, _, _| {
                calculator.redo()?;
                Ok(CommandOutput::Message("Redo successful.".to_string()))
            },
        });

        self.register_command(CommandInfo {
            name: "save".to_string(),
            description: "Save history to file".to_string(),
            usage: "save [path]".to_string(),
            handler: |calculator, store, args| {
                let records = calculator.history().records();
                let location = match args.first() {
                    Some(path) => {
                        let target = CsvHistoryStore::new(expand_path(path));
                        target.save(records)?;
                        target.location()
                    }
                    None => {
                        store.save(records)?;
                        store.location()
                    }
                };
                info!("History saved to {}", location);
                Ok(CommandOutput::Message(format!(
                    "History saved successfully ({}) to {}.",
                    plural(records.len(), "record"),
                    location
                )))
            },
        });

        self.register_command(CommandInfo {
            name: "load".to_string(),
            description: "Load history from file".to_string(),
            usage: "load [path]".to_string(),
            handler: |calculator, store, args| {
                let (records, location) = match args.first() {
                    Some(path) => {
                        let source = CsvHistoryStore::new(expand_path(path));
                        (source.load()?, source.location())
                    }
                    None => (store.load()?, store.location()),
                };
                calculator.load_history(records);
                Ok(CommandOutput::Message(format!(
                    "History loaded successfully ({}) from {}.",
                    plural(calculator.history().len(), "record"),
                    location
                )))
            },
        });

        self.register_command(CommandInfo {
            name: "operations".to_string(),
            description: "List available operations".to_string(),
            usage: "operations".to_string(),
            handler: |calculator, _, _| {
                Ok(CommandOutput::Help(
                    calculator
                        .operations()
                        .iter()
                        .map(|(name, op)| {
                            (name.to_string(), format!("{} ({})", op.description(), op.symbol()))
                        })
                        .collect(),
                ))
            },
        });
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CalculatorConfig;
    use tempfile::tempdir;

    fn setup() -> (CommandRegistry, Calculator) {
        (
            CommandRegistry::new(),
            Calculator::new(CalculatorConfig::default()).unwrap(),
        )
    }

    #[test]
    fn test_parse_prefix_calculation() {
        let (registry, calc) = setup();
        assert_eq!(
            registry.parse("add 2 3", calc.operations()).unwrap(),
            Input::Calculate {
                operation: "add".to_string(),
                a: 2.0,
                b: 3.0
            }
        );
    }

    #[test]
    fn test_parse_infix_calculation() {
        let (registry, calc) = setup();
        assert_eq!(
            registry.parse("2 ^ 8", calc.operations()).unwrap(),
            Input::Calculate {
                operation: "power".to_string(),
                a: 2.0,
                b: 8.0
            }
        );
        assert_eq!(
            registry.parse("-7//2", calc.operations()).unwrap(),
            Input::Calculate {
                operation: "int_divide".to_string(),
                a: -7.0,
                b: 2.0
            }
        );
        assert_eq!(
            registry.parse("5 - -3", calc.operations()).unwrap(),
            Input::Calculate {
                operation: "subtract".to_string(),
                a: 5.0,
                b: -3.0
            }
        );
    }

    #[test]
    fn test_parse_commands() {
        let (registry, calc) = setup();
        let ops = calc.operations();
        assert_eq!(registry.parse("  ", ops).unwrap(), Input::Empty);
        assert_eq!(registry.parse("HELP", ops).unwrap(), Input::Help);
        assert_eq!(registry.parse("quit", ops).unwrap(), Input::Exit);
        assert_eq!(
            registry.parse("divide", ops).unwrap(),
            Input::Operation("divide".to_string())
        );
        assert_eq!(
            registry.parse("save out.csv", ops).unwrap(),
            Input::Builtin {
                name: "save".to_string(),
                args: vec!["out.csv".to_string()]
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        let (registry, calc) = setup();
        let ops = calc.operations();
        assert!(matches!(
            registry.parse("add 1", ops),
            Err(CalcError::Command { .. })
        ));
        assert!(matches!(
            registry.parse("add one 2", ops),
            Err(CalcError::InvalidInput { .. })
        ));
        assert!(matches!(
            registry.parse("frobnicate", ops),
            Err(CalcError::Command { .. })
        ));
    }

    #[test]
    fn test_undo_command_propagates_error() {
        let (registry, mut calc) = setup();
        let dir = tempdir().unwrap();
        let store = CsvHistoryStore::new(dir.path().join("history.csv"));
        let result = registry.execute_command("undo", &mut calc, &store, &[]);
        assert!(matches!(result, Err(CalcError::NothingToUndo)));
    }

    #[test]
    fn test_save_and_load_commands() {
        let (registry, mut calc) = setup();
        let dir = tempdir().unwrap();
        let store = CsvHistoryStore::new(dir.path().join("history.csv"));

        calc.calculate("add", 2.0, 3.0).unwrap();
        registry.execute_command("save", &mut calc, &store, &[]).unwrap();
        registry.execute_command("clear", &mut calc, &store, &[]).unwrap();
        assert!(calc.history().is_empty());

        let output = registry.execute_command("load", &mut calc, &store, &[]).unwrap();
        assert_eq!(calc.history().len(), 1);
        assert!(matches!(output, CommandOutput::Message(m) if m.contains("1 record")));
    }

    #[test]
    fn test_save_and_load_expand_path_argument() {
        let (registry, mut calc) = setup();
        let dir = tempdir().unwrap();
        let store = CsvHistoryStore::new(dir.path().join("history.csv"));
        std::env::set_var("CALCSHELL_COMMANDS_TEST_DIR", dir.path());
        let args = vec!["$CALCSHELL_COMMANDS_TEST_DIR/explicit.csv".to_string()];

        calc.calculate("multiply", 4.0, 5.0).unwrap();
        registry.execute_command("save", &mut calc, &store, &args).unwrap();
        assert!(dir.path().join("explicit.csv").exists());
        assert!(!store.exists());

        registry.execute_command("clear", &mut calc, &store, &[]).unwrap();
        registry.execute_command("load", &mut calc, &store, &args).unwrap();
        assert_eq!(calc.history().len(), 1);
        assert_eq!(calc.history().last().unwrap().result(), 20.0);
    }

    #[test]
    fn test_history_rendering() {
        let output = CommandOutput::History(vec![
            Calculation::new("add", 2.0, 3.0, 5.0),
            Calculation::new("divide", 1.0, 3.0, 0.33),
        ]);
        assert_eq!(
            output.to_display_string(2),
            "1. 2 add 3 = 5\n2. 1 divide 3 = 0.33"
        );
        assert_eq!(
            CommandOutput::History(Vec::new()).to_display_string(2),
            "No calculations in history."
        );
    }

    #[test]
    fn test_operations_command_lists_all() {
        let (registry, mut calc) = setup();
        let dir = tempdir().unwrap();
        let store = CsvHistoryStore::new(dir.path().join("history.csv"));
        match registry
            .execute_command("operations", &mut calc, &store, &[])
            .unwrap()
        {
            CommandOutput::Help(entries) => {
                assert_eq!(entries.len(), 10);
                assert_eq!(entries[0].0, "add");
            }
            other => panic!("Expected help output, got {:?}", other),
        }
    }
}
