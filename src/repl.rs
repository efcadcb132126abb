use crate::commands::{format_calculation, CommandOutput, Input};
use crate::config::Config;
use crate::error::{CalcError, CalcResult};
use crate::shell::Shell;
use log::warn;
use nu_ansi_term::{Color, Style};
use reedline::{
    FileBackedHistory, Prompt, PromptEditMode, PromptHistorySearch, Reedline, Signal,
};
use std::borrow::Cow;

const RULE_WIDTH: usize = 60;

pub struct ReplEngine {
    config: Config,
    editor: Reedline,
    prompt: CalcPrompt,
    palette: Palette,
}

#[derive(Debug, Clone, PartialEq)]
enum PromptMode {
    Command,
    Operand(&'static str),
}

struct CalcPrompt {
    base_prompt: String,
    operand_prompt: String,
    mode: PromptMode,
    history_len: usize,
}

impl CalcPrompt {
    fn new(config: &Config) -> Self {
        Self {
            base_prompt: config.repl.prompt.clone(),
            operand_prompt: config.repl.operand_prompt.clone(),
            mode: PromptMode::Command,
            history_len: 0,
        }
    }

    fn set_mode(&mut self, mode: PromptMode) {
        self.mode = mode;
    }
}

impl Prompt for CalcPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        match self.mode {
            PromptMode::Command => Cow::Borrowed(&self.base_prompt),
            PromptMode::Operand(label) => {
                Cow::Owned(format!("{}Enter {} number: ", self.operand_prompt, label))
            }
        }
    }

    fn render_prompt_right(&self) -> Cow<str> {
        match self.mode {
            PromptMode::Command => Cow::Owned(format!("[{}]", self.history_len)),
            PromptMode::Operand(_) => Cow::Borrowed(""),
        }
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed("...")
    }

    fn render_prompt_history_search_indicator(&self, _history_search: PromptHistorySearch) -> Cow<str> {
        Cow::Borrowed("(search) ")
    }
}

/// Terminal styles, all plain when colors are off.
struct Palette {
    banner: Style,
    heading: Style,
    success: Style,
    notice: Style,
    error: Style,
}

impl Palette {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                banner: Color::Cyan.normal(),
                heading: Color::Yellow.bold(),
                success: Color::Green.normal(),
                notice: Color::Yellow.normal(),
                error: Color::Red.normal(),
            }
        } else {
            Self {
                banner: Style::new(),
                heading: Style::new(),
                success: Style::new(),
                notice: Style::new(),
                error: Style::new(),
            }
        }
    }
}

impl ReplEngine {
    pub fn new(config: &Config) -> CalcResult<Self> {
        let mut editor = Reedline::create();

        if let Some(parent) = config.input_history_file().parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Input history disabled: {}", e);
            }
        }
        match FileBackedHistory::with_file(config.repl.input_history_size, config.input_history_file()) {
            Ok(history) => editor = editor.with_history(Box::new(history)),
            Err(e) => warn!("Input history disabled: {}", e),
        }

        Ok(Self {
            config: config.clone(),
            editor,
            prompt: CalcPrompt::new(config),
            palette: Palette::new(config.repl.colors),
        })
    }

    pub fn run_interactive(&mut self, shell: &mut Shell) -> CalcResult<()> {
        self.display_welcome();

        loop {
            self.prompt.history_len = shell.calculator().history().len();
            self.prompt.set_mode(PromptMode::Command);

            let line = match self.editor.read_line(&self.prompt) {
                Ok(Signal::Success(buffer)) => buffer,
                Ok(Signal::CtrlD) => {
                    self.say_goodbye();
                    break;
                }
                Ok(Signal::CtrlC) => {
                    println!("{}", self.palette.notice.paint("Use 'exit' command to quit."));
                    continue;
                }
                Err(e) => {
                    return Err(CalcError::repl(format!("Line editor failed: {}", e)));
                }
            };

            let result = match shell.parse(&line) {
                Ok(Input::Operation(name)) => match self.read_operands()? {
                    Some((a, b)) => shell.calculate_from_text(&name, &a, &b),
                    None => continue,
                },
                Ok(input) => shell.execute_input(input),
                Err(e) => Err(e),
            };

            match result {
                Ok(CommandOutput::Exit) => {
                    self.say_goodbye();
                    break;
                }
                Ok(output) => {
                    self.render(&output);
                    shell.report_warnings();
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => self.render_error(&e),
            }
        }

        Ok(())
    }

    /// Prompt for both operands; `None` when the user cancels with Ctrl-C
    fn read_operands(&mut self) -> CalcResult<Option<(String, String)>> {
        let mut operands = Vec::with_capacity(2);
        for label in ["first", "second"] {
            self.prompt.set_mode(PromptMode::Operand(label));
            match self.editor.read_line(&self.prompt) {
                Ok(Signal::Success(buffer)) => operands.push(buffer),
                Ok(Signal::CtrlC) | Ok(Signal::CtrlD) => {
                    println!("{}", self.palette.notice.paint("Calculation cancelled."));
                    return Ok(None);
                }
                Err(e) => {
                    return Err(CalcError::repl(format!("Line editor failed: {}", e)));
                }
            }
        }
        let b = operands.pop().unwrap_or_default();
        let a = operands.pop().unwrap_or_default();
        Ok(Some((a, b)))
    }

    fn display_welcome(&self) {
        let rule = "=".repeat(RULE_WIDTH);
        println!("{}", self.palette.banner.paint(&rule));
        println!(
            "{}",
            self.palette.banner.paint(format!(
                "{:^width$}",
                format!("Calculator v{}", crate::VERSION),
                width = RULE_WIDTH
            ))
        );
        println!("{}", self.palette.banner.paint(&rule));
        println!("{}", self.palette.success.paint("Type 'help' for available commands"));
        println!("{}", self.palette.banner.paint(&rule));
        println!();
    }

    fn render(&self, output: &CommandOutput) {
        let precision = self.config.calculator.precision;
        match output {
            CommandOutput::Calculation(calc) => {
                println!(
                    "{}",
                    self.palette
                        .success
                        .paint(format!("Result: {}", format_calculation(calc, precision)))
                );
            }
            CommandOutput::History(records) if !records.is_empty() => {
                println!("{}", self.palette.heading.paint("Calculation History:"));
                println!("{}", output.to_display_string(precision));
            }
            CommandOutput::History(_) => {
                println!("{}", self.palette.notice.paint(output.to_display_string(precision)));
            }
            CommandOutput::Help(_) => {
                println!("{}", self.palette.heading.paint("Available Commands:"));
                println!("{}", output.to_display_string(precision));
            }
            CommandOutput::Message(message) => {
                println!("{}", self.palette.success.paint(message.as_str()));
            }
            CommandOutput::Exit | CommandOutput::Unit => {}
        }
    }

    fn render_error(&self, error: &CalcError) {
        let style = match error {
            CalcError::NothingToUndo | CalcError::NothingToRedo => self.palette.notice,
            _ => self.palette.error,
        };
        eprintln!("{}", style.paint(format!("{}: {}", error.category(), error)));
    }

    fn say_goodbye(&self) {
        println!(
            "{}",
            self.palette
                .banner
                .paint("Thank you for using the calculator. Goodbye!")
        );
    }
}
