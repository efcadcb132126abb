use crate::calculation::Calculation;
use crate::config::CalculatorConfig;
use crate::error::{CalcError, CalcResult};
use crate::events::{CalculationEvent, CalculationListener, ListenerFailure, ListenerId, NotificationHub};
use crate::history::History;
use crate::operations::{canonical_name, OperationRegistry};
use crate::utils::round_to_precision;
use log::{debug, info};

/// Single entry point for calculations, undo/redo and history access.
///
/// Failed calculations leave the history untouched and notify nobody.
/// The type is `Send`; share it between threads behind one `Mutex`.
pub struct Calculator {
    settings: CalculatorConfig,
    operations: OperationRegistry,
    history: History,
    hub: NotificationHub,
    warnings: Vec<ListenerFailure>,
}

impl Calculator {
    pub fn new(settings: CalculatorConfig) -> CalcResult<Self> {
        Self::with_operations(settings, OperationRegistry::with_builtins())
    }

    pub fn with_operations(
        settings: CalculatorConfig,
        operations: OperationRegistry,
    ) -> CalcResult<Self> {
        settings.validate()?;
        let history = History::new(settings.max_history_size);
        Ok(Self {
            settings,
            operations,
            history,
            hub: NotificationHub::new(),
            warnings: Vec::new(),
        })
    }

    pub fn calculate(&mut self, operation: &str, a: f64, b: f64) -> CalcResult<Calculation> {
        let op = self.operations.resolve(operation)?;
        self.check_bounds(a)?;
        self.check_bounds(b)?;
        op.validate(a, b)?;

        let raw = op.compute(a, b);
        if raw.is_nan() {
            return Err(CalcError::invalid_operation(format!(
                "{} of {} and {} is undefined",
                canonical_name(operation),
                a,
                b
            )));
        }
        let result = round_to_precision(raw, self.settings.precision);
        self.check_bounds(result)?;

        let calculation = Calculation::new(canonical_name(operation), a, b, result);
        debug!("Computed {}", calculation);

        self.history.record(calculation.clone());
        self.warnings = self.hub.publish(&CalculationEvent {
            calculation: &calculation,
            history: self.history.records(),
        });

        Ok(calculation)
    }

    fn check_bounds(&self, value: f64) -> CalcResult<()> {
        let limit = self.settings.max_input_value;
        if !value.is_finite() || value.abs() > limit {
            return Err(CalcError::out_of_bounds(value, limit));
        }
        Ok(())
    }

    pub fn undo(&mut self) -> CalcResult<()> {
        self.history.undo()?;
        info!("Undo performed");
        Ok(())
    }

    pub fn redo(&mut self) -> CalcResult<()> {
        self.history.redo()?;
        info!("Redo performed");
        Ok(())
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("History cleared");
    }

    /// Replace the history with persisted records; not undoable
    pub fn load_history(&mut self, records: Vec<Calculation>) {
        let count = records.len();
        self.history.seed(records);
        info!("History loaded ({} records, {} kept)", count, self.history.len());
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn subscribe(&mut self, listener: Box<dyn CalculationListener>) -> ListenerId {
        self.hub.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.hub.unsubscribe(id)
    }

    pub fn listeners(&self) -> &NotificationHub {
        &self.hub
    }

    /// Listener failures from the most recent calculation
    pub fn take_warnings(&mut self) -> Vec<ListenerFailure> {
        std::mem::take(&mut self.warnings)
    }

    pub fn operations(&self) -> &OperationRegistry {
        &self.operations
    }

    pub fn settings(&self) -> &CalculatorConfig {
        &self.settings
    }
}
