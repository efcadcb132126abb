use crate::error::CalcResult;
use crate::events::{CalculationEvent, CalculationListener};
use crate::storage::HistoryStore;
use log::{Level, Log, Record};
use std::sync::Arc;

/// Log target used for calculation records
pub const CALCULATION_LOG_TARGET: &str = "calculator";

/// Writes one log line per calculation through the given logger.
pub struct LoggingListener {
    logger: &'static dyn Log,
}

impl LoggingListener {
    pub fn new(logger: &'static dyn Log) -> Self {
        Self { logger }
    }
}

impl CalculationListener for LoggingListener {
    fn name(&self) -> &str {
        "logging"
    }

    fn on_calculation(&mut self, event: &CalculationEvent<'_>) -> CalcResult<()> {
        let calc = event.calculation;
        self.logger.log(
            &Record::builder()
                .args(format_args!(
                    "Calculation performed: {} | Operands: {}, {} | Result: {}",
                    calc.operation(),
                    calc.operand_a(),
                    calc.operand_b(),
                    calc.result()
                ))
                .level(Level::Info)
                .target(CALCULATION_LOG_TARGET)
                .module_path_static(Some(module_path!()))
                .build(),
        );
        Ok(())
    }
}

/// Persists the whole history after every calculation.
pub struct AutoSaveListener {
    store: Arc<dyn HistoryStore>,
}

impl AutoSaveListener {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }
}

impl CalculationListener for AutoSaveListener {
    fn name(&self) -> &str {
        "auto-save"
    }

    fn on_calculation(&mut self, event: &CalculationEvent<'_>) -> CalcResult<()> {
        self.store.save(event.history)
    }
}
