use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One completed arithmetic result.
///
/// Field order matches the on-disk CSV columns:
/// `operation,operand1,operand2,result,timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    operation: String,
    #[serde(rename = "operand1")]
    operand_a: f64,
    #[serde(rename = "operand2")]
    operand_b: f64,
    result: f64,
    #[serde(default = "now")]
    timestamp: NaiveDateTime,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl Calculation {
    pub fn new<S: Into<String>>(operation: S, operand_a: f64, operand_b: f64, result: f64) -> Self {
        Self::with_timestamp(operation, operand_a, operand_b, result, now())
    }

    pub fn with_timestamp<S: Into<String>>(
        operation: S,
        operand_a: f64,
        operand_b: f64,
        result: f64,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            operation: operation.into(),
            operand_a,
            operand_b,
            result,
            timestamp,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn operand_a(&self) -> f64 {
        self.operand_a
    }

    pub fn operand_b(&self) -> f64 {
        self.operand_b
    }

    pub fn result(&self) -> f64 {
        self.result
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

impl fmt::Display for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} = {}",
            self.operand_a, self.operation, self.operand_b, self.result
        )
    }
}
