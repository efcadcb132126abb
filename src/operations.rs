use crate::error::{CalcError, CalcResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A stateless two-operand computation.
///
/// `validate` decides whether the operands are acceptable; `compute` assumes
/// they are and only produces the value.
pub trait Operation: fmt::Debug + Send + Sync {
    /// Symbol used in infix input and help output
    fn symbol(&self) -> &'static str;

    /// One-line description shown by `help`
    fn description(&self) -> &'static str;

    fn validate(&self, _a: f64, _b: f64) -> CalcResult<()> {
        Ok(())
    }

    fn compute(&self, a: f64, b: f64) -> f64;
}

#[derive(Debug)]
pub struct Add;

impl Operation for Add {
    fn symbol(&self) -> &'static str {
        "+"
    }

    fn description(&self) -> &'static str {
        "Add two numbers"
    }

    fn compute(&self, a: f64, b: f64) -> f64 {
        a + b
    }
}

#[derive(Debug)]
pub struct Subtract;

impl Operation for Subtract {
    fn symbol(&self) -> &'static str {
        "-"
    }

    fn description(&self) -> &'static str {
        "Subtract the second number from the first"
    }

    fn compute(&self, a: f64, b: f64) -> f64 {
        a - b
    }
}

#[derive(Debug)]
pub struct Multiply;

impl Operation for Multiply {
    fn symbol(&self) -> &'static str {
        "*"
    }

    fn description(&self) -> &'static str {
        "Multiply two numbers"
    }

    fn compute(&self, a: f64, b: f64) -> f64 {
        a * b
    }
}

#[derive(Debug)]
pub struct Divide;

impl Operation for Divide {
    fn symbol(&self) -> &'static str {
        "/"
    }

    fn description(&self) -> &'static str {
        "Divide the first number by the second"
    }

    fn validate(&self, _a: f64, b: f64) -> CalcResult<()> {
        non_zero_divisor("divide", b)
    }

    fn compute(&self, a: f64, b: f64) -> f64 {
        a / b
    }
}

#[derive(Debug)]
pub struct Power;

impl Operation for Power {
    fn symbol(&self) -> &'static str {
        "^"
    }

    fn description(&self) -> &'static str {
        "Raise the first number to the power of the second"
    }

    fn validate(&self, a: f64, b: f64) -> CalcResult<()> {
        if a < 0.0 && b.fract() != 0.0 {
            return Err(CalcError::invalid_operation(
                "Cannot raise a negative number to a fractional power",
            ));
        }
        Ok(())
    }

    fn compute(&self, a: f64, b: f64) -> f64 {
        a.powf(b)
    }
}

#[derive(Debug)]
pub struct Root;

impl Operation for Root {
    fn symbol(&self) -> &'static str {
        "root"
    }

    fn description(&self) -> &'static str {
        "Take the n-th root of the first number, n being the second"
    }

    fn validate(&self, a: f64, b: f64) -> CalcResult<()> {
        if b == 0.0 {
            return Err(CalcError::invalid_operation("Cannot calculate 0th root"));
        }
        if a < 0.0 {
            if b.fract() != 0.0 {
                return Err(CalcError::invalid_operation(
                    "Cannot calculate a non-integer root of a negative number",
                ));
            }
            if b % 2.0 == 0.0 {
                return Err(CalcError::invalid_operation(
                    "Cannot calculate even root of negative number",
                ));
            }
        }
        Ok(())
    }

    fn compute(&self, a: f64, b: f64) -> f64 {
        // odd roots of negatives stay real
        if a < 0.0 {
            -(-a).powf(1.0 / b)
        } else {
            a.powf(1.0 / b)
        }
    }
}

#[derive(Debug)]
pub struct Modulus;

impl Operation for Modulus {
    fn symbol(&self) -> &'static str {
        "%"
    }

    fn description(&self) -> &'static str {
        "Remainder of the division, with the sign of the divisor"
    }

    fn validate(&self, _a: f64, b: f64) -> CalcResult<()> {
        non_zero_divisor("modulus", b)
    }

    fn compute(&self, a: f64, b: f64) -> f64 {
        a - b * (a / b).floor()
    }
}

#[derive(Debug)]
pub struct IntDivide;

impl Operation for IntDivide {
    fn symbol(&self) -> &'static str {
        "//"
    }

    fn description(&self) -> &'static str {
        "Divide and round down to the nearest integer"
    }

    fn validate(&self, _a: f64, b: f64) -> CalcResult<()> {
        non_zero_divisor("int_divide", b)
    }

    fn compute(&self, a: f64, b: f64) -> f64 {
        (a / b).floor()
    }
}

#[derive(Debug)]
pub struct Percentage;

impl Operation for Percentage {
    fn symbol(&self) -> &'static str {
        "%of"
    }

    fn description(&self) -> &'static str {
        "Express the first number as a percentage of the second"
    }

    fn validate(&self, _a: f64, b: f64) -> CalcResult<()> {
        non_zero_divisor("percent", b)
    }

    fn compute(&self, a: f64, b: f64) -> f64 {
        a / b * 100.0
    }
}

#[derive(Debug)]
pub struct AbsDifference;

impl Operation for AbsDifference {
    fn symbol(&self) -> &'static str {
        "abs_diff"
    }

    fn description(&self) -> &'static str {
        "Absolute difference between two numbers"
    }

    fn compute(&self, a: f64, b: f64) -> f64 {
        (a - b).abs()
    }
}

fn non_zero_divisor(operation: &str, b: f64) -> CalcResult<()> {
    if b == 0.0 {
        Err(CalcError::division_by_zero(operation))
    } else {
        Ok(())
    }
}

/// Normalized lookup key for an operation name
pub fn canonical_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Maps operation names to shared operation definitions.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    operations: HashMap<String, Arc<dyn Operation>>,
    order: Vec<String>,
}

impl OperationRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with every built-in operation
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("add", Arc::new(Add));
        registry.register("subtract", Arc::new(Subtract));
        registry.register("multiply", Arc::new(Multiply));
        registry.register("divide", Arc::new(Divide));
        registry.register("power", Arc::new(Power));
        registry.register("root", Arc::new(Root));
        registry.register("modulus", Arc::new(Modulus));
        registry.register("int_divide", Arc::new(IntDivide));
        registry.register("percent", Arc::new(Percentage));
        registry.register("abs_diff", Arc::new(AbsDifference));
        registry
    }

    /// Adds or replaces the operation stored under `name`
    pub fn register(&mut self, name: &str, operation: Arc<dyn Operation>) {
        let key = canonical_name(name);
        if self.operations.insert(key.clone(), operation).is_none() {
            self.order.push(key);
        }
    }

    pub fn resolve(&self, name: &str) -> CalcResult<Arc<dyn Operation>> {
        self.operations
            .get(&canonical_name(name))
            .cloned()
            .ok_or_else(|| CalcError::unknown_operation(name.trim()))
    }

    /// Finds the operation name whose symbol is `symbol`
    pub fn resolve_symbol(&self, symbol: &str) -> Option<&str> {
        self.order
            .iter()
            .find(|name| {
                self.operations
                    .get(name.as_str())
                    .is_some_and(|op| op.symbol() == symbol)
            })
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(&canonical_name(name))
    }

    /// Operation names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// `(name, operation)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Operation>)> {
        self.order
            .iter()
            .filter_map(|name| self.operations.get(name).map(|op| (name.as_str(), op)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
