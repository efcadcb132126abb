use crate::calculation::Calculation;
use crate::error::{CalcError, CalcResult};

/// Immutable copy of the whole record sequence at one point in time.
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    records: Vec<Calculation>,
}

impl Snapshot {
    fn capture(records: &[Calculation]) -> Self {
        Self {
            records: records.to_vec(),
        }
    }

    fn restore(self) -> Vec<Calculation> {
        self.records
    }
}

/// Chronological calculation history with whole-state undo/redo.
///
/// Every mutation through [`History::record`] pushes a snapshot of the
/// previous sequence, so capacity eviction is undone along with the append.
#[derive(Debug, Clone)]
pub struct History {
    records: Vec<Calculation>,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_size: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            records: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size: max_size.max(1),
        }
    }

    pub fn record(&mut self, calculation: Calculation) {
        self.undo_stack.push(Snapshot::capture(&self.records));
        self.records.push(calculation);
        self.redo_stack.clear();

        if self.records.len() > self.max_size {
            let overflow = self.records.len() - self.max_size;
            self.records.drain(..overflow);
        }
    }

    pub fn undo(&mut self) -> CalcResult<()> {
        let previous = self.undo_stack.pop().ok_or(CalcError::NothingToUndo)?;
        self.redo_stack.push(Snapshot::capture(&self.records));
        self.records = previous.restore();
        Ok(())
    }

    pub fn redo(&mut self) -> CalcResult<()> {
        let next = self.redo_stack.pop().ok_or(CalcError::NothingToRedo)?;
        self.undo_stack.push(Snapshot::capture(&self.records));
        self.records = next.restore();
        Ok(())
    }

    /// Empties the history and both stacks. Not undoable.
    pub fn clear(&mut self) {
        self.records.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Replaces the live sequence without touching the undo machinery.
    ///
    /// Used for loading persisted history; both stacks are dropped and only
    /// the newest `max_size` records are kept.
    pub fn seed(&mut self, mut records: Vec<Calculation>) {
        if records.len() > self.max_size {
            let overflow = records.len() - self.max_size;
            records.drain(..overflow);
        }
        self.records = records;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Owned copy of the records, oldest first
    pub fn view(&self) -> Vec<Calculation> {
        self.records.clone()
    }

    pub fn records(&self) -> &[Calculation] {
        &self.records
    }

    pub fn last(&self) -> Option<&Calculation> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(result: f64) -> Calculation {
        Calculation::new("add", result, 0.0, result)
    }

    fn results(history: &History) -> Vec<f64> {
        history.records().iter().map(|c| c.result()).collect()
    }

    #[test]
    fn test_new_history_is_empty() {
        let history = History::new(10);
        assert!(history.is_empty());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_restores_previous_sequence() {
        let mut history = History::new(10);
        history.record(calc(1.0));
        history.record(calc(2.0));

        history.undo().unwrap();
        assert_eq!(results(&history), vec![1.0]);
        assert!(history.can_redo());

        history.undo().unwrap();
        assert!(history.is_empty());
        assert!(matches!(history.undo(), Err(CalcError::NothingToUndo)));
    }

    #[test]
    fn test_redo_reapplies() {
        let mut history = History::new(10);
        history.record(calc(1.0));
        history.record(calc(2.0));
        let before = history.view();

        history.undo().unwrap();
        history.redo().unwrap();
        assert_eq!(history.view(), before);
        assert!(matches!(history.redo(), Err(CalcError::NothingToRedo)));
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new(10);
        history.record(calc(1.0));
        history.record(calc(2.0));
        history.undo().unwrap();
        assert_eq!(history.redo_depth(), 1);

        history.record(calc(3.0));
        assert!(!history.can_redo());
        assert_eq!(results(&history), vec![1.0, 3.0]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::new(3);
        for i in 1..=5 {
            history.record(calc(i as f64));
        }
        assert_eq!(results(&history), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_eviction_is_undoable() {
        let mut history = History::new(2);
        history.record(calc(1.0));
        history.record(calc(2.0));
        history.record(calc(3.0));
        assert_eq!(results(&history), vec![2.0, 3.0]);

        history.undo().unwrap();
        assert_eq!(results(&history), vec![1.0, 2.0]);
    }

    #[test]
    fn test_clear_is_not_undoable() {
        let mut history = History::new(10);
        history.record(calc(1.0));
        history.clear();
        assert!(history.is_empty());
        assert!(matches!(history.undo(), Err(CalcError::NothingToUndo)));
    }

    #[test]
    fn test_seed_bypasses_stacks_and_keeps_newest() {
        let mut history = History::new(2);
        history.record(calc(9.0));
        history.seed(vec![calc(1.0), calc(2.0), calc(3.0)]);
        assert_eq!(results(&history), vec![2.0, 3.0]);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_view_does_not_touch_stacks() {
        let mut history = History::new(10);
        history.record(calc(1.0));
        let _ = history.view();
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.redo_depth(), 0);
    }
}
