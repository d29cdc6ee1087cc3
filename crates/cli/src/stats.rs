use model::records::row::Row;

/// Mean over a stream of numbers in constant memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunningMean {
    count: u64,
    sum: f64,
}

impl RunningMean {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    /// Adds the row's `column` when it holds a number; returns whether it did.
    pub fn push_row(&mut self, row: &Row, column: &str) -> bool {
        match row.get_value(column).as_f64() {
            Some(value) => {
                self.push(value);
                true
            }
            None => false,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// True when `column` is numeric and strictly greater than `min`.
pub fn exceeds(row: &Row, column: &str, min: f64) -> bool {
    row.get_value(column).as_f64().is_some_and(|v| v > min)
}
