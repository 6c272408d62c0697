use sea_orm::sea_query::SimpleExpr;
use sea_orm::Condition;

/// Folds a list of optional predicates into one conjunctive, parameterized
/// condition. Absent filters contribute nothing; an empty builder matches
/// every row.
pub struct SearchBuilder {
    condition: Condition,
}

impl SearchBuilder {
    pub fn new() -> Self {
        Self {
            condition: Condition::all(),
        }
    }

    /// Add an unconditional predicate
    pub fn add(mut self, expr: SimpleExpr) -> Self {
        self.condition = self.condition.add(expr);
        self
    }

    /// Add a predicate only when the filter value is present
    pub fn add_optional<V, F>(mut self, value: Option<V>, predicate: F) -> Self
    where
        F: FnOnce(V) -> SimpleExpr,
    {
        if let Some(value) = value {
            self.condition = self.condition.add(predicate(value));
        }
        self
    }

    pub fn build(self) -> Condition {
        self.condition
    }
}

impl Default for SearchBuilder {
    fn default() -> Self {
        Self::new()
    }
}
