use std::cmp::Ordering;
use std::fmt;

use super::args::{arity, ok, typed};
use super::{Function, FunctionContext, FunctionRegistry};
use crate::types::{DataType, Evaluated, EvaluationError, Value};
use crate::uri::function::{V1, V2};

/// Total-order comparisons available on the ordered datatypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl CompareOp {
    pub const ALL: [CompareOp; 4] = [
        CompareOp::GreaterThan,
        CompareOp::GreaterThanOrEqual,
        CompareOp::LessThan,
        CompareOp::LessThanOrEqual,
    ];

    /// The function-name suffix, e.g. `greater-than-or-equal`.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            CompareOp::GreaterThan => "greater-than",
            CompareOp::GreaterThanOrEqual => "greater-than-or-equal",
            CompareOp::LessThan => "less-than",
            CompareOp::LessThanOrEqual => "less-than-or-equal",
        }
    }

    #[must_use]
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::GreaterThan => ordering == Ordering::Greater,
            CompareOp::GreaterThanOrEqual => ordering != Ordering::Less,
            CompareOp::LessThan => ordering == Ordering::Less,
            CompareOp::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::GreaterThan => write!(f, ">"),
            CompareOp::GreaterThanOrEqual => write!(f, ">="),
            CompareOp::LessThan => write!(f, "<"),
            CompareOp::LessThanOrEqual => write!(f, "<="),
        }
    }
}

struct Compare {
    data_type: DataType,
    op: CompareOp,
}

impl Function for Compare {
    fn call(
        &self,
        args: &[Evaluated],
        _ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError> {
        arity(args, 2)?;
        let a = typed(args, 0, self.data_type)?;
        let b = typed(args, 1, self.data_type)?;
        // Unordered pairs (NaN) compare false under every operator.
        ok(a.compare(b).is_some_and(|o| self.op.holds(o)))
    }
}

/// Whether the first time lies in the inclusive range given by the other
/// two, where a range whose end precedes its start wraps past midnight.
fn time_in_range(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    arity(args, 3)?;
    let mut times = [0_i128; 3];
    for (i, slot) in times.iter_mut().enumerate() {
        if let Value::Time(t) = typed(args, i, DataType::Time)? {
            *slot = t.utc_nanos_of_day();
        }
    }
    let [t, start, end] = times;
    ok(if start <= end {
        start <= t && t <= end
    } else {
        t >= start || t <= end
    })
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    for data_type in DataType::ALL.into_iter().filter(|dt| dt.is_ordered()) {
        for op in CompareOp::ALL {
            registry.insert(
                format!("{V1}{}-{}", data_type.short_name(), op.suffix()),
                Compare { data_type, op },
            );
        }
    }
    registry.native(format!("{V2}time-in-range"), time_in_range);
}
