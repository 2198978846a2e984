use super::args::{arity, ok, typed};
use super::{Function, FunctionContext, FunctionRegistry};
use crate::types::{DataType, Evaluated, EvaluationError, Value};
use crate::uri::function::{V1, V3};

#[derive(Clone, Copy)]
enum Sign {
    Add,
    Subtract,
}

/// `dateTime`/`date` plus or minus a duration.
#[derive(Clone, Copy)]
struct Shift {
    base: DataType,
    duration: DataType,
    sign: Sign,
}

impl Function for Shift {
    fn call(
        &self,
        args: &[Evaluated],
        _ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError> {
        arity(args, 2)?;
        let base = typed(args, 0, self.base)?;
        let duration = typed(args, 1, self.duration)?;
        let shifted = match (base, duration, self.sign) {
            (Value::DateTime(dt), Value::DayTimeDuration(d), Sign::Add) => {
                Value::DateTime(dt.add_duration(*d))
            }
            (Value::DateTime(dt), Value::DayTimeDuration(d), Sign::Subtract) => {
                Value::DateTime(dt.add_duration(d.negated()))
            }
            (Value::DateTime(dt), Value::YearMonthDuration(d), Sign::Add) => {
                Value::DateTime(dt.add_months(d.months))
            }
            (Value::DateTime(dt), Value::YearMonthDuration(d), Sign::Subtract) => {
                Value::DateTime(dt.add_months(-d.months))
            }
            (Value::Date(date), Value::YearMonthDuration(d), Sign::Add) => {
                Value::Date(date.add_months(d.months))
            }
            (Value::Date(date), Value::YearMonthDuration(d), Sign::Subtract) => {
                Value::Date(date.add_months(-d.months))
            }
            _ => {
                return Err(EvaluationError::processing(format!(
                    "cannot shift {} by {}",
                    self.base, self.duration
                )))
            }
        };
        ok(shifted)
    }
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    let table = [
        ("dateTime-add-dayTimeDuration", DataType::DateTime, DataType::DayTimeDuration, Sign::Add),
        ("dateTime-subtract-dayTimeDuration", DataType::DateTime, DataType::DayTimeDuration, Sign::Subtract),
        ("dateTime-add-yearMonthDuration", DataType::DateTime, DataType::YearMonthDuration, Sign::Add),
        ("dateTime-subtract-yearMonthDuration", DataType::DateTime, DataType::YearMonthDuration, Sign::Subtract),
        ("date-add-yearMonthDuration", DataType::Date, DataType::YearMonthDuration, Sign::Add),
        ("date-subtract-yearMonthDuration", DataType::Date, DataType::YearMonthDuration, Sign::Subtract),
    ];
    for (name, base, duration, sign) in table {
        let shift = Shift {
            base,
            duration,
            sign,
        };
        registry.insert(format!("{V1}{name}"), shift);
        registry.insert(format!("{V3}{name}"), shift);
    }
}
