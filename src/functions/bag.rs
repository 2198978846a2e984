use super::args::{arity, bag, min_arity, ok, typed};
use super::{Function, FunctionContext, FunctionRegistry};
use crate::types::{Bag, DataType, Evaluated, EvaluationError, Value};

#[derive(Clone, Copy)]
enum BagOp {
    OneAndOnly,
    Size,
    IsIn,
    Construct,
}

#[derive(Clone, Copy)]
struct BagFunction {
    data_type: DataType,
    op: BagOp,
}

impl Function for BagFunction {
    fn call(
        &self,
        args: &[Evaluated],
        _ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError> {
        let dt = self.data_type;
        match self.op {
            BagOp::OneAndOnly => {
                arity(args, 1)?;
                match bag(args, 0, dt)?.values.as_slice() {
                    [only] => ok(only.clone()),
                    values => Err(EvaluationError::processing(format!(
                        "{dt}-one-and-only: bag has {} values",
                        values.len()
                    ))),
                }
            }
            BagOp::Size => {
                arity(args, 1)?;
                let size = bag(args, 0, dt)?.len();
                ok(i64::try_from(size).unwrap_or(i64::MAX))
            }
            BagOp::IsIn => {
                arity(args, 2)?;
                let needle = typed(args, 0, dt)?;
                ok(bag(args, 1, dt)?.contains(needle))
            }
            BagOp::Construct => {
                let values = (0..args.len())
                    .map(|i| typed(args, i, dt).cloned())
                    .collect::<Result<Vec<Value>, _>>()?;
                Ok(Evaluated::Bag(Bag::new(dt, values)))
            }
        }
    }
}

#[derive(Clone, Copy)]
enum SetOp {
    Intersection,
    AtLeastOneMemberOf,
    Subset,
    SetEquals,
}

#[derive(Clone, Copy)]
struct SetFunction {
    data_type: DataType,
    op: SetOp,
}

fn subset(a: &Bag, b: &Bag) -> bool {
    a.values.iter().all(|v| b.contains(v))
}

impl Function for SetFunction {
    fn call(
        &self,
        args: &[Evaluated],
        _ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError> {
        let dt = self.data_type;
        arity(args, 2)?;
        let a = bag(args, 0, dt)?;
        let b = bag(args, 1, dt)?;
        match self.op {
            SetOp::Intersection => {
                let common = a
                    .distinct()
                    .into_iter()
                    .filter(|v| b.contains(v))
                    .collect();
                Ok(Evaluated::Bag(Bag::new(dt, common)))
            }
            SetOp::AtLeastOneMemberOf => ok(a.values.iter().any(|v| b.contains(v))),
            SetOp::Subset => ok(subset(a, b)),
            SetOp::SetEquals => ok(subset(a, b) && subset(b, a)),
        }
    }
}

/// `<type>-union` takes two or more bags.
#[derive(Clone, Copy)]
struct Union(DataType);

impl Function for Union {
    fn call(
        &self,
        args: &[Evaluated],
        _ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError> {
        min_arity(args, 2)?;
        let mut merged = Bag::empty(self.0);
        for i in 0..args.len() {
            merged
                .values
                .extend(bag(args, i, self.0)?.values.iter().cloned());
        }
        Ok(Evaluated::Bag(Bag::new(self.0, merged.distinct())))
    }
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    let bag_ops = [
        ("one-and-only", BagOp::OneAndOnly),
        ("bag-size", BagOp::Size),
        ("is-in", BagOp::IsIn),
        ("bag", BagOp::Construct),
    ];
    let set_ops = [
        ("intersection", SetOp::Intersection),
        ("at-least-one-member-of", SetOp::AtLeastOneMemberOf),
        ("subset", SetOp::Subset),
        ("set-equals", SetOp::SetEquals),
    ];
    for data_type in DataType::ALL {
        for (suffix, op) in bag_ops {
            registry.per_type(data_type, suffix, BagFunction { data_type, op });
        }
        for (suffix, op) in set_ops {
            registry.per_type(data_type, suffix, SetFunction { data_type, op });
        }
        registry.per_type(data_type, "union", Union(data_type));
    }
}
