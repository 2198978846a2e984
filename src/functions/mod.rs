//! Function registry and the standard XACML function library.
//!
//! Every function receives fully evaluated arguments and checks their
//! count and types itself; failures are recoverable [`EvaluationError`]s.

mod args;
mod arithmetic;
mod bag;
mod comparison;
mod equality;
mod higher_order;
mod logical;
mod string;
mod temporal;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::source::AttributeSource;
use crate::types::{DataType, Evaluated, EvaluationError, XacmlVersion};
use crate::uri::function::{V1, V3};

pub use comparison::CompareOp;

/// Per-call context for functions that look beyond their arguments.
pub struct FunctionContext<'a> {
    pub version: XacmlVersion,
    pub source: &'a dyn AttributeSource,
}

/// A function callable from an `Apply` or a target `Match`.
pub trait Function: Send + Sync {
    /// # Errors
    ///
    /// Returns [`EvaluationError`] on wrong arity or argument types, and on
    /// function-specific failures such as division by zero.
    fn call(
        &self,
        args: &[Evaluated],
        ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError>;
}

type NativeFn = fn(&[Evaluated], &FunctionContext<'_>) -> Result<Evaluated, EvaluationError>;

/// Adapter for functions that need no per-registration state.
struct Native(NativeFn);

impl Function for Native {
    fn call(
        &self,
        args: &[Evaluated],
        ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError> {
        (self.0)(args, ctx)
    }
}

/// Ordered map from function URI to implementation.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Arc<dyn Function>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.len())
            .finish()
    }
}

static STANDARD: OnceLock<FunctionRegistry> = OnceLock::new();

impl FunctionRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared standard library, built on first use.
    pub fn standard() -> &'static FunctionRegistry {
        STANDARD.get_or_init(|| {
            let mut registry = FunctionRegistry::new();
            equality::register(&mut registry);
            arithmetic::register(&mut registry);
            logical::register(&mut registry);
            comparison::register(&mut registry);
            temporal::register(&mut registry);
            bag::register(&mut registry);
            higher_order::register(&mut registry);
            string::register(&mut registry);
            registry
        })
    }

    /// Register (or replace) a function.
    pub fn register(&mut self, uri: impl Into<String>, function: Arc<dyn Function>) {
        self.functions.insert(uri.into(), function);
    }

    #[must_use]
    pub fn get(&self, uri: &str) -> Option<Arc<dyn Function>> {
        self.functions.get(uri).cloned()
    }

    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.functions.contains_key(uri)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    fn insert(&mut self, uri: String, function: impl Function + 'static) {
        self.functions.insert(uri, Arc::new(function));
    }

    fn native(&mut self, uri: String, f: NativeFn) {
        self.insert(uri, Native(f));
    }

    /// Register a per-type function under the 1.0 prefix, and for the
    /// duration types also under the 3.0 prefix they were moved to.
    fn per_type(&mut self, dt: DataType, suffix: &str, function: impl Function + Clone + 'static) {
        if matches!(dt, DataType::DayTimeDuration | DataType::YearMonthDuration) {
            self.insert(format!("{V3}{}-{suffix}", dt.short_name()), function.clone());
        }
        self.insert(format!("{V1}{}-{suffix}", dt.short_name()), function);
    }
}
