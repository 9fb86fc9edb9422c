//! Conjunctive field predicates and the query builder.
//!
//! A query targets one component name and holds an ordered list of
//! predicates, all of which must hold. The backend that runs it is decided by
//! the descriptor, never by the caller.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use spellbook_foundation::{Error, ErrorContext, Result, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::binder::Record;
use crate::component::ComponentData;
use crate::cursor::Components;
use crate::manager::Manager;
use crate::registry::Descriptor;
use crate::store::RecordStore;

/// A comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Op {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

impl Op {
    /// Returns the statement text for this operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Checks whether `field <op> literal` holds given their ordering.
    #[must_use]
    pub const fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering.is_eq(),
            Self::Ne => ordering.is_ne(),
            Self::Lt => ordering.is_lt(),
            Self::Le => ordering.is_le(),
            Self::Gt => ordering.is_gt(),
            Self::Ge => ordering.is_ge(),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// An operator string that is not one of `= == != <> < <= > >=`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownOp(pub String);

impl fmt::Display for UnknownOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown comparison operator: {}", self.0)
    }
}

impl std::error::Error for UnknownOp {}

impl FromStr for Op {
    type Err = UnknownOp;

    fn from_str(s: &str) -> std::result::Result<Self, UnknownOp> {
        match s {
            "=" | "==" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::Ne),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            other => Err(UnknownOp(other.to_string())),
        }
    }
}

/// One `field <op> literal` comparison.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Predicate {
    /// The compared field.
    pub field: String,
    /// The operator.
    pub op: Op,
    /// The literal compared against.
    pub literal: Value,
}

impl Predicate {
    /// Creates a predicate.
    #[must_use]
    pub fn new(field: impl Into<String>, op: Op, literal: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            literal: literal.into(),
        }
    }

    /// Checks the predicate against a field value.
    ///
    /// Values of different kinds never compare, so the predicate fails.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        value
            .compare(&self.literal)
            .is_some_and(|ordering| self.op.holds(ordering))
    }

    /// Checks the predicate against the matching field of a record.
    #[must_use]
    pub fn matches_record(&self, record: &Record) -> bool {
        record.get(&self.field).is_some_and(|value| self.matches(value))
    }

    /// Checks that the field is declared and the literal is of a kind the
    /// field can be compared with.
    ///
    /// # Errors
    ///
    /// Returns a field mismatch for an undeclared field and a type mismatch
    /// for an incompatible literal.
    pub fn validate(&self, descriptor: &Descriptor) -> Result<()> {
        let field = descriptor
            .field(&self.field)
            .ok_or_else(|| Error::field_mismatch(descriptor.name(), &self.field))?;
        let actual = self.literal.value_type();
        if field.ty.accepts(actual) {
            Ok(())
        } else {
            Err(Error::type_mismatch(field.ty, actual).with_context(
                ErrorContext::new()
                    .with_operation("query")
                    .with_component(descriptor.name())
                    .with_field(&self.field),
            ))
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.literal)
    }
}

/// Accumulates predicates against one component name.
///
/// Invalid predicates are remembered and reported by [`run`](Self::run), so
/// a chain of `filter` calls never needs intermediate error handling.
pub struct Query<'m, S, C> {
    manager: &'m Manager<S>,
    descriptor: &'m Descriptor,
    predicates: Vec<Predicate>,
    error: Option<Error>,
    _component: PhantomData<fn() -> C>,
}

impl<'m, S: RecordStore, C: ComponentData> Query<'m, S, C> {
    pub(crate) fn new(manager: &'m Manager<S>, descriptor: &'m Descriptor) -> Self {
        Self {
            manager,
            descriptor,
            predicates: Vec::new(),
            error: None,
            _component: PhantomData,
        }
    }

    /// Adds a predicate. Predicates are conjoined in insertion order.
    #[must_use]
    pub fn filter(mut self, field: &str, op: Op, literal: impl Into<Value>) -> Self {
        let predicate = Predicate::new(field, op, literal);
        if self.error.is_none() {
            self.error = predicate.validate(self.descriptor).err();
        }
        self.predicates.push(predicate);
        self
    }

    /// Adds `field = literal`.
    #[must_use]
    pub fn eq(self, field: &str, literal: impl Into<Value>) -> Self {
        self.filter(field, Op::Eq, literal)
    }

    /// Adds `field <> literal`.
    #[must_use]
    pub fn neq(self, field: &str, literal: impl Into<Value>) -> Self {
        self.filter(field, Op::Ne, literal)
    }

    /// Adds `field < literal`.
    #[must_use]
    pub fn lt(self, field: &str, literal: impl Into<Value>) -> Self {
        self.filter(field, Op::Lt, literal)
    }

    /// Adds `field <= literal`.
    #[must_use]
    pub fn lte(self, field: &str, literal: impl Into<Value>) -> Self {
        self.filter(field, Op::Le, literal)
    }

    /// Adds `field > literal`.
    #[must_use]
    pub fn gt(self, field: &str, literal: impl Into<Value>) -> Self {
        self.filter(field, Op::Gt, literal)
    }

    /// Adds `field >= literal`.
    #[must_use]
    pub fn gte(self, field: &str, literal: impl Into<Value>) -> Self {
        self.filter(field, Op::Ge, literal)
    }

    /// Returns the component name being queried.
    #[must_use]
    pub fn component(&self) -> &str {
        self.descriptor.name()
    }

    /// Returns the accumulated predicates in order.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Runs the query against the component's backend.
    ///
    /// # Errors
    ///
    /// Returns the first invalid predicate's error, or a store error if the
    /// scan cannot start.
    pub fn run(self) -> Result<Components<'m, C>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.manager.scan(self.descriptor, &self.predicates)
    }
}

impl<S, C> fmt::Debug for Query<'_, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("component", &self.descriptor.name())
            .field("predicates", &self.predicates)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
