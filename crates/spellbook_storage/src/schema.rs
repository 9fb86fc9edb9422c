//! Schema definitions for component fields.
//!
//! A [`Shape`] is the declared, ordered list of fields of a component type,
//! each paired with a typed accessor. It replaces runtime introspection:
//! the shape is built once at registration and cached by the registry.

use std::fmt;

use spellbook_foundation::{Error, ErrorContext, Result, Type, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name and type of a single component field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldSchema {
    /// Field name. For durable components this is also the column name.
    pub name: String,
    /// Field type.
    pub ty: Type,
}

impl FieldSchema {
    /// Creates a field schema.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A Rust type that can be stored in a component field.
pub trait Scalar: Sized {
    /// The declared field type.
    const TYPE: Type;

    /// Converts into a store value.
    fn into_value(self) -> Value;

    /// Converts from a store value, normalizing integer width.
    ///
    /// Returns `None` if the value is of the wrong kind or does not fit.
    fn from_value(value: Value) -> Option<Self>;
}

impl Scalar for bool {
    const TYPE: Type = Type::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        // Stores without a boolean column type hand back 0/1
        match value {
            Value::Bool(b) => Some(b),
            Value::Int(0) => Some(false),
            Value::Int(1) => Some(true),
            _ => None,
        }
    }
}

macro_rules! int_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const TYPE: Type = Type::$variant;

                fn into_value(self) -> Value {
                    Value::Int(i64::from(self))
                }

                fn from_value(value: Value) -> Option<Self> {
                    value.as_int().and_then(|n| <$ty>::try_from(n).ok())
                }
            }
        )*
    };
}

int_scalar!(i8 => I8, i16 => I16, i32 => I32, i64 => I64);

impl Scalar for f32 {
    const TYPE: Type = Type::F32;

    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(n) => Some(n as f32),
            Value::Int(n) => Some(n as f32),
            _ => None,
        }
    }
}

impl Scalar for f64 {
    const TYPE: Type = Type::F64;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(n) => Some(n),
            Value::Int(n) => Some(n as f64),
            _ => None,
        }
    }
}

impl Scalar for String {
    const TYPE: Type = Type::Text;

    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

type Getter<C> = Box<dyn Fn(&C) -> Value>;
type Setter<C> = Box<dyn Fn(&mut C, Value) -> bool>;

/// A declared field of component type `C` with its accessor pair.
pub struct Field<C> {
    schema: FieldSchema,
    get: Getter<C>,
    set: Setter<C>,
}

impl<C> Field<C> {
    /// Returns the field schema.
    #[must_use]
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Returns the declared field type.
    #[must_use]
    pub fn ty(&self) -> Type {
        self.schema.ty
    }

    /// Reads the field out of a component value.
    #[must_use]
    pub fn read(&self, component: &C) -> Value {
        (self.get)(component)
    }

    /// Writes a store value into the field.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if the value is of the wrong kind or does not
    /// fit the declared width.
    pub fn assign(&self, component: &mut C, value: Value) -> Result<()> {
        let actual = value.value_type();
        if (self.set)(component, value) {
            Ok(())
        } else {
            Err(Error::type_mismatch(self.schema.ty, actual)
                .with_context(ErrorContext::new().with_field(self.name())))
        }
    }
}

impl<C> fmt::Debug for Field<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.schema.name)
            .field("ty", &self.schema.ty)
            .finish_non_exhaustive()
    }
}

/// The ordered field list of component type `C`.
///
/// ```ignore
/// Shape::<Position>::new()
///     .field("x", |p: &Position| p.x, |p: &mut Position, v| p.x = v)
///     .field("y", |p: &Position| p.y, |p: &mut Position, v| p.y = v)
/// ```
#[derive(Debug)]
pub struct Shape<C> {
    fields: Vec<Field<C>>,
}

impl<C: 'static> Shape<C> {
    /// Creates an empty shape (a tag component).
    #[must_use]
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds a field with its getter and setter.
    #[must_use]
    pub fn field<T: Scalar + 'static>(
        mut self,
        name: &str,
        get: fn(&C) -> T,
        set: fn(&mut C, T),
    ) -> Self {
        self.fields.push(Field {
            schema: FieldSchema::new(name, T::TYPE),
            get: Box::new(move |component: &C| get(component).into_value()),
            set: Box::new(move |component: &mut C, value: Value| {
                T::from_value(value).is_some_and(|v| {
                    set(component, v);
                    true
                })
            }),
        });
        self
    }
}

impl<C: 'static> Default for Shape<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Shape<C> {
    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field<C>] {
        &self.fields
    }

    /// Returns the erased field schemas in declaration order.
    #[must_use]
    pub fn schemas(&self) -> Vec<FieldSchema> {
        self.fields.iter().map(|f| f.schema.clone()).collect()
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true for a tag component (no fields).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
