//! Conversion between typed component values and flat field records.
//!
//! Both backends go through the binder: the durable backend feeds it store
//! rows, the transient backend feeds it the records it keeps in memory.

use spellbook_foundation::{EntityId, Error, ErrorContext, Result, Type, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::component::ComponentData;
use crate::registry::Descriptor;
use crate::schema::Shape;

/// An ordered list of `(field name, value)` pairs.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zips a row's column names with its values.
    #[must_use]
    pub fn from_row(columns: &[String], values: Vec<Value>) -> Self {
        Self {
            fields: columns.iter().cloned().zip(values).collect(),
        }
    }

    /// Appends a field.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Looks up a field by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Removes a field and returns its value.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(field, _)| field == name)?;
        Some(self.fields.remove(index).1)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Iterates field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates values in order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Descriptor-driven marshalling for component type `C`.
pub struct Binder<'a, C> {
    descriptor: &'a Descriptor,
    shape: &'a Shape<C>,
}

impl<C> Clone for Binder<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Binder<'_, C> {}

impl<'a, C: ComponentData> Binder<'a, C> {
    /// Creates a binder, checking that `C` is the registered type.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch if the descriptor was registered with a
    /// different Rust type.
    pub fn new(descriptor: &'a Descriptor) -> Result<Self> {
        let shape = descriptor.shape::<C>()?;
        Ok(Self { descriptor, shape })
    }

    /// Returns the descriptor being bound against.
    #[must_use]
    pub fn descriptor(&self) -> &'a Descriptor {
        self.descriptor
    }

    /// Flattens a component value into its declared fields, in order.
    ///
    /// # Errors
    ///
    /// Returns a type mismatch for a NaN float. SQLite stores NaN as NULL,
    /// so it could never be read back.
    pub fn to_record(&self, data: &C) -> Result<Record> {
        let component = self.descriptor.name();
        self.shape
            .fields()
            .iter()
            .map(|field| match field.read(data) {
                Value::Float(n) if n.is_nan() => Err(Error::type_mismatch(field.ty(), "NaN")
                    .with_context(
                        ErrorContext::new()
                            .with_component(component)
                            .with_field(field.name()),
                    )),
                value => Ok((field.name(), value)),
            })
            .collect()
    }

    /// Builds a component value from a record.
    ///
    /// Every declared field must be present and every present field must be
    /// declared. Integer values are narrowed to the declared width.
    ///
    /// # Errors
    ///
    /// Returns a field mismatch for a missing or unknown field, and a type
    /// mismatch for a value the field cannot hold.
    pub fn from_record(&self, mut record: Record) -> Result<C> {
        let component = self.descriptor.name();
        let mut data = C::default();
        for field in self.shape.fields() {
            let value = record
                .take(field.name())
                .ok_or_else(|| Error::field_mismatch(component, field.name()))?;
            field
                .assign(&mut data, value)
                .map_err(|e| e.within(ErrorContext::new().with_component(component)))?;
        }
        if let Some(extra) = record.names().next() {
            return Err(Error::field_mismatch(component, extra));
        }
        Ok(data)
    }

    /// Splits the key column off a store row and binds the rest.
    ///
    /// # Errors
    ///
    /// Returns a field mismatch if the key column is missing, a type
    /// mismatch if it is not an integer, and any error of
    /// [`from_record`](Self::from_record).
    pub fn bind_row(&self, key_column: &str, mut row: Record) -> Result<(EntityId, C)> {
        let component = self.descriptor.name();
        let key = row
            .take(key_column)
            .ok_or_else(|| Error::field_mismatch(component, key_column))?;
        let entity = key.as_int().map(EntityId::new).ok_or_else(|| {
            Error::type_mismatch(Type::I64, key.value_type())
                .with_context(ErrorContext::new().with_component(component))
        })?;
        let data = self
            .from_record(row)
            .map_err(|e| e.within(ErrorContext::new().with_entity(entity)))?;
        Ok((entity, data))
    }
}
