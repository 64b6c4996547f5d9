//! Column definitions.
//!
//! A [`ColumnDef`] is built through the [`Column`] builder and validated when
//! its owning table is built, so an invalid type/constraint pairing is a
//! build-time error with the table name attached.
//!
//! # Examples
//!
//! ```
//! use riptide::model::{Column, DataType, Table};
//!
//! let users = Table::new("users")
//!     .column(Column::new("Id", DataType::Serial))
//!     .column(Column::new("Email", DataType::Varchar).length(255).not_null().min_length(3))
//!     .primary_key(["Id"])
//!     .build()?;
//! assert_eq!(users.column("Email").unwrap().max_chars(), Some(255));
//! # Ok::<(), riptide::Error>(())
//! ```

use super::ident::validate_identifier;
use super::{DataType, TypeModifier};
use crate::error::{Error, Result};
use crate::value::Value;
use regex::Regex;
use std::fmt;

/// SQL keyword defaults understood by every relational dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultKeyword {
    CurrentTimestamp,
    CurrentDate,
    CurrentTime,
}

impl DefaultKeyword {
    pub fn sql(self) -> &'static str {
        match self {
            DefaultKeyword::CurrentTimestamp => "CURRENT_TIMESTAMP",
            DefaultKeyword::CurrentDate => "CURRENT_DATE",
            DefaultKeyword::CurrentTime => "CURRENT_TIME",
        }
    }
}

/// Where a column's default value comes from
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// A fixed value, coerced to the column type at build time
    Literal(Value),
    /// A named generator looked up in the dialect's generator table
    Generator(String),
    /// A dialect-independent SQL keyword
    Keyword(DefaultKeyword),
}

/// Value constraint checked on Insert and Update
#[derive(Debug, Clone)]
pub enum Validation {
    /// The column must be given a non-null value
    Required,
    /// String values must match the expression
    Pattern(Regex),
    /// Minimum length in characters
    MinLength(usize),
    /// Maximum length in characters
    MaxLength(usize),
    /// Inclusive numeric bounds
    Range { min: Option<f64>, max: Option<f64> },
}

impl Validation {
    fn name(&self) -> &'static str {
        match self {
            Validation::Required => "required",
            Validation::Pattern(_) => "pattern",
            Validation::MinLength(_) => "min_length",
            Validation::MaxLength(_) => "max_length",
            Validation::Range { .. } => "range",
        }
    }

    fn applies_to(&self, data_type: DataType) -> bool {
        match self {
            Validation::Required => true,
            Validation::Pattern(_) | Validation::MinLength(_) | Validation::MaxLength(_) => {
                data_type.is_string()
            }
            Validation::Range { .. } => data_type.is_numeric(),
        }
    }

    /// Description of the failed rule, or `None` if `value` passes
    fn violation(&self, value: &Value) -> Option<String> {
        match (self, value) {
            (Validation::Required, Value::Null) => Some("required".to_string()),
            (Validation::Pattern(re), Value::String(s)) if !re.is_match(s) => {
                Some(format!("pattern `{}`", re.as_str()))
            }
            (Validation::MinLength(min), Value::String(s)) if s.chars().count() < *min => {
                Some(format!("min_length {min}"))
            }
            (Validation::MaxLength(max), Value::String(s)) if s.chars().count() > *max => {
                Some(format!("max_length {max}"))
            }
            (Validation::Range { min, max }, v) => {
                let n = v.as_f64()?;
                let below = min.is_some_and(|min| n < min);
                let above = max.is_some_and(|max| n > max);
                (below || above).then(|| format!("range {}", RangeDisplay(*min, *max)))
            }
            _ => None,
        }
    }
}

struct RangeDisplay(Option<f64>, Option<f64>);

impl fmt::Display for RangeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.0, self.1) {
            (Some(min), Some(max)) => write!(f, "[{min}, {max}]"),
            (Some(min), None) => write!(f, ">= {min}"),
            (None, Some(max)) => write!(f, "<= {max}"),
            (None, None) => f.write_str("unbounded"),
        }
    }
}

/// Validated column metadata
#[derive(Debug, Clone)]
pub struct ColumnDef {
    name: String,
    data_type: DataType,
    nullable: bool,
    modifier: Option<TypeModifier>,
    default: Option<DefaultValue>,
    validations: Vec<Validation>,
    comment: Option<String>,
}

impl ColumnDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn modifier(&self) -> Option<&TypeModifier> {
        self.modifier.as_ref()
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn validations(&self) -> &[Validation] {
        &self.validations
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Declared character length for `CHAR`/`VARCHAR` columns
    pub fn max_chars(&self) -> Option<u32> {
        match self.modifier {
            Some(TypeModifier::Length(len)) => Some(len),
            _ => None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.validations
            .iter()
            .any(|v| matches!(v, Validation::Required))
    }

    /// Whether every Insert row must supply this column
    ///
    /// True for non-nullable columns without a default that the database does
    /// not fill itself (serial columns), and for columns marked required.
    pub fn needs_value(&self) -> bool {
        self.is_required()
            || (!self.nullable && self.default.is_none() && !self.data_type.is_serial())
    }

    /// Coerce `value` to this column's type.
    ///
    /// # Errors
    ///
    /// Returns `Error::TypeMismatch` naming `table`, this column and `operator`
    /// if the value cannot represent the column type.
    pub fn coerce(&self, table: &str, operator: Option<&str>, value: Value) -> Result<Value> {
        value
            .coerce_to(self.data_type)
            .map_err(|detail| Error::type_mismatch(table, &self.name, operator, detail))
    }

    /// Coerce `value` and enforce nullability, declared length and validation rules.
    ///
    /// Used for values written by Insert and Update.
    ///
    /// # Errors
    ///
    /// Returns `Error::TypeMismatch` for an incompatible value and
    /// `Error::ValidationFailed` naming the failed rule otherwise.
    pub fn check_value(&self, table: &str, value: Value) -> Result<Value> {
        let value = self.coerce(table, None, value)?;
        let failed = |rule: String| Error::ValidationFailed {
            table: table.to_string(),
            column: self.name.clone(),
            rule,
        };
        if value.is_null() && !self.nullable {
            return Err(failed("not null".to_string()));
        }
        if let (Some(len), Value::String(s)) = (self.max_chars(), &value) {
            if s.chars().count() > len as usize {
                return Err(failed(format!("length {len}")));
            }
        }
        match self.validations.iter().find_map(|v| v.violation(&value)) {
            Some(rule) => Err(failed(rule)),
            None => Ok(value),
        }
    }
}

/// Builder for a [`ColumnDef`].
///
/// Columns are nullable unless [`Column::not_null`] is called or the column is
/// part of the table's primary key.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    data_type: DataType,
    nullable: bool,
    modifier: Option<TypeModifier>,
    default: Option<DefaultValue>,
    validations: Vec<Validation>,
    patterns: Vec<String>,
    comment: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            modifier: None,
            default: None,
            validations: Vec::new(),
            patterns: Vec::new(),
            comment: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Character length for `CHAR`/`VARCHAR`
    pub fn length(mut self, length: u32) -> Self {
        self.modifier = Some(TypeModifier::Length(length));
        self
    }

    /// Precision and scale for `DECIMAL`
    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.modifier = Some(TypeModifier::Precision { precision, scale });
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Default produced by the named generator (e.g. `"uuid"`, `"now"`)
    pub fn default_generator(mut self, name: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Generator(name.into()));
        self
    }

    pub fn default_keyword(mut self, keyword: DefaultKeyword) -> Self {
        self.default = Some(DefaultValue::Keyword(keyword));
        self
    }

    pub fn required(mut self) -> Self {
        self.validations.push(Validation::Required);
        self
    }

    /// Regular expression string values must match; compiled when the table is built
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.validations.push(Validation::MinLength(min));
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.validations.push(Validation::MaxLength(max));
        self
    }

    /// Inclusive numeric bounds; either side may be open
    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.validations.push(Validation::Range { min, max });
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn force_not_null(&mut self) {
        self.nullable = false;
    }

    pub(crate) fn build(self, table: &str) -> Result<ColumnDef> {
        validate_identifier(&self.name)?;
        let pairing = |constraint: String| Error::InvalidConstraintPairing {
            column: self.name.clone(),
            constraint,
            data_type: self.data_type,
        };

        match self.modifier {
            Some(TypeModifier::Length(len)) => {
                if !self.data_type.accepts_length() {
                    return Err(pairing("length".to_string()));
                }
                if len == 0 {
                    return Err(pairing("length 0".to_string()));
                }
            }
            Some(TypeModifier::Precision { precision, scale }) => {
                if !self.data_type.accepts_precision() {
                    return Err(pairing("precision".to_string()));
                }
                if precision == 0 || scale > precision {
                    return Err(pairing(format!("precision ({precision},{scale})")));
                }
            }
            None => {}
        }

        let mut validations = self.validations;
        for source in &self.patterns {
            let re = Regex::new(source).map_err(|e| Error::InvalidPattern {
                column: self.name.clone(),
                message: e.to_string(),
            })?;
            validations.push(Validation::Pattern(re));
        }
        if let Some(v) = validations.iter().find(|v| !v.applies_to(self.data_type)) {
            return Err(pairing(v.name().to_string()));
        }
        for v in &validations {
            match v {
                Validation::Range {
                    min: Some(min),
                    max: Some(max),
                } if min > max => return Err(pairing(format!("range [{min}, {max}]"))),
                _ => {}
            }
        }

        let default = match self.default {
            Some(_) if self.data_type.is_serial() => return Err(pairing("default".to_string())),
            Some(DefaultValue::Literal(value)) => {
                let value = value
                    .coerce_to(self.data_type)
                    .map_err(|detail| Error::type_mismatch(table, &self.name, None, detail))?;
                if value.is_null() && !self.nullable {
                    return Err(pairing("default NULL".to_string()));
                }
                Some(DefaultValue::Literal(value))
            }
            Some(DefaultValue::Generator(name)) => {
                validate_identifier(&name)?;
                Some(DefaultValue::Generator(name))
            }
            Some(DefaultValue::Keyword(kw)) => {
                let fits = match kw {
                    DefaultKeyword::CurrentDate => {
                        matches!(self.data_type, DataType::Date | DataType::DateTime | DataType::Timestamp)
                    }
                    DefaultKeyword::CurrentTime => self.data_type == DataType::Time,
                    DefaultKeyword::CurrentTimestamp => {
                        matches!(self.data_type, DataType::DateTime | DataType::Timestamp)
                    }
                };
                if !fits {
                    return Err(pairing(kw.sql().to_string()));
                }
                Some(DefaultValue::Keyword(kw))
            }
            None => None,
        };

        Ok(ColumnDef {
            name: self.name,
            data_type: self.data_type,
            nullable: self.nullable,
            modifier: self.modifier,
            default,
            validations,
            comment: self.comment,
        })
    }
}
