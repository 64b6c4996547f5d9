//! Per-dialect capability records.

use super::Dialect;
use crate::error::{Error, Result};
use crate::model::{DataType, TypeModifier};
use crate::query::QueryKind;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Optional target features the translator checks before rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    /// Cascading drops (`DROP TABLE ... CASCADE`)
    Cascade,
    MaterializedViews,
    Partitioning,
    /// `DISTRIBUTED BY` tables
    Distribution,
    /// `RETURNING` on INSERT/UPDATE/DELETE
    Returning,
    Joins,
    Aggregation,
    /// Correlated `EXISTS` subqueries for nested relation filters
    Subqueries,
    /// CREATE/DROP statements
    Ddl,
    Transactions,
    /// Isolation level on the BEGIN statement itself
    TransactionIsolation,
    Savepoints,
    /// `CAST(expr AS type)` projections
    Cast,
    /// `LIKE` style pattern matching
    Patterns,
}

impl Feature {
    pub fn name(self) -> &'static str {
        match self {
            Feature::Cascade => "cascade",
            Feature::MaterializedViews => "materialized views",
            Feature::Partitioning => "partitioning",
            Feature::Distribution => "distributed tables",
            Feature::Returning => "RETURNING",
            Feature::Joins => "joins",
            Feature::Aggregation => "aggregation",
            Feature::Subqueries => "correlated subqueries",
            Feature::Ddl => "schema statements",
            Feature::Transactions => "transactions",
            Feature::TransactionIsolation => "isolation levels on BEGIN",
            Feature::Savepoints => "savepoints",
            Feature::Cast => "casts",
            Feature::Patterns => "pattern matching",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How bound parameters appear in rendered text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderStyle {
    /// `?`
    Question,
    /// `$1`, `$2`, ...
    Dollar,
    /// `{"$param":1}` inside a JSON command document
    Document,
}

impl PlaceholderStyle {
    /// Placeholder for the 1-based parameter `position`
    pub fn placeholder(self, position: usize) -> String {
        match self {
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::Dollar => format!("${position}"),
            PlaceholderStyle::Document => format!("{{\"$param\":{position}}}"),
        }
    }
}

/// Form used for multi-row inserts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkInsert {
    /// `VALUES (...), (...)`
    ValuesList,
    /// `SELECT ... UNION ALL SELECT ...`
    UnionAll,
    /// Document target `insert` command with a `documents` array
    Documents,
}

/// Concrete type keyword for one logical type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    keyword: Cow<'static, str>,
    accepts_args: bool,
    default_args: Option<Cow<'static, str>>,
}

impl TypeSpec {
    /// Keyword that never takes a modifier
    pub const fn plain(keyword: &'static str) -> Self {
        Self {
            keyword: Cow::Borrowed(keyword),
            accepts_args: false,
            default_args: None,
        }
    }

    /// Keyword that renders the column's length or precision when declared
    pub const fn with_args(keyword: &'static str) -> Self {
        Self {
            keyword: Cow::Borrowed(keyword),
            accepts_args: true,
            default_args: None,
        }
    }

    pub fn custom(keyword: impl Into<String>, accepts_args: bool) -> Self {
        Self {
            keyword: Cow::Owned(keyword.into()),
            accepts_args,
            default_args: None,
        }
    }

    /// Arguments used when the column declares no modifier (`VARCHAR` on MySQL)
    pub fn or_default_args(mut self, args: &'static str) -> Self {
        self.default_args = Some(Cow::Borrowed(args));
        self
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Render with the column's modifier, if the keyword takes one
    pub fn render(&self, modifier: Option<&TypeModifier>) -> String {
        if !self.accepts_args {
            return self.keyword.to_string();
        }
        match (modifier, &self.default_args) {
            (Some(m), _) => format!("{}({})", self.keyword, m.args()),
            (None, Some(args)) => format!("{}({})", self.keyword, args),
            (None, None) => self.keyword.to_string(),
        }
    }
}

/// Where a named generator's value comes from on a dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorSource {
    /// SQL expression evaluated by the database, e.g. `gen_random_uuid()`
    Keyword(Cow<'static, str>),
    /// Value computed by the caller before translation and bound as a parameter
    Literal,
}

/// Immutable capability record for one dialect
#[derive(Debug, Clone)]
pub struct Capabilities {
    dialect: Dialect,
    identifier_quote: char,
    placeholder: PlaceholderStyle,
    bulk_insert: BulkInsert,
    max_parameters: Option<usize>,
    types: BTreeMap<DataType, TypeSpec>,
    generators: BTreeMap<String, GeneratorSource>,
    features: BTreeSet<Feature>,
}

const RELATIONAL_FEATURES: [Feature; 8] = [
    Feature::Joins,
    Feature::Aggregation,
    Feature::Subqueries,
    Feature::Ddl,
    Feature::Transactions,
    Feature::Savepoints,
    Feature::Cast,
    Feature::Patterns,
];

impl Capabilities {
    fn base(dialect: Dialect, identifier_quote: char, placeholder: PlaceholderStyle) -> Self {
        Self {
            dialect,
            identifier_quote,
            placeholder,
            bulk_insert: BulkInsert::ValuesList,
            max_parameters: None,
            types: BTreeMap::new(),
            generators: BTreeMap::new(),
            features: BTreeSet::new(),
        }
    }

    /// PostgreSQL-like targets
    pub fn postgres() -> Self {
        let mut caps = Self::base(Dialect::Postgres, '"', PlaceholderStyle::Dollar)
            .with_max_parameters(65_535)
            .with_features(RELATIONAL_FEATURES)
            .with_features([
                Feature::Cascade,
                Feature::MaterializedViews,
                Feature::Partitioning,
                Feature::Returning,
                Feature::TransactionIsolation,
            ]);
        caps.types = BTreeMap::from([
            (DataType::Boolean, TypeSpec::plain("BOOLEAN")),
            (DataType::Date, TypeSpec::plain("DATE")),
            (DataType::Time, TypeSpec::plain("TIME")),
            (DataType::DateTime, TypeSpec::plain("TIMESTAMP")),
            (DataType::Timestamp, TypeSpec::plain("TIMESTAMPTZ")),
            (DataType::SmallInt, TypeSpec::plain("SMALLINT")),
            (DataType::Integer, TypeSpec::plain("INTEGER")),
            (DataType::BigInt, TypeSpec::plain("BIGINT")),
            (DataType::Decimal, TypeSpec::with_args("NUMERIC")),
            (DataType::Real, TypeSpec::plain("REAL")),
            (DataType::Double, TypeSpec::plain("DOUBLE PRECISION")),
            (DataType::Char, TypeSpec::with_args("CHAR")),
            (DataType::Varchar, TypeSpec::with_args("VARCHAR")),
            (DataType::Text, TypeSpec::plain("TEXT")),
            (DataType::Uuid, TypeSpec::plain("UUID")),
            (DataType::Json, TypeSpec::plain("JSONB")),
            (DataType::SmallSerial, TypeSpec::plain("SMALLSERIAL")),
            (DataType::Serial, TypeSpec::plain("SERIAL")),
            (DataType::BigSerial, TypeSpec::plain("BIGSERIAL")),
        ]);
        caps.with_generator("uuid", GeneratorSource::Keyword("gen_random_uuid()".into()))
            .with_generator("now", GeneratorSource::Keyword("NOW()".into()))
            .with_generator("current_date", GeneratorSource::Keyword("CURRENT_DATE".into()))
            .with_generator("nanoid", GeneratorSource::Literal)
    }

    /// MySQL/MariaDB-like targets
    pub fn mysql() -> Self {
        let mut caps = Self::base(Dialect::MySql, '`', PlaceholderStyle::Question)
            .with_max_parameters(65_535)
            .with_features(RELATIONAL_FEATURES)
            .with_features([Feature::Cascade, Feature::Partitioning]);
        caps.types = BTreeMap::from([
            (DataType::Boolean, TypeSpec::plain("BOOLEAN")),
            (DataType::Date, TypeSpec::plain("DATE")),
            (DataType::Time, TypeSpec::plain("TIME")),
            (DataType::DateTime, TypeSpec::plain("DATETIME")),
            (DataType::Timestamp, TypeSpec::plain("TIMESTAMP")),
            (DataType::SmallInt, TypeSpec::plain("SMALLINT")),
            (DataType::Integer, TypeSpec::plain("INT")),
            (DataType::BigInt, TypeSpec::plain("BIGINT")),
            (DataType::Decimal, TypeSpec::with_args("DECIMAL")),
            (DataType::Real, TypeSpec::plain("FLOAT")),
            (DataType::Double, TypeSpec::plain("DOUBLE")),
            (DataType::Char, TypeSpec::with_args("CHAR")),
            (DataType::Varchar, TypeSpec::with_args("VARCHAR").or_default_args("255")),
            (DataType::Text, TypeSpec::plain("TEXT")),
            (DataType::Uuid, TypeSpec::plain("CHAR(36)")),
            (DataType::Json, TypeSpec::plain("JSON")),
            (DataType::SmallSerial, TypeSpec::plain("SMALLINT AUTO_INCREMENT")),
            (DataType::Serial, TypeSpec::plain("INT AUTO_INCREMENT")),
            (DataType::BigSerial, TypeSpec::plain("BIGINT AUTO_INCREMENT")),
        ]);
        caps.with_generator("uuid", GeneratorSource::Keyword("UUID()".into()))
            .with_generator("now", GeneratorSource::Keyword("NOW()".into()))
            .with_generator("current_date", GeneratorSource::Keyword("CURRENT_DATE".into()))
            .with_generator("nanoid", GeneratorSource::Literal)
    }

    /// SQLite-like targets
    pub fn sqlite() -> Self {
        let mut caps = Self::base(Dialect::Sqlite, '"', PlaceholderStyle::Question)
            .with_max_parameters(32_766)
            .with_features(RELATIONAL_FEATURES)
            .with_features([Feature::Returning]);
        caps.types = BTreeMap::from([
            (DataType::Boolean, TypeSpec::plain("INTEGER")),
            (DataType::Date, TypeSpec::plain("TEXT")),
            (DataType::Time, TypeSpec::plain("TEXT")),
            (DataType::DateTime, TypeSpec::plain("TEXT")),
            (DataType::Timestamp, TypeSpec::plain("TEXT")),
            (DataType::SmallInt, TypeSpec::plain("INTEGER")),
            (DataType::Integer, TypeSpec::plain("INTEGER")),
            (DataType::BigInt, TypeSpec::plain("INTEGER")),
            (DataType::Decimal, TypeSpec::with_args("NUMERIC")),
            (DataType::Real, TypeSpec::plain("REAL")),
            (DataType::Double, TypeSpec::plain("REAL")),
            (DataType::Char, TypeSpec::with_args("CHAR")),
            (DataType::Varchar, TypeSpec::with_args("VARCHAR")),
            (DataType::Text, TypeSpec::plain("TEXT")),
            (DataType::Uuid, TypeSpec::plain("TEXT")),
            (DataType::Json, TypeSpec::plain("TEXT")),
            (DataType::SmallSerial, TypeSpec::plain("INTEGER")),
            (DataType::Serial, TypeSpec::plain("INTEGER")),
            (DataType::BigSerial, TypeSpec::plain("INTEGER")),
        ]);
        caps.with_generator("uuid", GeneratorSource::Literal)
            .with_generator("now", GeneratorSource::Keyword("CURRENT_TIMESTAMP".into()))
            .with_generator("current_date", GeneratorSource::Keyword("CURRENT_DATE".into()))
            .with_generator("nanoid", GeneratorSource::Literal)
    }

    /// Document-oriented target. No type table and no relational features;
    /// every generator is computed by the caller.
    pub fn document() -> Self {
        let mut caps = Self::base(Dialect::Document, '"', PlaceholderStyle::Document);
        caps.bulk_insert = BulkInsert::Documents;
        caps.with_generator("uuid", GeneratorSource::Literal)
            .with_generator("now", GeneratorSource::Literal)
            .with_generator("current_date", GeneratorSource::Literal)
            .with_generator("nanoid", GeneratorSource::Literal)
    }

    /// Built-in record for `dialect`
    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Postgres => Self::postgres(),
            Dialect::MySql => Self::mysql(),
            Dialect::Sqlite => Self::sqlite(),
            Dialect::Document => Self::document(),
        }
    }

    pub fn with_feature(mut self, feature: Feature, enabled: bool) -> Self {
        if enabled {
            self.features.insert(feature);
        } else {
            self.features.remove(&feature);
        }
        self
    }

    fn with_features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.features.extend(features);
        self
    }

    pub fn with_type(mut self, data_type: DataType, spec: TypeSpec) -> Self {
        self.types.insert(data_type, spec);
        self
    }

    pub fn without_type(mut self, data_type: DataType) -> Self {
        self.types.remove(&data_type);
        self
    }

    pub fn with_generator(mut self, name: impl Into<String>, source: GeneratorSource) -> Self {
        self.generators.insert(name.into(), source);
        self
    }

    pub fn with_max_parameters(mut self, limit: usize) -> Self {
        self.max_parameters = Some(limit);
        self
    }

    pub fn with_bulk_insert(mut self, form: BulkInsert) -> Self {
        self.bulk_insert = form;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn identifier_quote(&self) -> char {
        self.identifier_quote
    }

    pub fn placeholder_style(&self) -> PlaceholderStyle {
        self.placeholder
    }

    pub fn bulk_insert(&self) -> BulkInsert {
        self.bulk_insert
    }

    pub fn max_parameters(&self) -> Option<usize> {
        self.max_parameters
    }

    pub fn supports(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        self.features.iter().copied()
    }

    pub fn type_spec(&self, data_type: DataType) -> Option<&TypeSpec> {
        self.types.get(&data_type)
    }

    pub fn generator(&self, name: &str) -> Option<&GeneratorSource> {
        self.generators.get(name)
    }

    /// Fail with `UnsupportedCapability` unless `feature` is enabled
    pub fn require(&self, feature: Feature, query_kind: QueryKind, detail: &str) -> Result<()> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(Error::unsupported(self.dialect, query_kind, feature, detail))
        }
    }

    /// Quote an identifier, doubling any embedded quote character
    pub fn quote_identifier(&self, name: &str) -> String {
        let q = self.identifier_quote;
        let mut out = String::with_capacity(name.len() + 2);
        out.push(q);
        for ch in name.chars() {
            if ch == q {
                out.push(q);
            }
            out.push(ch);
        }
        out.push(q);
        out
    }
}
