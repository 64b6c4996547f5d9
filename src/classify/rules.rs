//! Per-dialect classification tables.
//!
//! Rules are tried in order and the first match wins, so exact codes come
//! before class prefixes and message-qualified rules before the bare code.

use super::{ConstraintKind, ErrorClass, NativeError};
use crate::dialect::Dialect;
use once_cell::sync::Lazy;
use regex::Regex;

use ConstraintKind::{Check, ForeignKey, NotNull, Other, Unique};
use ErrorClass::{ConnectionLost, LockWaitTimeout, MissingColumn, MissingRelation, Syntax, Timeout};

enum Code {
    Exact(&'static str),
    Prefix(&'static str),
    Any,
}

struct Rule {
    code: Code,
    message: Option<Regex>,
    class: ErrorClass,
}

impl Rule {
    fn matches(&self, native: &NativeError) -> bool {
        let code = native.code();
        let code_ok = match self.code {
            Code::Exact(c) => code == c,
            Code::Prefix(p) => code.starts_with(p),
            Code::Any => true,
        };
        code_ok && self.message.as_ref().map_or(true, |re| re.is_match(native.message()))
    }
}

pub(crate) struct RuleTable {
    rules: Vec<Rule>,
    /// Patterns with optional `table` and `column` capture groups
    extractors: Vec<Regex>,
}

impl RuleTable {
    pub(crate) fn class_of(&self, native: &NativeError) -> ErrorClass {
        self.rules
            .iter()
            .find(|rule| rule.matches(native))
            .map_or(ErrorClass::Unclassified, |rule| rule.class)
    }

    /// Table and column named by the native message, first capture wins
    pub(crate) fn names_in(&self, message: &str) -> (Option<String>, Option<String>) {
        let mut table = None;
        let mut column = None;
        for re in &self.extractors {
            if let Some(caps) = re.captures(message) {
                if table.is_none() {
                    table = caps.name("table").map(|m| m.as_str().to_string());
                }
                if column.is_none() {
                    column = caps.name("column").map(|m| m.as_str().to_string());
                }
            }
        }
        (table, column)
    }
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("classifier pattern is a valid regex")
}

fn exact(code: &'static str, class: ErrorClass) -> Rule {
    Rule {
        code: Code::Exact(code),
        message: None,
        class,
    }
}

fn prefix(code: &'static str, class: ErrorClass) -> Rule {
    Rule {
        code: Code::Prefix(code),
        message: None,
        class,
    }
}

fn exact_with(code: &'static str, message: &str, class: ErrorClass) -> Rule {
    Rule {
        code: Code::Exact(code),
        message: Some(pattern(message)),
        class,
    }
}

fn any_with(message: &str, class: ErrorClass) -> Rule {
    Rule {
        code: Code::Any,
        message: Some(pattern(message)),
        class,
    }
}

fn constraint(kind: ConstraintKind) -> ErrorClass {
    ErrorClass::ConstraintViolation(kind)
}

/// SQLSTATE codes
static POSTGRES: Lazy<RuleTable> = Lazy::new(|| RuleTable {
    rules: vec![
        exact("23505", constraint(Unique)),
        exact("23503", constraint(ForeignKey)),
        exact("23502", constraint(NotNull)),
        exact("23514", constraint(Check)),
        prefix("23", constraint(Other)),
        exact("42601", Syntax),
        exact("42P01", MissingRelation),
        exact("42703", MissingColumn),
        exact("57014", Timeout),
        exact("55P03", LockWaitTimeout),
        prefix("08", ConnectionLost),
        exact("57P01", ConnectionLost),
        exact("57P02", ConnectionLost),
        exact("57P03", ConnectionLost),
        exact_with("", r"(?i)connection (closed|reset|refused)", ConnectionLost),
    ],
    extractors: vec![
        pattern(r#"column "(?P<column>[^"]+)" of relation "(?P<table>[^"]+)""#),
        pattern(r#"relation "(?P<table>[^"]+)" does not exist"#),
        pattern(r#"on table "(?P<table>[^"]+)""#),
        pattern(r#"column "(?P<column>[^"]+)""#),
        pattern(r"Key \((?P<column>[A-Za-z0-9_]+)\)="),
    ],
});

/// Server error numbers and client error numbers
static MYSQL: Lazy<RuleTable> = Lazy::new(|| RuleTable {
    rules: vec![
        exact("1062", constraint(Unique)),
        exact("1586", constraint(Unique)),
        exact("1451", constraint(ForeignKey)),
        exact("1452", constraint(ForeignKey)),
        exact("1048", constraint(NotNull)),
        exact("1364", constraint(NotNull)),
        exact("3819", constraint(Check)),
        exact("1064", Syntax),
        exact("1146", MissingRelation),
        exact("1054", MissingColumn),
        exact("3024", Timeout),
        exact("1317", Timeout),
        exact("1205", LockWaitTimeout),
        exact("2002", ConnectionLost),
        exact("2003", ConnectionLost),
        exact("2006", ConnectionLost),
        exact("2013", ConnectionLost),
    ],
    extractors: vec![
        pattern(r"Table '(?:[^'.]+\.)?(?P<table>[^']+)' doesn't exist"),
        pattern(r"Unknown column '(?:[^'.]+\.)?(?P<column>[^']+)'"),
        pattern(r"Column '(?P<column>[^']+)' cannot be null"),
        pattern(r"Field '(?P<column>[^']+)' doesn't have a default value"),
        pattern(r"Duplicate entry '.*' for key '(?P<table>[^'.]+)\.[^']+'"),
        pattern(r"foreign key constraint fails \(`[^`]+`\.`(?P<table>[^`]+)`"),
    ],
});

/// Extended result codes first, then the primary code qualified by message
static SQLITE: Lazy<RuleTable> = Lazy::new(|| RuleTable {
    rules: vec![
        exact("2067", constraint(Unique)),
        exact("1555", constraint(Unique)),
        exact("787", constraint(ForeignKey)),
        exact("1299", constraint(NotNull)),
        exact("275", constraint(Check)),
        exact_with("19", r"^UNIQUE constraint failed", constraint(Unique)),
        exact_with("19", r"^FOREIGN KEY constraint failed", constraint(ForeignKey)),
        exact_with("19", r"^NOT NULL constraint failed", constraint(NotNull)),
        exact_with("19", r"^CHECK constraint failed", constraint(Check)),
        exact("19", constraint(Other)),
        exact_with("1", r"no such table", MissingRelation),
        exact_with("1", r"no such column|has no column named", MissingColumn),
        exact_with("1", r"syntax error|incomplete input", Syntax),
        exact("5", LockWaitTimeout),
        exact("6", LockWaitTimeout),
        exact("9", Timeout),
        any_with(r"^database is locked", LockWaitTimeout),
    ],
    extractors: vec![
        pattern(r"constraint failed: (?P<table>[A-Za-z0-9_]+)\.(?P<column>[A-Za-z0-9_]+)"),
        pattern(r"no such table: (?:[A-Za-z0-9_]+\.)?(?P<table>[A-Za-z0-9_]+)"),
        pattern(r"no such column: (?:[A-Za-z0-9_]+\.)?(?P<column>[A-Za-z0-9_]+)"),
        pattern(r"table (?P<table>[A-Za-z0-9_]+) has no column named (?P<column>[A-Za-z0-9_]+)"),
    ],
});

/// Server error codes of the document engine
static DOCUMENT: Lazy<RuleTable> = Lazy::new(|| RuleTable {
    rules: vec![
        exact("11000", constraint(Unique)),
        exact("11001", constraint(Unique)),
        exact("121", constraint(Check)),
        exact("9", Syntax),
        exact("26", MissingRelation),
        exact("50", Timeout),
        exact("6", ConnectionLost),
        exact("89", ConnectionLost),
        exact("91", ConnectionLost),
    ],
    extractors: vec![
        pattern(r"collection: (?:[^.\s]+\.)?(?P<table>[A-Za-z0-9_]+)"),
        pattern(r"dup key: \{ (?P<column>[A-Za-z0-9_]+):"),
    ],
});

pub(crate) fn for_dialect(dialect: Dialect) -> &'static RuleTable {
    match dialect {
        Dialect::Postgres => &POSTGRES,
        Dialect::MySql => &MYSQL,
        Dialect::Sqlite => &SQLITE,
        Dialect::Document => &DOCUMENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(dialect: Dialect, code: &str, message: &str) -> ErrorClass {
        for_dialect(dialect).class_of(&NativeError::new(code, message))
    }

    #[test]
    fn test_exact_code_before_class_prefix() {
        assert_eq!(class(Dialect::Postgres, "23505", ""), constraint(Unique));
        assert_eq!(class(Dialect::Postgres, "23P01", ""), constraint(Other));
        assert_eq!(class(Dialect::Postgres, "08006", ""), ConnectionLost);
    }

    #[test]
    fn test_sqlite_primary_code_uses_message() {
        assert_eq!(
            class(Dialect::Sqlite, "19", "NOT NULL constraint failed: users.Name"),
            constraint(NotNull)
        );
        assert_eq!(class(Dialect::Sqlite, "19", "constraint failed"), constraint(Other));
        assert_eq!(class(Dialect::Sqlite, "1", "no such table: users"), MissingRelation);
        assert_eq!(class(Dialect::Sqlite, "1", "near \"SELEC\": syntax error"), Syntax);
        assert_eq!(class(Dialect::Sqlite, "1", "something else"), ErrorClass::Unclassified);
    }

    #[test]
    fn test_names_from_messages() {
        let (table, column) = for_dialect(Dialect::Postgres)
            .names_in(r#"null value in column "Name" of relation "users" violates not-null constraint"#);
        assert_eq!(table.as_deref(), Some("users"));
        assert_eq!(column.as_deref(), Some("Name"));

        let (table, column) = for_dialect(Dialect::MySql).names_in("Table 'shop.orders' doesn't exist");
        assert_eq!(table.as_deref(), Some("orders"));
        assert_eq!(column, None);

        let (table, column) =
            for_dialect(Dialect::Sqlite).names_in("UNIQUE constraint failed: users.Email");
        assert_eq!(table.as_deref(), Some("users"));
        assert_eq!(column.as_deref(), Some("Email"));

        let (table, column) = for_dialect(Dialect::Document).names_in(
            r#"E11000 duplicate key error collection: app.users index: Email_1 dup key: { Email: "a@x.com" }"#,
        );
        assert_eq!(table.as_deref(), Some("users"));
        assert_eq!(column.as_deref(), Some("Email"));
    }
}
