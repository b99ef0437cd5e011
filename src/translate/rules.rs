//! The rewrite rules behind the star-to-normalized query translation.
//!
//! Each rule is a pure text-structural transform over one clause family.
//! The rules assume the warehouse's canned query shape: `Fact_Delays`
//! aliased `d`, dimension joins aliased `orig`/`dest_apt`/`apt` and `a`.
//! Queries using other aliases pass through unchanged (or partially
//! changed); arbitrary SQL is out of scope.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::Translator;

/// A named rewrite step. Rules apply in declaration order.
pub(super) struct RewriteRule {
    pub name: &'static str,
    pub apply: fn(&Translator, &str) -> String,
}

pub(super) const RULES: [RewriteRule; 5] = [
    RewriteRule {
        name: "expand_fact_source",
        apply: expand_fact_source,
    },
    RewriteRule {
        name: "strip_dimension_joins",
        apply: strip_dimension_joins,
    },
    RewriteRule {
        name: "rename_measures",
        apply: rename_measures,
    },
    RewriteRule {
        name: "rewrite_carrier_columns",
        apply: rewrite_carrier_columns,
    },
    RewriteRule {
        name: "normalize_group_by",
        apply: normalize_group_by,
    },
];

static FACT_SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)FROM\s+(?:dbo\.)?Fact_Delays\s+d\b").unwrap());

static AIRPORT_JOIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*INNER\s+JOIN\s+dbo\.Dim_Airport\s+(?:orig|dest_apt|apt)\s+ON\s+[^\n]+")
        .unwrap()
});

static AIRLINE_JOIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*INNER\s+JOIN\s+dbo\.Dim_Airline\s+a\s+ON\s+[^\n]+").unwrap()
});

static CARRIER_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\ba\.carrier_code\b").unwrap());

static CARRIER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\ba\.carrier_name\b").unwrap());

static GROUP_BY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)GROUP\s+BY").unwrap());

static GROUP_BY_TERMINATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:HAVING|ORDER\s+BY)\b").unwrap());

static AS_CARRIER_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+AS\s+carrier_(?:code|name)\b").unwrap());

/// Replace the fact-table source with a union-all of the per-period tables,
/// each filtered to non-cancelled rows, keeping the `d` alias.
fn expand_fact_source(translator: &Translator, query: &str) -> String {
    let unions = translator
        .period_tables()
        .iter()
        .map(|table| format!("    SELECT * FROM {table} WHERE cancelled = 0"))
        .collect::<Vec<_>>()
        .join("\n    UNION ALL\n");
    let replacement = format!("FROM (\n{unions}\n) d");
    FACT_SOURCE.replace_all(query, replacement.as_str()).into_owned()
}

/// Remove the three dimension joins; their attributes are available on the
/// unioned source directly.
fn strip_dimension_joins(_: &Translator, query: &str) -> String {
    let query = AIRPORT_JOIN.replace_all(query, "");
    AIRLINE_JOIN.replace_all(&query, "").into_owned()
}

/// Rename delay and airport columns to their normalized-schema equivalents.
fn rename_measures(_: &Translator, query: &str) -> String {
    query
        .replace("d.arrival_delay", "d.arr_delay")
        .replace("d.departure_delay", "d.dep_delay")
        .replace("d.is_delayed", "CASE WHEN d.arr_delay > 0 THEN 1 ELSE 0 END")
        .replace("orig.airport_code", "d.origin")
        // dest_apt before apt: the latter is a suffix of the former.
        .replace("dest_apt.airport_code", "d.dest")
        .replace("apt.airport_code", "d.origin")
}

/// Map carrier references from the removed dimension onto the normalized
/// carrier column, aliased back to the original name so downstream column
/// references stay valid.
fn rewrite_carrier_columns(_: &Translator, query: &str) -> String {
    let query = CARRIER_CODE.replace_all(query, "d.op_unique_carrier AS carrier_code");
    CARRIER_NAME
        .replace_all(&query, "d.op_unique_carrier AS carrier_name")
        .into_owned()
}

/// Clean up the GROUP BY list: drop the `AS carrier_*` aliases the carrier
/// rewrite introduced, then deduplicate columns (case- and
/// whitespace-insensitive, first occurrence wins, order preserved) since
/// carrier code and name now collapse to the same physical column.
fn normalize_group_by(_: &Translator, query: &str) -> String {
    let Some(group_by) = GROUP_BY.find(query) else {
        return query.to_string();
    };

    let head = &query[..group_by.end()];
    let tail = &query[group_by.end()..];
    let (columns_raw, rest) = match GROUP_BY_TERMINATOR.find(tail) {
        Some(terminator) => (&tail[..terminator.start()], &tail[terminator.start()..]),
        None => (tail, ""),
    };

    let stripped = AS_CARRIER_ALIAS.replace_all(columns_raw, "");
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns: Vec<&str> = Vec::new();
    for column in stripped.split(',') {
        let column = column.trim();
        if column.is_empty() {
            continue;
        }
        let normalized: String = column
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if seen.insert(normalized) {
            columns.push(column);
        }
    }

    let mut out = String::with_capacity(query.len());
    out.push_str(head);
    out.push(' ');
    out.push_str(&columns.join(", "));
    if !rest.is_empty() {
        out.push('\n');
        out.push_str(rest);
    }
    out
}
