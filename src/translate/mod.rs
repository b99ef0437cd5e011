//! Star-to-normalized query translation.
//!
//! The analytics frontend issues SQL written against the star schema
//! (`Fact_Delays` plus the date, airline and airport dimensions). This
//! module rewrites such a query into an equivalent one over the normalized
//! per-period tables, applying a fixed sequence of structural rules:
//! expand the fact source into a union-all of period tables, strip the
//! dimension joins, rename measures, map carrier columns onto the
//! normalized carrier code, and finally normalize the GROUP BY list.
//!
//! Translation is pure text rewriting with no warehouse access, and it is
//! deterministic: the same input always yields the same output.

mod rules;

use tracing::debug;

/// Default per-period table names, matching the default source periods.
pub const DEFAULT_PERIOD_TABLES: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

/// Rewrites star-schema SQL into normalized-schema SQL.
#[derive(Debug, Clone)]
pub struct Translator {
    period_tables: Vec<String>,
}

impl Translator {
    pub fn new(period_tables: Vec<String>) -> Self {
        Self { period_tables }
    }

    /// A translator over the four standard quarterly tables.
    pub fn with_default_periods() -> Self {
        Self::new(DEFAULT_PERIOD_TABLES.iter().map(|p| p.to_string()).collect())
    }

    pub fn period_tables(&self) -> &[String] {
        &self.period_tables
    }

    /// Apply every rewrite rule in order and return the rewritten query.
    pub fn translate(&self, query: &str) -> String {
        let mut current = query.to_string();
        for rule in &rules::RULES {
            let next = (rule.apply)(self, &current);
            if next != current {
                debug!(rule = rule.name, "Applied rewrite rule");
            }
            current = next;
        }
        current
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::with_default_periods()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_is_idempotent() {
        let translator = Translator::with_default_periods();
        let query = "SELECT a.carrier_code, AVG(d.arrival_delay) AS avg_delay\n\
                     FROM dbo.Fact_Delays d\n\
                     INNER JOIN dbo.Dim_Airline a ON d.airline_key = a.airline_key\n\
                     GROUP BY a.carrier_code\n\
                     ORDER BY avg_delay DESC";
        let once = translator.translate(query);
        let twice = translator.translate(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_untranslatable_query_passes_through() {
        let translator = Translator::with_default_periods();
        let query = "SELECT 1";
        assert_eq!(translator.translate(query), query);
    }

    #[test]
    fn test_carrier_group_by_collapses_to_one_column() {
        let translator = Translator::with_default_periods();
        let query = "SELECT a.carrier_code, a.carrier_name, COUNT(*) AS flights\n\
                     FROM dbo.Fact_Delays d\n\
                     INNER JOIN dbo.Dim_Airline a ON d.airline_key = a.airline_key\n\
                     GROUP BY a.carrier_code, a.carrier_name\n\
                     ORDER BY flights DESC";
        let out = translator.translate(query);

        assert!(!out.contains("INNER JOIN"));
        assert!(out.contains("d.op_unique_carrier AS carrier_code"));
        assert!(out.contains("d.op_unique_carrier AS carrier_name"));
        // The GROUP BY keeps the physical column exactly once, unaliased.
        assert!(out.contains("GROUP BY d.op_unique_carrier\n"));
        assert!(!out.contains("GROUP BY d.op_unique_carrier AS"));
        assert!(out.contains("ORDER BY flights DESC"));
    }
}
