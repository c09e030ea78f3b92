use std::collections::HashMap;

use super::types::SortDirection;

/// Fixed page size when `results` is absent or unparseable.
pub const RECORDS_PER_PAGE: i64 = 50;

/// Query keys with reserved meaning; everything else is treated as a
/// column=value equality filter.
pub const CONTROL_KEYS: &[&str] = &["filter", "page", "results", "id", "order", "sort"];

/// Parsed listing parameters. Numeric values fall back to their defaults
/// instead of erroring; equality filters are sorted by key so generated SQL
/// is deterministic.
#[derive(Debug, Clone)]
pub struct ListParams {
    pub id: Option<String>,
    pub filter: Option<String>,
    pub page: i64,
    pub results: i64,
    pub sort: Option<String>,
    pub order: SortDirection,
    pub equals: Vec<(String, String)>,
}

impl ListParams {
    pub fn parse(params: &HashMap<String, String>) -> Self {
        let page = params
            .get("page")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let results = params
            .get("results")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|r| *r >= 1)
            .unwrap_or(RECORDS_PER_PAGE);
        let order = match params.get("order").map(String::as_str) {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        };

        let mut equals: Vec<(String, String)> = params
            .iter()
            .filter(|(k, _)| !CONTROL_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        equals.sort_by(|a, b| a.0.cmp(&b.0));

        Self {
            id: params.get("id").cloned(),
            filter: params.get("filter").cloned(),
            page,
            results,
            sort: params.get("sort").cloned(),
            order,
            equals,
        }
    }

    /// True when something narrows the result set, so the filtered count
    /// query is worth running.
    pub fn narrows(&self) -> bool {
        self.id.is_some() || self.filter.is_some() || !self.equals.is_empty()
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_without_parameters() {
        let p = ListParams::parse(&params(&[]));
        assert_eq!(p.page, 1);
        assert_eq!(p.results, RECORDS_PER_PAGE);
        assert_eq!(p.order, SortDirection::Desc);
        assert!(!p.narrows());
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let p = ListParams::parse(&params(&[("page", "abc"), ("results", "-3")]));
        assert_eq!(p.page, 1);
        assert_eq!(p.results, RECORDS_PER_PAGE);
    }

    #[test]
    fn pagination_offset() {
        let p = ListParams::parse(&params(&[("page", "3"), ("results", "20")]));
        assert_eq!(p.offset(), 40);
        assert_eq!(p.results, 20);
    }

    #[test]
    fn control_keys_do_not_become_equality_filters() {
        let p = ListParams::parse(&params(&[("sort", "created_date"), ("order", "asc"), ("active", "true")]));
        assert_eq!(p.equals, vec![("active".to_string(), "true".to_string())]);
        assert_eq!(p.order, SortDirection::Asc);
        assert!(p.narrows());
    }
}
