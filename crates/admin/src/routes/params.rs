//! Index table query parameters.
//!
//! Tables read `search`, `sort`, `direction`, `page`, `filter_{key}` and
//! repeated `hidden` parameters. Relation tables on an edit page use the
//! same names behind a `{relation}_` prefix so several tables can share one
//! query string.

use url::form_urlencoded;

use crate::components::data_table::DataTableConfig;
use crate::db::ListQuery;

const FILTER_PREFIX: &str = "filter_";

/// Parsed table parameters, kept as text so links can round-trip them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    prefix: String,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub descending: bool,
    pub page: u32,
    pub filters: Vec<(String, String)>,
    pub hidden: Vec<String>,
}

impl ListParams {
    /// Read the parameters carrying `prefix` from raw query pairs.
    #[must_use]
    pub fn parse(pairs: &[(String, String)], prefix: &str) -> Self {
        let mut params = Self {
            prefix: prefix.to_string(),
            page: 1,
            ..Self::default()
        };
        for (key, value) in pairs {
            let Some(key) = key.strip_prefix(prefix) else {
                continue;
            };
            let value = value.trim();
            match key {
                "search" => params.search = Some(value.to_string()).filter(|v| !v.is_empty()),
                "sort" => params.sort = Some(value.to_string()).filter(|v| !v.is_empty()),
                "direction" => params.descending = value.eq_ignore_ascii_case("desc"),
                "page" => params.page = value.parse().unwrap_or(1).max(1),
                "hidden" if !value.is_empty() => params.hidden.push(value.to_string()),
                other => {
                    if let Some(filter) = other.strip_prefix(FILTER_PREFIX)
                        && !value.is_empty()
                    {
                        params.filters.push((filter.to_string(), value.to_string()));
                    }
                }
            }
        }
        params
    }

    /// Repository query for `table`, with the table's default sort applied
    /// when no sort was requested.
    #[must_use]
    pub fn to_query(&self, table: &DataTableConfig, per_page: u32) -> ListQuery {
        let (sort, descending) = match &self.sort {
            Some(sort) => (Some(sort.clone()), self.descending),
            None => (table.default_sort.clone(), table.default_sort_desc),
        };
        ListQuery {
            search: self.search.clone(),
            sort,
            descending,
            filters: self.filters.clone(),
            page: self.page,
            per_page,
        }
    }

    /// Name of a parameter under this table's prefix.
    #[must_use]
    pub fn key(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    #[must_use]
    pub fn filter_key(&self, filter: &str) -> String {
        self.key(&format!("{FILTER_PREFIX}{filter}"))
    }

    /// Selected value of a filter.
    #[must_use]
    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Query string (without `?`) for these parameters.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if let Some(search) = &self.search {
            out.append_pair(&self.key("search"), search);
        }
        if let Some(sort) = &self.sort {
            out.append_pair(&self.key("sort"), sort);
            out.append_pair(
                &self.key("direction"),
                if self.descending { "desc" } else { "asc" },
            );
        }
        for (key, value) in &self.filters {
            out.append_pair(&self.filter_key(key), value);
        }
        for hidden in &self.hidden {
            out.append_pair(&self.key("hidden"), hidden);
        }
        if self.page > 1 {
            out.append_pair(&self.key("page"), &self.page.to_string());
        }
        out.finish()
    }

    /// `base` with these parameters appended.
    #[must_use]
    pub fn url(&self, base: &str) -> String {
        let query = self.query_string();
        if query.is_empty() {
            base.to_string()
        } else {
            format!("{base}?{query}")
        }
    }

    /// Parameters for a different page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Parameters sorted by `key`; sorting by the current column again
    /// flips the direction. Changing the sort returns to the first page.
    #[must_use]
    pub fn sorted_by(&self, key: &str) -> Self {
        let descending = self.sort.as_deref() == Some(key) && !self.descending;
        Self {
            sort: Some(key.to_string()),
            descending,
            page: 1,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_reads_prefixed_keys_only() {
        let raw = pairs(&[
            ("search", "acme"),
            ("products_search", "shoe"),
            ("products_page", "3"),
            ("products_filter_is_visible", "true"),
            ("products_filter_type", ""),
        ]);
        let params = ListParams::parse(&raw, "products_");
        assert_eq!(params.search.as_deref(), Some("shoe"));
        assert_eq!(params.page, 3);
        assert_eq!(params.filter("is_visible"), Some("true"));
        assert_eq!(params.filter("type"), None);
    }

    #[test]
    fn test_bad_page_falls_back_to_first() {
        let params = ListParams::parse(&pairs(&[("page", "zero"), ("direction", "DESC")]), "");
        assert_eq!(params.page, 1);
        assert!(params.descending);
    }

    #[test]
    fn test_sorted_by_toggles_direction() {
        let params = ListParams::parse(&pairs(&[("page", "4")]), "");
        let by_name = params.sorted_by("name");
        assert_eq!(by_name.sort.as_deref(), Some("name"));
        assert!(!by_name.descending);
        assert_eq!(by_name.page, 1);
        assert!(by_name.sorted_by("name").descending);
        assert!(!by_name.sorted_by("price").descending);
    }

    #[test]
    fn test_url_round_trips() {
        let raw = pairs(&[
            ("search", "red shoe"),
            ("sort", "price"),
            ("direction", "desc"),
            ("filter_type", "deliverable"),
            ("page", "2"),
        ]);
        let params = ListParams::parse(&raw, "");
        let url = params.url("/products");
        assert_eq!(
            url,
            "/products?search=red+shoe&sort=price&direction=desc&filter_type=deliverable&page=2"
        );
        let reparsed: Vec<(String, String)> =
            form_urlencoded::parse(url.split_once('?').map_or("", |(_, q)| q).as_bytes())
                .into_owned()
                .collect();
        assert_eq!(ListParams::parse(&reparsed, ""), params);
    }

    #[test]
    fn test_to_query_uses_default_sort() {
        let table = DataTableConfig::new("orders").default_sort("created_at", true);
        let query = ListParams::parse(&[], "").to_query(&table, 25);
        assert_eq!(query.sort.as_deref(), Some("created_at"));
        assert!(query.descending);
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 25);
    }
}
