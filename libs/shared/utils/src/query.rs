use std::fmt::Display;

use serde::Deserialize;

pub const DEFAULT_PER_PAGE: u32 = 15;
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination and sorting parameters shared by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Builds a PostgREST query string from filters, ordering and a page window.
#[derive(Debug, Clone)]
pub struct ListQuery {
    select: Option<String>,
    filters: Vec<String>,
    order: (String, SortDirection),
    page: u32,
    per_page: u32,
}

impl ListQuery {
    /// `sort_by` values outside `sortable` fall back to `default_sort`.
    pub fn from_params(params: &ListParams, sortable: &[&str], default_sort: &str) -> Self {
        let column = params
            .sort_by
            .as_deref()
            .filter(|c| sortable.contains(c))
            .unwrap_or(default_sort)
            .to_string();

        Self {
            select: None,
            filters: Vec::new(),
            order: (column, SortDirection::parse(params.sort_direction.as_deref())),
            page: params.page.unwrap_or(1).max(1),
            per_page: params
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push(format!(
            "{}=eq.{}",
            column,
            urlencoding::encode(&value.to_string())
        ));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push(format!(
            "{}=gte.{}",
            column,
            urlencoding::encode(&value.to_string())
        ));
        self
    }

    pub fn lt(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push(format!(
            "{}=lt.{}",
            column,
            urlencoding::encode(&value.to_string())
        ));
        self
    }

    pub fn ilike(mut self, column: &str, term: &str) -> Self {
        self.filters
            .push(format!("{}=ilike.*{}*", column, encode_term(term)));
        self
    }

    /// Case-insensitive substring match on any of `columns`.
    pub fn any_ilike(mut self, columns: &[&str], term: &str) -> Self {
        let term = encode_term(term);
        let clauses: Vec<String> = columns
            .iter()
            .map(|c| format!("{}.ilike.*{}*", c, term))
            .collect();
        self.filters.push(format!("or=({})", clauses.join(",")));
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Widened so that any `page` a client sends yields a valid offset.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    pub fn to_path(&self, table: &str) -> String {
        let mut parts = Vec::with_capacity(self.filters.len() + 4);
        parts.push(format!("select={}", self.select.as_deref().unwrap_or("*")));
        parts.extend(self.filters.iter().cloned());
        parts.push(format!("order={}.{}", self.order.0, self.order.1.as_str()));
        parts.push(format!("limit={}", self.per_page));
        parts.push(format!("offset={}", self.offset()));

        format!("/rest/v1/{}?{}", table, parts.join("&"))
    }
}

/// Drops PostgREST operator characters from free text before encoding it.
pub fn encode_term(term: &str) -> String {
    let cleaned: String = term
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '%'))
        .collect();
    urlencoding::encode(&cleaned).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<u32>, per_page: Option<u32>, sort_by: Option<&str>, dir: Option<&str>) -> ListParams {
        ListParams {
            page,
            per_page,
            sort_by: sort_by.map(str::to_string),
            sort_direction: dir.map(str::to_string),
        }
    }

    #[test]
    fn defaults_to_first_page() {
        let query = ListQuery::from_params(&ListParams::default(), &["id"], "id");
        assert_eq!(
            query.to_path("patients"),
            "/rest/v1/patients?select=*&order=id.asc&limit=15&offset=0"
        );
    }

    #[test]
    fn composes_filters_sort_and_window() {
        let query = ListQuery::from_params(
            &params(Some(3), Some(10), Some("last_name"), Some("DESC")),
            &["id", "last_name"],
            "id",
        )
        .ilike("last_name", "dup")
        .eq("sex", "F");

        assert_eq!(
            query.to_path("patients"),
            "/rest/v1/patients?select=*&last_name=ilike.*dup*&sex=eq.F&order=last_name.desc&limit=10&offset=20"
        );
    }

    #[test]
    fn unknown_sort_column_falls_back() {
        let query = ListQuery::from_params(
            &params(None, Some(1000), Some("password"), None),
            &["id"],
            "created_at",
        );
        assert_eq!(query.per_page(), MAX_PER_PAGE);
        assert!(query.to_path("patients").contains("order=created_at.asc"));
    }

    #[test]
    fn free_text_cannot_inject_operators() {
        let query = ListQuery::from_params(&ListParams::default(), &["id"], "id")
            .any_ilike(&["first_name", "last_name"], "a),id.gt.(0");
        let path = query.to_path("patients");
        assert!(path.contains("or=(first_name.ilike.*aid.gt.0*,last_name.ilike.*aid.gt.0*)"));
    }

    #[test]
    fn last_page_number_does_not_overflow_the_offset() {
        let query = ListQuery::from_params(&params(Some(u32::MAX), Some(100), None, None), &["id"], "id");
        assert_eq!(query.offset(), 429_496_729_400);
        assert!(query.to_path("patients").ends_with("limit=100&offset=429496729400"));
    }
}
