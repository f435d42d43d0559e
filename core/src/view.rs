//! Filtered, sorted and paginated view over the cache.
//!
//! # Design
//! `derive_view` is a pure function of the records and a `ViewQuery`. It
//! borrows the records and never mutates them, so the host can call it on
//! every input change and on every cache event without coordination.

use std::cmp::Ordering;

use crate::record::UserRecord;

pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CompanyFilter {
    #[default]
    All,
    Named(String),
}

impl CompanyFilter {
    fn matches(&self, record: &UserRecord) -> bool {
        match self {
            CompanyFilter::All => true,
            CompanyFilter::Named(name) => record.company.name == *name,
        }
    }
}

/// Everything the list screen lets the user adjust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub company: CompanyFilter,
    pub sort: SortOrder,
    /// 1-based; out-of-range values are clamped when the view is derived.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl ViewQuery {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            search: String::new(),
            company: CompanyFilter::All,
            sort: SortOrder::Asc,
            page: 1,
            page_size,
        }
    }

    /// Changing the search jumps back to the first page.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    /// Changing the company filter jumps back to the first page.
    pub fn set_company(&mut self, company: CompanyFilter) {
        self.company = company;
        self.page = 1;
    }

    pub fn toggle_sort(&mut self) {
        self.sort = self.sort.toggled();
    }

    /// Step forward, never past `page_count`.
    pub fn next_page(&mut self, page_count: usize) {
        self.page = (self.page.max(1) + 1).min(page_count.max(1));
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }
}

/// One page of the derived list plus the numbers the pager needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView<'a> {
    pub rows: Vec<&'a UserRecord>,
    /// Matching records across all pages.
    pub total: usize,
    /// Effective page after clamping.
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
}

impl UserView<'_> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }

    /// 1-based inclusive range of the rows on this page, `(0, 0)` when
    /// nothing matches.
    pub fn showing(&self) -> (usize, usize) {
        if self.rows.is_empty() {
            return (0, 0);
        }
        let start = (self.page - 1) * self.page_size + 1;
        (start, start + self.rows.len() - 1)
    }
}

pub fn derive_view<'a>(records: &'a [UserRecord], query: &ViewQuery) -> UserView<'a> {
    let needle = query.search.trim().to_lowercase();
    let mut matching: Vec<&UserRecord> = records
        .iter()
        .filter(|r| needle.is_empty() || r.name.to_lowercase().contains(&needle))
        .filter(|r| query.company.matches(r))
        .collect();

    // sort_by is stable, so equal emails keep cache order in both directions.
    matching.sort_by(|a, b| {
        let ordering = compare_email(a, b);
        match query.sort {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let page_size = query.page_size.max(1);
    let total = matching.len();
    let page_count = total.div_ceil(page_size).max(1);
    let page = query.page.clamp(1, page_count);
    let rows = matching
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    UserView {
        rows,
        total,
        page,
        page_count,
        page_size,
    }
}

fn compare_email(a: &UserRecord, b: &UserRecord) -> Ordering {
    a.email.to_lowercase().cmp(&b.email.to_lowercase())
}

/// Distinct non-empty company names in cache order, for the filter options.
pub fn companies(records: &[UserRecord]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for record in records {
        let name = record.company_name();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordId;
    use crate::types::Company;

    fn record(id: u64, name: &str, email: &str, company: &str) -> UserRecord {
        UserRecord {
            id: RecordId::Committed(id),
            name: name.to_string(),
            email: email.to_string(),
            phone: String::new(),
            company: Company::named(company),
            address: None,
            username: None,
            website: None,
        }
    }

    fn sample() -> Vec<UserRecord> {
        vec![
            record(1, "Leanne Graham", "Sincere@april.biz", "Romaguera-Crona"),
            record(2, "Ervin Howell", "Shanna@melissa.tv", "Deckow-Crist"),
            record(3, "Clementine Bauch", "Nathan@yesenia.net", "Romaguera-Jacobson"),
            record(4, "Patricia Lebsack", "Julianne.OConner@kory.org", "Robel-Corkery"),
            record(5, "Chelsey Dietrich", "Lucio_Hettinger@annie.ca", "Keebler LLC"),
            record(6, "Mrs. Dennis Schulist", "Karley_Dach@jasper.info", "Considine-Lockman"),
            record(7, "Kurtis Weissnat", "Telly.Hoeger@billy.biz", "Johns Group"),
        ]
    }

    fn ids(view: &UserView<'_>) -> Vec<RecordId> {
        view.rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn search_is_case_insensitive_and_trimmed() {
        let records = sample();
        let mut query = ViewQuery::default();
        query.set_search("  GRAHAM ");
        let view = derive_view(&records, &query);
        assert_eq!(ids(&view), vec![RecordId::Committed(1)]);
    }

    #[test]
    fn company_filter_is_exact() {
        let records = sample();
        let mut query = ViewQuery::default();
        query.set_company(CompanyFilter::Named("Romaguera".to_string()));
        assert_eq!(derive_view(&records, &query).total, 0);
        query.set_company(CompanyFilter::Named("Deckow-Crist".to_string()));
        assert_eq!(ids(&derive_view(&records, &query)), vec![RecordId::Committed(2)]);
    }

    #[test]
    fn sorts_by_email_ignoring_case() {
        let records = sample();
        let query = ViewQuery::with_page_size(10);
        let emails: Vec<&str> = derive_view(&records, &query)
            .rows
            .iter()
            .map(|r| r.email.as_str())
            .collect();
        assert_eq!(
            emails,
            vec![
                "Julianne.OConner@kory.org",
                "Karley_Dach@jasper.info",
                "Lucio_Hettinger@annie.ca",
                "Nathan@yesenia.net",
                "Shanna@melissa.tv",
                "Sincere@april.biz",
                "Telly.Hoeger@billy.biz",
            ]
        );
    }

    #[test]
    fn equal_emails_keep_cache_order_both_ways() {
        let records = vec![
            record(1, "A", "same@x.io", "C"),
            record(2, "B", "SAME@x.io", "C"),
            record(3, "C", "a@x.io", "C"),
        ];
        let mut query = ViewQuery::default();
        assert_eq!(
            ids(&derive_view(&records, &query)),
            vec![RecordId::Committed(3), RecordId::Committed(1), RecordId::Committed(2)]
        );
        query.toggle_sort();
        assert_eq!(
            ids(&derive_view(&records, &query)),
            vec![RecordId::Committed(1), RecordId::Committed(2), RecordId::Committed(3)]
        );
    }

    #[test]
    fn pages_slice_the_sorted_list() {
        let records = sample();
        let mut query = ViewQuery::default();
        query.page = 2;
        let view = derive_view(&records, &query);
        assert_eq!(view.total, 7);
        assert_eq!(view.page_count, 2);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.showing(), (6, 7));
        assert!(view.has_prev());
        assert!(!view.has_next());
    }

    #[test]
    fn out_of_range_pages_clamp() {
        let records = sample();
        let first = derive_view(&records, &ViewQuery::default());
        let mut query = ViewQuery::default();
        query.page = 0;
        assert_eq!(derive_view(&records, &query), first);

        query.page = 2;
        let last = derive_view(&records, &query);
        query.page = 99;
        assert_eq!(derive_view(&records, &query), last);
    }

    #[test]
    fn empty_result_still_has_one_page() {
        let records = sample();
        let mut query = ViewQuery::default();
        query.set_search("zzz");
        query.page = 3;
        let view = derive_view(&records, &query);
        assert!(view.rows.is_empty());
        assert_eq!(view.page, 1);
        assert_eq!(view.page_count, 1);
        assert_eq!(view.showing(), (0, 0));
    }

    #[test]
    fn zero_page_size_behaves_like_one() {
        let records = sample();
        let view = derive_view(&records, &ViewQuery::with_page_size(0));
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.page_count, 7);
    }

    #[test]
    fn query_navigation_respects_bounds() {
        let mut query = ViewQuery::default();
        query.prev_page();
        assert_eq!(query.page, 1);
        query.next_page(2);
        query.next_page(2);
        assert_eq!(query.page, 2);
        query.set_search("x");
        assert_eq!(query.page, 1);
    }

    #[test]
    fn companies_are_distinct_in_cache_order() {
        let mut records = sample();
        records.push(record(8, "Nicholas Runolfsdottir V", "Sherwood@rosamond.me", "Deckow-Crist"));
        records.push(record(9, "No Company", "none@x.io", ""));
        let names = companies(&records);
        assert_eq!(names.len(), 7);
        assert_eq!(names[1], "Deckow-Crist");
        assert!(!names.iter().any(|n| n.is_empty()));
    }
}
