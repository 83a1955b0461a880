//! Filtering requests: paging, sorting and predicates.
//!
//! Two request flavours reach the engine. [`RawFilteringRequest`] is parsed
//! from the query-string grammar:
//!
//! ```text
//! page=<int>&limit=<int>&sortBy=<field> <asc|desc>&<field>[<operator>]=<value>
//! ```
//!
//! Typed requests are plain serde structs that implement
//! [`FilteringRequest`] directly.

use std::sync::LazyLock;

use regex::Regex;
use sea_orm::Order;

use crate::{EngineError, ResultEngine};

use super::operators::FilteringOperator;

pub const DEFAULT_PAGE_NUMBER: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page size and offset the database binds (a signed 64-bit integer).
pub const MAX_ROWS: u64 = i64::MAX as u64;

/// Query parameters that are never treated as filters.
pub const RESERVED_PARAMETERS: [&str; 6] =
    ["sortBy", "limit", "page", "pageNumber", "pageSize", "sortOrder"];

static FILTER_KEY: LazyLock<Regex> = LazyLock::new(|| match Regex::new(
    r"^([a-zA-Z]+)\[([a-z]+)\]$",
) {
    Ok(regex) => regex,
    Err(err) => panic!("invalid filter key pattern: {err}"),
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive `asc` / `desc`.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    pub fn order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

impl From<api_types::SortOrder> for SortDirection {
    fn from(value: api_types::SortOrder) -> Self {
        match value {
            api_types::SortOrder::Asc => Self::Asc,
            api_types::SortOrder::Desc => Self::Desc,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortRequest {
    pub field: String,
    pub direction: SortDirection,
}

/// Validated paging information. `page_number` is 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: u64,
    pub page_size: u64,
    pub sort: Option<SortRequest>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
        }
    }
}

impl PageRequest {
    pub fn new(page_number: u64, page_size: u64, sort: Option<SortRequest>) -> ResultEngine<Self> {
        if page_number == 0 {
            return Err(EngineError::Validation(
                "Page number must be a positive integer".to_string(),
            ));
        }
        if page_size == 0 {
            return Err(EngineError::Validation(
                "Page size must be a positive integer".to_string(),
            ));
        }
        if page_size > MAX_ROWS {
            return Err(EngineError::Validation(format!(
                "Page size must not exceed {MAX_ROWS}"
            )));
        }
        let offset = (page_number - 1).checked_mul(page_size);
        if offset.is_none_or(|offset| offset > MAX_ROWS) {
            return Err(EngineError::Validation(format!(
                "Page {page_number} of size {page_size} is out of range"
            )));
        }
        Ok(Self {
            page_number,
            page_size,
            sort,
        })
    }

    /// Rows to skip before the requested page. Never above [`MAX_ROWS`]
    /// for a request built through [`PageRequest::new`].
    pub fn offset(&self) -> u64 {
        self.page_number
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .min(MAX_ROWS)
    }
}

/// A single `<field>[<operator>]=<value>` predicate.
///
/// Single-valued operators always carry exactly one value. Multi-valued
/// operators carry the comma separated values with blanks dropped, so
/// `status[in]=` yields an empty list, which filters nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Predicate {
    pub field: String,
    pub operator: FilteringOperator,
    pub values: Vec<String>,
}

impl Predicate {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// What the query executor needs from a request, whatever its flavour.
pub trait FilteringRequest {
    fn page_request(&self) -> ResultEngine<PageRequest>;

    /// Predicates parsed from the string grammar. Typed requests carry their
    /// filters in their own fields and keep the default.
    fn predicates(&self) -> &[Predicate] {
        &[]
    }
}

impl FilteringRequest for PageRequest {
    fn page_request(&self) -> ResultEngine<PageRequest> {
        Ok(self.clone())
    }
}

impl FilteringRequest for api_types::expense::ExpensesQuery {
    fn page_request(&self) -> ResultEngine<PageRequest> {
        let sort = self.sort_by.as_ref().map(|field| SortRequest {
            field: field.clone(),
            direction: self.sort_order.unwrap_or_default().into(),
        });
        PageRequest::new(
            self.page_number.unwrap_or(DEFAULT_PAGE_NUMBER),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            sort,
        )
    }
}

/// A request parsed from the query-string grammar.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawFilteringRequest {
    page: PageRequest,
    predicates: Vec<Predicate>,
}

impl RawFilteringRequest {
    /// Parse raw query parameters. Keys may repeat; every value of a filter
    /// key produces its own predicate.
    pub fn parse<K, V>(params: impl IntoIterator<Item = (K, V)>) -> ResultEngine<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut page: Option<String> = None;
        let mut limit: Option<String> = None;
        let mut sort_by: Option<String> = None;
        let mut predicates = Vec::new();

        for (key, value) in params {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "page" => set_once(&mut page, key, value)?,
                "limit" => set_once(&mut limit, key, value)?,
                "sortBy" => set_once(&mut sort_by, key, value)?,
                _ if RESERVED_PARAMETERS.contains(&key) => {}
                _ => predicates.push(parse_predicate(key, value)?),
            }
        }

        let page_number = parse_positive("page", page.as_deref())?.unwrap_or(DEFAULT_PAGE_NUMBER);
        let page_size = parse_positive("limit", limit.as_deref())?.unwrap_or(DEFAULT_PAGE_SIZE);
        let sort = sort_by.as_deref().map(parse_sort).transpose()?;

        Ok(Self {
            page: PageRequest::new(page_number, page_size, sort)?,
            predicates,
        })
    }

    pub fn page(&self) -> &PageRequest {
        &self.page
    }

    /// First value of the first `field[operator]` predicate, if any.
    pub fn value(&self, field: &str, operator: FilteringOperator) -> Option<&str> {
        self.predicates
            .iter()
            .find(|p| p.field == field && p.operator == operator)
            .and_then(Predicate::value)
    }

    /// Every value of every `field[operator]` predicate.
    pub fn values(&self, field: &str, operator: FilteringOperator) -> Vec<&str> {
        self.predicates
            .iter()
            .filter(|p| p.field == field && p.operator == operator)
            .flat_map(|p| p.values.iter().map(String::as_str))
            .collect()
    }
}

impl FilteringRequest for RawFilteringRequest {
    fn page_request(&self) -> ResultEngine<PageRequest> {
        Ok(self.page.clone())
    }

    fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}

fn set_once(slot: &mut Option<String>, key: &str, value: &str) -> ResultEngine<()> {
    if slot.is_some() {
        return Err(EngineError::Validation(format!(
            "Only a single '{key}' parameter is supported"
        )));
    }
    *slot = Some(value.to_string());
    Ok(())
}

fn parse_positive(key: &str, value: Option<&str>) -> ResultEngine<Option<u64>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(Some(parsed)),
        _ => Err(EngineError::Validation(format!(
            "Invalid '{key}' parameter value: '{value}'"
        ))),
    }
}

fn parse_sort(expression: &str) -> ResultEngine<SortRequest> {
    let invalid = || EngineError::Validation(format!("Invalid sorting expression: '{expression}'"));
    let tokens: Vec<&str> = expression.split_whitespace().collect();
    let [field, direction] = tokens.as_slice() else {
        return Err(invalid());
    };
    let direction = SortDirection::parse(direction).ok_or_else(invalid)?;
    Ok(SortRequest {
        field: field.to_string(),
        direction,
    })
}

fn parse_predicate(key: &str, value: &str) -> ResultEngine<Predicate> {
    let captures = FILTER_KEY.captures(key).ok_or_else(|| {
        EngineError::Validation(format!("Invalid filter expression: '{key}'"))
    })?;
    let field = &captures[1];
    let token = &captures[2];
    let operator = FilteringOperator::lookup(token).ok_or_else(|| {
        EngineError::Validation(format!("Unsupported filter operator: '{token}' in '{key}'"))
    })?;

    let values = if operator.is_multi_valued() {
        value
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
            .collect()
    } else {
        vec![value.to_string()]
    };

    Ok(Predicate {
        field: field.to_string(),
        operator,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(params: &[(&str, &str)]) -> ResultEngine<RawFilteringRequest> {
        RawFilteringRequest::parse(params.iter().copied())
    }

    fn validation(message: &str) -> EngineError {
        EngineError::Validation(message.to_string())
    }

    #[test]
    fn defaults_apply_when_paging_is_absent() {
        let request = parse(&[]).unwrap();
        assert_eq!(request.page(), &PageRequest::default());
        assert_eq!(request.page().page_number, 1);
        assert_eq!(request.page().page_size, 10);
        assert!(request.predicates().is_empty());
    }

    #[test]
    fn page_limit_and_sort_are_parsed() {
        let request = parse(&[("page", "2"), ("limit", "5"), ("sortBy", "dateIssued DESC")]).unwrap();
        assert_eq!(
            request.page(),
            &PageRequest {
                page_number: 2,
                page_size: 5,
                sort: Some(SortRequest {
                    field: "dateIssued".to_string(),
                    direction: SortDirection::Desc,
                }),
            }
        );
        assert_eq!(request.page().offset(), 5);
    }

    #[test]
    fn non_integer_or_zero_page_is_rejected() {
        assert_eq!(
            parse(&[("page", "two")]).unwrap_err(),
            validation("Invalid 'page' parameter value: 'two'")
        );
        assert_eq!(
            parse(&[("limit", "0")]).unwrap_err(),
            validation("Invalid 'limit' parameter value: '0'")
        );
        assert_eq!(
            parse(&[("page", "-1")]).unwrap_err(),
            validation("Invalid 'page' parameter value: '-1'")
        );
    }

    #[test]
    fn paging_beyond_the_database_range_is_rejected() {
        assert_eq!(
            parse(&[("limit", "18446744073709551615")]).unwrap_err(),
            validation("Page size must not exceed 9223372036854775807")
        );
        assert_eq!(
            parse(&[("page", "9223372036854775807"), ("limit", "10")]).unwrap_err(),
            validation("Page 9223372036854775807 of size 10 is out of range")
        );
        assert_eq!(
            parse(&[("page", "18446744073709551615")]).unwrap_err(),
            validation("Page 18446744073709551615 of size 10 is out of range")
        );

        let request = parse(&[("page", "9223372036854775807"), ("limit", "1")]).unwrap();
        assert_eq!(request.page().offset(), 9223372036854775806);
        let request = parse(&[("limit", "9223372036854775807")]).unwrap();
        assert_eq!(request.page().offset(), 0);
    }

    #[test]
    fn repeated_single_valued_parameters_are_rejected() {
        assert_eq!(
            parse(&[("page", "1"), ("page", "2")]).unwrap_err(),
            validation("Only a single 'page' parameter is supported")
        );
        assert_eq!(
            parse(&[("sortBy", "name asc"), ("sortBy", "name desc")]).unwrap_err(),
            validation("Only a single 'sortBy' parameter is supported")
        );
    }

    #[test]
    fn malformed_sort_expressions_cite_the_input() {
        for expression in ["name", "name up", "name asc extra", ""] {
            assert_eq!(
                parse(&[("sortBy", expression)]).unwrap_err(),
                validation(&format!("Invalid sorting expression: '{expression}'"))
            );
        }
    }

    #[test]
    fn filter_keys_become_predicates() {
        let request = parse(&[
            ("status[in]", "DRAFT, SENT"),
            ("amount[goe]", "100"),
            ("amount[loe]", "500"),
        ])
        .unwrap();
        assert_eq!(
            request.predicates(),
            &[
                Predicate {
                    field: "status".to_string(),
                    operator: FilteringOperator::In,
                    values: vec!["DRAFT".to_string(), "SENT".to_string()],
                },
                Predicate {
                    field: "amount".to_string(),
                    operator: FilteringOperator::Goe,
                    values: vec!["100".to_string()],
                },
                Predicate {
                    field: "amount".to_string(),
                    operator: FilteringOperator::Loe,
                    values: vec!["500".to_string()],
                },
            ]
        );
        assert_eq!(request.value("amount", FilteringOperator::Goe), Some("100"));
        assert_eq!(request.value("amount", FilteringOperator::Eq), None);
    }

    #[test]
    fn repeated_filter_keys_produce_one_predicate_each() {
        let request = parse(&[("status[in]", "DRAFT"), ("status[in]", "PAID,SENT")]).unwrap();
        assert_eq!(request.predicates().len(), 2);
        assert_eq!(
            request.values("status", FilteringOperator::In),
            vec!["DRAFT", "PAID", "SENT"]
        );
    }

    #[test]
    fn empty_in_list_yields_empty_predicate() {
        let request = parse(&[("status[in]", " , ")]).unwrap();
        assert!(request.predicates()[0].is_empty());
    }

    #[test]
    fn reserved_typed_parameters_are_ignored() {
        let request =
            parse(&[("pageNumber", "3"), ("pageSize", "7"), ("sortOrder", "DESC")]).unwrap();
        assert_eq!(request.page(), &PageRequest::default());
        assert!(request.predicates().is_empty());
    }

    #[test]
    fn malformed_filter_keys_and_unknown_operators_are_rejected() {
        assert_eq!(
            parse(&[("status", "DRAFT")]).unwrap_err(),
            validation("Invalid filter expression: 'status'")
        );
        assert_eq!(
            parse(&[("status[IN]", "DRAFT")]).unwrap_err(),
            validation("Invalid filter expression: 'status[IN]'")
        );
        assert_eq!(
            parse(&[("date_issued[eq]", "2024-01-01")]).unwrap_err(),
            validation("Invalid filter expression: 'date_issued[eq]'")
        );
        assert_eq!(
            parse(&[("amount[lt]", "10")]).unwrap_err(),
            validation("Unsupported filter operator: 'lt' in 'amount[lt]'")
        );
    }

    #[test]
    fn typed_request_defaults_and_validates_paging() {
        let query = api_types::expense::ExpensesQuery {
            sort_by: Some("datePaid".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.page_request().unwrap(),
            PageRequest {
                page_number: 1,
                page_size: 10,
                sort: Some(SortRequest {
                    field: "datePaid".to_string(),
                    direction: SortDirection::Asc,
                }),
            }
        );

        let query = api_types::expense::ExpensesQuery {
            page_number: Some(0),
            ..Default::default()
        };
        assert_eq!(
            query.page_request().unwrap_err(),
            validation("Page number must be a positive integer")
        );

        let query = api_types::expense::ExpensesQuery {
            page_number: Some(2),
            page_size: Some(u64::MAX),
            ..Default::default()
        };
        assert_eq!(
            query.page_request().unwrap_err(),
            validation("Page size must not exceed 9223372036854775807")
        );
    }
}
