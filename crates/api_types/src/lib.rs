use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sort direction accepted by the typed filtering requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

pub mod page {
    use super::*;

    /// Uniform envelope returned by every list endpoint.
    ///
    /// `page_number` is 1-based and echoes the effective (defaulted) request
    /// page number.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ApiPage<T> {
        pub page_number: u64,
        pub page_size: u64,
        pub total_elements: u64,
        pub data: Vec<T>,
    }
}

pub mod customer {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CustomerView {
        pub id: Uuid,
        pub name: String,
    }
}

pub mod invoice {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum InvoiceStatus {
        Draft,
        Sent,
        Paid,
        Overdue,
        Cancelled,
    }

    impl InvoiceStatus {
        pub const ALL: [Self; 5] = [
            Self::Draft,
            Self::Sent,
            Self::Paid,
            Self::Overdue,
            Self::Cancelled,
        ];

        /// Stored and wire representation.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Draft => "DRAFT",
                Self::Sent => "SENT",
                Self::Paid => "PAID",
                Self::Overdue => "OVERDUE",
                Self::Cancelled => "CANCELLED",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InvoiceView {
        pub id: Uuid,
        pub customer_id: Uuid,
        pub title: String,
        pub status: InvoiceStatus,
        pub date_issued: NaiveDate,
        pub due_date: NaiveDate,
        pub amount_minor: i64,
        pub currency: String,
        pub notes: Option<String>,
    }
}

pub mod expense {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum ExpenseStatus {
        Finalized,
        PendingConversion,
        PendingConversionForTaxation,
    }

    impl ExpenseStatus {
        pub const ALL: [Self; 3] = [
            Self::Finalized,
            Self::PendingConversion,
            Self::PendingConversionForTaxation,
        ];

        pub fn as_str(self) -> &'static str {
            match self {
                Self::Finalized => "FINALIZED",
                Self::PendingConversion => "PENDING_CONVERSION",
                Self::PendingConversionForTaxation => "PENDING_CONVERSION_FOR_TAXATION",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseView {
        pub id: Uuid,
        pub title: String,
        pub category: Option<String>,
        pub status: ExpenseStatus,
        pub date_paid: NaiveDate,
        pub amount_minor: i64,
        pub currency: String,
    }

    /// Query string of `GET /workspaces/{id}/expenses`.
    ///
    /// `status` may be repeated (`status=FINALIZED&status=PENDING_CONVERSION`);
    /// an empty list means "any status".
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct ExpensesQuery {
        pub page_number: Option<u64>,
        pub page_size: Option<u64>,
        pub sort_by: Option<String>,
        pub sort_order: Option<SortOrder>,
        pub free_search_text: Option<String>,
        pub status: Vec<ExpenseStatus>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_serializes_with_camel_case_keys() {
        let page = page::ApiPage {
            page_number: 2,
            page_size: 5,
            total_elements: 12,
            data: vec![1, 2],
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "pageNumber": 2,
                "pageSize": 5,
                "totalElements": 12,
                "data": [1, 2]
            })
        );
    }

    #[test]
    fn invoice_status_uses_upper_snake_case() {
        let json = serde_json::to_string(&invoice::InvoiceStatus::Draft).unwrap();
        assert_eq!(json, "\"DRAFT\"");
        let status: expense::ExpenseStatus =
            serde_json::from_str("\"PENDING_CONVERSION\"").unwrap();
        assert_eq!(status, expense::ExpenseStatus::PendingConversion);
    }

    #[test]
    fn as_str_matches_serde_representation() {
        for status in invoice::InvoiceStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        for status in expense::ExpenseStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
