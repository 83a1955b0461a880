use api_types::{invoice::InvoiceView, page::ApiPage};
use sea_orm::{Condition, JoinType, Order, QuerySelect, prelude::*, sea_query::LikeExpr};
use uuid::Uuid;

use crate::{
    ResultEngine, customers,
    filtering::{
        FieldKind, FilteringOperator, QuerySpecification, RawFilteringRequest, WorkspaceScope,
    },
    invoices,
    util::contains_pattern,
};

use super::Engine;

pub(super) type InvoicesSpecification = QuerySpecification<invoices::Entity, RawFilteringRequest>;

pub(super) const FREE_SEARCH_TEXT: &str = "freeSearchText";

pub(super) fn specification() -> ResultEngine<InvoicesSpecification> {
    InvoicesSpecification::builder()
        .configure(|query| query.join(JoinType::InnerJoin, invoices::Relation::Customers.def()))
        .on_column("id", invoices::Column::Id, FieldKind::Uuid)
        .on_column("status", invoices::Column::Status, FieldKind::Text)
        .on_column("customer", invoices::Column::CustomerId, FieldKind::Uuid)
        .on_column("dateIssued", invoices::Column::DateIssued, FieldKind::Date)
        .on_column("dueDate", invoices::Column::DueDate, FieldKind::Date)
        .on_column("amount", invoices::Column::AmountMinor, FieldKind::Integer)
        .on_filter_in(
            FREE_SEARCH_TEXT,
            |request: &RawFilteringRequest| {
                request
                    .values(FREE_SEARCH_TEXT, FilteringOperator::Eq)
                    .into_iter()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(contains_pattern)
                    .collect()
            },
            |patterns: Vec<LikeExpr>| {
                patterns
                    .into_iter()
                    .fold(Condition::all(), |all, pattern| {
                        all.add(
                            Condition::any()
                                .add(invoices::Column::Title.like(pattern.clone()))
                                .add(invoices::Column::Notes.like(pattern.clone()))
                                .add(customers::Column::Name.like(pattern)),
                        )
                    })
            },
        )
        .with_operators(FREE_SEARCH_TEXT, &[FilteringOperator::Eq])
        .workspace_filter(|workspace_id| {
            Condition::all().add(invoices::Column::WorkspaceId.eq(workspace_id.to_string()))
        })
        .on_sort("dateIssued", invoices::Column::DateIssued)
        .on_sort("dueDate", invoices::Column::DueDate)
        .on_sort("amount", invoices::Column::AmountMinor)
        .add_default_sorting(invoices::Column::DateIssued, Order::Desc)
        .add_default_sorting(invoices::Column::Id, Order::Asc)
        .build()
}

impl Engine {
    /// Lists the invoices of a workspace.
    ///
    /// Newest first unless the request sorts on `dateIssued`, `dueDate` or
    /// `amount`.
    pub async fn list_invoices(
        &self,
        workspace_id: Uuid,
        user_id: &str,
        request: &RawFilteringRequest,
    ) -> ResultEngine<ApiPage<InvoiceView>> {
        self.invoices
            .execute_filtering(
                &self.database,
                request,
                Some(&WorkspaceScope::read(workspace_id, user_id)),
                InvoiceView::try_from,
            )
            .await
    }
}
