use api_types::{
    expense::{ExpenseStatus, ExpenseView, ExpensesQuery},
    page::ApiPage,
};
use sea_orm::{Condition, Order, prelude::*, sea_query::LikeExpr};
use uuid::Uuid;

use crate::{
    ResultEngine, expenses,
    filtering::{QuerySpecification, WorkspaceScope},
    util::contains_pattern,
};

use super::Engine;

pub(super) type ExpensesSpecification = QuerySpecification<expenses::Entity, ExpensesQuery>;

pub(super) fn specification() -> ResultEngine<ExpensesSpecification> {
    ExpensesSpecification::builder()
        .on_filter(
            "freeSearchText",
            |query: &ExpensesQuery| {
                query
                    .free_search_text
                    .as_deref()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(contains_pattern)
            },
            |pattern: LikeExpr| {
                Condition::any()
                    .add(expenses::Column::Title.like(pattern.clone()))
                    .add(expenses::Column::Category.like(pattern))
            },
        )
        .on_filter_in(
            "status",
            |query: &ExpensesQuery| {
                query
                    .status
                    .iter()
                    .copied()
                    .map(ExpenseStatus::as_str)
                    .collect()
            },
            |statuses: Vec<&'static str>| {
                Condition::all().add(expenses::Column::Status.is_in(statuses))
            },
        )
        .workspace_filter(|workspace_id| {
            Condition::all().add(expenses::Column::WorkspaceId.eq(workspace_id.to_string()))
        })
        .on_sort("datePaid", expenses::Column::DatePaid)
        .on_sort("amount", expenses::Column::AmountMinor)
        .add_default_sorting(expenses::Column::DatePaid, Order::Desc)
        .add_default_sorting(expenses::Column::Id, Order::Asc)
        .build()
}

impl Engine {
    /// Lists the expenses of a workspace.
    pub async fn list_expenses(
        &self,
        workspace_id: Uuid,
        user_id: &str,
        query: &ExpensesQuery,
    ) -> ResultEngine<ApiPage<ExpenseView>> {
        self.expenses
            .execute_filtering(
                &self.database,
                query,
                Some(&WorkspaceScope::read(workspace_id, user_id)),
                ExpenseView::try_from,
            )
            .await
    }
}
