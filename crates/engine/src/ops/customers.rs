use api_types::{customer::CustomerView, page::ApiPage};
use sea_orm::{Condition, Order, prelude::*};
use uuid::Uuid;

use crate::{
    ResultEngine, customers,
    filtering::{FieldKind, QuerySpecification, RawFilteringRequest, WorkspaceScope},
};

use super::Engine;

pub(super) type CustomersSpecification = QuerySpecification<customers::Entity, RawFilteringRequest>;

pub(super) fn specification() -> ResultEngine<CustomersSpecification> {
    CustomersSpecification::builder()
        .on_column("id", customers::Column::Id, FieldKind::Uuid)
        .on_column("name", customers::Column::Name, FieldKind::Text)
        .workspace_filter(|workspace_id| {
            Condition::all().add(customers::Column::WorkspaceId.eq(workspace_id.to_string()))
        })
        .add_default_sorting(customers::Column::Name, Order::Asc)
        .add_default_sorting(customers::Column::Id, Order::Asc)
        .build()
}

impl Engine {
    /// Lists the customers of a workspace.
    ///
    /// Filters: `id`, `name`. Always ordered by name.
    pub async fn list_customers(
        &self,
        workspace_id: Uuid,
        user_id: &str,
        request: &RawFilteringRequest,
    ) -> ResultEngine<ApiPage<CustomerView>> {
        self.customers
            .execute_filtering(
                &self.database,
                request,
                Some(&WorkspaceScope::read(workspace_id, user_id)),
                CustomerView::try_from,
            )
            .await
    }
}
