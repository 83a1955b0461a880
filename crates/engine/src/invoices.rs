//! Invoices issued to customers of a workspace.
//!
//! Amounts are stored in minor units, statuses as their wire representation
//! (`DRAFT`, `SENT`, ...) so that the string filter grammar compares them
//! directly.

use api_types::invoice::{InvoiceStatus, InvoiceView};
use sea_orm::entity::prelude::*;

use crate::{
    EngineError, ResultEngine,
    util::{parse_id, parse_status},
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub workspace_id: String,
    pub customer_id: String,
    pub title: String,
    pub status: String,
    pub date_issued: Date,
    pub due_date: Date,
    pub amount_minor: i64,
    pub currency: String,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workspaces::Entity",
        from = "Column::WorkspaceId",
        to = "super::workspaces::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Workspaces,
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Customers,
}

impl Related<super::workspaces::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workspaces.def()
    }
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for InvoiceView {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(InvoiceView {
            id: parse_id(&model.id, "invoice")?,
            customer_id: parse_id(&model.customer_id, "customer")?,
            title: model.title,
            status: parse_status(&model.status, &InvoiceStatus::ALL, InvoiceStatus::as_str)?,
            date_issued: model.date_issued,
            due_date: model.due_date,
            amount_minor: model.amount_minor,
            currency: model.currency,
            notes: model.notes,
        })
    }
}
