use api_types::expense::{ExpenseStatus, ExpenseView};
use sea_orm::entity::prelude::*;

use crate::{
    EngineError, ResultEngine,
    util::{parse_id, parse_status},
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub workspace_id: String,
    pub title: String,
    pub category: Option<String>,
    pub status: String,
    pub date_paid: Date,
    pub amount_minor: i64,
    pub currency: String,
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
}

impl Related<super::workspaces::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workspaces.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ExpenseView {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(ExpenseView {
            id: parse_id(&model.id, "expense")?,
            title: model.title,
            category: model.category,
            status: parse_status(&model.status, &ExpenseStatus::ALL, ExpenseStatus::as_str)?,
            date_paid: model.date_paid,
            amount_minor: model.amount_minor,
            currency: model.currency,
        })
    }
}
