use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// `None` marks a global activity, usable with every project.
    pub project_id: Option<Uuid>,
    pub name: String,
    pub comment: Option<String>,
    pub visible: bool,
    pub budget: f64,
    pub fixed_rate: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub synthesized: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(has_many = "super::timesheet::Entity")]
    Timesheet,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::timesheet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Timesheet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_global(&self) -> bool {
        self.project_id.is_none()
    }
}
