use sea_orm::{DatabaseConnection, DbErr, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    filtering::{AccessMode, WorkspaceAccess},
    workspace_members, workspaces,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MembershipRole {
    Editor,
    Viewer,
}

impl MembershipRole {
    pub(crate) fn allows(self, mode: AccessMode) -> bool {
        match mode {
            AccessMode::ReadOnly => true,
            AccessMode::ReadWrite => self == Self::Editor,
        }
    }
}

impl TryFrom<&str> for MembershipRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            other => Err(EngineError::Database(DbErr::Custom(format!(
                "invalid membership role: {other}"
            )))),
        }
    }
}

/// Workspace access backed by the `workspaces` and `workspace_members`
/// tables.
///
/// The owner may do anything. Members get what their role allows. Unknown
/// workspaces and non-members are indistinguishable to the caller.
#[derive(Clone, Debug)]
pub struct DbWorkspaceAccess {
    database: DatabaseConnection,
}

impl DbWorkspaceAccess {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    async fn membership_role(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> ResultEngine<Option<MembershipRole>> {
        let row = workspace_members::Entity::find_by_id((
            workspace_id.to_string(),
            user_id.to_string(),
        ))
        .one(&self.database)
        .await?;
        row.as_ref()
            .map(|m| MembershipRole::try_from(m.role.as_str()))
            .transpose()
    }
}

impl WorkspaceAccess for DbWorkspaceAccess {
    async fn validate_access(
        &self,
        workspace_id: Uuid,
        user_id: &str,
        mode: AccessMode,
    ) -> ResultEngine<workspaces::Model> {
        let workspace = workspaces::Entity::find_by_id(workspace_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("workspace not exists".to_string()))?;
        if workspace.owner_id == user_id {
            return Ok(workspace);
        }

        let role = self
            .membership_role(&workspace.id, user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("workspace not exists".to_string()))?;
        if !role.allows(mode) {
            tracing::debug!(%workspace_id, user_id, ?role, ?mode, "workspace access denied");
            return Err(EngineError::Forbidden(
                "workspace is read-only for this user".to_string(),
            ));
        }
        Ok(workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewers_only_read() {
        assert!(MembershipRole::Viewer.allows(AccessMode::ReadOnly));
        assert!(!MembershipRole::Viewer.allows(AccessMode::ReadWrite));
        assert!(MembershipRole::Editor.allows(AccessMode::ReadWrite));
    }

    #[test]
    fn unknown_roles_are_rejected() {
        assert_eq!(
            MembershipRole::try_from("editor").unwrap(),
            MembershipRole::Editor
        );
        assert!(MembershipRole::try_from("owner").is_err());
    }
}
