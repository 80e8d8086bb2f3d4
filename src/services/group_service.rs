use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::api::{Page, Paginated};
use crate::context::SharedContext;
use crate::database::daos::{GroupDao, UserDao};
use crate::database::models::group::{
    Group, GroupMember, MEMBER_ROLE_MEMBER, MEMBER_ROLE_MODERATOR, MEMBER_ROLE_OWNER,
    MEMBER_STATUS_ACTIVE, MEMBER_STATUS_BANNED, MEMBER_STATUS_PENDING, PRIVACY_CLOSED,
    PRIVACY_OPEN, PRIVACY_SECRET,
};
use crate::error::ApiError;

pub struct GroupService {
    groups: GroupDao,
    users: UserDao,
}

#[derive(Debug)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub privacy: Option<String>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Default)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub privacy: Option<String>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct JoinOutcome {
    pub group_id: Uuid,
    pub membership_status: String,
}

fn validate_privacy(privacy: &str) -> Result<(), ApiError> {
    match privacy {
        PRIVACY_OPEN | PRIVACY_CLOSED | PRIVACY_SECRET => Ok(()),
        other => Err(ApiError::validation_error(
            format!("Unknown privacy setting '{}'", other),
            None,
        )),
    }
}

fn validate_member_role(role: &str) -> Result<(), ApiError> {
    match role {
        MEMBER_ROLE_MEMBER | MEMBER_ROLE_MODERATOR | MEMBER_ROLE_OWNER => Ok(()),
        other => Err(ApiError::validation_error(
            format!("Unknown member role '{}'", other),
            None,
        )),
    }
}

impl GroupService {
    pub fn new(ctx: &SharedContext) -> Self {
        Self {
            groups: GroupDao::new(ctx.db.clone()),
            users: UserDao::new(ctx.db.clone()),
        }
    }

    pub async fn create(&self, owner_id: Uuid, new: NewGroup) -> Result<Group, ApiError> {
        self.users.get_active(owner_id).await?;

        let privacy = new.privacy.unwrap_or_else(|| PRIVACY_OPEN.to_string());
        validate_privacy(&privacy)?;

        if self.groups.find_active_by_name(&new.name).await?.is_some() {
            return Err(ApiError::conflict("Group name already in use"));
        }

        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4(),
            owner_id,
            name: new.name,
            description: new.description,
            logo_url: new.logo_url,
            cover_url: new.cover_url,
            privacy,
            categories: new.categories,
            member_count: 1, // the creator enrolls as owner
            created_at: now,
            updated_at: now,
            is_active: true,
        };

        self.groups.insert_with_owner(&group).await?;
        info!(group_id = %group.id, owner_id = %owner_id, "Group created");
        Ok(group)
    }

    pub async fn get(&self, id: Uuid) -> Result<Group, ApiError> {
        Ok(self.groups.get_active(id).await?)
    }

    /// Public index. Secret groups are reachable only by id.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: Page,
    ) -> Result<Paginated<Group>, ApiError> {
        let (items, total) = self.groups.list(search, false, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    /// Group settings may be changed by members with a managing role
    /// (owner/moderator) or a global admin.
    pub async fn update(
        &self,
        id: Uuid,
        actor_id: Uuid,
        update: GroupUpdate,
    ) -> Result<Group, ApiError> {
        let group = self.groups.get_active(id).await?;
        self.require_manager(&group, actor_id).await?;

        if let Some(privacy) = update.privacy.as_deref() {
            validate_privacy(privacy)?;
        }

        if let Some(name) = update.name.as_deref() {
            if let Some(existing) = self.groups.find_active_by_name(name).await? {
                if existing.id != id {
                    return Err(ApiError::conflict("Group name already in use"));
                }
            }
        }

        let group = self
            .groups
            .update(
                id,
                update.name.as_deref(),
                update.description.as_deref(),
                update.logo_url.as_deref(),
                update.cover_url.as_deref(),
                update.privacy.as_deref(),
                update.categories.as_deref(),
            )
            .await?;

        info!(group_id = %id, "Group updated");
        Ok(group)
    }

    pub async fn delete(&self, id: Uuid, actor_id: Uuid) -> Result<(), ApiError> {
        let group = self.groups.get_active(id).await?;

        if group.owner_id != actor_id {
            let actor = self.users.get_active(actor_id).await?;
            if !actor.is_admin() {
                return Err(ApiError::forbidden("Not allowed to delete this group"));
            }
        }

        self.groups.soft_delete(id).await?;
        info!(group_id = %id, actor_id = %actor_id, "Group deleted");
        Ok(())
    }

    /// Join a group. Open groups enroll immediately; closed groups queue the
    /// membership for approval; secret groups cannot be joined from outside.
    pub async fn join(&self, group_id: Uuid, user_id: Uuid) -> Result<JoinOutcome, ApiError> {
        self.users.get_active(user_id).await?;
        let group = self.groups.get_active(group_id).await?;

        if let Some(member) = self.groups.member(group_id, user_id).await? {
            return Err(match member.status.as_str() {
                MEMBER_STATUS_ACTIVE => ApiError::conflict("Already a member of this group"),
                MEMBER_STATUS_PENDING => ApiError::conflict("Membership approval pending"),
                _ => ApiError::forbidden("Banned from this group"),
            });
        }

        if group.is_secret() {
            return Err(ApiError::forbidden("This group is invitation only"));
        }

        let status = if group.privacy == PRIVACY_CLOSED {
            MEMBER_STATUS_PENDING
        } else {
            MEMBER_STATUS_ACTIVE
        };

        self.groups
            .add_member(group_id, user_id, MEMBER_ROLE_MEMBER, status)
            .await?;
        info!(group_id = %group_id, user_id = %user_id, status = status, "Group join");

        Ok(JoinOutcome {
            group_id,
            membership_status: status.to_string(),
        })
    }

    pub async fn leave(&self, group_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        let group = self.groups.get_active(group_id).await?;

        if group.owner_id == user_id {
            return Err(ApiError::validation_error(
                "The group owner cannot leave the group",
                None,
            ));
        }

        self.groups.remove_member(group_id, user_id).await?;
        info!(group_id = %group_id, user_id = %user_id, "Left group");
        Ok(())
    }

    /// Member listing. Active members are public; pending and banned rows
    /// are visible only to managers.
    pub async fn members(
        &self,
        group_id: Uuid,
        status: Option<&str>,
        viewer_id: Option<Uuid>,
        page: Page,
    ) -> Result<Paginated<GroupMember>, ApiError> {
        let group = self.groups.get_active(group_id).await?;
        let status = status.unwrap_or(MEMBER_STATUS_ACTIVE);

        match status {
            MEMBER_STATUS_ACTIVE => {}
            MEMBER_STATUS_PENDING | MEMBER_STATUS_BANNED => {
                let viewer_id = viewer_id
                    .ok_or_else(|| ApiError::forbidden("Not allowed to view this member list"))?;
                self.require_manager(&group, viewer_id).await?;
            }
            other => {
                return Err(ApiError::validation_error(
                    format!("Unknown membership status '{}'", other),
                    None,
                ))
            }
        }

        let (items, total) = self.groups.members_by_status(group_id, status, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    /// Role changes are restricted to the group owner or a global admin;
    /// the owner's own enrollment is immutable.
    pub async fn update_member_role(
        &self,
        group_id: Uuid,
        target_user_id: Uuid,
        role: &str,
        actor_id: Uuid,
    ) -> Result<GroupMember, ApiError> {
        validate_member_role(role)?;
        let group = self.groups.get_active(group_id).await?;

        if group.owner_id != actor_id {
            let actor = self.users.get_active(actor_id).await?;
            if !actor.is_admin() {
                return Err(ApiError::forbidden("Not allowed to change member roles"));
            }
        }
        if target_user_id == group.owner_id {
            return Err(ApiError::validation_error(
                "The group owner's role cannot be changed",
                None,
            ));
        }

        let member = self
            .groups
            .update_member_role(group_id, target_user_id, role)
            .await?;

        info!(group_id = %group_id, user_id = %target_user_id, role = role, "Member role updated");
        Ok(member)
    }

    /// Approve or reject a pending membership.
    pub async fn decide_membership(
        &self,
        group_id: Uuid,
        target_user_id: Uuid,
        approve: bool,
        actor_id: Uuid,
    ) -> Result<Option<GroupMember>, ApiError> {
        let group = self.groups.get_active(group_id).await?;
        self.require_manager(&group, actor_id).await?;

        let member = self
            .groups
            .member(group_id, target_user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Membership not found"))?;

        if member.status != MEMBER_STATUS_PENDING {
            return Err(ApiError::validation_error(
                "Membership is not awaiting approval",
                None,
            ));
        }

        if approve {
            let member = self
                .groups
                .set_member_status(group_id, target_user_id, MEMBER_STATUS_ACTIVE)
                .await?;
            info!(group_id = %group_id, user_id = %target_user_id, "Membership approved");
            Ok(Some(member))
        } else {
            self.groups.remove_member(group_id, target_user_id).await?;
            info!(group_id = %group_id, user_id = %target_user_id, "Membership rejected");
            Ok(None)
        }
    }

    /// Managing rights: active owner/moderator membership, or global admin.
    async fn require_manager(&self, group: &Group, actor_id: Uuid) -> Result<(), ApiError> {
        if let Some(member) = self.groups.member(group.id, actor_id).await? {
            if member.can_manage() {
                return Ok(());
            }
        }

        let actor = self.users.get_active(actor_id).await?;
        if actor.is_admin() {
            return Ok(());
        }

        Err(ApiError::forbidden("Not allowed to manage this group"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privacy_values_are_validated() {
        assert!(validate_privacy("open").is_ok());
        assert!(validate_privacy("closed").is_ok());
        assert!(validate_privacy("secret").is_ok());
        assert!(validate_privacy("hidden").is_err());
    }

    #[test]
    fn member_roles_are_validated() {
        assert!(validate_member_role("member").is_ok());
        assert!(validate_member_role("moderator").is_ok());
        assert!(validate_member_role("admin").is_err());
    }
}
