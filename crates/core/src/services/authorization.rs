//! Authorization: principal resolution and capability checks.

use agora_common::{AppError, AppResult, ForumConfig};
use agora_db::entities::{forum, forum_permission, user, user::UserRole};
use serde::Serialize;

use crate::context::ForumContext;

/// The authenticated user behind a request, with everything the
/// capability checks need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
    pub role: UserRole,
    pub group_ids: Vec<String>,
    /// Member of at least one group flagged `is_moderator`.
    pub in_moderator_group: bool,
    /// Member of at least one group flagged `is_admin`.
    pub in_admin_group: bool,
    /// Has an active, unexpired ban.
    pub banned: bool,
}

impl Principal {
    /// Principal for a user with no groups and no ban.
    #[must_use]
    pub fn from_user(user: &user::Model) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            group_ids: Vec::new(),
            in_moderator_group: false,
            in_admin_group: false,
            banned: false,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Admins and moderators by role, or members of a staff group.
    #[must_use]
    pub fn can_moderate(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Moderator)
            || self.in_moderator_group
            || self.in_admin_group
    }

    /// Authors may change their own content; admins may change anyone's.
    #[must_use]
    pub fn can_modify(&self, author_id: &str) -> bool {
        self.user_id == author_id || self.is_admin()
    }

    /// Refuse mutations from banned users.
    pub fn ensure_not_banned(&self) -> AppResult<()> {
        if self.banned {
            return Err(AppError::Forbidden("banned".to_string()));
        }
        Ok(())
    }

    /// Refuse the action unless the principal may moderate.
    pub fn ensure_can_moderate(&self) -> AppResult<()> {
        if !self.can_moderate() {
            return Err(AppError::Forbidden("Moderator privileges required".to_string()));
        }
        Ok(())
    }

    /// Refuse the action unless the principal authored the content or is an admin.
    pub fn ensure_can_modify(&self, author_id: &str) -> AppResult<()> {
        if !self.can_modify(author_id) {
            return Err(AppError::Forbidden(
                "Only the author or an admin may do this".to_string(),
            ));
        }
        Ok(())
    }
}

/// Decide whether `principal` may start a topic in `forum`.
///
/// `permissions` are the forum's permission rows for the principal's groups.
#[must_use]
pub fn can_post(
    principal: &Principal,
    forum: &forum::Model,
    permissions: &[forum_permission::Model],
    config: &ForumConfig,
) -> bool {
    if principal.is_admin() {
        return true;
    }

    if forum.is_locked {
        return false;
    }

    if forum.name == config.announcement_forum_name {
        return principal.in_moderator_group || principal.in_admin_group;
    }

    let mut matching = permissions
        .iter()
        .filter(|p| p.forum_id == forum.id && principal.group_ids.contains(&p.group_id))
        .peekable();

    if matching.peek().is_none() {
        return config.default_permission.allows();
    }
    matching.any(|p| p.can_post_topics)
}

/// Resolves principals and evaluates forum permissions.
#[derive(Clone)]
pub struct AuthorizationService {
    ctx: ForumContext,
}

impl AuthorizationService {
    /// Create a new authorization service.
    #[must_use]
    pub const fn new(ctx: ForumContext) -> Self {
        Self { ctx }
    }

    /// Resolve the principal behind a bearer token.
    pub async fn resolve_principal(&self, token: &str) -> AppResult<Option<Principal>> {
        let Some(user) = self.ctx.repos.users.find_by_token(token).await? else {
            return Ok(None);
        };
        self.principal_for(&user).await.map(Some)
    }

    /// Build the principal for a known user.
    pub async fn principal_for(&self, user: &user::Model) -> AppResult<Principal> {
        let groups = self.ctx.repos.groups.find_by_user(&user.id).await?;
        let banned = self
            .ctx
            .repos
            .bans
            .find_active_ban(self.ctx.db.as_ref(), &user.id)
            .await?
            .is_some();

        let mut principal = Principal::from_user(user);
        principal.in_moderator_group = groups.iter().any(|g| g.is_moderator);
        principal.in_admin_group = groups.iter().any(|g| g.is_admin);
        principal.group_ids = groups.into_iter().map(|g| g.id).collect();
        principal.banned = banned;
        Ok(principal)
    }

    /// Load the forum's permission rows and evaluate [`can_post`].
    pub async fn can_post(&self, principal: &Principal, forum: &forum::Model) -> AppResult<bool> {
        let permissions = self
            .ctx
            .repos
            .groups
            .find_permissions(&forum.id, &principal.group_ids)
            .await?;
        Ok(can_post(principal, forum, &permissions, &self.ctx.config))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use agora_common::PermissionDefault;
    use chrono::Utc;

    fn principal(role: UserRole, groups: &[&str]) -> Principal {
        Principal {
            user_id: "u1".to_string(),
            username: "alice".to_string(),
            role,
            group_ids: groups.iter().map(ToString::to_string).collect(),
            in_moderator_group: false,
            in_admin_group: false,
            banned: false,
        }
    }

    fn create_test_forum(name: &str, is_locked: bool) -> forum::Model {
        forum::Model {
            id: "f1".to_string(),
            category_id: "c1".to_string(),
            name: name.to_string(),
            description: None,
            display_order: 0,
            is_locked,
            topics_count: 0,
            posts_count: 0,
            last_post_id: None,
            last_post_topic_id: None,
            last_post_user_id: None,
            last_post_at: None,
            created_at: Utc::now().into(),
        }
    }

    fn permission(group_id: &str, can_post_topics: bool) -> forum_permission::Model {
        forum_permission::Model {
            id: format!("p-{group_id}"),
            forum_id: "f1".to_string(),
            group_id: group_id.to_string(),
            can_view: true,
            can_post_topics,
            can_post_replies: true,
            can_edit_own: true,
            can_delete_own: true,
        }
    }

    #[test]
    fn test_admin_always_allowed() {
        let config = ForumConfig::default();
        let admin = principal(UserRole::Admin, &[]);
        assert!(can_post(&admin, &create_test_forum("General", true), &[], &config));
        assert!(can_post(
            &admin,
            &create_test_forum("Announcements", false),
            &[],
            &config
        ));
    }

    #[test]
    fn test_locked_forum_denies_moderators() {
        let config = ForumConfig::default();
        let mut moderator = principal(UserRole::Moderator, &["g1"]);
        moderator.in_moderator_group = true;
        let forum = create_test_forum("General", true);
        assert!(!can_post(&moderator, &forum, &[permission("g1", true)], &config));
    }

    #[test]
    fn test_announcement_forum_requires_staff_group() {
        let config = ForumConfig::default();
        let forum = create_test_forum("Announcements", false);

        let member = principal(UserRole::User, &["g1"]);
        assert!(!can_post(&member, &forum, &[permission("g1", true)], &config));

        let mut staff = principal(UserRole::User, &["g2"]);
        staff.in_moderator_group = true;
        assert!(can_post(&staff, &forum, &[], &config));
    }

    #[test]
    fn test_any_granting_group_wins() {
        let config = ForumConfig::default();
        let forum = create_test_forum("General", false);
        let member = principal(UserRole::User, &["g1", "g2"]);

        let rows = [permission("g1", false), permission("g2", true)];
        assert!(can_post(&member, &forum, &rows, &config));

        let rows = [permission("g1", false)];
        assert!(!can_post(&member, &forum, &rows, &config));
    }

    #[test]
    fn test_rows_for_other_groups_are_ignored() {
        let config = ForumConfig::default();
        let forum = create_test_forum("General", false);
        let member = principal(UserRole::User, &["g1"]);
        assert!(can_post(&member, &forum, &[permission("g9", false)], &config));
    }

    #[test]
    fn test_default_permission_applies_without_rows() {
        let forum = create_test_forum("General", false);
        let member = principal(UserRole::User, &[]);

        let open = ForumConfig::default();
        assert!(can_post(&member, &forum, &[], &open));

        let closed = ForumConfig {
            default_permission: PermissionDefault::Deny,
            ..ForumConfig::default()
        };
        assert!(!can_post(&member, &forum, &[], &closed));
    }

    #[test]
    fn test_capabilities() {
        let user = principal(UserRole::User, &[]);
        assert!(!user.can_moderate());
        assert!(user.can_modify("u1"));
        assert!(!user.can_modify("u2"));

        let admin = principal(UserRole::Admin, &[]);
        assert!(admin.can_moderate());
        assert!(admin.can_modify("u2"));

        let mut group_mod = principal(UserRole::User, &["g1"]);
        group_mod.in_moderator_group = true;
        assert!(group_mod.can_moderate());
        assert!(!group_mod.can_modify("u2"));
    }

    #[test]
    fn test_banned_principal_refused() {
        let mut user = principal(UserRole::User, &[]);
        assert!(user.ensure_not_banned().is_ok());
        user.banned = true;
        assert!(matches!(user.ensure_not_banned(), Err(AppError::Forbidden(msg)) if msg == "banned"));
    }
}
