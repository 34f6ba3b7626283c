//! User Service
//!
//! Assembles denormalized user views and applies user mutations with their
//! audit records.
//!
//! Store calls are sequential with no transaction around them. The two
//! mutating paths order their audit writes differently:
//!
//! - update writes the [`RoleChangeRecord`] first and aborts if that fails;
//! - deactivate writes the new state first, then the
//!   [`StatusChangeRecord`], and reports a failed audit write without
//!   undoing the state change.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::audit::entity::{RoleChangeRecord, StatusChangeRecord};
use crate::audit::repository::AuditStore;
use crate::auth::password_service::PasswordService;
use crate::role::entity::{RoleResponse, UserRole};
use crate::role::repository::RoleStore;
use crate::shared::authorization::{checks, AuthContext};
use crate::shared::error::{PlatformError, Result};
use crate::timezone::entity::{Timezone, TimezoneResponse};
use crate::timezone::repository::TimezoneStore;
use crate::user::entity::{
    dedup_ids, CreateUserRequest, UpdateUserRequest, User, UserUpdate, UserView,
};
use crate::user::repository::UserStore;

pub struct UserService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    timezones: Arc<dyn TimezoneStore>,
    audit: Arc<dyn AuditStore>,
    passwords: Arc<PasswordService>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        timezones: Arc<dyn TimezoneStore>,
        audit: Arc<dyn AuditStore>,
        passwords: Arc<PasswordService>,
    ) -> Self {
        Self {
            users,
            roles,
            timezones,
            audit,
            passwords,
        }
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// Denormalized view of one user.
    ///
    /// A missing user or a dangling timezone reference is `NotFound`.
    /// Dangling role references are dropped from the view.
    pub async fn resolve(&self, user_id: &str) -> Result<UserView> {
        let user = self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("User", user_id))?;
        self.view_of(&user).await
    }

    /// Denormalized views of all users.
    ///
    /// Users whose timezone reference does not resolve are left out.
    pub async fn resolve_all(&self) -> Result<Vec<UserView>> {
        let users = self.users.find_all().await?;

        let tz_ids: Vec<String> = dedup_ids(
            &users.iter().map(|u| u.current_timezone.clone()).collect::<Vec<_>>(),
        );
        let role_ids: Vec<String> = dedup_ids(
            &users.iter().flat_map(|u| u.roles.iter().cloned()).collect::<Vec<_>>(),
        );

        let timezones: HashMap<String, Timezone> = self.timezones
            .find_by_ids(&tz_ids)
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();
        let roles: HashMap<String, UserRole> = self.roles
            .find_by_ids(&role_ids)
            .await?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        let mut views = Vec::with_capacity(users.len());
        for user in users {
            let Some(tz) = timezones.get(&user.current_timezone) else {
                warn!(
                    user_id = %user.id,
                    timezone_id = %user.current_timezone,
                    "Skipping user with unknown timezone"
                );
                continue;
            };
            let user_roles = user.roles.iter().filter_map(|id| roles.get(id)).cloned().collect();
            views.push(build_view(user, tz.clone(), user_roles));
        }
        Ok(views)
    }

    async fn view_of(&self, user: &User) -> Result<UserView> {
        let tz = self.timezones
            .find_by_id(&user.current_timezone)
            .await?
            .ok_or_else(|| PlatformError::not_found("Timezone", &user.current_timezone))?;
        let roles = self.ordered_roles(&user.roles).await?;
        Ok(build_view(user.clone(), tz, roles))
    }

    /// Roles for `ids`, in the order of `ids`, skipping unknown ids.
    async fn ordered_roles(&self, ids: &[String]) -> Result<Vec<UserRole>> {
        let found: HashMap<String, UserRole> = self.roles
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
        Ok(ids.iter().filter_map(|id| found.get(id)).cloned().collect())
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Create a user. Requires the admin role.
    pub async fn create(&self, actor: &AuthContext, req: CreateUserRequest) -> Result<UserView> {
        checks::require_admin(actor)?;
        let user = self.insert_user(req).await?;
        info!(user_id = %user.id, user_name = %user.user_name, actor = %actor.user_id, "User created");
        self.resolve(&user.id).await
    }

    /// Validate, hash and insert without an actor check.
    pub(crate) async fn insert_user(&self, req: CreateUserRequest) -> Result<User> {
        let user_name = normalize_user_name(&req.user_name)?;
        if req.password.is_empty() {
            return Err(PlatformError::validation("Password is required"));
        }

        if self.users.find_by_user_name(&user_name).await?.is_some() {
            warn!(user_name = %user_name, "Rejected create: user name taken");
            return Err(PlatformError::duplicate("User", "user_name", &user_name));
        }

        let roles = dedup_ids(&req.roles);
        self.ensure_references(&req.current_timezone, &roles).await?;

        let hash = self.passwords.hash_password(&req.password)?;
        let mut user = User::new(user_name, hash, req.current_timezone, roles);
        user.is_active = req.is_active;
        let now = Utc::now();
        user.created_at = req.created_at.unwrap_or(now);
        user.updated_at = req.updated_at.unwrap_or(now);

        self.users.insert(&user).await?;
        Ok(user)
    }

    /// Replace the mutable fields of a user. Requires the admin role.
    ///
    /// `is_active` must match the stored flag: deactivation goes through
    /// [`UserService::deactivate`] and there is no reactivation.
    ///
    /// When the role set changes, a [`RoleChangeRecord`] is written before
    /// the user; if that write fails the user is left untouched.
    pub async fn update(
        &self,
        actor: &AuthContext,
        user_id: &str,
        req: UpdateUserRequest,
    ) -> Result<UserView> {
        checks::require_admin(actor)?;

        if let Some(body_id) = req.id.as_deref() {
            if body_id != user_id {
                return Err(PlatformError::validation(format!(
                    "Body id {} does not match path id {}", body_id, user_id
                )));
            }
        }

        let current = self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("User", user_id))?;

        if req.is_active != current.is_active {
            let message = if current.is_active {
                "Active flag cannot be changed by update; deactivate the user instead"
            } else {
                "Inactive users cannot be reactivated"
            };
            warn!(user_id = %user_id, requested = req.is_active, "Rejected update: active flag change");
            return Err(PlatformError::validation(message));
        }

        let user_name = normalize_user_name(&req.user_name)?;
        if user_name != current.user_name {
            if let Some(other) = self.users.find_by_user_name(&user_name).await? {
                if other.id != current.id {
                    warn!(user_id = %user_id, user_name = %user_name, "Rejected rename: user name taken");
                    return Err(PlatformError::duplicate("User", "user_name", &user_name));
                }
            }
        }

        let new_roles = dedup_ids(&req.roles);
        self.ensure_references(&req.current_timezone, &new_roles).await?;

        if !same_role_set(&current.roles, &new_roles) {
            let record = RoleChangeRecord::new(
                user_id,
                current.roles.clone(),
                new_roles.clone(),
                &actor.user_id,
            );
            self.audit.record_role_change(&record).await.map_err(|e| {
                error!(user_id = %user_id, error = %e, "Role change audit write failed, update aborted");
                PlatformError::audit_write(e.to_string())
            })?;
            info!(
                user_id = %user_id,
                previous = ?record.previous_roles,
                new = ?record.new_roles,
                actor = %actor.user_id,
                "Role change recorded"
            );
        }

        let update = UserUpdate {
            user_name,
            updated_at: req.updated_at.unwrap_or_else(Utc::now),
            current_timezone: req.current_timezone,
            roles: new_roles,
        };
        if self.users.update(user_id, &update).await? == 0 {
            return Err(PlatformError::not_found("User", user_id));
        }

        info!(user_id = %user_id, actor = %actor.user_id, "User updated");
        self.resolve(user_id).await
    }

    /// Soft-delete a user. Requires the admin role.
    ///
    /// Returns the view as it was before the write, with `is_active` false.
    pub async fn deactivate(&self, actor: &AuthContext, user_id: &str) -> Result<UserView> {
        checks::require_admin(actor)?;

        let mut view = self.resolve(user_id).await?;
        if !view.is_active {
            return Err(PlatformError::validation("User is already inactive"));
        }

        if self.users.set_active(user_id, false).await? == 0 {
            return Err(PlatformError::not_found("User", user_id));
        }

        let record = StatusChangeRecord::new(user_id, false, &actor.user_id);
        if let Err(e) = self.audit.record_status_change(&record).await {
            error!(user_id = %user_id, error = %e, "User deactivated but status audit write failed");
            return Err(PlatformError::audit_write(e.to_string()));
        }

        info!(user_id = %user_id, actor = %actor.user_id, "User deactivated");
        view.is_active = false;
        Ok(view)
    }

    // ---------------------------------------------------------------
    // Authentication support
    // ---------------------------------------------------------------

    /// Check a user name and password. Inactive users are refused.
    pub async fn verify_credentials(&self, user_name: &str, password: &str) -> Result<User> {
        let Some(user) = self.users.find_by_user_name(user_name).await? else {
            warn!(user_name = %user_name, "Login failed: unknown user");
            return Err(PlatformError::InvalidCredentials);
        };

        if !self.passwords.verify_password(password, &user.password)? {
            warn!(user_name = %user_name, "Login failed: wrong password");
            return Err(PlatformError::InvalidCredentials);
        }

        if !user.is_active {
            warn!(user_name = %user_name, "Login refused: user is inactive");
            return Err(PlatformError::unauthorized("User is inactive"));
        }

        Ok(user)
    }

    /// Request context for a user already known to be active
    pub async fn context_for(&self, user: &User) -> Result<AuthContext> {
        let roles = self.ordered_roles(&user.roles)
            .await?
            .into_iter()
            .map(|r| r.role)
            .collect();
        Ok(AuthContext::new(user.id.clone(), user.user_name.clone(), roles))
    }

    /// Build the request context for an authenticated user name.
    ///
    /// Unknown or inactive users are `Unauthorized`.
    pub async fn auth_context(&self, user_name: &str) -> Result<AuthContext> {
        let user = self.users
            .find_by_user_name(user_name)
            .await?
            .ok_or_else(|| PlatformError::unauthorized("Unknown user"))?;
        if !user.is_active {
            return Err(PlatformError::unauthorized("User is inactive"));
        }
        self.context_for(&user).await
    }

    pub async fn has_users(&self) -> Result<bool> {
        Ok(self.users.count().await? > 0)
    }

    // ---------------------------------------------------------------
    // Audit history
    // ---------------------------------------------------------------

    /// Role changes of a user, newest first. Requires the admin role.
    pub async fn role_history(&self, actor: &AuthContext, user_id: &str) -> Result<Vec<RoleChangeRecord>> {
        checks::require_admin(actor)?;
        self.ensure_user_exists(user_id).await?;
        self.audit.role_changes_for(user_id).await
    }

    /// Status changes of a user, newest first. Requires the admin role.
    pub async fn status_history(&self, actor: &AuthContext, user_id: &str) -> Result<Vec<StatusChangeRecord>> {
        checks::require_admin(actor)?;
        self.ensure_user_exists(user_id).await?;
        self.audit.status_changes_for(user_id).await
    }

    async fn ensure_user_exists(&self, user_id: &str) -> Result<()> {
        match self.users.find_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(PlatformError::not_found("User", user_id)),
        }
    }

    /// Every referenced timezone and role must exist.
    async fn ensure_references(&self, timezone_id: &str, role_ids: &[String]) -> Result<()> {
        if self.timezones.find_by_id(timezone_id).await?.is_none() {
            return Err(PlatformError::not_found("Timezone", timezone_id));
        }

        let found: HashSet<String> = self.roles
            .find_by_ids(role_ids)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        if let Some(missing) = role_ids.iter().find(|id| !found.contains(*id)) {
            return Err(PlatformError::not_found("Role", missing));
        }
        Ok(())
    }
}

fn normalize_user_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(PlatformError::validation("User name is required"));
    }
    Ok(name.to_string())
}

/// Role sets are compared as sets: order and duplicates do not matter.
fn same_role_set(a: &[String], b: &[String]) -> bool {
    let a: HashSet<&String> = a.iter().collect();
    let b: HashSet<&String> = b.iter().collect();
    a == b
}

fn build_view(user: User, tz: Timezone, roles: Vec<UserRole>) -> UserView {
    UserView {
        id: user.id,
        user_name: user.user_name,
        is_active: user.is_active,
        created_at: user.created_at,
        updated_at: user.updated_at,
        current_timezone: TimezoneResponse::from(tz),
        roles: roles.into_iter().map(RoleResponse::from).collect(),
    }
}
