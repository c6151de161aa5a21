//! Permission store implementation
//!
//! Holds what the current actor may do:
//! - Permissions: identifiers granted directly
//! - Roles: named groups that expand to a set of permissions
//!
//! Readers take an immutable [`PermissionSnapshot`]; later mutations never
//! show up in a snapshot that was already taken.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A role and the permissions it grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Role identifier
    pub name: String,
    /// Permissions granted while the role is held
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl RoleDefinition {
    /// Create a role granting the given permissions
    pub fn new<I, S>(name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if this role grants a permission
    pub fn grants(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Read-only view of the store at one point in time
///
/// Permissions granted through held roles are already flattened in, so a
/// single membership test covers both namespaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSnapshot {
    permissions: HashSet<String>,
    roles: HashSet<String>,
    revision: u64,
    taken_at: DateTime<Utc>,
}

impl PermissionSnapshot {
    /// Check if an identifier is held as a permission or as a role name
    pub fn contains(&self, identifier: &str) -> bool {
        self.permissions.contains(identifier) || self.roles.contains(identifier)
    }

    /// Check if any identifier is held
    ///
    /// An empty list holds nothing.
    pub fn contains_any<S: AsRef<str>>(&self, identifiers: &[S]) -> bool {
        identifiers.iter().any(|id| self.contains(id.as_ref()))
    }

    /// Flattened permission identifiers (direct and role-granted)
    pub fn permissions(&self) -> &HashSet<String> {
        &self.permissions
    }

    /// Held role names
    pub fn roles(&self) -> &HashSet<String> {
        &self.roles
    }

    /// Store revision this snapshot was taken at
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// When this snapshot was taken
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }
}

#[derive(Debug, Default)]
struct StoreState {
    permissions: HashSet<String>,
    roles: HashMap<String, RoleDefinition>,
    revision: u64,
}

impl StoreState {
    fn touch(&mut self, changed: bool) {
        if changed {
            self.revision += 1;
        }
    }
}

/// Process-wide permission and role state
///
/// Created once per session and shared via `Arc<PermissionStore>`. Every
/// operation is total; a poisoned lock is recovered rather than reported.
#[derive(Debug, Default)]
pub struct PermissionStore {
    state: RwLock<StoreState>,
}

impl PermissionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given permissions and roles
    pub fn with_grants<I, S>(permissions: I, roles: Vec<RoleDefinition>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        store.add(permissions);
        store.add_roles(roles);
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // === Permissions ===

    /// Merge permissions into the held set
    pub fn add<I, S>(&self, identifiers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.write();
        let mut changed = false;
        for id in identifiers {
            let id = id.into();
            if state.permissions.insert(id.clone()) {
                tracing::debug!("Adding permission: {}", id);
                changed = true;
            }
        }
        state.touch(changed);
    }

    /// Add a single permission
    pub fn add_permission(&self, identifier: impl Into<String>) {
        self.add([identifier]);
    }

    /// Remove permissions; unheld identifiers are ignored
    pub fn remove<I, S>(&self, identifiers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.write();
        let mut changed = false;
        for id in identifiers {
            if state.permissions.remove(id.as_ref()) {
                tracing::debug!("Removing permission: {}", id.as_ref());
                changed = true;
            }
        }
        state.touch(changed);
    }

    /// Remove a single permission
    pub fn remove_permission(&self, identifier: &str) {
        self.remove([identifier]);
    }

    /// Replace the held permissions
    pub fn load_permissions<I, S>(&self, identifiers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let loaded: HashSet<String> = identifiers.into_iter().map(Into::into).collect();
        let mut state = self.write();
        let changed = state.permissions != loaded;
        tracing::info!("Loading {} permissions", loaded.len());
        state.permissions = loaded;
        state.touch(changed);
    }

    /// Drop every held permission
    pub fn flush_permissions(&self) {
        let mut state = self.write();
        let changed = !state.permissions.is_empty();
        state.permissions.clear();
        state.touch(changed);
    }

    /// Held permissions (direct grants only), sorted
    pub fn permissions(&self) -> Vec<String> {
        let mut permissions: Vec<String> = self.read().permissions.iter().cloned().collect();
        permissions.sort();
        permissions
    }

    // === Roles ===

    /// Add a role, replacing any role with the same name
    pub fn add_role(&self, role: RoleDefinition) {
        let mut state = self.write();
        tracing::info!(
            "Adding role: {} ({} permissions)",
            role.name,
            role.permissions.len()
        );
        let changed = state.roles.get(&role.name) != Some(&role);
        state.roles.insert(role.name.clone(), role);
        state.touch(changed);
    }

    /// Add several roles
    pub fn add_roles(&self, roles: impl IntoIterator<Item = RoleDefinition>) {
        for role in roles {
            self.add_role(role);
        }
    }

    /// Replace the held roles
    pub fn set_roles(&self, roles: impl IntoIterator<Item = RoleDefinition>) {
        let roles: HashMap<String, RoleDefinition> =
            roles.into_iter().map(|r| (r.name.clone(), r)).collect();
        let mut state = self.write();
        tracing::info!("Setting {} roles", roles.len());
        let changed = state.roles != roles;
        state.roles = roles;
        state.touch(changed);
    }

    /// Remove a role by name; removing an unheld role is a no-op
    pub fn remove_role(&self, name: &str) {
        let mut state = self.write();
        let changed = state.roles.remove(name).is_some();
        if changed {
            tracing::debug!("Removing role: {}", name);
        }
        state.touch(changed);
    }

    /// Drop every held role
    pub fn flush_roles(&self) {
        let mut state = self.write();
        let changed = !state.roles.is_empty();
        state.roles.clear();
        state.touch(changed);
    }

    /// Get a held role by name
    pub fn role(&self, name: &str) -> Option<RoleDefinition> {
        self.read().roles.get(name).cloned()
    }

    /// Held roles, sorted by name
    pub fn roles(&self) -> Vec<RoleDefinition> {
        let mut roles: Vec<RoleDefinition> = self.read().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    /// Drop all permissions and roles (e.g., on logout)
    pub fn flush(&self) {
        let mut state = self.write();
        let changed = !state.permissions.is_empty() || !state.roles.is_empty();
        tracing::info!("Flushing all permissions and roles");
        state.permissions.clear();
        state.roles.clear();
        state.touch(changed);
    }

    // === Reads ===

    /// Take an immutable snapshot with role grants flattened in
    ///
    /// Role expansion is one level deep: a role's permission entries are
    /// never looked up as roles themselves.
    pub fn snapshot(&self) -> Arc<PermissionSnapshot> {
        let state = self.read();
        let mut permissions = state.permissions.clone();
        for role in state.roles.values() {
            permissions.extend(role.permissions.iter().cloned());
        }

        Arc::new(PermissionSnapshot {
            permissions,
            roles: state.roles.keys().cloned().collect(),
            revision: state.revision,
            taken_at: Utc::now(),
        })
    }

    /// Current revision; bumped by every mutation that changes state
    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    /// Check a single identifier against a fresh snapshot
    pub fn has_permission(&self, identifier: &str) -> bool {
        self.snapshot().contains(identifier)
    }

    /// Check if any identifier is held, against a fresh snapshot
    pub fn has_any<S: AsRef<str>>(&self, identifiers: &[S]) -> bool {
        self.snapshot().contains_any(identifiers)
    }
}
