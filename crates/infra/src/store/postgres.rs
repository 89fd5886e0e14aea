//! Postgres-backed RBAC and session stores.
//!
//! ## Tenant isolation
//!
//! Every per-user query is keyed by `user_id` *and* either the requested
//! `tenant_id` or the global (`tenant_id IS NULL`) scope.
//!
//! ## Atomic replacement
//!
//! `replace_role_permissions` runs delete-all-then-insert inside a single
//! transaction; an unknown permission name rolls the whole thing back.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use cerbero_auth::{
    Permission, Role, RolePermissionSet, Tenant, TenantMembership, UserRole, catalog,
};
use cerbero_core::{RoleId, TenantId, UserId};

use crate::error::StoreError;

use super::{RbacStore, SessionRecord, SessionStore};

/// Schema owned by this crate. Statements are idempotent.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS tenants (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE
    )"#,
    r#"CREATE TABLE IF NOT EXISTS permissions (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        resource TEXT NOT NULL,
        action TEXT NOT NULL,
        description TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS roles (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        tenant_id TEXT NULL REFERENCES tenants(id) ON DELETE CASCADE
    )"#,
    // (name, tenant_id) is unique for tenant roles; NULL tenants need their own index.
    "CREATE UNIQUE INDEX IF NOT EXISTS roles_name_tenant_key ON roles (name, tenant_id) WHERE tenant_id IS NOT NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS roles_name_global_key ON roles (name) WHERE tenant_id IS NULL",
    r#"CREATE TABLE IF NOT EXISTS role_permissions (
        role_id TEXT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
        permission_id TEXT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
        PRIMARY KEY (role_id, permission_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS user_roles (
        user_id TEXT NOT NULL,
        role_id TEXT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
        tenant_id TEXT NULL REFERENCES tenants(id) ON DELETE CASCADE
    )"#,
    "CREATE UNIQUE INDEX IF NOT EXISTS user_roles_key ON user_roles (user_id, role_id, COALESCE(tenant_id, ''))",
    r#"CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        active_tenant_id TEXT NULL REFERENCES tenants(id) ON DELETE SET NULL
    )"#,
];

fn unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[derive(Debug, Clone)]
pub struct PostgresRbacStore {
    pool: PgPool,
}

impl PostgresRbacStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(PgPool::connect(database_url).await?))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and seed the compiled permission catalog.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        self.seed_catalog().await
    }

    async fn seed_catalog(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for def in catalog::catalog() {
            sqlx::query(
                r#"
                INSERT INTO permissions (id, name, resource, action, description)
                VALUES ($1, $1, $2, $3, $4)
                ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
                "#,
            )
            .bind(def.name.as_str())
            .bind(def.resource)
            .bind(def.action)
            .bind(def.description)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        tracing::info!("permission catalog seeded");
        Ok(())
    }
}

#[async_trait]
impl RbacStore for PostgresRbacStore {
    async fn upsert_tenant(&self, tenant: Tenant) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO tenants (id, name, slug) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, slug = EXCLUDED.slug
            "#,
        )
        .bind(tenant.id.as_str())
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if unique_violation(&e) => {
                Err(StoreError::Conflict(format!("tenant slug '{}' is taken", tenant.slug)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn tenant(&self, tenant_id: &TenantId) -> Result<Option<Tenant>, StoreError> {
        let row = sqlx::query("SELECT id, name, slug FROM tenants WHERE id = $1")
            .bind(tenant_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(Tenant {
            id: TenantId::from_raw(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
        }))
    }

    async fn upsert_role(&self, role: Role) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO roles (id, name, tenant_id) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(role.id.as_str())
        .bind(&role.name)
        .bind(role.tenant_id.as_ref().map(TenantId::as_str))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if unique_violation(&e) => {
                Err(StoreError::Conflict(format!("role '{}' already exists", role.name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn role(&self, role_id: &RoleId) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query("SELECT id, name, tenant_id FROM roles WHERE id = $1")
            .bind(role_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(Role {
            id: RoleId::from_raw(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            tenant_id: row
                .try_get::<Option<String>, _>("tenant_id")?
                .map(TenantId::from_raw),
        }))
    }

    async fn assign_role(&self, assignment: UserRole) -> Result<(), StoreError> {
        let role = self
            .role(&assignment.role_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("role {}", assignment.role_id)))?;
        if role.tenant_id != assignment.tenant_id {
            return Err(cerbero_core::DomainError::invariant(
                "assignment tenant must match the role's tenant",
            )
            .into());
        }

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id, tenant_id) VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(assignment.user_id.as_str())
        .bind(assignment.role_id.as_str())
        .bind(assignment.tenant_id.as_ref().map(TenantId::as_str))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace_role_permissions(
        &self,
        role_id: &RoleId,
        permissions: &RolePermissionSet,
    ) -> Result<(), StoreError> {
        let role = self
            .role(role_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("role {role_id}")))?;
        permissions.validate_for(&role)?;

        let names = permissions.names();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id.as_str())
            .execute(&mut *tx)
            .await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, p.id FROM permissions p WHERE p.name = ANY($2)
            "#,
        )
        .bind(role_id.as_str())
        .bind(&names)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted as usize != names.len() {
            // Dropping `tx` rolls back the delete as well.
            let known: Vec<String> = sqlx::query("SELECT name FROM permissions WHERE name = ANY($1)")
                .bind(&names)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .map(|r| r.try_get::<String, _>("name"))
                .collect::<Result<_, _>>()?;
            let unknown = names.into_iter().filter(|n| !known.contains(n)).collect();
            return Err(StoreError::UnknownPermissions(unknown));
        }

        tx.commit().await?;
        tracing::info!(role_id = %role_id, count = inserted, "role permissions replaced");
        Ok(())
    }

    async fn role_permissions(&self, role_id: &RoleId) -> Result<RolePermissionSet, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT p.name FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            "#,
        )
        .bind(role_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let permissions = rows
            .into_iter()
            .map(|r| -> Result<Permission, StoreError> {
                Ok(Permission::parse(r.try_get::<String, _>("name")?)?)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RolePermissionSet::new(permissions))
    }

    async fn memberships(&self, user_id: &UserId) -> Result<Vec<TenantMembership>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, role_id FROM user_roles
            WHERE user_id = $1 AND tenant_id IS NOT NULL
            ORDER BY tenant_id, role_id
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut by_tenant: BTreeMap<String, Vec<RoleId>> = BTreeMap::new();
        for row in rows {
            let tenant: String = row.try_get("tenant_id")?;
            let role: String = row.try_get("role_id")?;
            by_tenant.entry(tenant).or_default().push(RoleId::from_raw(role));
        }
        Ok(by_tenant
            .into_iter()
            .map(|(tenant, roles)| TenantMembership {
                tenant_id: TenantId::from_raw(tenant),
                roles,
            })
            .collect())
    }

    async fn permissions_for(
        &self,
        user_id: &UserId,
        tenant_id: Option<&TenantId>,
    ) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT p.name FROM user_roles ur
            JOIN role_permissions rp ON rp.role_id = ur.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE ur.user_id = $1
              AND (ur.tenant_id IS NULL OR ur.tenant_id = $2)
            ORDER BY p.name
            "#,
        )
        .bind(user_id.as_str())
        .bind(tenant_id.map(TenantId::as_str))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| r.try_get::<String, _>("name").map_err(StoreError::from))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn lookup(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query("SELECT token, user_id, active_tenant_id FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(SessionRecord {
            token: row.try_get("token")?,
            user_id: UserId::from_raw(row.try_get::<String, _>("user_id")?),
            active_tenant_id: row
                .try_get::<Option<String>, _>("active_tenant_id")?
                .map(TenantId::from_raw),
        }))
    }

    async fn set_active_tenant(&self, token: &str, tenant_id: Option<TenantId>) -> Result<(), StoreError> {
        let updated = sqlx::query("UPDATE sessions SET active_tenant_id = $2 WHERE token = $1")
            .bind(token)
            .bind(tenant_id.as_ref().map(TenantId::as_str))
            .execute(&self.pool)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(StoreError::NotFound("session".to_string()));
        }
        Ok(())
    }
}
