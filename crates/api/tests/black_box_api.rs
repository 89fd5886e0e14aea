use std::sync::Arc;

use cerbero_api::app::{build_app, services::AppServices};
use cerbero_api::config::Environment;
use cerbero_auth::{Role, RolePermissionSet, Tenant, UserRole};
use cerbero_core::{RoleId, TenantId, UserId};
use cerbero_infra::read_model::InMemoryDataClient;
use cerbero_infra::store::{InMemoryRbacStore, InMemorySessionStore, RbacStore, SessionRecord};
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod over seeded in-memory stores, on an ephemeral port.
    ///
    /// Seed:
    /// - `root`: global administrator (`super:admin`), no active tenant
    /// - `ana`: `ventas` in T1 (vacantes:gestionar, leads:acceder, roles:acceder),
    ///   `lectura` in T2 (vacantes:acceder); active in T1
    /// - `bob`: no roles at all
    async fn spawn() -> Self {
        let rbac = InMemoryRbacStore::new();
        let sessions = InMemorySessionStore::new();
        let t1 = TenantId::from_raw("T1");
        let t2 = TenantId::from_raw("T2");

        rbac.upsert_tenant(Tenant::new(t1.clone(), "Acme", "acme").unwrap()).await.unwrap();
        rbac.upsert_tenant(Tenant::new(t2.clone(), "Globex", "globex").unwrap()).await.unwrap();

        let admin = Role::administrator(RoleId::from_raw("admin"));
        let ventas = Role::new(RoleId::from_raw("ventas"), "ventas", Some(t1.clone())).unwrap();
        let lectura = Role::new(RoleId::from_raw("lectura"), "lectura", Some(t2.clone())).unwrap();
        for (role, perms) in [
            (&admin, vec!["super:admin"]),
            (&ventas, vec!["vacantes:gestionar", "leads:acceder", "roles:acceder"]),
            (&lectura, vec!["vacantes:acceder"]),
        ] {
            rbac.upsert_role(role.clone()).await.unwrap();
            rbac.replace_role_permissions(&role.id, &RolePermissionSet::parse(perms).unwrap())
                .await
                .unwrap();
        }

        let root = UserId::from_raw("root");
        let ana = UserId::from_raw("ana");
        rbac.assign_role(UserRole::for_role(root.clone(), &admin)).await.unwrap();
        rbac.assign_role(UserRole::for_role(ana.clone(), &ventas)).await.unwrap();
        rbac.assign_role(UserRole::for_role(ana.clone(), &lectura)).await.unwrap();

        for (token, user, tenant) in [
            ("tok-root", root, None),
            ("tok-ana", ana, Some(t1)),
            ("tok-bob", UserId::from_raw("bob"), None),
        ] {
            sessions
                .insert(SessionRecord {
                    token: token.to_string(),
                    user_id: user,
                    active_tenant_id: tenant,
                })
                .unwrap();
        }

        let services = AppServices::new(
            Environment::Development,
            Arc::new(rbac),
            Arc::new(sessions),
            Arc::new(InMemoryDataClient::new()),
        );
        let app = build_app(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn check(&self, token: Option<&str>, path: &str) -> Value {
        let mut req = reqwest::Client::new()
            .post(self.url("/access/check"))
            .json(&json!({ "path": path }));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let res = req.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn put_role_permissions(&self, token: &str, role: &str, perms: Value) -> reqwest::Response {
        reqwest::Client::new()
            .put(self.url(&format!("/rbac/roles/{role}/permissions")))
            .bearer_auth(token)
            .json(&json!({ "permissions": perms }))
            .send()
            .await
            .unwrap()
    }

    async fn switch(&self, token: &str, tenant: Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(self.url("/tenants/switch"))
            .bearer_auth(token)
            .json(&json!({ "tenantId": tenant }))
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_open() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_checks_distinguish_public_from_unauthenticated() {
    let srv = TestServer::spawn().await;

    let public = srv.check(None, "/sign-in/factor").await;
    assert_eq!(public["hasAccess"], true);
    assert_eq!(public["reason"], "public");

    let protected = srv.check(None, "/admin/usuarios").await;
    assert_eq!(protected["hasAccess"], false);
    assert_eq!(protected["reason"], "unauthenticated");

    // Unknown tokens are anonymous, not an error.
    let unknown = srv.check(Some("nope"), "/perfil").await;
    assert_eq!(unknown["reason"], "unauthenticated");
}

#[tokio::test]
async fn route_checks_follow_the_resolution_engine() {
    let srv = TestServer::spawn().await;

    let modular = srv.check(Some("tok-ana"), "/vacantes/nueva").await;
    assert_eq!(modular["hasAccess"], true);
    assert_eq!(modular["reason"], "permission verified");
    assert_eq!(modular["requiredPermission"], "vacantes:crear");

    let nested = srv.check(Some("tok-ana"), "/leads/42/editar").await;
    assert_eq!(nested["hasAccess"], true);
    assert_eq!(nested["requiredPermission"], "leads:acceder");

    let missing = srv.check(Some("tok-ana"), "/admin/usuarios").await;
    assert_eq!(missing["hasAccess"], false);
    assert_eq!(missing["reason"], "permission insufficient");
    assert_eq!(missing["requiredPermission"], "usuarios:acceder");

    let unlisted = srv.check(Some("tok-bob"), "/reportes").await;
    assert_eq!(unlisted["reason"], "no permission required");

    let profile = srv.check(Some("tok-bob"), "/perfil").await;
    assert_eq!(profile["reason"], "authenticated");

    let root = srv.check(Some("tok-root"), "/admin/super").await;
    assert_eq!(root["reason"], "super-admin");
}

#[tokio::test]
async fn malformed_authorization_header_is_rejected() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(srv.url("/whoami"))
        .header("Authorization", "Basic abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_reflects_request_context() {
    let srv = TestServer::spawn().await;

    let body: Value = srv.get("tok-ana", "/whoami").await.json().await.unwrap();
    assert_eq!(body["userId"], "ana");
    assert_eq!(body["tenantId"], "T1");

    let anon: Value = reqwest::get(srv.url("/whoami")).await.unwrap().json().await.unwrap();
    assert_eq!(anon["authenticated"], false);
    assert!(anon["tenantId"].is_null());
}

#[tokio::test]
async fn default_route_depends_on_held_permissions() {
    let srv = TestServer::spawn().await;

    for (token, expected) in [
        ("tok-root", "/admin/super"),
        ("tok-ana", "/vacantes"),
        ("tok-bob", "/acceso-denegado"),
    ] {
        let body: Value = srv.get(token, "/access/default-route").await.json().await.unwrap();
        assert_eq!(body["path"], expected, "token {token}");
    }

    let res = reqwest::get(srv.url("/access/default-route")).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn vacancies_are_isolated_per_active_tenant() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/vacantes"))
        .bearer_auth("tok-ana")
        .json(&json!({ "titulo": "Backend" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["tenantId"], "T1");

    let rows: Vec<Value> = srv.get("tok-ana", "/vacantes").await.json().await.unwrap();
    assert_eq!(rows.len(), 1);

    let res = srv.switch("tok-ana", json!("T2")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["activeTenantId"], "T2");
    assert_eq!(body["redirect"], "/vacantes");

    let rows: Vec<Value> = srv.get("tok-ana", "/vacantes").await.json().await.unwrap();
    assert!(rows.is_empty());

    // T2 only grants read access.
    let res = client
        .post(srv.url("/vacantes"))
        .bearer_auth("tok-ana")
        .json(&json!({ "titulo": "Frontend" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    srv.switch("tok-ana", json!("T1")).await;
    let rows: Vec<Value> = srv.get("tok-ana", "/vacantes").await.json().await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn tenant_switch_requires_membership() {
    let srv = TestServer::spawn().await;

    assert_eq!(srv.switch("tok-bob", json!("T1")).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(srv.switch("tok-ana", json!(null)).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(srv.switch("tok-ana", json!("T9")).await.status(), StatusCode::FORBIDDEN);

    // Even a super-admin cannot enter a tenant that does not exist.
    assert_eq!(srv.switch("tok-root", json!("T9")).await.status(), StatusCode::NOT_FOUND);

    let res = srv.switch("tok-root", json!("T2")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = srv.switch("tok-root", json!(null)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["activeTenantId"].is_null());
    assert_eq!(body["redirect"], "/admin/super");

    let mine: Value = srv.get("tok-ana", "/tenants/mine").await.json().await.unwrap();
    assert_eq!(mine["activeTenantId"], "T1");
    assert_eq!(mine["isSuperAdmin"], false);
    assert_eq!(mine["memberships"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn role_permission_changes_apply_on_next_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let current: Value = srv.get("tok-ana", "/rbac/roles/ventas/permissions").await.json().await.unwrap();
    assert_eq!(current["permissions"].as_array().unwrap().len(), 3);

    // ana can read roles but not edit them.
    let res = client
        .put(srv.url("/rbac/roles/ventas/permissions"))
        .bearer_auth("tok-ana")
        .json(&json!({ "permissions": ["dashboard:acceder"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Roles of another tenant look missing.
    assert_eq!(
        srv.get("tok-ana", "/rbac/roles/lectura/permissions").await.status(),
        StatusCode::NOT_FOUND
    );

    for (perms, status) in [
        (json!(["foo:bar"]), StatusCode::BAD_REQUEST),
        (json!(["nope"]), StatusCode::BAD_REQUEST),
        (json!(["super:admin"]), StatusCode::UNPROCESSABLE_ENTITY),
        (json!(["dashboard:acceder", "vacantes:acceder"]), StatusCode::OK),
    ] {
        let res = client
            .put(srv.url("/rbac/roles/ventas/permissions"))
            .bearer_auth("tok-root")
            .json(&json!({ "permissions": perms }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), status, "permissions {perms}");
    }

    let body: Value = srv.get("tok-ana", "/access/default-route").await.json().await.unwrap();
    assert_eq!(body["path"], "/dashboard");
    let lost = srv.check(Some("tok-ana"), "/leads").await;
    assert_eq!(lost["hasAccess"], false);
}

#[tokio::test]
async fn catalog_listing_requires_roles_access() {
    let srv = TestServer::spawn().await;

    assert_eq!(srv.get("tok-bob", "/rbac/permissions").await.status(), StatusCode::FORBIDDEN);

    let groups: Vec<Value> = srv.get("tok-ana", "/rbac/permissions").await.json().await.unwrap();
    assert!(groups.iter().any(|g| g["resource"] == "vacantes"));
    assert!(groups.iter().all(|g| g["resource"] != "super"));
}

#[tokio::test]
async fn role_editors_cannot_grant_beyond_their_own_permissions() {
    let srv = TestServer::spawn().await;

    let res = srv
        .put_role_permissions(
            "tok-root",
            "ventas",
            json!(["roles:editar", "roles:acceder", "vacantes:gestionar"]),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .put_role_permissions(
            "tok-ana",
            "ventas",
            json!(["roles:gestionar", "usuarios:gestionar", "tenants:gestionar"]),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "grant_exceeds_held");

    let users = srv.check(Some("tok-ana"), "/admin/usuarios").await;
    assert_eq!(users["reason"], "permission insufficient");
    let tenants = srv.check(Some("tok-ana"), "/admin/empresas").await;
    assert_eq!(tenants["reason"], "permission insufficient");

    // Narrowing within what ana holds is fine; modular grants cover granular ones.
    let res = srv
        .put_role_permissions(
            "tok-ana",
            "ventas",
            json!(["roles:editar", "roles:acceder", "vacantes:acceder"]),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn global_roles_are_hidden_from_tenant_users() {
    let srv = TestServer::spawn().await;

    assert_eq!(
        srv.get("tok-ana", "/rbac/roles/admin/permissions").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        srv.put_role_permissions("tok-ana", "admin", json!(["roles:acceder"])).await.status(),
        StatusCode::FORBIDDEN
    );

    let body: Value = srv.get("tok-root", "/rbac/roles/admin/permissions").await.json().await.unwrap();
    assert_eq!(body["permissions"], json!(["super:admin"]));
}
