//! Central module for organizing the application's main API endpoints.
//!
//! This module holds the route table (`/{module}/{action}`), the legacy
//! `index.php?module=&action=` dispatcher, and the protected router that puts
//! every non-auth route behind the session gate. Authentication routes are
//! handled separately in [`crate::auth`].

pub mod reports;
pub mod transactions;

use axum::extract::Query;
use axum::middleware::from_fn_with_state;
use axum::response::Redirect;
use axum::routing::any;
use axum::Router;
use finsight_store::Role;
use serde::Deserialize;

use crate::auth::{session_gate, GateState};
use crate::errors::AppError;
use crate::state::AppState;

pub const DASHBOARD_PATH: &str = "/reports/dashboard";

/// Top-level feature area of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Auth,
    Transactions,
    Budgets,
    Goals,
    Reports,
}

impl Module {
    pub const ALL: [Module; 5] = [
        Module::Auth,
        Module::Transactions,
        Module::Budgets,
        Module::Goals,
        Module::Reports,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Module::Auth => "auth",
            Module::Transactions => "transactions",
            Module::Budgets => "budgets",
            Module::Goals => "goals",
            Module::Reports => "reports",
        }
    }

    pub fn actions(self) -> &'static [&'static str] {
        match self {
            Module::Auth => &["login", "logout", "register"],
            Module::Transactions => &["list", "add", "edit", "delete"],
            Module::Budgets => &["manage", "report", "create", "update", "delete"],
            Module::Goals => &["create", "track", "update", "delete"],
            Module::Reports => &["dashboard", "monthly", "yearly", "export"],
        }
    }

    pub fn from_name(name: &str) -> Option<Module> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Everything except `auth` needs a session.
    pub fn requires_session(self) -> bool {
        self != Module::Auth
    }
}

/// One entry of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub module: Module,
    pub action: &'static str,
}

impl Route {
    pub const DEFAULT: Route = Route {
        module: Module::Reports,
        action: "dashboard",
    };

    /// Look up `module`/`action`. Missing parts take the default's; anything
    /// not in the table resolves to the dashboard.
    pub fn resolve(module: Option<&str>, action: Option<&str>) -> Route {
        let module_name = module.unwrap_or(Self::DEFAULT.module.name());
        let action_name = action.unwrap_or(Self::DEFAULT.action);

        Module::from_name(module_name)
            .and_then(|module| {
                module
                    .actions()
                    .iter()
                    .copied()
                    .find(|a| *a == action_name)
                    .map(|action| Route { module, action })
            })
            .unwrap_or(Self::DEFAULT)
    }

    pub fn path(&self) -> String {
        format!("/{}/{}", self.module.name(), self.action)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DispatchQuery {
    pub module: Option<String>,
    pub action: Option<String>,
}

/// `/` and `/index.php?module=&action=`.
pub async fn dispatch(Query(query): Query<DispatchQuery>) -> Redirect {
    let route = Route::resolve(query.module.as_deref(), query.action.as_deref());
    Redirect::to(&route.path())
}

/// Any path outside the table.
pub async fn fallback() -> Redirect {
    Redirect::to(DASHBOARD_PATH)
}

/// Table entries with no backing feature.
async fn missing_page() -> AppError {
    AppError::not_found()
}

/// Every session-protected route, gated at `Role::Student` and above.
pub fn protected_router(state: AppState) -> Router<AppState> {
    let mut router = Router::new()
        .merge(transactions::routes::transactions_router())
        .merge(reports::routes::reports_router());

    for module in [Module::Budgets, Module::Goals] {
        for &action in module.actions() {
            router = router.route(&Route { module, action }.path(), any(missing_page));
        }
    }

    let gate = GateState {
        app: state,
        min_role: Role::Student,
    };
    router.route_layer(from_fn_with_state(gate, session_gate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get, json_body, location, TestApp};
    use axum::http::StatusCode;

    #[test]
    fn resolve_known_and_unknown_routes() {
        assert_eq!(
            Route::resolve(Some("transactions"), Some("edit")).path(),
            "/transactions/edit"
        );
        assert_eq!(Route::resolve(None, None), Route::DEFAULT);
        assert_eq!(Route::resolve(Some("reports"), None), Route::DEFAULT);
        assert_eq!(Route::resolve(Some("admin"), Some("panel")), Route::DEFAULT);
        assert_eq!(Route::resolve(Some("goals"), Some("dashboard")), Route::DEFAULT);
        assert_eq!(Route::resolve(Some("auth"), Some("login")).path(), "/auth/login");
    }

    #[test]
    fn only_auth_is_public() {
        for module in Module::ALL {
            assert_eq!(module.requires_session(), module != Module::Auth);
            assert_eq!(Module::from_name(module.name()), Some(module));
        }
    }

    #[tokio::test]
    async fn legacy_dispatch_redirects() {
        let app = TestApp::new();
        let response = app
            .send(get("/index.php?module=transactions&action=list", None))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/transactions/list");

        let response = app.send(get("/", None)).await;
        assert_eq!(location(&response), DASHBOARD_PATH);

        let response = app.send(get("/index.php?module=nope&action=x", None)).await;
        assert_eq!(location(&response), DASHBOARD_PATH);

        let response = app.send(get("/no/such/page", None)).await;
        assert_eq!(location(&response), DASHBOARD_PATH);
    }

    #[tokio::test]
    async fn budgets_and_goals_are_gated_then_missing() {
        let app = TestApp::new();
        let response = app.send(get("/goals/track", None)).await;
        assert_eq!(location(&response), "/auth/login?error=unauthorized");

        app.user("tono", Role::Student).await;
        let (cookie, _) = app.login("tono").await;
        let response = app.send(get("/budgets/manage", Some(cookie.as_str()))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["message"], "The requested page does not exist.");
    }
}
