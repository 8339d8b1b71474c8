//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::state::AppState;
use crate::widgets::{self, Widget};

use super::{Shell, render};

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub shell: Shell,
    pub widgets: Vec<Widget>,
}

/// Dashboard page handler.
///
/// A failing widget query is logged and the page renders without widgets.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let placements = state.panel().widgets();
    let widgets = match widgets::load(state.pool(), &placements).await {
        Ok(widgets) => widgets,
        Err(e) => {
            tracing::error!("Failed to load dashboard widgets: {e}");
            Vec::new()
        }
    };
    let shell = Shell::load(&state, "", "Dashboard").await?;
    render(&DashboardTemplate { shell, widgets })
}
