use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::CookieJar;
use minijinja::context;
use pantry::{IngredientList, Recipe};
use pantry_client::{
    kitchen::{failure_message, run_generation, NO_INGREDIENTS_MESSAGE},
    Kitchen, KitchenError, RecipeGenerator,
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::{
    errors::{WebError, WebResult},
    session::{Sessions, Visitor},
};

lazy_static::lazy_static! {
    static ref TEMPLATES: minijinja::Environment<'static> = {
        let mut env = minijinja::Environment::new();
        for (name, template) in &[
            ("base.html.jinja", include_str!("../templates/base.html.jinja")),
            ("index.html.jinja", include_str!("../templates/index.html.jinja")),
        ] {
            env.add_template(name, template)
                .expect("Failed to register template");
        }
        env
    };
}

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn RecipeGenerator>,
    pub sessions: Sessions,
}

impl AppState {
    pub fn new(generator: Arc<dyn RecipeGenerator>) -> Self {
        Self {
            generator,
            sessions: Sessions::default(),
        }
    }
}

impl FromRef<AppState> for Sessions {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // `GET /` renders the whole page for the visitor's kitchen
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ingredients", post(add_ingredient))
        .route("/ingredients/remove", post(remove_ingredient))
        .route("/generate", post(generate))
        // JSON flavour of `/generate`, with no session involved
        .route("/api/recipe", post(api_recipe))
        .route("/static/*path", get(serve_static))
        .layer(
            tower_http::compression::CompressionLayer::new()
                .quality(tower_http::CompressionLevel::Fastest),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn root(visitor: Visitor) -> WebResult<(CookieJar, Html<String>)> {
    // Looking is free: a fresh kitchen is only stored once the visitor changes something
    let kitchen = match visitor.existing_kitchen() {
        Some(handle) => handle.lock_owned().await,
        None => Arc::new(tokio::sync::Mutex::new(Kitchen::new())).lock_owned().await,
    };
    let page = TEMPLATES.get_template("index.html.jinja")?.render(context! {
        ingredients => kitchen.ingredients(),
        recipe => kitchen.recipe(),
        image_url => kitchen.image().map(|image| image.to_data_url()),
        error => kitchen.error(),
        busy => kitchen.is_busy(),
        can_submit => kitchen.can_submit(),
        welcome => !kitchen.is_busy() && kitchen.recipe().is_none() && kitchen.error().is_none(),
    })?;
    Ok((visitor.jar, Html(page)))
}

// Just reply that everything is okay
async fn health() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct IngredientForm {
    ingredient: String,
}

async fn add_ingredient(visitor: Visitor, Form(form): Form<IngredientForm>) -> (CookieJar, Redirect) {
    visitor.kitchen().lock().await.add_ingredient(&form.ingredient);
    (visitor.jar, Redirect::to("/"))
}

async fn remove_ingredient(
    visitor: Visitor,
    Form(form): Form<IngredientForm>,
) -> (CookieJar, Redirect) {
    visitor
        .kitchen()
        .lock()
        .await
        .remove_ingredient(&form.ingredient);
    (visitor.jar, Redirect::to("/"))
}

/// Generate a recipe, then its photo, for the visitor's ingredients.
///
/// The kitchen is only locked around `begin` and `finish`, so the page can
/// still render (showing the busy state) while the models are working.
/// The work runs on its own task: if the browser gives up on the request,
/// the kitchen still finishes and stops being busy.
async fn generate(
    State(state): State<AppState>,
    visitor: Visitor,
) -> WebResult<(CookieJar, Redirect)> {
    let kitchen = visitor.kitchen();
    let started = kitchen.lock().await.begin();
    match started {
        Ok(ingredients) => {
            let generator = state.generator.clone();
            let span = tracing::info_span!("generate", session = %visitor.id);
            let cooking = tokio::spawn(
                async move {
                    let outcome = run_generation(generator.as_ref(), &ingredients).await;
                    // Failures are already on the kitchen for the page to show
                    let _ = kitchen.lock().await.finish(outcome);
                }
                .instrument(span),
            );
            cooking
                .await
                .map_err(|err| anyhow::anyhow!("Generation task failed: {}", err))?;
        }
        Err(KitchenError::Busy) => {
            tracing::info!(session = %visitor.id, "Refusing a second generation");
            return Err(WebError::Conflict(KitchenError::Busy.to_string()));
        }
        Err(err) => tracing::info!(session = %visitor.id, "Not generating: {}", err),
    }
    Ok((visitor.jar, Redirect::to("/")))
}

#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub ingredients: IngredientList,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub recipe: Recipe,
    /// A data URL, or null when no photo could be made
    pub image: Option<String>,
}

async fn api_recipe(
    State(state): State<AppState>,
    Json(request): Json<RecipeRequest>,
) -> WebResult<Json<RecipeResponse>> {
    if request.ingredients.is_empty() {
        return Err(WebError::BadRequest(NO_INGREDIENTS_MESSAGE.into()));
    }
    let generated = run_generation(state.generator.as_ref(), request.ingredients.as_slice())
        .await
        .map_err(|err| WebError::Upstream(failure_message(&err).into()))?;
    Ok(Json(RecipeResponse {
        image: generated.image.map(|image| image.to_data_url()),
        recipe: generated.recipe,
    }))
}

/// Serve static files from in memory using `include_dir!`
async fn serve_static(Path(path): Path<String>) -> WebResult<impl IntoResponse> {
    let dir = include_dir::include_dir!("$CARGO_MANIFEST_DIR/static");
    let bytes = dir.get_file(&path).ok_or(WebError::NotFound)?.contents();
    let header = (
        "Content-Type",
        match path.split('.').last() {
            Some("css") => "text/css",
            Some("js") => "text/javascript",
            Some("svg") => "image/svg+xml",
            _ => "application/octet-stream",
        },
    );
    Ok(([header], bytes).into_response())
}
