//! Movie resource handlers.
//!
//! Each handler does one row operation inside a request-scoped session and
//! commits before responding. Request bodies are parsed by [`ApiJson`]; a
//! body that does not match the shape never reaches the handler.

use crate::api::{with_session, ApiError, ApiJson, ApiPath};
use crate::AppState;
use axum::{extract::Extension, http::StatusCode, Json};
use marquee_movies::{
    create_movie, delete_movie, get_movie, update_movie, Movie, MovieUpdate, NewMovie,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// POST /movies
pub async fn create_movie_handler(
    Extension(state): Extension<Arc<AppState>>,
    ApiJson(payload): ApiJson<NewMovie>,
) -> Result<(StatusCode, Json<Movie>), ApiError> {
    let movie = with_session(&state.pool, move |session| {
        let tx = session.unit_of_work()?;
        let movie = create_movie(&tx, payload)?;
        tx.commit()?;
        Ok(movie)
    })
    .await?;

    tracing::info!(movie_id = movie.id, "movie created");
    Ok((StatusCode::CREATED, Json(movie)))
}

/// GET /movies/{id}
pub async fn get_movie_handler(
    Extension(state): Extension<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Movie>, ApiError> {
    let movie = with_session(&state.pool, move |session| {
        Ok(get_movie(session.connection(), id)?)
    })
    .await?;

    Ok(Json(movie))
}

/// PUT /movies/{id}
///
/// Responds with 201 rather than 200; existing clients depend on it.
pub async fn update_movie_handler(
    Extension(state): Extension<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<MovieUpdate>,
) -> Result<(StatusCode, Json<Movie>), ApiError> {
    let movie = with_session(&state.pool, move |session| {
        let tx = session.unit_of_work()?;
        let movie = update_movie(&tx, id, &payload)?;
        tx.commit()?;
        Ok(movie)
    })
    .await?;

    tracing::info!(movie_id = id, "movie updated");
    Ok((StatusCode::CREATED, Json(movie)))
}

/// DELETE /movies/{id}
pub async fn delete_movie_handler(
    Extension(state): Extension<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    with_session(&state.pool, move |session| {
        let tx = session.unit_of_work()?;
        delete_movie(&tx, id)?;
        tx.commit()?;
        Ok(())
    })
    .await?;

    tracing::info!(movie_id = id, "movie deleted");
    Ok(Json(json!({"deleted": "Ok"})))
}
