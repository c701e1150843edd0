//! HTTP endpoint serving the latest stories as JSON.
//!
//! `GET /getTimeStories?fetch=<bool>` answers:
//!
//! - `200` with the story array when the full limit was extracted
//! - `502` with `{"error", "extracted", "stories"}` when fewer were found
//! - `500` with `{"detail"}` when the page could not be fetched or read

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

use crate::harvest::{Harvest, HarvestError, Harvester};

pub const STORIES_ROUTE: &str = "/getTimeStories";

#[derive(Debug, Deserialize)]
pub struct StoriesQuery {
    #[serde(default = "fetch_by_default")]
    pub fetch: bool,
}

fn fetch_by_default() -> bool {
    true
}

pub fn router(harvester: Arc<Harvester>) -> Router {
    Router::new()
        .route(STORIES_ROUTE, get(get_time_stories))
        .with_state(harvester)
}

async fn get_time_stories(
    State(harvester): State<Arc<Harvester>>,
    Query(query): Query<StoriesQuery>,
) -> Response {
    tracing::debug!(fetch = query.fetch, "server.stories.request");
    harvest_response(harvester.harvest(query.fetch).await)
}

/// Map a harvest outcome onto status code and JSON body.
pub fn harvest_response(outcome: Result<Harvest, HarvestError>) -> Response {
    match outcome {
        Ok(harvest) if harvest.is_insufficient() => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": format!("extracted_less_than_{}", harvest.requested),
                "extracted": harvest.extracted(),
                "stories": harvest.stories,
            })),
        )
            .into_response(),
        Ok(harvest) => (StatusCode::OK, Json(harvest.stories)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "server.stories.failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": err.to_string() })),
            )
                .into_response()
        }
    }
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, harvester: Arc<Harvester>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, route = STORIES_ROUTE, "server.listening");
    }
    axum::serve(listener, router(harvester))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "server.signal.unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("server.shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyline_common::StorylineError;
    use storyline_scan::Story;

    fn stories(n: usize) -> Vec<Story> {
        (0..n)
            .map(|i| Story {
                title: format!("Story {i}"),
                link: format!("https://time.com/{i}/"),
            })
            .collect()
    }

    #[test]
    fn complete_harvest_is_ok() {
        let resp = harvest_response(Ok(Harvest {
            stories: stories(6),
            requested: 6,
        }));
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn short_harvest_is_bad_gateway() {
        let resp = harvest_response(Ok(Harvest {
            stories: stories(4),
            requested: 6,
        }));
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn faults_are_internal_errors() {
        let err = HarvestError::Local(StorylineError::Config("boom".into()));
        let resp = harvest_response(Err(err));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn fetch_defaults_to_true() {
        let q: StoriesQuery = serde_json::from_str("{}").unwrap();
        assert!(q.fetch);
    }
}
