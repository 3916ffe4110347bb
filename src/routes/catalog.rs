use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::kt::config::KtConfig;
use crate::kt::types::Topic;
use crate::response::ok;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/topics", get(list_topics))
        .route("/model", get(model_parameters))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TopicInfo {
    id: Topic,
    label: &'static str,
}

async fn list_topics() -> impl axum::response::IntoResponse {
    let topics: Vec<TopicInfo> = Topic::ALL
        .into_iter()
        .map(|topic| TopicInfo {
            id: topic,
            label: topic.label(),
        })
        .collect();
    ok(topics)
}

async fn model_parameters(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let config: KtConfig = *state.engine().config();
    ok(config)
}
