use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use event_buckets::{ErrorBody, EventsQueryParams, EventsResponse, StoreHandle, ingest};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Clone)]
struct AppState {
    store: StoreHandle,
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let app_state = AppState {
        store: StoreHandle::default(),
    };

    let feed_path = std::env::var("EVENTS_FILE").unwrap_or_else(|_| "events.csv".to_string());
    let loader = app_state.store.clone();
    tokio::spawn(async move {
        match ingest::load(&feed_path).await {
            Ok(store) => {
                info!(customers = store.customer_count(), "event index ready");
                loader.publish(store);
            }
            Err(e) => {
                error!("failed to load event feed {feed_path:?}: {e}");
                std::process::exit(1);
            }
        }
    });

    let app = Router::new()
        .route("/events", get(events))
        .with_state(app_state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    info!("listening on {addr}");

    axum::serve(listener, app).await.unwrap();
}

async fn events(
    State(app_state): State<AppState>,
    Query(params): Query<EventsQueryParams>,
) -> Result<Json<EventsResponse>, (StatusCode, Json<ErrorBody>)> {
    // suspends until the one-time load has published the index
    let store = app_state.store.get().await;

    let buckets = store
        .hourly_buckets(&params.customer, params.lower, params.upper)
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
        })?;

    Ok(Json(EventsResponse {
        lower: params.lower,
        upper: params.upper,
        buckets,
    }))
}
