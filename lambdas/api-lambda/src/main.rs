use std::sync::Arc;

use gigboard_shared::AppState;
use lambda_http::{run, service_fn, Error};

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_http::tracing::init_default_subscriber();

    let state = Arc::new(AppState::from_env().await);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
