//! A controller with JSON and redirect routes, stopped gracefully on Ctrl-C.
//!
//! ```text
//! curl 'http://127.0.0.1:8080/Add?a=1&b=2'
//! curl -d 'a=6&b=7' 'http://127.0.0.1:8080/Multiply'
//! curl -i 'http://127.0.0.1:8080/'
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use listener_web::{
    Controller, DispatchError, HandlerRegistry, HandlerRegistryBuilder, HandlerResult, JsonRender, RedirectRender, Server,
    TracingListener, handler_fn,
};
use serde::Serialize;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Default)]
struct Calculator {
    operations: AtomicU64,
}

#[derive(Serialize)]
struct Outcome {
    result: i64,
    operation_count: u64,
}

impl Calculator {
    fn outcome(&self, result: Option<i64>) -> HandlerResult<Outcome> {
        let result = result.ok_or_else(|| DispatchError::bad_request("The result does not fit in 64 bits."))?;
        let operation_count = self.operations.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Outcome { result, operation_count })
    }
}

impl Controller for Calculator {
    fn register(self: Arc<Self>, routes: HandlerRegistryBuilder) -> HandlerRegistryBuilder {
        let add = Arc::clone(&self);
        let multiply = Arc::clone(&self);
        routes
            .route("Index", RedirectRender::get(), handler_fn(|| async { HandlerResult::Ok("/Add?a=1&b=1") }, &[]))
            .route(
                "Add",
                JsonRender::get(),
                handler_fn(
                    move |a: i64, b: i64| {
                        let calculator = Arc::clone(&add);
                        async move { calculator.outcome(a.checked_add(b)) }
                    },
                    &["a", "b"],
                ),
            )
            .route(
                "Multiply",
                JsonRender::post(),
                handler_fn(
                    move |a: i64, b: Option<i64>| {
                        let calculator = Arc::clone(&multiply);
                        async move { calculator.outcome(a.checked_mul(b.unwrap_or(1))) }
                    },
                    &["a", "b"],
                ),
            )
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let registry = match HandlerRegistry::from_controller(Calculator::default()) {
        Ok(registry) => registry,
        Err(e) => {
            error!(cause = %e, "invalid routes");
            return;
        }
    };

    let server = Server::builder()
        .registry(registry)
        .address("127.0.0.1:8080")
        .listener(TracingListener)
        .shutdown_grace(Duration::from_secs(2))
        .build()
        .expect("server config should be valid");

    let running = server.clone();
    let accept_loop = tokio::spawn(async move { running.start().await });

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(cause = %e, "unable to listen for shutdown signal");
    }
    info!("shutting down");
    server.stop().await;

    match accept_loop.await {
        Ok(Err(e)) => error!(cause = %e, "server failed"),
        Err(e) => error!(cause = %e, "accept loop panicked"),
        Ok(Ok(())) => {}
    }
}
