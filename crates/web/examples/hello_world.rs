use listener_web::{HandlerRegistry, HandlerResult, Server, TextRender, handler_fn};

async fn hello_world() -> HandlerResult<&'static str> {
    Ok("hello world")
}

async fn hello(name: Option<String>) -> HandlerResult<String> {
    Ok(format!("hello {}", name.as_deref().unwrap_or("stranger")))
}

#[tokio::main]
async fn main() {
    let registry = HandlerRegistry::builder()
        .route("Index", TextRender::get(), handler_fn(hello_world, &[]))
        .route("Hello", TextRender::any(), handler_fn(hello, &["name"]))
        .build()
        .unwrap();

    Server::builder().registry(registry).address("127.0.0.1:3000").build().unwrap().start().await.unwrap();
}
