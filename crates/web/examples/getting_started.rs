use std::time::Instant;

use http::{HeaderName, HeaderValue, Method, StatusCode};
use nimble_web::middleware::{middleware_fn, MiddlewareChain, Next};
use nimble_web::router::Router;
use nimble_web::{Handler, HandlerError, HandlerResult, PathParams, Request, Server, ServerConfig};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Deserialize, Debug)]
pub struct User {
    name: String,
    zip: String,
}

fn index(_req: Request, _params: PathParams) -> &'static str {
    "try GET /users/42 or POST /api/users\r\n"
}

// curl -v http://127.0.0.1:8080/users/42
async fn show_user(_req: Request, params: PathParams) -> serde_json::Value {
    json!({ "id": params.get("id"), "name": "nimble" })
}

// curl -v -H 'Content-Type: application/json' -H 'Authorization: token' -d '{"name":"hello","zip":"world"}' http://127.0.0.1:8080/api/users
async fn create_user(req: Request, _params: PathParams) -> Result<(StatusCode, String), HandlerError> {
    let user: User = serde_json::from_slice(req.body()).map_err(HandlerError::bad_request)?;
    Ok((StatusCode::CREATED, format!("created user {} in {}\r\n", user.name, user.zip)))
}

async fn timing(req: Request, params: PathParams, next: Next) -> HandlerResult {
    let start = Instant::now();
    let (method, path) = (req.method().clone(), req.path().to_owned());
    let result = next.run(req, params).await;
    info!(%method, %path, elapsed = ?start.elapsed(), "request handled");
    result
}

async fn require_token(req: Request, params: PathParams, next: Next) -> HandlerResult {
    if req.header("authorization").is_none() {
        return Err(HandlerError::status(StatusCode::UNAUTHORIZED, "missing authorization header"));
    }
    let response = next.run(req, params).await?;
    Ok(response.with_header(HeaderName::from_static("x-authorized"), HeaderValue::from_static("true")))
}

#[tokio::main]
async fn main() {
    // reads `nimble.toml` from the working directory when it exists
    let config = ServerConfig::from_file("nimble.toml").unwrap_or_default();

    let router = Router::builder()
        .with_global_middleware(middleware_fn(timing))
        .get("/", Handler::blocking(index))
        .get("/users/:id", Handler::suspending(show_user))
        .group("/api", MiddlewareChain::new().with(middleware_fn(require_token)), |api| {
            api.route("/users", &[Method::POST, Method::PUT], Handler::suspending(create_user))
        })
        .build()
        .unwrap();

    Server::builder().router(router).config(config).build().unwrap().start().await.unwrap();
}
