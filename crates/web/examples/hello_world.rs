use nimble_web::router::Router;
use nimble_web::{Handler, Server};

#[tokio::main]
async fn main() {
    let router = Router::builder()
        .get("/", Handler::blocking(|_req, _params| "hello world"))
        .build()
        .unwrap();

    Server::builder().router(router).address("127.0.0.1", 3000).build().unwrap().start().await.unwrap();
}
