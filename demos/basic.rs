use std::time::Duration;

use demand_http::{Descriptor, Engine, EngineOptions};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url =
        std::env::var("DEMAND_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_owned());

    let mut options = EngineOptions::from_env()?;
    if options.retry_delays.is_empty() {
        options.retry_delays = vec![Duration::from_millis(200), Duration::from_secs(1)];
    }
    let engine = Engine::with_options(options);

    let lookup = Descriptor::create("GET", &base_url, "/v1/items", [("q", "kit")])
        .parameter(json!({ "page": 1, "tags": ["a", "b"] }))
        .header("X-Client", "demand-http-demo");
    let (response, properties, success) = engine.send(lookup).await.into_parts();
    println!(
        "GET success={success} status={} attempts={} elapsed={:?}",
        response.status_code, properties.retries, properties.total_elapsed
    );
    if let Some(err) = properties.last_error() {
        println!("last error: {err}");
    }

    let create = Descriptor::create("POST", &base_url, "/v1/items", ())
        .authorization_bearer("demo-token");
    let exchange = engine
        .send_json(create, &json!({ "name": "Kit", "tags": ["demo"] }))
        .await;
    println!(
        "POST success={} status={} body={}",
        exchange.success,
        exchange.response.status_code,
        exchange.response.text().trim_end()
    );

    let login = Descriptor::create("POST", &base_url, "/login", ());
    let exchange = engine
        .send_form(login, [("user", "kit"), ("password", "hunter2")])
        .await;
    println!("FORM success={} ok={}", exchange.success, exchange.response.is_ok);

    Ok(())
}
