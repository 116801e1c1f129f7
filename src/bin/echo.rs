use anyhow::{Context as _, Result};
use aws_lambda_gateway::{Gateway, Request, RequestExt, ResponseWriter, handler_fn};
use http::StatusCode;
use lambda_runtime::Error;
use lambda_runtime::tracing::{error, warn};
use serde_json::{Map, Value, json};

/// Everything the handler can see about the request, as JSON.
fn describe(request: &Request) -> Result<Vec<u8>> {
    let headers: Map<String, Value> = request
        .headers()
        .keys()
        .map(|name| {
            let values: Vec<Value> = request
                .headers()
                .get_all(name)
                .iter()
                .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
                .collect();
            (name.to_string(), Value::Array(values))
        })
        .collect();

    let body = json!({
        "method": request.method().as_str(),
        "uri": request.uri().to_string(),
        "requestUri": request.request_uri(),
        "remoteAddr": request.remote_addr(),
        "host": request.host(),
        "headers": headers,
        "body": String::from_utf8_lossy(request.body()),
        "requestContext": request.gateway_context(),
    });

    serde_json::to_vec_pretty(&body).context("Failed to serialize request description")
}

fn echo(request: Request, writer: &mut ResponseWriter) {
    writer.headers_mut().set("Content-Type", "application/json");

    match describe(&request) {
        Ok(body) => {
            if let Err(e) = writer.write(&body) {
                warn!(error = %e, "Failed to write echo body");
            }
        }
        Err(e) => {
            error!(error = ?e, "Echo failed");
            writer.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();

    Gateway::builder().handler(handler_fn(echo)).build().start().await
}
