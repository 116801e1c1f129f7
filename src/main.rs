use aws_lambda_gateway::{Gateway, Request, ResponseWriter, handler_fn};
use lambda_runtime::Error;
use lambda_runtime::tracing::warn;
use std::io::Write;

fn hello(request: Request, writer: &mut ResponseWriter) {
    if let Err(e) = writeln!(writer, "Hello World from Rust - method {}", request.method()) {
        warn!(error = %e, "Failed to write response");
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Use Lambda runtime's built-in tracing subscriber for CloudWatch Logs
    lambda_runtime::tracing::init_default_subscriber();

    Gateway::builder().handler(handler_fn(hello)).build().start().await
}
