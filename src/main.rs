use std::sync::Arc;

use anyhow::Context;
use brrtmux::dispatcher::{HandlerRequest, HandlerResponse};
use brrtmux::logging::{init_logging, LogConfig};
use brrtmux::{MetricsPlugin, Multiplexer, TracingPlugin};
use clap::Parser;
use serde_json::json;
use tracing::info;

/// Demo server for brrtmux
#[derive(Parser)]
#[command(name = "brrtmux-demo")]
#[command(about = "Run a small brrtmux service", long_about = None)]
struct Cli {
    /// Address to bind to
    #[arg(long, env = "BRRTMUX_ADDRESS", default_value = "0.0.0.0")]
    address: String,

    /// Port to listen on
    #[arg(long, env = "BRRTMUX_PORT", default_value = "8080")]
    port: String,

    /// Only serve requests under this prefix (e.g. /api)
    #[arg(long, env = "BRRTMUX_BASE_PATH", default_value = "")]
    base_path: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env())?;

    let metrics = Arc::new(MetricsPlugin::new());
    let mut mux = Multiplexer::with_base_path(&cli.base_path);

    // Collapse a trailing slash so `/health/` routes like `/health`.
    mux.use_plugin(|_res: &mut HandlerResponse, req: &mut HandlerRequest| {
        if req.path.len() > 1 && req.path.ends_with('/') {
            req.path.pop();
        }
    })?;
    mux.use_shared_plugin(Arc::clone(&metrics) as Arc<dyn brrtmux::Plugin>)?;
    mux.use_plugin(TracingPlugin::new())?;

    mux.get("/health", |res: &mut HandlerResponse, _req: &HandlerRequest| {
        res.set_body(json!({ "status": "ok" }));
    })?;

    let metrics_view = Arc::clone(&metrics);
    mux.get("/metrics", move |res: &mut HandlerResponse, _req: &HandlerRequest| {
        res.set_header("content-type", "text/plain; version=0.0.4");
        res.set_body(json!(metrics_view.render()));
    })?;

    mux.get("/users/{id:int}", |res: &mut HandlerResponse, req: &HandlerRequest| {
        res.set_body(json!({
            "id": req.get_path_param("id"),
            "request_id": req.request_id.to_string(),
        }));
    })?;

    mux.post("/users", |res: &mut HandlerResponse, req: &HandlerRequest| match &req.body {
        Some(body) => {
            res.set_status(201);
            res.set_body(json!({ "created": body }));
        }
        None => {
            res.set_status(400);
            res.set_body(json!({ "error": "expected a JSON body" }));
        }
    })?;

    mux.get(
        r"/files/:name([a-z0-9_-]+\.txt)",
        |res: &mut HandlerResponse, req: &HandlerRequest| {
            res.set_body(json!(format!(
                "contents of {}",
                req.get_path_param("name").unwrap_or_default()
            )));
        },
    )?;

    mux.listen(&cli.address, &cli.port)
        .with_context(|| format!("failed to listen on {}:{}", cli.address, cli.port))?;
    info!(
        address = %cli.address,
        port = %cli.port,
        base_path = %mux.base_path(),
        "brrtmux-demo ready"
    );
    mux.join()?;
    Ok(())
}
