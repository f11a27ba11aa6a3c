//! Demo server for convention-dispatch.
//!
//! ```text
//! convention-dispatch [--config config.toml]
//! ```
//!
//! Serves a small in-memory notes resource:
//!
//! ```text
//! GET    /notes                notes
//! GET    /notes/:note_id       note
//! POST   /notes/:note_id/pin   pin_note
//! GET    /health
//! GET    /                     → 301 /notes
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use axum::http::StatusCode;
use clap::Parser;
use tokio::net::TcpListener;

use convention_dispatch::config::{load_config, DispatchConfig};
use convention_dispatch::http::middleware::form_method;
use convention_dispatch::http::status_response;
use convention_dispatch::observability::logging::init_logging;
use convention_dispatch::{
    handler_fn, ActionError, Controller, Dispatcher, HttpServer, Methods, ResponseWriter,
    Shutdown,
};

#[derive(Parser)]
#[command(name = "convention-dispatch")]
#[command(about = "Demo server for convention-based routing", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
struct Notes {
    pinned: Arc<Mutex<Vec<String>>>,
}

impl Notes {
    fn index(&mut self) -> String {
        let pinned = self.pinned.lock().unwrap_or_else(PoisonError::into_inner);
        format!("notes (pinned: {})\n", pinned.join(", "))
    }

    fn show(&mut self, id: String) -> Result<String, ActionError> {
        if id.parse::<u64>().is_err() {
            return Err(ActionError::msg(format!("invalid note id {:?}", id)));
        }
        Ok(format!("note {}\n", id))
    }

    fn pin(&mut self, id: String) -> (String, StatusCode) {
        self.pinned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id.clone());
        (format!("pinned {}\n", id), StatusCode::CREATED)
    }

    fn handle_error(&mut self, w: ResponseWriter, err: ActionError) {
        tracing::warn!(error = %err, "Request failed");
        w.write_header(StatusCode::BAD_REQUEST);
        w.write(format!("{}\n", err).as_bytes());
    }
}

impl Controller for Notes {
    fn methods(m: &mut Methods<Self>) {
        m.method("Index", Self::index)
            .method("Show", Self::show)
            .method("MemberPOSTPin", Self::pin)
            .method("HandleError", Self::handle_error);
    }
}


#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DispatchConfig::default(),
    };
    init_logging(&config.observability);

    tracing::info!("convention-dispatch v0.1.0 starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        pool_capacity = config.pipeline.pool_capacity,
        "Configuration loaded"
    );

    let mut dispatcher = Dispatcher::with_config(&config);
    dispatcher.use_middleware(form_method());
    dispatcher.draw(|s| {
        s.resources(Notes::default());
        s.get("health")
            .to(handler_fn(|_| status_response(StatusCode::OK)))
            .as_name("health");
        s.get("").redirect_to("/notes");
    });

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, Arc::new(dispatcher));
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
