use axum::{body::Body, extract::MatchedPath, routing::get, Router};
use hyper::Request;
use std::{future::Future, net::SocketAddr};
use tokio::net::TcpListener;

use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::configuration::Settings;

pub const POLLING_BODY: &str = "Bot is running in polling mode";

pub struct Application {
    listening_addr: SocketAddr,
    server: Server,
}

impl Application {
    /// Serves `webhook` when given, otherwise the polling-mode liveness route.
    pub async fn build(
        settings: &Settings,
        webhook: Option<Router>,
    ) -> Result<Application, anyhow::Error> {
        let tracing_layer = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let method = req.method();
                let uri = req.uri();
                let matched_path = req.extensions().get::<MatchedPath>().map(|p| p.as_str());

                tracing::debug_span!("http-request", %method, %uri, matched_path, request_id = %Uuid::new_v4())
            });

        let app = match webhook {
            Some(router) => {
                if let Some(url) = &settings.bot.webhook_url {
                    info!("Webhook endpoint set up at {}", url.path());
                }
                router
            }
            None => Router::new().route("/", get(|| async { POLLING_BODY })),
        }
        .layer(tracing_layer);

        let listener = TcpListener::bind(settings.app.socket_addr()).await?;
        Ok(Self {
            listening_addr: listener.local_addr()?,
            server: Server::new(listener, app),
        })
    }
    pub async fn serve_forever(self) -> Result<(), std::io::Error> {
        info!("Web server is listening on {}", self.listening_addr);
        self.server.serve().await
    }
    pub async fn serve_until<F>(self, signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Web server is listening on {}", self.listening_addr);
        self.server.serve_until(signal).await
    }
    pub fn listening_addr(&self) -> SocketAddr {
        self.listening_addr
    }
}

struct Server {
    listener: TcpListener,
    app: Router,
}
impl Server {
    pub fn new(listener: TcpListener, app: Router) -> Self {
        Self { listener, app }
    }

    pub async fn serve(self) -> Result<(), std::io::Error> {
        axum::serve(self.listener, self.app).await
    }

    pub async fn serve_until<F>(self, signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(signal)
            .await
    }
}
