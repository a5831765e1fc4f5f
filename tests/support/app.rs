use std::net::SocketAddr;

use super::setup_settings;

use game_launch_bot::web::Application;

pub struct TestApp {
    pub addr: SocketAddr,
    pub api_client: reqwest::Client,
}
impl TestApp {
    pub async fn new() -> TestApp {
        let settings = setup_settings();
        let app = Application::build(&settings, None).await.unwrap();
        let addr = app.listening_addr();
        tokio::spawn(app.serve_forever());
        TestApp {
            addr,
            api_client: reqwest::Client::new(),
        }
    }
}
