use std::sync::Arc;

use crate::{
    auth::jwt::JwtService, chat::ChatHub, config::AppConfig, mailer::Mailer, store::JobStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
    pub mailer: Arc<dyn Mailer>,
    pub chat: Arc<ChatHub>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn JobStore>,
        config: AppConfig,
        jwt: JwtService,
        mailer: Arc<dyn Mailer>,
        chat: Arc<ChatHub>,
    ) -> Self {
        Self {
            store,
            config: Arc::new(config),
            jwt,
            mailer,
            chat,
        }
    }
}
