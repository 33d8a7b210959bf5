// Application state shared across all modules

use std::sync::Arc;

use crate::auth::identity::AuthIdentityRepository;
use crate::common::config::Settings;
use crate::services::{OAuthProviders, OAuthStateStore, TokenCipher};
use crate::users::repository::UserRepository;

/// Application state containing repositories, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub users: UserRepository,
    pub identities: AuthIdentityRepository,
    pub oauth_providers: OAuthProviders,
    pub oauth_state: Arc<dyn OAuthStateStore>,
    pub token_cipher: Option<Arc<TokenCipher>>,
}
