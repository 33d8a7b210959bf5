// Services module - outbound clients and shared infrastructure

pub mod encryption;
pub mod oauth;
pub mod oauth_state;

pub use encryption::TokenCipher;
pub use oauth::{OAuthError, OAuthProvider, OAuthProviders, ProviderProfile, ProviderTokens};
pub use oauth_state::{InMemoryOAuthStateStore, OAuthStateStore, OAuthTransaction};
