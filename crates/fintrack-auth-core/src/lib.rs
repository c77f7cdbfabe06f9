//! FinTrack Auth Core - request security and session logic
//!
//! Request envelope opening, token issuance and rotation, the session gate,
//! password hashing and the error taxonomy shared by the HTTP layers.

pub mod clock;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod gate;
pub mod password;
pub mod service;
pub mod session;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, EnvelopeConfig};
pub use crypto::{constant_time_eq, constant_time_str_eq, md5_hex, SigningSecret, SigningSecretError};
pub use envelope::{
    compute_signature, decode_payload, Envelope, EnvelopeOpener, KeyLoadError, PrivateKey,
};
pub use error::AuthError;
pub use gate::{extract_token, require_admin, SessionGate};
pub use password::{HashedPassword, PasswordHasher, PasswordParams};
pub use service::{AuthService, UserProfile};
pub use session::SessionManager;
pub use token::{Claims, MintedPair, TokenKind, TokenPair, TokenSigner};
