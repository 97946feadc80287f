// qpw-api: implicit-grant session + paginated REST client for contact-center platform APIs

pub mod auth;
pub mod client;
pub mod error;
pub mod paginate;
pub mod query;
pub mod session;
pub mod transport;

pub use auth::{
    AuthFlow, AuthResult, Identity, LoginOutcome, RedirectLocation, build_authorize_url,
    parse_redirect_fragment, region_from_state, regional_login_base,
};
pub use client::{ApiClient, ApiHost, RequestOptions};
pub use error::Error;
pub use paginate::{PageResult, PageShape, WalkOptions};
pub use query::{ParamValue, QueryParams, build_url};
pub use session::{MemoryStorage, Session, SessionKey, SessionStorage, SessionStore, StorageError};
pub use transport::TransportConfig;
