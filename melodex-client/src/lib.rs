//! melodex-client library - client-side state for melodex-server
//!
//! [`FavoritesSync`] keeps a session user's favorites consistent with the
//! server across duplicate submissions and partial failures.
//! [`DiscoveryClient`] wraps search, recommendations and search history.

pub mod discovery;
pub mod error;
pub mod favorites;
pub mod guard;
pub mod transport;

pub use discovery::{DiscoveryClient, DiscoveryError, Recommendation};
pub use error::{SyncError, SyncResult};
pub use favorites::FavoritesSync;
pub use transport::{AddOutcome, FavoritesTransport, HttpTransport, RemoveOutcome};
