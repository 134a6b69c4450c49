/// User profile storage and synchronization
pub mod cache;
pub mod store;
pub mod sync;
pub mod types;

pub use cache::ProfileCache;
pub use store::{MockProfileStore, ProfileStore, RestProfileStore};
pub use sync::{FavoriteUpdate, ProfileService};
pub use types::{Account, FavoritePlace, PlaceKind, ProfilePatch, Theme, UserProfile};
