//! Fetching, enumerating and storing k-line data

pub mod provider;
pub mod store;
pub mod throttle;
pub mod ths;
pub mod universe;

pub use provider::{FetchError, FetchedBody, KlineSource};
pub use store::{KlineStore, StoreError, StoreStatus};
pub use throttle::Throttle;
pub use ths::{default_headers, kline_url, ThsSource, DEFAULT_BASE_URL};
pub use universe::{Universe, UniverseError};
