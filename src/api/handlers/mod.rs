pub mod account;
pub mod mint;
pub mod token;

use std::time::Duration;

use tokio::sync::Mutex;

use crate::infrastructure::blockchain::client::NetworkInfo;
use crate::infrastructure::cache::TtlCache;
use crate::infrastructure::config::Network;

/// One process-wide network-info cache, shared across all workers. The mutex
/// is held only for the get/set itself, never across an upstream call.
pub type SharedNetCache = Mutex<TtlCache<NetworkInfo>>;

pub const NETWORK_INFO_TTL: Duration = Duration::from_secs(30);

pub fn net_cache_key(network: Network) -> String {
    format!("net:{network}")
}
