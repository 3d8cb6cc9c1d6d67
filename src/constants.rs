//! Global constants used throughout the plugin-deps codebase.
//!
//! This module contains cache lifetimes, fetch timeouts, parallelism
//! parameters and the fixed text used in synthesized metadata. Defining
//! them centrally keeps magic numbers discoverable.

use std::time::Duration;

/// Default lifetime of a fetched metadata record (12 hours).
pub const DEFAULT_METADATA_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Default lifetime of a synthesized placeholder record (10 minutes).
///
/// Kept short so a real source that comes online is picked up on a
/// following pass.
pub const DEFAULT_SYNTHESIZED_TTL: Duration = Duration::from_secs(10 * 60);

/// Default timeout for a single metadata fetch (10 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of characters of a long description kept when deriving a
/// short description.
pub const SHORT_DESCRIPTION_LIMIT: usize = 150;

/// Marker appended to a truncated long description.
pub const ELLIPSIS: &str = "...";

/// Short description used for every synthesized record.
pub const MANUAL_INSTALL_NOTICE: &str = "You will need to manually install this dependency. \
    Please contact the plugin's developer and ask them to add plugin dependencies support \
    and for information on how to install this dependency.";

/// Installation section used for every synthesized record.
pub const MANUAL_INSTALL_INSTRUCTIONS: &str =
    "Ask the plugin developer where to download and install this plugin dependency.";

/// Icon used for synthesized records; `{slug}` is replaced by the identifier.
pub const DEFAULT_ICON_TEMPLATE: &str = "https://s.w.org/plugins/geopattern-icon/{slug}.svg";

/// Minimum number of parallel metadata fetches regardless of CPU count.
pub const MIN_PARALLELISM: usize = 4;

/// Multiplier applied to CPU core count for default parallelism.
pub const PARALLELISM_CORE_MULTIPLIER: usize = 2;

/// Default CPU core count when detection fails.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// Default number of concurrent identifier resolutions.
pub fn default_max_concurrency() -> usize {
    let cores =
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(FALLBACK_CORE_COUNT);
    std::cmp::max(MIN_PARALLELISM, cores * PARALLELISM_CORE_MULTIPLIER)
}

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "PLUGIN_DEPS_CONFIG";

/// Environment variable disabling progress bars.
pub const NO_PROGRESS_ENV: &str = "PLUGIN_DEPS_NO_PROGRESS";

/// Directory name under the home directory holding config and cache files.
pub const APP_DIR_NAME: &str = ".plugin-deps";
