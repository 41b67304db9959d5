//! Fixed tuning values and well-known addresses.

use std::net::Ipv4Addr;

/// Delay between the first "facts changed" signal and recomputing settings.
pub const DEBOUNCE_MSEC: u64 = 500;

/// Default MTU when the mesh runs without encryption.
pub const MTU_PLAIN: u32 = 1360;

/// Default MTU with encryption enabled, leaves room for per-packet overhead.
pub const MTU_ENCRYPTED: u32 = 1380;

/// Address of the resolver the routing engine answers on when magic DNS is on.
pub const MAGIC_DNS_ADDR: Ipv4Addr = Ipv4Addr::new(100, 100, 100, 101);

/// Internal top-level zone served by the magic DNS resolver.
pub const MAGIC_DNS_ZONE: &str = "et.net";

/// Name of the shared file the host reads the last error from.
pub const LAST_ERROR_KEY: &str = "last_error";

/// Suffix of the file bumped to wake the host after a new error is written.
pub const SIGNAL_SUFFIX: &str = "signal";
