//! Protocol versioning for the bridge socket transport.
//!
//! Breaking changes (removing fields or variants, changing field types,
//! renaming without `#[serde(alias)]`) require a `PROTOCOL_VERSION` bump.
//! Adding variants or optional `#[serde(default)]` fields is safe without one.
//!
//! `MIN_SUPPORTED_VERSION` trails by at most one so a freshly-updated client
//! can still talk to a not-yet-restarted server and vice versa.

/// Current protocol version. Bump when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Minimum protocol version this build can communicate with.
pub const MIN_SUPPORTED_VERSION: u32 = 1;
