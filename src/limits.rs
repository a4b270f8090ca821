pub(crate) const MAX_TELEMETRY_EVENTS: usize = 100;
pub(crate) const ACCESS_TOKEN_LENGTH: usize = 32;

pub const ITEM_ENDPOINT: &str = "https://api.rollbar.com/api/1/item/";
pub const SOURCEMAP_ENDPOINT: &str = "https://api.rollbar.com/api/1/sourcemap";
