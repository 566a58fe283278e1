pub const APP_NAME: &str = "Hookchat";

// Limits
pub const MAX_MESSAGE_LENGTH: usize = 4000;
pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_WEBHOOK_URL_LENGTH: usize = 2000;
pub const MIN_PASSWORD_LENGTH: usize = 8;

// Canned bot replies used when the webhook cannot produce one. The relay
// never surfaces webhook failures as errors; the user always gets some
// reply in the channel.
pub const REPLY_WEBHOOK_UNAVAILABLE: &str =
    "Sorry, I'm having trouble right now. Please try again later.";
pub const REPLY_UNPARSEABLE: &str = "Sorry, I can't process that response.";

// WebSocket
pub const WS_HEARTBEAT_INTERVAL_MS: u64 = 30_000;
