pub const LINE_SIGNATURE_HEADER: &str = "X-Line-Signature";

pub const ENV_CHANNEL_SECRET: &str = "LINE_CHANNEL_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "LINE_ACCESS_TOKEN";

pub const HEALTH_BODY: &str = "OK (Webhooks are up)";
pub const ACK_BODY: &str = "OK";

pub const SIGNATURE_MISMATCH_HINT: &str =
    "Check LINE_CHANNEL_SECRET in the deployment environment and restart the server";
