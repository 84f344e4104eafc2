//! Shop-or-not channel classification

use groq_client::GroqClient;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::prompts;

#[derive(Deserialize)]
struct Verdict {
    is_shop: bool,
}

/// Ask the model whether the sampled messages read like a shop channel.
/// An answer that does not parse counts as "not a shop"; model failures
/// (including a fully exhausted rotation) propagate to the caller.
pub async fn is_shop_channel(
    groq: &GroqClient,
    channel: &str,
    texts: &[String],
) -> groq_client::Result<bool> {
    let answer = groq.chat(&prompts::shop_verdict(texts)).await?;
    match parse_verdict(&answer) {
        Some(is_shop) => {
            debug!(channel, is_shop, "channel classified");
            Ok(is_shop)
        }
        None => {
            warn!(channel, answer = %answer, "unparseable verdict, counting as not a shop");
            Ok(false)
        }
    }
}

/// Strict `{"is_shop": bool}`, tolerating markdown fences around it.
fn parse_verdict(answer: &str) -> Option<bool> {
    serde_json::from_str::<Verdict>(prompts::strip_code_fences(answer))
        .ok()
        .map(|verdict| verdict.is_shop)
}
