//! Prompt texts for the model calls
//!
//! Both prompts demand machine-readable answers. Parsing lives next to the
//! respective caller; the fence stripping lives here because every answer
//! needs it.

/// At most this many message texts are quoted per verdict prompt.
const VERDICT_SAMPLE: usize = 10;

/// Ask for search tags matching the current trends payload.
pub fn hashtags(trends: &str) -> String {
    format!(
        "Current trending topics on the Eitaa messaging platform:\n\
         {trends}\n\n\
         Suggest Persian hashtags or short search phrases likely to surface \
         channels that sell goods related to these trends. Answer with a \
         JSON array of strings only, no explanation."
    )
}

/// Ask whether a channel's recent messages read like a shop. Quotes at
/// most `VERDICT_SAMPLE` texts.
pub fn shop_verdict(texts: &[String]) -> String {
    let sample = texts
        .iter()
        .take(VERDICT_SAMPLE)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n---\n");
    format!(
        "Recent messages from one Eitaa channel:\n\
         {sample}\n\n\
         Is this channel selling goods or services? Answer with exactly \
         {{\"is_shop\": true}} or {{\"is_shop\": false}}, no explanation."
    )
}

/// Models often wrap JSON answers in markdown fences; strip one layer.
pub(crate) fn strip_code_fences(answer: &str) -> &str {
    let trimmed = answer.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
