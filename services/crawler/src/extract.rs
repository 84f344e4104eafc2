//! Product extraction from message text

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Characters kept for the product title.
const TITLE_LEN: usize = 50;

/// One product mention lifted out of a message. Only messages with a
/// recognizable price produce a product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub title: String,
    pub price: String,
    pub raw_text: String,
}

// Grouped digits: 1,250,000 or a bare run of up to three digits.
fn price_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{1,3}(?:,\d{3})*").expect("price pattern compiles"))
}

/// Extract one product per text that carries a price.
pub fn products_from<'a>(texts: impl IntoIterator<Item = &'a String>) -> Vec<Product> {
    texts
        .into_iter()
        .filter_map(|text| product_from(text))
        .collect()
}

fn product_from(text: &str) -> Option<Product> {
    let price = price_pattern().find(text)?.as_str().to_owned();
    Some(Product {
        title: text.chars().take(TITLE_LEN).collect(),
        price,
        raw_text: text.to_owned(),
    })
}
