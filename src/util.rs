use regex::Regex;
use sha2::Digest;
use std::sync::OnceLock;

pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn sha256_bytes(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

fn word_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").expect("regex for word boundaries"))
}

fn camel_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([a-z0-9])([A-Z])").expect("regex for camel-case boundaries")
    })
}

/// Split an identifier or phrase into lower-case words.
///
/// Handles camelCase, PascalCase, kebab-case, snake_case and free text.
pub fn words(text: &str) -> Vec<String> {
    let spaced = camel_boundary().replace_all(text, "${1} ${2}");
    word_boundary()
        .split(&spaced)
        .filter(|word| !word.is_empty())
        .map(|word| word.to_ascii_lowercase())
        .collect()
}

/// `"Create checkout session"` -> `"create_checkout_session"`.
pub fn slugify(text: &str) -> String {
    words(text).join("_")
}

pub fn snake_case(text: &str) -> String {
    slugify(text)
}

/// `"mock_payments"` -> `"MockPayments"`.
pub fn pascal_case(text: &str) -> String {
    words(text)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

pub fn now_epoch_ms() -> anyhow::Result<u128> {
    use anyhow::Context;
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .context("compute timestamp")?
        .as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_split_camel_and_separators() {
        assert_eq!(
            words("createCheckoutSession"),
            vec!["create", "checkout", "session"]
        );
        assert_eq!(words("mock-payments v2"), vec!["mock", "payments", "v2"]);
        assert_eq!(words("/v1/checkout/sessions/{id}"), vec!["v1", "checkout", "sessions", "id"]);
    }

    #[test]
    fn casing_helpers_agree_on_words() {
        assert_eq!(slugify("Create checkout session"), "create_checkout_session");
        assert_eq!(snake_case("createCheckoutSession"), "create_checkout_session");
        assert_eq!(pascal_case("mock_payments"), "MockPayments");
        assert_eq!(pascal_case(""), "");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_string("héllo", 2), "h");
        assert_eq!(truncate_string("short", 100), "short");
    }

    #[test]
    fn sha256_is_stable() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(sha256_bytes(b"abc")[0], 0xba);
    }
}
