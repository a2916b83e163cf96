use regex::Regex;
use std::sync::LazyLock;

const MAX_NETID_LENGTH: usize = 20;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)@[\w-]+(?:\.[\w-]+)+").expect("valid email pattern"));
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*(\w+)\s*$").expect("valid comma pattern"));
static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\w+)\)").expect("valid parenthesis pattern"));

/// 去除空白並轉小寫
pub fn normalize_netid(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// 輸出格式以逗號與方括號分隔組員，這些字元與空白不能出現在 netID 中
pub fn is_valid_netid(netid: &str) -> bool {
    !netid.is_empty() && !netid.chars().any(|c| c.is_whitespace() || matches!(c, ',' | '[' | ']' | '"'))
}

/// 至少含一個小寫字母且沒有大寫字母
fn looks_like_netid(token: &str) -> bool {
    token.chars().count() <= MAX_NETID_LENGTH
        && token.chars().any(char::is_lowercase)
        && !token.chars().any(char::is_uppercase)
}

/// 從組員欄位取出 netID（保留原本大小寫）
///
/// 依序嘗試：
/// - `netid@domain`
/// - `Name, netid`
/// - `Name (netid)`
/// - `Name netid`，最後一段為小寫
/// - 單獨一個小寫 token
pub fn parse_member_string(cell: &str) -> Option<String> {
    let value = cell.trim();
    if value.is_empty() {
        return None;
    }

    for pattern in [&EMAIL, &TRAILING_COMMA, &PARENTHESIZED] {
        if let Some(caps) = pattern.captures(value) {
            return Some(caps[1].to_string());
        }
    }

    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [.., last] if parts.len() >= 2 && looks_like_netid(last) => Some(last.to_string()),
        [only] if only.chars().all(|c| c.is_alphanumeric() || c == '_') && looks_like_netid(only) => {
            Some(only.to_string())
        }
        _ => None,
    }
}

/// 在名單中找出最相似的 netID，相似度需達到 `threshold`
pub fn fuzzy_match<'a>(
    netid: &str,
    known: impl IntoIterator<Item = &'a str>,
    threshold: f64,
) -> Option<(&'a str, f64)> {
    let target = normalize_netid(netid);
    let mut best: Option<(&'a str, f64)> = None;

    for candidate in known {
        let score = strsim::normalized_levenshtein(&target, &candidate.to_lowercase());
        if score >= threshold && best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }

    best
}
