//! Built-in keyword and synonym tables.
//!
//! These are the defaults used when the configuration file does not declare
//! its own `keywords` / `aliases`.

use std::collections::HashMap;

use super::types::KeywordDefinition;

/// Canonical keywords as `(keyword, image file, reply text)`, in the order they are listed to users.
pub const DEFAULT_KEYWORDS: &[(&str, &str, &str)] = &[
    ("成功", "success.png", "🏆 成功模式啟動中。\n不急著衝刺，但每一步都算數。"),
    ("業績", "sales.png", "📈 進度條幫你偷偷往前推一格。\n今年努力有回音，辛苦也值得。"),
    ("有錢", "rich.png", "💰 財氣已幫你放進口袋。\n願今年進帳穩穩來，也能留點時間給自己。"),
    ("好運", "luck.png", "🍀 好消息正在路上。\n願今年多一點驚喜，少一點驚嚇 😄"),
];

/// Synonyms as `(alias, canonical keyword)`.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    // 成功
    ("勝利", "成功"),
    ("達標", "成功"),
    ("突破", "成功"),
    ("上榜", "成功"),
    ("升遷", "成功"),
    ("升官", "成功"),
    // 業績
    ("成交", "業績"),
    ("爆單", "業績"),
    ("接案", "業績"),
    ("事業", "業績"),
    // 有錢
    ("賺錢", "有錢"),
    ("發財", "有錢"),
    ("中獎", "有錢"),
    ("賺大錢", "有錢"),
    ("超有錢", "有錢"),
    ("很有錢", "有錢"),
    // 好運
    ("幸運", "好運"),
    ("好事", "好運"),
    ("開運", "好運"),
    ("轉運", "好運"),
    ("吉", "好運"),
    ("大吉", "好運"),
    ("順利", "好運"),
];

/// Default leading text of the "unrecognized keyword" reply.
pub const DEFAULT_FALLBACK_TEXT: &str = "請輸入以下關鍵字之一：";

/// Separator between keywords in the "unrecognized keyword" reply.
pub const FALLBACK_KEYWORD_SEPARATOR: &str = "、";

/// The built-in keyword table.
pub fn default_keywords() -> Vec<KeywordDefinition> {
    DEFAULT_KEYWORDS.iter().map(|(keyword, file, text)| KeywordDefinition::new(*keyword, *file, *text)).collect()
}

/// The built-in synonym table.
pub fn default_aliases() -> HashMap<String, String> {
    DEFAULT_ALIASES.iter().map(|(alias, keyword)| (alias.to_string(), keyword.to_string())).collect()
}
