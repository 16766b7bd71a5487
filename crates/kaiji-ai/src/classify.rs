//! Batched title classification.
//!
//! One request per listing date: every title is numbered from 1 and sent in a
//! single user message. The reply is free text that should contain a JSON
//! array of `{"番号": n, "判定理由": "..."}` objects. Extraction is two-staged
//! (fenced code block, then the outermost bracket span) and anything else is
//! [`ClassifierOutput::Unparseable`], which callers treat as "no matches".

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{AiError, MessagesClient};

pub const CLASSIFY_MAX_TOKENS: u32 = 4096;

pub const SYSTEM_PROMPT: &str = "\
あなたは日本の上場企業の適時開示情報を分析する専門家です。
以下の表題一覧から、不祥事・コンプライアンス問題に**明確に**関連するものだけを特定してください。

## 該当する基準（これらに明確に該当するもののみ）
- 第三者委員会・特別調査委員会・調査委員会の設置や調査報告
- 不正行為・不適切な会計処理・粉飾決算の判明
- 横領・着服・資金流用
- 行政処分・業務改善命令・業務停止命令
- 課徴金・金融庁処分
- コンプライアンス違反・法令違反
- 不正に関する再発防止策・改善報告書・改善状況報告書の提出
- 役員の懲戒処分
- 過年度決算の訂正（不正会計に起因するもの）
- 不正に関する社内調査・外部調査の委嘱
- 不適切事案に関する経過報告

## 該当しないもの（必ず除外）
- 自己株式の処分・取得（株式報酬、持株会向け等）
- 第三者割当による株式発行・処分
- 剰余金の処分・固定資産の処分
- 政策保有株式の処分
- 上場維持基準の改善期間に関するもの
- 事業構造改善・体質改善（経営改善施策）
- 通常の決算短信・決算説明資料の訂正（単純な数値誤り・記載ミスの訂正）
- 決算発表の延期（不正が明示されていない場合）
- レビュー結論不表明（監査手続上の事項）
- 通常の訴訟（訴訟提起・和解のみで不祥事が明示されていないもの）
- 「一部報道の件」（不祥事の具体的内容が表題に含まれていない場合）

## 重要な注意事項
- 迷った場合は**除外**してください。明確に不祥事と分かるもののみ返してください。
- 判定理由には「不正ではない」「コンプライアンス問題ではない」と記載するようなものは絶対に含めないでください。

## 回答形式
JSON配列で回答してください。該当する表題の番号と判定理由を含めてください。
該当なしの場合は空配列 [] を返してください。
例: [{\"番号\": 3, \"判定理由\": \"第三者委員会の設置\"}]
";

const USER_PREAMBLE: &str = "以下の表題一覧を判定してください。\n";

static FENCED_ARRAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\[.*?\])\s*```").expect("static regex")
});

/// Numbered title list sent as the user turn.
pub fn build_user_message(titles: &[String]) -> String {
    let mut msg = String::from(USER_PREAMBLE);
    for (i, title) in titles.iter().enumerate() {
        msg.push_str(&format!("{}. {title}\n", i + 1));
    }
    msg
}

/// External classification capability: titles in, raw reply text out.
#[async_trait]
pub trait TitleClassifier: Send + Sync {
    async fn classify(&self, titles: &[String]) -> Result<String, AiError>;
}

/// [`TitleClassifier`] backed by the Messages API.
pub struct ClaudeClassifier {
    client: MessagesClient,
}

impl ClaudeClassifier {
    pub fn new(client: MessagesClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TitleClassifier for ClaudeClassifier {
    async fn classify(&self, titles: &[String]) -> Result<String, AiError> {
        debug!(titles = titles.len(), model = self.client.model(), "classifying titles");
        self.client
            .complete(SYSTEM_PROMPT, &build_user_message(titles), CLASSIFY_MAX_TOKENS)
            .await
    }
}

/// One referenced title. `number` is 1-based and not yet range-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMatch {
    pub number: usize,
    pub rationale: String,
}

/// Where the JSON payload was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    FencedBlock,
    BracketSpan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierOutput {
    Matches {
        matches: Vec<TitleMatch>,
        source: PayloadSource,
    },
    Unparseable,
}

impl ClassifierOutput {
    /// Matches, or an empty list for unparseable replies.
    pub fn into_matches(self) -> Vec<TitleMatch> {
        match self {
            Self::Matches { matches, .. } => matches,
            Self::Unparseable => Vec::new(),
        }
    }
}

/// Array inside a ```` ```json ```` (or bare ```` ``` ````) fence.
pub fn fenced_block(text: &str) -> Option<&str> {
    FENCED_ARRAY
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// From the first `[` to the last `]`.
pub fn bracket_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a classifier reply. Never fails: anything unusable is `Unparseable`.
pub fn parse_classification(text: &str) -> ClassifierOutput {
    if let Some(block) = fenced_block(text)
        && let Some(matches) = decode_array(block)
    {
        return ClassifierOutput::Matches {
            matches,
            source: PayloadSource::FencedBlock,
        };
    }
    if let Some(span) = bracket_span(text)
        && let Some(matches) = decode_array(span)
    {
        return ClassifierOutput::Matches {
            matches,
            source: PayloadSource::BracketSpan,
        };
    }
    warn!(chars = text.chars().count(), "classifier reply had no parseable array");
    ClassifierOutput::Unparseable
}

fn decode_array(payload: &str) -> Option<Vec<TitleMatch>> {
    let Value::Array(items) = serde_json::from_str::<Value>(payload).ok()? else {
        return None;
    };
    Some(items.iter().filter_map(decode_item).collect())
}

fn decode_item(item: &Value) -> Option<TitleMatch> {
    let obj = item.as_object()?;
    let number = match obj.get("番号")? {
        Value::Number(n) => usize::try_from(n.as_u64()?).ok()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    let rationale = obj
        .get("判定理由")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(TitleMatch { number, rationale })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_caution_lines() {
        assert!(SYSTEM_PROMPT.contains(
            "- 判定理由には「不正ではない」「コンプライアンス問題ではない」と記載するようなものは絶対に含めないでください。\n"
        ));
        assert!(SYSTEM_PROMPT.ends_with(
            "例: [{\"番号\": 3, \"判定理由\": \"第三者委員会の設置\"}]\n"
        ));
    }

    #[test]
    fn user_message_numbers_titles_from_one() {
        let titles = vec!["決算短信".to_string(), "第三者委員会設置のお知らせ".to_string()];
        assert_eq!(
            build_user_message(&titles),
            "以下の表題一覧を判定してください。\n1. 決算短信\n2. 第三者委員会設置のお知らせ\n"
        );
    }

    #[test]
    fn fenced_block_wins() {
        let text = "ここに結果: ```json\n[{\"番号\":2,\"判定理由\":\"第三者委員会の設置\"}]\n```";
        let out = parse_classification(text);
        assert_eq!(
            out,
            ClassifierOutput::Matches {
                matches: vec![TitleMatch {
                    number: 2,
                    rationale: "第三者委員会の設置".into()
                }],
                source: PayloadSource::FencedBlock,
            }
        );
    }

    #[test]
    fn fence_without_language_tag() {
        assert_eq!(fenced_block("```\n[]\n```"), Some("[]"));
        assert_eq!(fenced_block("no fence [1]"), None);
    }

    #[test]
    fn bare_array_falls_back_to_span() {
        let text = "該当は以下です。[{\"番号\": 1, \"判定理由\": \"横領\"}] 以上。";
        let out = parse_classification(text);
        let ClassifierOutput::Matches { matches, source } = out else {
            panic!("expected matches");
        };
        assert_eq!(source, PayloadSource::BracketSpan);
        assert_eq!(matches[0].number, 1);
        assert_eq!(matches[0].rationale, "横領");
    }

    #[test]
    fn broken_fence_and_span_are_unparseable() {
        // Neither the fenced payload nor the outer span is valid JSON.
        let text = "```json\n[oops]\n``` [{\"番号\": 4}]";
        assert_eq!(bracket_span(text), Some("[oops]\n``` [{\"番号\": 4}]"));
        assert_eq!(parse_classification(text), ClassifierOutput::Unparseable);
    }

    #[test]
    fn prose_is_unparseable() {
        assert_eq!(
            parse_classification("該当する表題はありませんでした。"),
            ClassifierOutput::Unparseable
        );
        assert!(parse_classification("] backwards [").into_matches().is_empty());
    }

    #[test]
    fn empty_array_is_zero_matches_not_unparseable() {
        assert_eq!(
            parse_classification("[]"),
            ClassifierOutput::Matches {
                matches: vec![],
                source: PayloadSource::BracketSpan
            }
        );
    }

    #[test]
    fn items_are_read_tolerantly() {
        let text = r#"[{"番号": "3", "判定理由": "課徴金"}, {"番号": 5}, {"判定理由": "番号なし"}, "x", {"番号": -1}]"#;
        let matches = parse_classification(text).into_matches();
        assert_eq!(
            matches,
            vec![
                TitleMatch {
                    number: 3,
                    rationale: "課徴金".into()
                },
                TitleMatch {
                    number: 5,
                    rationale: String::new()
                },
            ]
        );
    }

    #[test]
    fn object_payload_is_not_an_array() {
        assert_eq!(
            parse_classification("```json\n{\"番号\": 1}\n```"),
            ClassifierOutput::Unparseable
        );
    }
}
