//! Short structured summaries of disclosure documents.

use async_trait::async_trait;
use tracing::debug;

use crate::{AiError, MessagesClient};

pub const SUMMARY_MAX_TOKENS: u32 = 1024;

/// Cap on document characters sent per request.
pub const MAX_TEXT_CHARS: usize = 50_000;

pub const TRUNCATION_MARKER: &str = "\n\n（以下省略）";

pub const SUMMARY_PROMPT: &str = "\
この適時開示資料の内容を以下の観点で要約してください:
1. 何が起きたか（不祥事・問題の概要）
2. 関与者（誰が関与したか）
3. 影響範囲（金額、期間、対象範囲）
4. 会社の対応（第三者委員会設置、再発防止策等）
5. 今後の見通し

300字以内で簡潔にまとめてください。
";

/// Cut `text` to [`MAX_TEXT_CHARS`] characters, appending the marker if cut.
pub fn truncate_for_summary(text: &str) -> String {
    match text.char_indices().nth(MAX_TEXT_CHARS) {
        Some((byte_idx, _)) => format!("{}{TRUNCATION_MARKER}", &text[..byte_idx]),
        None => text.to_string(),
    }
}

pub fn build_user_message(company: &str, title: &str, text: &str) -> String {
    format!(
        "会社名: {company}\n表題: {title}\n\n--- 開示資料本文 ---\n{}",
        truncate_for_summary(text)
    )
}

/// External summarization capability.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, company: &str, title: &str, text: &str) -> Result<String, AiError>;
}

pub struct ClaudeSummarizer {
    client: MessagesClient,
}

impl ClaudeSummarizer {
    pub fn new(client: MessagesClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Summarizer for ClaudeSummarizer {
    async fn summarize(&self, company: &str, title: &str, text: &str) -> Result<String, AiError> {
        debug!(company, chars = text.chars().count(), "requesting summary");
        self.client
            .complete(
                SUMMARY_PROMPT,
                &build_user_message(company, title, text),
                SUMMARY_MAX_TOKENS,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn short_text_untouched() {
        assert_eq!(truncate_for_summary("本文"), "本文");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "不".repeat(MAX_TEXT_CHARS + 10);
        let cut = truncate_for_summary(&text);
        assert!(cut.ends_with(TRUNCATION_MARKER));
        let body = cut.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert_eq!(body.chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn exactly_at_cap_is_not_marked() {
        let text = "a".repeat(MAX_TEXT_CHARS);
        assert_eq!(truncate_for_summary(&text), text);
    }

    #[test]
    fn user_message_layout() {
        let msg = build_user_message("極洋", "第三者委員会設置", "本文です");
        assert_eq!(
            msg,
            "会社名: 極洋\n表題: 第三者委員会設置\n\n--- 開示資料本文 ---\n本文です"
        );
    }

    #[tokio::test]
    async fn summarizer_sends_prompt_and_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(body_string_contains("\"max_tokens\":1024"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "text", "text": "1. 元役員による横領が判明。"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MessagesClient::new("k", crate::DEFAULT_MODEL)
            .unwrap()
            .with_base_url(server.uri());
        let summary = ClaudeSummarizer::new(client)
            .summarize("極洋", "横領に関するお知らせ", "本文")
            .await
            .unwrap();
        assert_eq!(summary, "1. 元役員による横領が判明。");
    }
}
