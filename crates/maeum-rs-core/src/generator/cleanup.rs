//! Post-processing applied to raw model output.

use crate::error::MaeumCoreError;
use regex::Regex;

/// Returned when cleanup leaves too little text.
pub const FALLBACK_REPLY: &str = "죄송해요, 다시 한번 말씀해주시겠어요?";
/// Replies shorter than this many characters are replaced by the fallback.
const MIN_REPLY_CHARS: usize = 5;
/// Output is cut at the earliest of these markers.
const STOP_MARKERS: [&str; 6] = ["→", "->", "＞", "※", "■", "□"];

/// Strips reasoning blocks, markup, and trailing commentary from replies.
///
/// Steps, in order:
/// 1. remove `<think>...</think>` spans
/// 2. remove remaining `<...>` tags, including a lone `<think>`
/// 3. cut at the first `(`
/// 4. cut at the earliest stop marker
/// 5. trim
/// 6. replace anything shorter than five characters with [`FALLBACK_REPLY`]
#[derive(Debug, Clone)]
pub struct ResponseCleaner {
    think_block: Regex,
    tag: Regex,
}

impl ResponseCleaner {
    pub fn new() -> Result<Self, MaeumCoreError> {
        let think_block = Regex::new(r"(?s)<think>.*?</think>")
            .map_err(|err| MaeumCoreError::Setup(format!("think pattern: {err}")))?;
        let tag = Regex::new(r"<[^>]+>")
            .map_err(|err| MaeumCoreError::Setup(format!("tag pattern: {err}")))?;
        Ok(Self { think_block, tag })
    }

    pub fn clean(&self, raw: &str) -> String {
        let without_reasoning = self.think_block.replace_all(raw, "");
        let without_tags = self.tag.replace_all(&without_reasoning, "");

        let mut text: &str = without_tags.as_ref();
        if let Some(idx) = text.find('(') {
            text = &text[..idx];
        }
        if let Some(idx) = STOP_MARKERS
            .iter()
            .filter_map(|marker| text.find(marker))
            .min()
        {
            text = &text[..idx];
        }

        let text = text.trim();
        if text.chars().count() < MIN_REPLY_CHARS {
            return FALLBACK_REPLY.to_string();
        }
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cleaner() -> ResponseCleaner {
        ResponseCleaner::new().expect("cleaner")
    }

    #[test]
    fn strips_reasoning_then_truncates_at_paren() {
        assert_eq!(
            cleaner().clean("<think>internal</think>좋은 하루였네요(추가설명)"),
            "좋은 하루였네요"
        );
    }

    #[test]
    fn reasoning_block_spans_lines() {
        let raw = "<think>\n계획:\n1. 공감하기\n</think>\n\n  많이 속상하셨겠어요.  ";
        assert_eq!(cleaner().clean(raw), "많이 속상하셨겠어요.");
    }

    #[test]
    fn unclosed_reasoning_tag_is_stripped_and_text_kept() {
        assert_eq!(
            cleaner().clean("<think>오늘 정말 고생 많으셨어요"),
            "오늘 정말 고생 많으셨어요"
        );
        assert_eq!(
            cleaner().clean("그런 일이 있었군요.<think> 정말 힘드셨겠어요."),
            "그런 일이 있었군요. 정말 힘드셨겠어요."
        );
    }

    #[test]
    fn removes_markup_tags() {
        assert_eq!(
            cleaner().clean("<b>정말</b> 수고 많으셨어요<br/>"),
            "정말 수고 많으셨어요"
        );
    }

    #[test]
    fn cuts_at_earliest_stop_marker() {
        assert_eq!(
            cleaner().clean("마음이 많이 무거우셨겠어요 ※ 참고 → 다음"),
            "마음이 많이 무거우셨겠어요"
        );
        assert_eq!(
            cleaner().clean("그 말을 들으니 저도 마음이 아파요 -> 위로"),
            "그 말을 들으니 저도 마음이 아파요"
        );
        assert_eq!(
            cleaner().clean("충분히 그렇게 느끼실 수 있어요■■"),
            "충분히 그렇게 느끼실 수 있어요"
        );
    }

    #[test]
    fn short_output_falls_back() {
        assert_eq!(cleaner().clean("음"), FALLBACK_REPLY);
        assert_eq!(cleaner().clean("   "), FALLBACK_REPLY);
        assert_eq!(cleaner().clean("<think>only thoughts</think>"), FALLBACK_REPLY);
        assert_eq!(cleaner().clean("네(웃음) 그래요"), FALLBACK_REPLY);
    }

    #[test]
    fn exactly_five_characters_survive() {
        assert_eq!(cleaner().clean("고마워요!"), "고마워요!");
    }

    #[test]
    fn cleanup_is_idempotent() {
        let cleaner = cleaner();
        for raw in [
            "<think>x</think>좋은 하루였네요(추가설명)",
            "음",
            "오늘 정말 애쓰셨어요. 어떤 순간이 가장 힘드셨나요?",
            "<p>많이 지치셨군요</p> → 조언",
        ] {
            let once = cleaner.clean(raw);
            assert_eq!(cleaner.clean(&once), once);
        }
    }
}
