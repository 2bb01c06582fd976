use anyhow::Result;
use serde::Serialize;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Wraps command output with the topic it came from and that topic's content
/// fingerprint, so saved JSON can be matched to a content revision.
#[derive(Debug, Serialize)]
pub struct TopicEnvelope<'a, T: Serialize + ?Sized> {
    pub topic: &'a str,
    pub fingerprint: &'a str,
    pub data: &'a T,
}

pub fn render_topic_json<T: Serialize + ?Sized>(
    topic: &str,
    fingerprint: &str,
    data: &T,
) -> Result<String> {
    render_json(&TopicEnvelope {
        topic,
        fingerprint,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::render_topic_json;

    #[test]
    fn envelope_carries_topic_and_fingerprint() {
        let rendered = render_topic_json("chunking", "abc123", &vec![1, 2]).expect("renders");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
        assert_eq!(value["topic"], "chunking");
        assert_eq!(value["fingerprint"], "abc123");
        assert_eq!(value["data"][1], 2);
    }
}
