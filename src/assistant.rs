//! Plantation assistant with canned, keyword-matched answers.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;

pub const MAX_INPUT_LEN: usize = 500;

pub const QUICK_PROMPTS: [&str; 4] = [
    "How to harvest FFB?",
    "Fertilizer application tips",
    "Pest control methods",
    "Safety guidelines",
];

const GREETING: &str = "Hello! I'm your AI plantation assistant. How can I help you today? 🌴";

const DEFAULT_RESPONSE: &str = "I'm your AI assistant for palm oil plantation work. I can help you with:\n\n\
• Harvesting techniques\n\
• Fertilizer application\n\
• Pest & disease control\n\
• Safety guidelines\n\
• Weather considerations\n\n\
What would you like to know?";

/// Answer given when any keyword appears in the lowercased message.
#[derive(Debug, Clone)]
pub struct ResponseRule {
    pub keywords: Vec<&'static str>,
    pub response: &'static str,
}

impl ResponseRule {
    fn new(keywords: &[&'static str], response: &'static str) -> Self {
        Self {
            keywords: keywords.to_vec(),
            response,
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

/// Ordered rules; the first match wins.
#[derive(Debug, Clone)]
pub struct Assistant {
    rules: Vec<ResponseRule>,
    fallback: &'static str,
}

impl Assistant {
    pub fn new(rules: Vec<ResponseRule>, fallback: &'static str) -> Self {
        Self { rules, fallback }
    }

    pub fn respond(&self, message: &str) -> &'static str {
        let lowered = message.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.response)
            .unwrap_or(self.fallback)
    }
}

impl Default for Assistant {
    fn default() -> Self {
        Self::new(
            vec![
                ResponseRule::new(
                    &["harvest", "ffb", "fruit"],
                    "For FFB harvesting, ensure the fruit bunches are ripe (orange-red color with loose fruits). \
                     Use a chisel for palms under 3m and a sickle on a pole for taller palms. Always cut at the base \
                     of the bunch stalk. Remember to collect all loose fruits!",
                ),
                ResponseRule::new(
                    &["fertilizer", "manur", "npk"],
                    "For fertilizer application, spread 3kg of NPK compound per palm in a circle around the trunk \
                     (about 1.5m radius). Apply during early morning or late afternoon to prevent nutrient loss. \
                     Always wear gloves and avoid application before heavy rain.",
                ),
                ResponseRule::new(
                    &["pest", "beetle", "bagworm"],
                    "Common pests include rhinoceros beetle (look for V-shaped cuts on fronds) and bagworms. \
                     For beetles, set up pheromone traps. For bagworms, apply Bacillus thuringiensis spray. \
                     Report any unusual pest activity to your supervisor immediately.",
                ),
                ResponseRule::new(
                    &["disease", "ganoderma", "sick"],
                    "Ganoderma is the most serious disease - look for bracket fungi at the trunk base, yellowing \
                     fronds, and unopened spears. Mark infected palms and avoid spreading soil from infected areas. \
                     Early detection is crucial!",
                ),
                ResponseRule::new(
                    &["safety", "ppe", "protect"],
                    "Always wear proper PPE: safety boots, gloves, long sleeves, and eye protection when spraying. \
                     Stay hydrated in hot weather. Never work alone in remote areas. Report any injuries immediately.",
                ),
                ResponseRule::new(
                    &["weather", "rain", "storm"],
                    "Check weather conditions before outdoor work. Avoid harvesting during heavy rain (slippery \
                     conditions). Postpone spraying if rain is expected within 4 hours. Take shelter during \
                     thunderstorms.",
                ),
            ],
            DEFAULT_RESPONSE,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

/// Messages exchanged on the chat screen.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Conversation {
    pub fn new(now: DateTime<Utc>) -> Self {
        let mut conversation = Self {
            messages: Vec::new(),
            next_id: 1,
        };
        conversation.push(GREETING.to_string(), Sender::Assistant, now);
        conversation
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Quick prompts are offered until the user has had one exchange.
    pub fn show_quick_prompts(&self) -> bool {
        self.messages.len() <= 2
    }

    /// Record a user message. Returns the trimmed text to answer, or None
    /// when the input was blank.
    pub fn send(&mut self, text: &str, now: DateTime<Utc>) -> Option<String> {
        let text: String = text.trim().chars().take(MAX_INPUT_LEN).collect();
        if text.is_empty() {
            return None;
        }
        self.push(text.clone(), Sender::User, now);
        Some(text)
    }

    pub fn receive(&mut self, text: String, now: DateTime<Utc>) {
        self.push(text, Sender::Assistant, now);
    }

    fn push(&mut self, text: String, sender: Sender, timestamp: DateTime<Utc>) {
        self.messages.push(ChatMessage {
            id: self.next_id,
            text,
            sender,
            timestamp,
        });
        self.next_id += 1;
    }
}

/// Base delay plus uniform jitter in `[0, jitter)`.
pub fn typing_delay(base: Duration, jitter: Duration) -> Duration {
    let jitter_ms = jitter.as_millis() as u64;
    if jitter_ms == 0 {
        return base;
    }
    base + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_rules() {
        let assistant = Assistant::default();
        assert!(assistant.respond("How to harvest FFB?").starts_with("For FFB harvesting"));
        assert!(assistant.respond("NPK dosage").starts_with("For fertilizer"));
        assert!(assistant.respond("Saw a BEETLE").starts_with("Common pests"));
        assert!(assistant.respond("palm looks sick").starts_with("Ganoderma"));
        assert!(assistant.respond("what ppe do I need").starts_with("Always wear"));
        assert!(assistant.respond("storm coming").starts_with("Check weather"));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let assistant = Assistant::default();
        // Mentions both fruit (harvest) and rain (weather); harvest is listed first.
        assert!(assistant
            .respond("can I collect fruit in the rain")
            .starts_with("For FFB harvesting"));
    }

    #[test]
    fn test_fallback_response() {
        let assistant = Assistant::default();
        assert_eq!(assistant.respond("hello there"), DEFAULT_RESPONSE);
    }

    #[test]
    fn test_custom_rules() {
        let assistant = Assistant::new(vec![ResponseRule::new(&["ping"], "pong")], "?");
        assert_eq!(assistant.respond("PING"), "pong");
        assert_eq!(assistant.respond("pang"), "?");
    }

    #[test]
    fn test_conversation_flow() {
        let now = Utc::now();
        let mut conversation = Conversation::new(now);
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(conversation.messages()[0].sender, Sender::Assistant);
        assert!(conversation.show_quick_prompts());

        assert_eq!(conversation.send("   ", now), None);
        assert_eq!(conversation.messages().len(), 1);

        let text = conversation.send("  pest help ", now).unwrap();
        assert_eq!(text, "pest help");
        conversation.receive("answer".to_string(), now);
        assert_eq!(conversation.messages().len(), 3);
        assert!(!conversation.show_quick_prompts());

        let ids: Vec<u64> = conversation.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_input_is_capped() {
        let mut conversation = Conversation::new(Utc::now());
        let long = "a".repeat(MAX_INPUT_LEN + 50);
        let text = conversation.send(&long, Utc::now()).unwrap();
        assert_eq!(text.len(), MAX_INPUT_LEN);
    }

    #[test]
    fn test_typing_delay_bounds() {
        let base = Duration::from_millis(1000);
        let jitter = Duration::from_millis(1000);
        for _ in 0..50 {
            let delay = typing_delay(base, jitter);
            assert!(delay >= base);
            assert!(delay < base + jitter);
        }
        assert_eq!(typing_delay(base, Duration::ZERO), base);
    }
}
