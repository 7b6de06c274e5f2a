use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ADJECTIVES: [&str; 12] = [
    "Brave", "Clever", "Dusty", "Eager", "Fuzzy", "Gentle", "Happy", "Jolly", "Lucky", "Mighty",
    "Quiet", "Swift",
];

const ANIMALS: [&str; 12] = [
    "Badger", "Cheetah", "Dolphin", "Falcon", "Gecko", "Koala", "Lynx", "Otter", "Panda",
    "Penguin", "Raccoon", "Walrus",
];

/// Who is asking for flag values. Sent to the backend as-is for targeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationContext {
    pub kind: String,
    pub key: String,
    pub name: String,
    pub path: String,
}

/// Fixed context used by the greeting handler.
pub fn static_context() -> EvaluationContext {
    EvaluationContext {
        kind: "user".to_string(),
        key: "example-user-key".to_string(),
        name: "Sandy".to_string(),
        path: "/".to_string(),
    }
}

/// Build a fresh context for one request.
///
/// Every call gets a new random key, so two requests from the same browser are
/// two unrelated subjects as far as the backend is concerned.
pub fn build_context(path: &str) -> EvaluationContext {
    let path = if path.is_empty() { "/" } else { path };

    EvaluationContext {
        kind: "user".to_string(),
        key: Uuid::new_v4().to_string(),
        name: random_name(),
        path: path.to_string(),
    }
}

/// "Adjective Animal", drawn uniformly from 144 combinations
fn random_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let animal = ANIMALS[rng.gen_range(0..ANIMALS.len())];

    format!("{} {}", adjective, animal)
}
