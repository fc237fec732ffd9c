use serde::{Deserialize, Serialize};

pub const DEFAULT_STATE: &str = "TX";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub state: String,
}

/// Parse `City, ST` or `City ST` free text.
///
/// With a comma the first two comma-separated parts are city and state, even
/// when the state part is empty. Without one, the last word is the state (upper-cased). A single word is a city in
/// the default state.
pub fn parse_location(text: &str) -> Location {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.contains(',') {
        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        if parts.len() >= 2 {
            return Location {
                city: parts[0].to_string(),
                state: parts[1].to_string(),
            };
        }
    }

    let words: Vec<&str> = text.split(' ').filter(|w| !w.is_empty()).collect();
    if let Some((state, city)) = words.split_last() {
        if !city.is_empty() {
            return Location {
                city: city.join(" "),
                state: state.to_uppercase(),
            };
        }
    }

    Location {
        city: text,
        state: DEFAULT_STATE.to_string(),
    }
}
