//! Dispatch results rendered as Slack messages.

use rei_core::actor::Actor;
use rei_core::dispatch::DispatchResult;
use rei_core::help::COMMAND_PREFIX;
use rei_core::location::parse_location;
use rei_core::types::{Reason, Tool};
use serde_json::{json, Value};

/// Slack caps a section block's text at 3000 characters.
const SECTION_MAX: usize = 2900;
const LIST_MAX: usize = 5;

/// Slash-command reply. `args` is the argument text the user typed.
pub fn render(result: &DispatchResult, args: &str, actor: &Actor) -> Value {
    let (text, blocks) = match (&result.payload, result.reason) {
        (Some(payload), None) => success_blocks(&result.tool, payload, args, actor),
        (_, reason) => {
            let text = failure_text(result, reason, actor);
            (text.clone(), vec![section(&text)])
        }
    };
    json!({
        "response_type": "ephemeral",
        "text": text,
        "blocks": blocks,
    })
}

/// Immediate reply sent when the answer will arrive through `response_url`.
pub fn ack(args: &str) -> Value {
    let text = if args.trim().is_empty() {
        "⏳ Working on it...".to_string()
    } else {
        format!("⏳ Working on *{}*...", truncate(args.trim(), 80))
    };
    json!({ "response_type": "ephemeral", "text": text })
}

/// Single-line reply for chat messages (mentions and DMs).
pub fn plain_text(result: &DispatchResult, actor: &Actor) -> String {
    match (&result.payload, result.reason) {
        (Some(payload), None) => payload
            .get("response")
            .or_else(|| payload.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| "Sorry, I couldn't process that request.".to_string()),
        (_, reason) => failure_text(result, reason, actor),
    }
}

fn failure_text(result: &DispatchResult, reason: Option<Reason>, actor: &Actor) -> String {
    let tool = &result.tool;
    let detail = result.message.as_deref().unwrap_or("unexpected error");
    match reason {
        Some(Reason::AccountDisabled) => {
            "🚫 Your account is disabled. Contact an admin.".to_string()
        }
        Some(Reason::InsufficientRole) => format!(
            "🚫 `{COMMAND_PREFIX} {tool}` is not available to the {} role.",
            actor.role
        ),
        Some(Reason::UnknownCommand) => format!("❓ {detail}"),
        Some(Reason::InvalidArguments) => format!("❌ {detail}"),
        Some(Reason::UpstreamTimeout) => format!(
            "⏱️ `{COMMAND_PREFIX} {tool}` took too long to answer. Please try again."
        ),
        Some(Reason::HandlerMissing) => {
            format!("⚠️ `{COMMAND_PREFIX} {tool}` is not available right now.")
        }
        Some(Reason::UpstreamError) | None => format!("❌ Error: {detail}"),
    }
}

// ---------------------------------------------------------------------------
// Success rendering per tool
// ---------------------------------------------------------------------------

fn success_blocks(tool: &str, payload: &Value, args: &str, actor: &Actor) -> (String, Vec<Value>) {
    let requested_by = format!("Requested by {}", actor.display_name());
    match tool.parse::<Tool>() {
        Ok(Tool::Help) => {
            let text = str_field(payload, "text").unwrap_or_default();
            (text.clone(), vec![section(&text)])
        }
        Ok(Tool::Lookup) => {
            let data = data_of(payload);
            let text = format!(
                "*Address:* {args}\n*Estimated Value:* ${}\n*Year Built:* {}\n*Bedrooms:* {} | *Bathrooms:* {}\n*Square Feet:* {}\n*Equity:* {}%\n*Owner:* {}",
                money(&data["estimated_value"]),
                or_na(&data["year_built"]),
                or_na(&data["bedrooms"]),
                or_na(&data["bathrooms"]),
                number_or_na(&data["square_feet"]),
                or_na(&data["equity_percent"]),
                data["owner"]["name"].as_str().unwrap_or("Unknown"),
            );
            titled("📍 Property Details", &text, &requested_by)
        }
        Ok(Tool::Search) => {
            let loc = parse_location(args);
            let items = list_of(payload, &["data", "properties"]);
            if items.is_empty() {
                let text = format!("📭 No high equity leads found in {}, {}", loc.city, loc.state);
                return (text.clone(), vec![section(&text)]);
            }
            let lines: Vec<String> = items.iter().copied().take(LIST_MAX).map(property_line).collect();
            titled(
                &format!("🎯 High Equity Leads - {}, {}", loc.city, loc.state),
                &lines.join("\n"),
                &format!("Found {} leads | {requested_by}", items.len()),
            )
        }
        Ok(Tool::Buyers) => {
            let loc = parse_location(args);
            let items = list_of(payload, &["buyers", "data"]);
            if items.is_empty() {
                let text = format!("📭 No portfolio buyers found in {}, {}", loc.city, loc.state);
                return (text.clone(), vec![section(&text)]);
            }
            let lines: Vec<String> = items
                .iter()
                .take(LIST_MAX)
                .map(|b| {
                    format!(
                        "💰 *{}* - {} purchases in last 12 months",
                        b["name"].as_str().unwrap_or("Unknown"),
                        b["purchase_count"].as_u64().unwrap_or(0)
                    )
                })
                .collect();
            titled(
                &format!("💰 Cash Buyers - {}, {}", loc.city, loc.state),
                &lines.join("\n"),
                &format!("Found {} portfolio buyers | {requested_by}", items.len()),
            )
        }
        Ok(Tool::Skip) => {
            let data = data_of(payload);
            let text = format!(
                "*Address:* {args}\n*Owner:* {}\n*Phones:* {}\n*Emails:* {}",
                data["name"].as_str().unwrap_or("Unknown"),
                joined(&data["phones"]),
                joined(&data["emails"]),
            );
            titled("📞 Skip Trace Results", &text, &requested_by)
        }
        Ok(Tool::Ask) => {
            let answer = str_field(payload, "response")
                .or_else(|| str_field(payload, "text"))
                .unwrap_or_else(|| "No response generated".to_string());
            let blocks = vec![
                header("🤖 AI Assistant"),
                section(&format!("*Q:* {args}")),
                json!({ "type": "divider" }),
                section(&answer),
                context(&format!("Asked by {}", actor.display_name())),
            ];
            (answer, blocks)
        }
        Ok(Tool::ActivityLog) => {
            let entries = list_of(payload, &["activity"]);
            if entries.is_empty() {
                let text = "📭 No matching activity.".to_string();
                return (text.clone(), vec![section(&text)]);
            }
            let lines: Vec<String> = entries
                .iter()
                .map(|e| {
                    let mut line = format!(
                        "`{}` {} *{}* {}",
                        e["timestamp"].as_str().unwrap_or("?"),
                        e["actor_id"].as_str().unwrap_or("?"),
                        e["tool"].as_str().unwrap_or("?"),
                        e["outcome"].as_str().unwrap_or("?"),
                    );
                    if let Some(reason) = e["reason"].as_str() {
                        line.push_str(&format!(" ({reason})"));
                    }
                    line
                })
                .collect();
            titled(
                "🗂️ Recent Activity",
                &lines.join("\n"),
                &format!("{} entries", entries.len()),
            )
        }
        Err(_) => {
            let text = format!("```{}```", pretty(payload));
            (text.clone(), vec![section(&text)])
        }
    }
}

fn property_line(prop: &Value) -> String {
    let addr = &prop["address"];
    let address = if addr.is_object() {
        format!(
            "{}, {}, {}",
            addr["street"].as_str().unwrap_or("Unknown"),
            addr["city"].as_str().unwrap_or(""),
            addr["state"].as_str().unwrap_or("")
        )
    } else {
        addr.as_str().unwrap_or("Unknown").to_string()
    };
    format!(
        "📍 *{address}*\n   Equity: {}% | Value: ${} | Built: {}",
        or_na(&prop["equity_percent"]),
        money(&prop["estimated_value"]),
        or_na(&prop["year_built"]),
    )
}

// ---------------------------------------------------------------------------
// Block helpers
// ---------------------------------------------------------------------------

fn titled(title: &str, body: &str, footer: &str) -> (String, Vec<Value>) {
    let blocks = vec![header(title), section(body), context(footer)];
    (format!("{title}\n{body}"), blocks)
}

fn header(text: &str) -> Value {
    json!({ "type": "header", "text": { "type": "plain_text", "text": text } })
}

fn section(text: &str) -> Value {
    json!({ "type": "section", "text": { "type": "mrkdwn", "text": truncate(text, SECTION_MAX) } })
}

fn context(text: &str) -> Value {
    json!({ "type": "context", "elements": [{ "type": "mrkdwn", "text": text }] })
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max).collect();
        out.push('…');
        out
    }
}

fn data_of(payload: &Value) -> &Value {
    let nested = &payload["detail"]["data"];
    if nested.is_object() {
        return nested;
    }
    if payload["data"].is_object() {
        return &payload["data"];
    }
    payload
}

fn list_of<'a>(payload: &'a Value, keys: &[&str]) -> Vec<&'a Value> {
    keys.iter()
        .find_map(|k| payload.get(*k).and_then(Value::as_array))
        .or_else(|| payload.as_array())
        .map(|items| items.iter().collect())
        .unwrap_or_default()
}

fn str_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

fn or_na(v: &Value) -> String {
    match v {
        Value::Null => "N/A".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn number_or_na(v: &Value) -> String {
    match v.as_f64() {
        Some(n) => with_commas(n.round() as i64),
        None => or_na(v),
    }
}

fn money(v: &Value) -> String {
    with_commas(v.as_f64().unwrap_or(0.0).round() as i64)
}

fn joined(v: &Value) -> String {
    let items: Vec<&str> = v
        .as_array()
        .map(|a| a.iter().filter_map(Value::as_str).take(3).collect())
        .unwrap_or_default();
    if items.is_empty() {
        "None found".to_string()
    } else {
        items.join(", ")
    }
}

fn pretty(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

fn with_commas(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rei_core::types::Role;

    fn member() -> Actor {
        Actor::new("u1", Role::Member)
    }

    #[test]
    fn commas() {
        assert_eq!(with_commas(0), "0");
        assert_eq!(with_commas(999), "999");
        assert_eq!(with_commas(1000), "1,000");
        assert_eq!(with_commas(-1234567), "-1,234,567");
    }

    #[test]
    fn denied_reply_names_the_role() {
        let result = DispatchResult::failure("skip", Reason::InsufficientRole, "denied");
        let msg = render(&result, "123 Main St", &member());
        assert_eq!(msg["response_type"], "ephemeral");
        assert_eq!(msg["text"], "🚫 `/rei skip` is not available to the member role.");
    }

    #[test]
    fn timeout_reply() {
        let result = DispatchResult::failure("ask", Reason::UpstreamTimeout, "slow");
        let text = render(&result, "q", &member())["text"].as_str().unwrap().to_string();
        assert!(text.contains("took too long"));
    }

    #[test]
    fn buyers_reply_lists_buyers_for_location() {
        let payload = json!({ "buyers": [
            { "name": "Acme Homes", "purchase_count": 4 },
            { "name": "Lone Star Capital", "purchase_count": 2 },
        ]});
        let result = DispatchResult::success("buyers", payload);
        let msg = render(&result, "Dallas, TX", &Actor::new("m", Role::Manager));
        assert_eq!(msg["blocks"][0]["text"]["text"], "💰 Cash Buyers - Dallas, TX");
        let body = msg["blocks"][1]["text"]["text"].as_str().unwrap();
        assert!(body.contains("*Acme Homes* - 4 purchases"));
        assert!(msg["blocks"][2]["elements"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Found 2 portfolio buyers"));
    }

    #[test]
    fn empty_search_says_so() {
        let result = DispatchResult::success("search", json!({ "data": [] }));
        let msg = render(&result, "Plano TX", &member());
        assert_eq!(msg["text"], "📭 No high equity leads found in Plano, TX");
    }

    #[test]
    fn search_reply_lists_at_most_five_leads() {
        let props: Vec<Value> = (0..7)
            .map(|i| {
                json!({
                    "address": { "street": format!("{i} Elm St"), "city": "Plano", "state": "TX" },
                    "equity_percent": 60,
                    "estimated_value": 250000,
                    "year_built": 1998,
                })
            })
            .collect();
        let result = DispatchResult::success("search", json!({ "data": props }));
        let msg = render(&result, "Plano, TX", &member());

        assert_eq!(msg["blocks"][0]["text"]["text"], "🎯 High Equity Leads - Plano, TX");
        let body = msg["blocks"][1]["text"]["text"].as_str().unwrap();
        assert!(body.contains("📍 *0 Elm St, Plano, TX*"));
        assert!(body.contains("Value: $250,000"));
        assert!(body.contains("4 Elm St"));
        assert!(!body.contains("5 Elm St"));
        assert!(msg["blocks"][2]["elements"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Found 7 leads"));
    }

    #[test]
    fn help_reply_is_the_help_text() {
        let result = DispatchResult::success("help", json!({ "text": "*REI Nationwide Commands*" }));
        let msg = render(&result, "", &member());
        assert_eq!(msg["text"], "*REI Nationwide Commands*");
    }

    #[test]
    fn plain_text_prefers_ai_response() {
        let result = DispatchResult::success("ask", json!({ "response": "70% rule" }));
        assert_eq!(plain_text(&result, &member()), "70% rule");
        let denied = DispatchResult::failure("ask", Reason::AccountDisabled, "disabled");
        assert!(plain_text(&denied, &member()).contains("disabled"));
    }

    #[test]
    fn long_sections_are_truncated() {
        let long = "x".repeat(SECTION_MAX + 50);
        let block = section(&long);
        assert_eq!(
            block["text"]["text"].as_str().unwrap().chars().count(),
            SECTION_MAX + 1
        );
    }
}
