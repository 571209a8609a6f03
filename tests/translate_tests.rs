//! Canonical ↔ vendor translation over whole conversations, through JSON.

use pretty_assertions::assert_eq;

use toolchat::translate::{anthropic, openai, AnthropicMessage, OpenAiMessage};
use toolchat::types::{Message, Role, ToolCallRequest};

fn conversation() -> Vec<Message> {
    vec![
        Message::system("You are a helpful assistant"),
        Message::user("Which red and green widgets are there?"),
        Message::assistant_with_tool_calls(
            "Let me look both up.",
            vec![
                ToolCallRequest::new("call_red", "getWidgets", r#"{"colour":"red"}"#),
                ToolCallRequest::new("call_green", "getWidgets", r#"{"colour":"green"}"#),
            ],
        ),
        Message::tool_result("call_red", "red widgets: Fire chilli widget", false),
        Message::tool_result("call_green", "No green widgets found", true),
        Message::assistant("Only one red widget, and no green ones."),
        Message::user("Thanks"),
    ]
}

/// The parts of a message the round trip must keep.
fn linkage(m: &Message) -> (Role, String, Option<String>, Vec<ToolCallRequest>) {
    (
        m.role,
        m.content.clone(),
        m.tool_call_id.clone(),
        m.tool_calls().to_vec(),
    )
}

#[test]
fn anthropic_round_trip_keeps_everything_but_system() {
    let original = conversation();
    let prompt = anthropic::to_vendor(&original).unwrap();
    assert_eq!(prompt.system.as_deref(), Some("You are a helpful assistant"));

    let wire = serde_json::to_string(&prompt.messages).unwrap();
    let decoded: Vec<AnthropicMessage> = serde_json::from_str(&wire).unwrap();

    let mut restored = Vec::new();
    for message in &decoded {
        restored.extend(anthropic::from_vendor(message).unwrap());
    }

    let expected: Vec<_> = original[1..].iter().map(linkage).collect();
    let actual: Vec<_> = restored.iter().map(linkage).collect();
    assert_eq!(actual, expected);
    assert!(restored[3].is_error(), "tool error flag survives the Anthropic path");
}

#[test]
fn anthropic_coalesces_both_results_into_one_user_turn() {
    let prompt = anthropic::to_vendor(&conversation()).unwrap();
    let roles: Vec<&str> = prompt.messages.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, vec!["user", "assistant", "user", "assistant", "user"]);

    let json = serde_json::to_value(&prompt.messages[2]).unwrap();
    let blocks = json["content"].as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0]["tool_use_id"], "call_red");
    assert_eq!(blocks[1]["tool_use_id"], "call_green");
    assert_eq!(blocks[1]["is_error"], true);
}

#[test]
fn openai_round_trip_keeps_system_inline() {
    let original = conversation();
    let wire = serde_json::to_string(&openai::to_vendor(&original)).unwrap();
    let decoded: Vec<OpenAiMessage> = serde_json::from_str(&wire).unwrap();

    let restored: Vec<Message> = decoded
        .iter()
        .map(|m| openai::from_vendor(m).unwrap())
        .collect();

    let expected: Vec<_> = original.iter().map(linkage).collect();
    let actual: Vec<_> = restored.iter().map(linkage).collect();
    assert_eq!(actual, expected);
}
