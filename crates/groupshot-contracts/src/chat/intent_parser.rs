use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, ADD_COMMAND, EDIT_COMMAND, NO_ARG_COMMANDS, RAW_ARG_COMMANDS, SLOT_COMMANDS,
    TOGGLE_COMMANDS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub prompt: Option<String>,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            prompt: None,
            command_args: BTreeMap::new(),
        }
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_toggle_arg(arg: &str) -> Option<bool> {
    match arg.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Parses one REPL line into a wizard intent. Pure: no state, no I/O.
///
/// Slash-commands resolve through the registry tables; anything else is
/// free text (the result-step edit instruction). Slot numbers are the
/// user-facing 1-based person numbers, passed through unconverted.
pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    let Some(slash_tail) = raw_trimmed.strip_prefix('/') else {
        let mut intent = Intent::new("free_text", text);
        intent.prompt = Some(raw_trimmed.to_string());
        return intent;
    };

    let command_len = slash_tail
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .count();
    if command_len == 0 {
        return Intent::new("unknown", text);
    }
    let command = slash_tail[..command_len].to_ascii_lowercase();
    let remainder = &slash_tail[command_len..];
    let arg = if remainder.is_empty() {
        ""
    } else {
        remainder.trim()
    };

    if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
        return Intent::new(action, text);
    }

    if let Some(action) = find_action(&command, SLOT_COMMANDS) {
        let mut intent = Intent::new(action, text);
        intent.command_args.insert(
            "slot".to_string(),
            arg.parse::<u64>()
                .map(|value| Value::Number(value.into()))
                .unwrap_or(Value::Null),
        );
        return intent;
    }

    if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
        let mut intent = Intent::new(action, text);
        intent
            .command_args
            .insert("value".to_string(), Value::String(arg.to_string()));
        return intent;
    }

    if let Some(action) = find_action(&command, TOGGLE_COMMANDS) {
        let mut intent = Intent::new(action, text);
        intent.command_args.insert(
            "enabled".to_string(),
            parse_toggle_arg(arg).map(Value::Bool).unwrap_or(Value::Null),
        );
        return intent;
    }

    if command == ADD_COMMAND.command {
        // `/add [slot] <path>`; the path may be quoted and contain spaces.
        let mut parts = parse_path_args(arg);
        let mut intent = Intent::new(ADD_COMMAND.action, text);
        let slot = parts
            .first()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|_| parts.len() > 1);
        if slot.is_some() {
            parts.remove(0);
        }
        intent.command_args.insert(
            "slot".to_string(),
            slot.map(|value| Value::Number(value.into()))
                .unwrap_or(Value::Null),
        );
        intent.command_args.insert(
            "path".to_string(),
            Value::String(parts.join(" ")),
        );
        return intent;
    }

    if command == EDIT_COMMAND.command {
        let mut intent = Intent::new(EDIT_COMMAND.action, text);
        intent.prompt = Some(arg.to_string());
        return intent;
    }

    Intent::new("unknown", text)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::parse_intent;

    #[test]
    fn blank_input_is_a_noop() {
        assert_eq!(parse_intent("").action, "noop");
        assert_eq!(parse_intent("   ").action, "noop");
    }

    #[test]
    fn free_text_becomes_an_edit_prompt() {
        let intent = parse_intent("  make the background a beach  ");
        assert_eq!(intent.action, "free_text");
        assert_eq!(intent.prompt.as_deref(), Some("make the background a beach"));
    }

    #[test]
    fn no_arg_commands_resolve_through_the_registry() {
        assert_eq!(parse_intent("/start").action, "begin");
        assert_eq!(parse_intent("/next").action, "advance");
        assert_eq!(parse_intent("/generate").action, "generate");
        assert_eq!(parse_intent("/restart").action, "start_over");
        assert_eq!(parse_intent("/THEME").action, "toggle_theme");
    }

    #[test]
    fn slot_commands_carry_the_number_or_null() {
        let intent = parse_intent("/remove 3");
        assert_eq!(intent.action, "remove_image");
        assert_eq!(intent.command_args["slot"], Value::Number(3.into()));

        let missing = parse_intent("/reference");
        assert_eq!(missing.action, "toggle_reference");
        assert_eq!(missing.command_args["slot"], Value::Null);
    }

    #[test]
    fn raw_arg_commands_keep_the_full_argument() {
        let intent = parse_intent("/scene Luxury event backdrop");
        assert_eq!(intent.action, "set_scene");
        assert_eq!(
            intent.command_args["value"],
            Value::String("Luxury event backdrop".to_string())
        );

        let ratio = parse_intent("/ratio 16:9");
        assert_eq!(ratio.action, "set_ratio");
        assert_eq!(ratio.command_args["value"], Value::String("16:9".to_string()));
    }

    #[test]
    fn toggle_commands_parse_on_off() {
        let on = parse_intent("/outfits on");
        assert_eq!(on.action, "set_outfits");
        assert_eq!(on.command_args["enabled"], Value::Bool(true));

        let off = parse_intent("/background off");
        assert_eq!(off.command_args["enabled"], Value::Bool(false));

        let invalid = parse_intent("/outfits sideways");
        assert_eq!(invalid.command_args["enabled"], Value::Null);
    }

    #[test]
    fn add_accepts_optional_slot_and_quoted_paths() {
        let plain = parse_intent("/add portraits/ana.png");
        assert_eq!(plain.action, "add_image");
        assert_eq!(plain.command_args["slot"], Value::Null);
        assert_eq!(
            plain.command_args["path"],
            Value::String("portraits/ana.png".to_string())
        );

        let slotted = parse_intent("/add 2 \"family photos/uncle bob.jpg\"");
        assert_eq!(slotted.command_args["slot"], Value::Number(2.into()));
        assert_eq!(
            slotted.command_args["path"],
            Value::String("family photos/uncle bob.jpg".to_string())
        );
    }

    #[test]
    fn edit_keeps_the_instruction_as_prompt() {
        let intent = parse_intent("/edit add a retro filter");
        assert_eq!(intent.action, "edit_image");
        assert_eq!(intent.prompt.as_deref(), Some("add a retro filter"));
    }

    #[test]
    fn unknown_slash_commands_are_flagged() {
        assert_eq!(parse_intent("/teleport").action, "unknown");
        assert_eq!(parse_intent("/").action, "unknown");
    }
}
