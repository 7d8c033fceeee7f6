use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{HotkeyStatement, HotstringStatement, Key, LegacyLiteral, Stmt};
use crate::token::{Token, TokenKind};

use super::block::statement;
use super::command::{assemble, literal};
use super::state::ParseState;
use super::ParseResult;

/// Named keys from the AutoHotkey key list.
const KEY_NAMES: &[&str] = &[
    // mouse
    "LButton", "RButton", "MButton", "XButton1", "XButton2",
    "WheelDown", "WheelUp", "WheelLeft", "WheelRight",
    // general
    "CapsLock", "Space", "Tab", "Enter", "Return", "Escape", "Esc", "Backspace", "BS",
    // cursor control
    "ScrollLock", "Delete", "Del", "Insert", "Ins", "Home", "End", "PgUp", "PgDn",
    "Up", "Down", "Left", "Right",
    // numpad
    "NumpadIns", "NumpadEnd", "NumpadDown", "NumpadPgDn", "NumpadLeft", "NumpadClear",
    "NumpadRight", "NumpadHome", "NumpadUp", "NumpadPgUp", "NumpadDot", "NumpadDel",
    "NumLock", "NumpadDiv", "NumpadMult", "NumpadAdd", "NumpadSub", "NumpadEnter",
    // modifiers
    "LWin", "RWin", "Control", "Ctrl", "Alt", "Shift", "LControl", "LCtrl", "RControl",
    "RCtrl", "LShift", "RShift", "LAlt", "RAlt",
    // multimedia
    "Browser_Back", "Browser_Forward", "Browser_Refresh", "Browser_Stop", "Browser_Search",
    "Browser_Favorites", "Browser_Home", "Volume_Mute", "Volume_Down", "Volume_Up",
    "Media_Next", "Media_Prev", "Media_Stop", "Media_Play_Pause", "Launch_Mail",
    "Launch_Media", "Launch_App1", "Launch_App2",
    // other
    "AppsKey", "PrintScreen", "CtrlBreak", "Pause", "Break", "Help", "Sleep",
];

const MODIFIERS: &str = "#!^+<>*~$";

/// `2Joy1`: joystick number in front of a joystick control.
static JOYSTICK_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{1,2})joy").expect("joystick prefix pattern"));

static NUMBERED_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(f|joy)(\d{1,2})$").expect("numbered key pattern"));

static CODE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:numpad\d|sc[\da-f]{3}|vk[\da-f]{2})$").expect("key code pattern")
});

static HOTSTRING_OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\*|\?|B0|B|C0|C1|C|k-1|k\d+|O0|O|P\d+|R0|R|SI|SP|SE|T0|T|X|Z0|Z)")
        .expect("hotstring option pattern")
});

/// Whether `name` is a key AutoHotkey accepts in a hotkey.
pub(crate) fn is_valid_key(name: &str) -> bool {
    if name.chars().count() == 1 {
        return true;
    }

    let name = JOYSTICK_PREFIX
        .captures(name)
        .and_then(|caps| caps.get(1))
        .filter(|number| in_range(number.as_str(), 16))
        .map_or(name, |number| &name[number.end()..]);

    if KEY_NAMES.iter().any(|key| key.eq_ignore_ascii_case(name)) {
        return true;
    }

    let numbered = NUMBERED_KEY.captures(name).is_some_and(|caps| {
        let limit = if caps[1].eq_ignore_ascii_case("f") { 24 } else { 32 };
        in_range(&caps[2], limit)
    });
    numbered || CODE_KEY.is_match(name)
}

/// `digits` is a number from 1 to `max`.
fn in_range(digits: &str, max: u32) -> bool {
    digits.parse::<u32>().is_ok_and(|n| (1..=max).contains(&n))
}

/// Split hotstring option text into individual options.
///
/// Returns `None` unless the whole text is made of known options.
pub(crate) fn hotstring_options(text: &str) -> Option<Vec<String>> {
    let mut options = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let option = HOTSTRING_OPTION.find(rest)?;
        options.push(option.as_str().to_string());
        rest = &rest[option.end()..];
    }
    Some(options)
}

fn is_modifier(token: &Token) -> bool {
    token.kind == TokenKind::Symbol && token.text.chars().all(|c| MODIFIERS.contains(c))
}

fn key_of(token: &Token) -> Key {
    Key {
        name: token.text.clone(),
        up: false,
        span: token.span,
    }
}

struct Trigger {
    modifiers: String,
    prefix: Option<Key>,
    key: Key,
}

/// `[modifiers][prefix &] key:: [action]`.
pub(crate) fn hotkey(state: &mut ParseState<'_>) -> ParseResult<Stmt> {
    let Some(start) = state.current() else {
        return Ok(None);
    };
    let Some(trigger) = state.attempt(trigger)? else {
        return Ok(None);
    };
    state.pos += 2;

    let action = if state.sol() {
        None
    } else {
        statement(state)?.map(Box::new)
    };
    if !state.sol() {
        return Err(state.error());
    }

    Ok(Some(Stmt::Hotkey(HotkeyStatement {
        modifiers: trigger.modifiers,
        prefix: trigger.prefix,
        key: trigger.key,
        action,
        span: state.span_from(start.span),
    })))
}

/// Everything before the `::` of a hotkey, leaving the cursor on it.
fn trigger(state: &mut ParseState<'_>) -> ParseResult<Trigger> {
    let first = state.pos;
    let mut modifiers: Vec<&Token> = Vec::new();
    while let Some(token) = state.current() {
        let adjacent = modifiers.last().is_none_or(|prev| prev.touches(token));
        if (state.pos != first && state.sol()) || !adjacent || !is_modifier(token) {
            break;
        }
        modifiers.push(token);
        state.advance();
    }
    if state.eof() || (!modifiers.is_empty() && state.sol()) {
        return Ok(None);
    }

    let (prefix, key) = if !modifiers.is_empty() && closes_trigger(state, 0) {
        // `!::` names the modifier itself
        let Some(last) = modifiers.pop() else {
            return Ok(None);
        };
        (None, key_of(last))
    } else if let Some(token) = state.current().filter(|token| {
        closes_trigger(state, 1)
            && token.text.chars().count() == 1
            && touches_modifiers(&modifiers, token)
    }) {
        // `:::` and other single-character keys
        state.advance();
        (None, key_of(token))
    } else {
        if !state.current().is_some_and(|token| touches_modifiers(&modifiers, token)) {
            return Ok(None);
        }
        let Some(combination) = combination(state) else {
            return Ok(None);
        };
        if !closes_trigger(state, 0) {
            return Ok(None);
        }
        combination
    };

    Ok(Some(Trigger {
        modifiers: modifiers.iter().map(|t| t.text.as_str()).collect(),
        prefix,
        key,
    }))
}

/// Adjacent `::` at `offset`, on the line of the token before it.
fn closes_trigger(state: &ParseState<'_>, offset: isize) -> bool {
    state.continues(offset) && state.is_double_colon(offset)
}

fn touches_modifiers(modifiers: &[&Token], token: &Token) -> bool {
    modifiers.last().is_none_or(|last| last.touches(token))
}

/// `key` or `prefix & key`.
fn combination(state: &mut ParseState<'_>) -> Option<(Option<Key>, Key)> {
    let first = key(state)?;
    if state.continue_line() && state.current().is_some_and(|t| t.text == "&") {
        state.advance();
        if state.sol() {
            return None;
        }
        let second = key(state)?;
        return Some((Some(first), second));
    }
    Some((None, first))
}

fn key(state: &mut ParseState<'_>) -> Option<Key> {
    let token = state.current()?;

    if let Some(next) = state.token(1) {
        let name = format!("{}{}", token.text, next.text);
        if token.kind == TokenKind::Number && token.touches(next) && is_valid_key(&name) {
            state.pos += 2;
            return Some(Key {
                name,
                up: false,
                span: token.span.to(next.span.end),
            });
        }
    }

    if !is_valid_key(&token.text) {
        return None;
    }
    state.advance();
    let up = state.continue_line()
        && state
            .current()
            .is_some_and(|next| next.kind == TokenKind::Word && next.is("up"));
    if up {
        state.advance();
    }
    Some(Key {
        name: token.text.clone(),
        up,
        span: state.span_from(token.span),
    })
}

struct Head {
    options: Vec<String>,
    trigger: LegacyLiteral,
}

/// `:options:trigger::replacement`, or an `X` hotstring running a
/// statement.
pub(crate) fn hotstring(state: &mut ParseState<'_>) -> ParseResult<Stmt> {
    let Some(start) = state.current() else {
        return Ok(None);
    };
    if start.text != ":" {
        return Ok(None);
    }
    let Some(head) = state.attempt(head)? else {
        return Ok(None);
    };
    state.pos += 2;

    let execute = head.options.iter().any(|o| o.eq_ignore_ascii_case("x"));
    let (action, replacement) = match (state.continue_line(), execute) {
        (false, _) => (None, None),
        (true, true) => (statement(state)?.map(Box::new), None),
        (true, false) => (None, literal(state, |_| false)),
    };
    if !state.sol() {
        return Err(state.error());
    }

    Ok(Some(Stmt::Hotstring(HotstringStatement {
        options: head.options,
        trigger: head.trigger,
        replacement,
        action,
        span: state.span_from(start.span),
    })))
}

fn head(state: &mut ParseState<'_>) -> ParseResult<Head> {
    let Some(open) = state.advance() else {
        return Ok(None);
    };

    let mut last = open;
    while let Some(token) = state.current() {
        if state.sol() || !last.touches(token) {
            return Ok(None);
        }
        state.advance();
        if token.text == ":" {
            break;
        }
        last = token;
    }
    let Some(close) = state.previous().filter(|t| t.text == ":" && !std::ptr::eq(*t, open)) else {
        return Ok(None);
    };
    let Some(options) = hotstring_options(&state.source[open.span.end..close.span.start]) else {
        return Ok(None);
    };

    let first = state.pos;
    let mut escaped = false;
    let mut closed = false;
    while let Some(token) = state.current() {
        if state.sol() {
            break;
        }
        if escaped && state.previous().is_some_and(|prev| prev.touches(token)) {
            escaped = false;
            state.advance();
            continue;
        }
        if state.is_double_colon(0) {
            closed = true;
            break;
        }
        escaped = token.text == "`";
        state.advance();
    }
    if !closed || state.pos == first {
        return Ok(None);
    }

    Ok(Some(Head {
        options,
        trigger: assemble(state, first, state.pos - 1),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn first(source: &str) -> Stmt {
        parse(source)
            .expect("should parse")
            .body
            .into_iter()
            .next()
            .expect("should have a statement")
    }

    fn hotkey(source: &str) -> HotkeyStatement {
        match first(source) {
            Stmt::Hotkey(hotkey) => hotkey,
            other => panic!("expected hotkey, got {other:?}"),
        }
    }

    fn hotstring(source: &str) -> HotstringStatement {
        match first(source) {
            Stmt::Hotstring(hotstring) => hotstring,
            other => panic!("expected hotstring, got {other:?}"),
        }
    }

    #[test]
    fn valid_keys() {
        for key in ["a", "!", "LButton", "numpadenter", "F24", "Joy32", "2Joy7", "Numpad5", "SC01F", "vk1b"] {
            assert!(is_valid_key(key), "{key}");
        }
        for key in ["F25", "Joy33", "17Joy1", "Foo", "sc1", "vkxyz", "F0", "Joy0", "0Joy1"] {
            assert!(!is_valid_key(key), "{key}");
        }
    }

    #[test]
    fn options_are_split_greedily() {
        assert_eq!(
            hotstring_options("*B0C1k10"),
            Some(vec!["*".into(), "B0".into(), "C1".into(), "k10".into()])
        );
        assert_eq!(hotstring_options(""), Some(Vec::new()));
        assert_eq!(hotstring_options("Q"), None);
    }

    #[test]
    fn modifiers_and_key() {
        let stmt = hotkey("^!c::Send, copied");
        assert_eq!(stmt.modifiers, "^!");
        assert_eq!(stmt.key.name, "c");
        assert!(matches!(stmt.action.as_deref(), Some(Stmt::Command(_))));
    }

    #[test]
    fn lone_modifier_is_the_key() {
        let stmt = hotkey("!::return");
        assert_eq!(stmt.modifiers, "");
        assert_eq!(stmt.key.name, "!");
    }

    #[test]
    fn colon_key() {
        let stmt = hotkey(":::return");
        assert_eq!(stmt.key.name, ":");
    }

    #[test]
    fn prefix_key() {
        let stmt = hotkey("a & b::MsgBox");
        assert_eq!(stmt.prefix.map(|k| k.name).as_deref(), Some("a"));
        assert_eq!(stmt.key.name, "b");
    }

    #[test]
    fn key_up() {
        let stmt = hotkey("LButton up::return");
        assert!(stmt.key.up);
        assert_eq!(stmt.key.span.end, 10);
    }

    #[test]
    fn joystick_key() {
        let stmt = hotkey("2Joy1::return");
        assert_eq!(stmt.key.name, "2Joy1");
    }

    #[test]
    fn action_on_next_line() {
        let script = parse("F1::\nMsgBox, hi\nreturn").expect("should parse");
        assert_eq!(script.body.len(), 3);
        let Stmt::Hotkey(stmt) = &script.body[0] else {
            panic!("expected hotkey");
        };
        assert!(stmt.action.is_none());
    }

    #[test]
    fn invalid_key_is_not_a_hotkey() {
        assert!(!matches!(first("Foo := 1"), Stmt::Hotkey(_)));
        assert!(!matches!(first("a := 1"), Stmt::Hotkey(_)));
    }

    #[test]
    fn leftover_after_action_is_fatal() {
        assert!(parse("a::b)").is_err());
    }

    #[test]
    fn replacement_hotstring() {
        let stmt = hotstring("::btw::by the way");
        assert!(stmt.options.is_empty());
        assert_eq!(stmt.trigger.value, "btw");
        assert_eq!(stmt.replacement.map(|r| r.value).as_deref(), Some("by the way"));
    }

    #[test]
    fn execute_hotstring() {
        let stmt = hotstring(":*X:x::Run, notepad");
        assert_eq!(stmt.options, vec!["*".to_string(), "X".to_string()]);
        assert!(stmt.replacement.is_none());
        assert!(matches!(stmt.action.as_deref(), Some(Stmt::Command(_))));
    }

    #[test]
    fn escaped_colons_in_trigger() {
        let stmt = hotstring("::a`::b::c");
        assert_eq!(stmt.trigger.value, "a::b");
        assert_eq!(stmt.replacement.map(|r| r.value).as_deref(), Some("c"));
    }

    #[test]
    fn double_colon_on_the_next_line_is_not_a_trigger() {
        for source in ["return\n::btw::by the way", "x\n::btw::by the way", "Esc\n::a::b"] {
            let script = parse(source).unwrap_or_else(|e| panic!("{source:?}: {e}"));
            assert_eq!(script.body.len(), 2, "{source:?}");
            assert!(!matches!(script.body[0], Stmt::Hotkey(_)), "{source:?}");
            assert!(matches!(script.body[1], Stmt::Hotstring(_)), "{source:?}");
        }
    }

    #[test]
    fn unknown_option_is_not_a_hotstring() {
        assert!(parse(":Q:x::y").is_err());
    }
}
