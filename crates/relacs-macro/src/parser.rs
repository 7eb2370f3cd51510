use crate::ast::{ActionFlag, CommandKind, MacroCommand, MacroDef, ParamList};
use crate::error::{MacroError, MacroResult};

/// Splits a `key=value;key=value` parameter string into an ordered list,
/// per spec.md §6 ("Parameters follow as key=value separated by
/// semicolons").
pub fn parse_params(s: &str) -> ParamList {
    s.split(';')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .filter_map(|chunk| {
            chunk.split_once('=').map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}

fn flag_for_token(token: &str) -> Option<ActionFlag> {
    match token.to_ascii_lowercase().as_str() {
        "startup" => Some(ActionFlag::STARTUP),
        "shutdown" => Some(ActionFlag::SHUTDOWN),
        "fallback" => Some(ActionFlag::FALLBACK),
        "startsession" => Some(ActionFlag::STARTSESSION),
        "stopsession" => Some(ActionFlag::STOPSESSION),
        "nobutton" => Some(ActionFlag::NOBUTTON),
        "nokey" => Some(ActionFlag::NOKEY),
        "nomenu" => Some(ActionFlag::NOMENU),
        "keep" => Some(ActionFlag::KEEP),
        "overwrite" => Some(ActionFlag::OVERWRITE),
        _ => None,
    }
}

/// Parses a macro header `macro Name FLAG1 FLAG2 key=val;key=val`.
/// Unrecognized bare tokens are warnings, not parse errors (spec.md §6).
fn parse_header(rest: &str, line: usize, warnings: &mut Vec<String>) -> MacroResult<MacroDef> {
    let mut tokens = rest.split_whitespace();
    let name = tokens
        .next()
        .ok_or_else(|| MacroError::Parse { line, message: "macro header is missing a name".into() })?;

    let mut action = ActionFlag::empty();
    let mut variables = ParamList::new();
    for token in tokens {
        if let Some(flag) = flag_for_token(token) {
            action |= flag;
        } else if token.contains('=') {
            variables.extend(parse_params(token));
        } else {
            warnings.push(format!("line {line}: unknown macro flag '{token}'"));
        }
    }
    Ok(MacroDef::new(name, action, variables))
}

/// Parses one indented command line under the current macro.
fn parse_command(rest: &str, line: usize) -> MacroResult<MacroCommand> {
    let (keyword, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let tail = tail.trim();
    let err = |message: String| MacroError::Parse { line, message };

    let (kind, params) = match keyword {
        "repro" => {
            let (name, params) = tail.split_once(char::is_whitespace).unwrap_or((tail, ""));
            if name.is_empty() {
                return Err(err("repro command is missing a RePro name".into()));
            }
            (CommandKind::Repro { name: name.to_string() }, parse_params(params.trim()))
        }
        "macro" => {
            let (name, params) = tail.split_once(char::is_whitespace).unwrap_or((tail, ""));
            if name.is_empty() {
                return Err(err("macro command is missing a macro name".into()));
            }
            (CommandKind::Macro { name: name.to_string() }, parse_params(params.trim()))
        }
        "shell" => (CommandKind::Shell { command: tail.to_string() }, ParamList::new()),
        "message" => {
            let (text, timeout) = match tail.rsplit_once(";timeout=") {
                Some((text, t)) => (text.trim().to_string(), t.trim().parse::<f64>().ok()),
                None => (tail.to_string(), None),
            };
            (CommandKind::Message { text, timeout }, ParamList::new())
        }
        "browse" => (CommandKind::Browse { path: tail.to_string() }, ParamList::new()),
        "switch" => (CommandKind::Switch { file: tail.to_string() }, ParamList::new()),
        "startsession" => (CommandKind::StartSession, ParamList::new()),
        "savedata" => (CommandKind::SaveData, ParamList::new()),
        "filter" => {
            let mut it = tail.split_whitespace();
            let name = it.next().unwrap_or_default().to_string();
            let action = it.next().unwrap_or("save").to_string();
            (CommandKind::Filter { name, action }, ParamList::new())
        }
        "detector" => {
            let mut it = tail.split_whitespace();
            let name = it.next().unwrap_or_default().to_string();
            let action = it.next().unwrap_or("save").to_string();
            (CommandKind::Detector { name, action }, ParamList::new())
        }
        other => return Err(err(format!("unknown macro command '{other}'"))),
    };
    Ok(MacroCommand::new(kind, params))
}

/// Parses a full macro file (spec.md §6 "Macro file format"): `macro`
/// headers at column 0 followed by indented command lines, blank lines
/// and `#`-comments ignored. Returns the parsed macros alongside any
/// non-fatal warnings (unknown flags, per spec.md §6).
pub fn parse_macro_file(text: &str) -> MacroResult<(Vec<MacroDef>, Vec<String>)> {
    let mut macros = Vec::new();
    let mut warnings = Vec::new();
    let mut current: Option<MacroDef> = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_num = idx + 1;
        if raw_line.trim().is_empty() || raw_line.trim_start().starts_with('#') {
            continue;
        }
        let indented = raw_line.starts_with(' ') || raw_line.starts_with('\t');
        let trimmed = raw_line.trim();

        if !indented {
            let rest = trimmed
                .strip_prefix("macro")
                .ok_or_else(|| MacroError::Parse {
                    line: line_num,
                    message: format!("expected a 'macro' header, found '{trimmed}'"),
                })?
                .trim();
            if let Some(def) = current.take() {
                macros.push(def);
            }
            current = Some(parse_header(rest, line_num, &mut warnings)?);
        } else {
            let def = current.as_mut().ok_or_else(|| MacroError::Parse {
                line: line_num,
                message: "command line appears before any macro header".into(),
            })?;
            def.commands.push(parse_command(trimmed, line_num)?);
        }
    }
    if let Some(def) = current.take() {
        macros.push(def);
    }
    Ok((macros, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_macro_with_two_commands() {
        let text = "\
macro Baseline STARTUP
  repro NoStimulus duration=1.0;repeats=5
  message text=\"done\";timeout=2
";
        let (macros, warnings) = parse_macro_file(text).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(macros.len(), 1);
        let m = &macros[0];
        assert_eq!(m.name, "Baseline");
        assert!(m.action.contains(ActionFlag::STARTUP));
        assert_eq!(m.commands.len(), 2);
        match &m.commands[0].kind {
            CommandKind::Repro { name } => assert_eq!(name, "NoStimulus"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_flag_is_a_warning_not_an_error() {
        let text = "macro M GARBAGE\n  startsession\n";
        let (macros, warnings) = parse_macro_file(text).unwrap();
        assert_eq!(macros.len(), 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn multiple_macros_are_split_on_headers() {
        let text = "\
macro A\n  startsession\nmacro B\n  savedata\n";
        let (macros, _) = parse_macro_file(text).unwrap();
        assert_eq!(macros.len(), 2);
        assert_eq!(macros[1].name, "B");
    }

    #[test]
    fn command_before_any_header_is_rejected() {
        let text = "  startsession\n";
        assert!(parse_macro_file(text).is_err());
    }
}
