use crate::ast::{ActionFlag, CommandKind, MacroDef, ParamList};
use crate::error::{MacroError, MacroResult};

/// One command handed back to the host for execution. The engine drives
/// its own command stack (macro-calls-macro is resolved internally); only
/// commands with an effect outside the macro system are surfaced here,
/// mirroring `MacroCommand::execute` in `macros.h` dispatching by
/// `CommandType`.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutedCommand {
    RunRepro { name: String, params: ParamList },
    Shell { command: String },
    Message { text: String, timeout: Option<f64> },
    Browse { path: String },
    Switch { file: String },
    StartSession,
    SaveData,
    Filter { name: String, action: String },
    Detector { name: String, action: String },
}

/// Replaces `$ident` tokens in `text` with macro variable values, per
/// `Macro::expandParameter`. Unresolved identifiers are left untouched.
fn substitute(text: &str, variables: &ParamList) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    let bytes = text.as_bytes();
    while let Some((i, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }
        if end == start {
            out.push('$');
            continue;
        }
        let ident = &text[start..end];
        match variables.iter().find(|(k, _)| k == ident) {
            Some((_, v)) => out.push_str(v),
            None => {
                out.push('$');
                out.push_str(ident);
            }
        }
        for _ in start..end {
            chars.next();
        }
    }
    out
}

fn substitute_params(params: &ParamList, variables: &ParamList) -> ParamList {
    params.iter().map(|(k, v)| (k.clone(), substitute(v, variables))).collect()
}

/// Overlays `overrides` onto a clone of `base`, caller values winning,
/// per `Macro::expandParameter`'s invocation-time parameter binding
/// (spec.md §4.7).
fn merge_variables(base: &ParamList, overrides: &ParamList) -> ParamList {
    let mut merged = base.clone();
    for (key, value) in overrides {
        match merged.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value.clone(),
            None => merged.push((key.clone(), value.clone())),
        }
    }
    merged
}

/// Position in the command stack: which macro, which command within it
/// to run next, and the variable set in effect for this invocation (the
/// callee's own declared defaults overlaid with whatever the calling
/// `macro` command passed at invocation time).
#[derive(Debug, Clone)]
struct StackFrame {
    macro_index: usize,
    command_index: usize,
    variables: ParamList,
}

/// Interprets a set of loaded macro definitions, walking their command
/// lists (handling nested macro calls via an explicit stack) and yielding
/// [`ExecutedCommand`]s for the host to act on (spec.md §4.7;
/// `Macros`/`Macro`/`MacroCommand` in `macros.h`).
pub struct MacroEngine {
    macros: Vec<MacroDef>,
    current: Option<StackFrame>,
    stack: Vec<StackFrame>,
    resume_pos: Option<StackFrame>,
    resume_stack: Vec<StackFrame>,
}

impl MacroEngine {
    pub fn load(macros: Vec<MacroDef>) -> MacroResult<Self> {
        if macros.is_empty() {
            return Err(MacroError::EmptyMacro("<none>".into()));
        }
        Ok(Self { macros, current: None, stack: Vec::new(), resume_pos: None, resume_stack: Vec::new() })
    }

    /// True only when there is nothing loaded at all — matches the
    /// doc comment pattern "(only in case there is one)" for every
    /// distinguished macro slot: their absence is routine, not fatal.
    pub fn is_fatal(&self) -> bool {
        self.macros.is_empty()
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.macros.iter().position(|m| m.name == name)
    }

    pub fn macro_def(&self, index: usize) -> Option<&MacroDef> {
        self.macros.get(index)
    }

    fn index_with_flag(&self, flag: ActionFlag) -> Option<usize> {
        self.macros.iter().position(|m| m.action.contains(flag))
    }

    /// Begins execution at `macro_index`, command `command_index`,
    /// discarding any in-progress stack (`Macros::startMacro`).
    pub fn start_macro(&mut self, macro_index: usize, command_index: usize) -> MacroResult<()> {
        if macro_index >= self.macros.len() {
            return Err(MacroError::UnknownMacro(format!("#{macro_index}")));
        }
        self.stack.clear();
        let variables = self.macros[macro_index].variables.clone();
        self.current = Some(StackFrame { macro_index, command_index, variables });
        Ok(())
    }

    pub fn start_up(&mut self) -> bool {
        self.index_with_flag(ActionFlag::STARTUP).map(|i| self.start_macro(i, 0).is_ok()).unwrap_or(false)
    }

    pub fn shut_down(&mut self) -> bool {
        self.index_with_flag(ActionFlag::SHUTDOWN).map(|i| self.start_macro(i, 0).is_ok()).unwrap_or(false)
    }

    pub fn fall_back(&mut self) -> bool {
        self.index_with_flag(ActionFlag::FALLBACK).map(|i| self.start_macro(i, 0).is_ok()).unwrap_or(false)
    }

    pub fn start_session(&mut self) -> bool {
        self.index_with_flag(ActionFlag::STARTSESSION).map(|i| self.start_macro(i, 0).is_ok()).unwrap_or(false)
    }

    pub fn stop_session(&mut self) -> bool {
        self.index_with_flag(ActionFlag::STOPSESSION).map(|i| self.start_macro(i, 0).is_ok()).unwrap_or(false)
    }

    /// Memorizes the currently running macro/command so [`Self::resume`]
    /// or [`Self::resume_next`] can return to it (`Macros::store`).
    pub fn store(&mut self) {
        self.resume_pos = self.current.clone();
        self.resume_stack = self.stack.clone();
    }

    /// Memorizes the current position and switches to the fallback macro
    /// immediately (`Macros::hardBreak`). The caller is responsible for
    /// telling the running RePro's [`crate::error::MacroError`]-adjacent
    /// cancellation handle (outside this crate) to stop.
    pub fn hard_break(&mut self) -> bool {
        self.store();
        self.fall_back()
    }

    /// Same bookkeeping as [`Self::hard_break`]; named separately because
    /// the host is expected to request a cooperative stop rather than an
    /// immediate interrupt (`Macros::softBreak`).
    pub fn soft_break(&mut self) -> bool {
        self.store();
        self.fall_back()
    }

    /// Resumes at the memorized repro itself, re-running it
    /// (`Macros::resume`). [`Self::store`] is called right after that
    /// repro's command was yielded, so its index already points one past
    /// it — this steps back by one.
    pub fn resume(&mut self) -> bool {
        match &self.resume_pos {
            Some(frame) => {
                self.current = Some(StackFrame {
                    macro_index: frame.macro_index,
                    command_index: frame.command_index.saturating_sub(1),
                    variables: frame.variables.clone(),
                });
                self.stack = self.resume_stack.clone();
                true
            }
            None => false,
        }
    }

    /// Resumes at the command following the memorized repro
    /// (`Macros::resumeNext`).
    pub fn resume_next(&mut self) -> bool {
        match &self.resume_pos {
            Some(frame) => {
                self.current = Some(frame.clone());
                self.stack = self.resume_stack.clone();
                true
            }
            None => false,
        }
    }

    /// Runs forward from the current position until a command with an
    /// outward effect is reached (`Some`), or the stack is exhausted
    /// (`None`), resolving nested `macro` calls and `$variable`
    /// substitution along the way (`Macros::startNextRePro`).
    pub fn advance(&mut self) -> MacroResult<Option<ExecutedCommand>> {
        loop {
            let Some(frame) = self.current.take() else { return Ok(None) };
            let def = &self.macros[frame.macro_index];

            if frame.command_index >= def.commands.len() {
                match self.stack.pop() {
                    Some(parent) => {
                        self.current = Some(parent);
                        continue;
                    }
                    None => {
                        self.current = None;
                        return Ok(None);
                    }
                }
            }

            let command = &def.commands[frame.command_index];
            if !command.enabled {
                self.current = Some(StackFrame { command_index: frame.command_index + 1, ..frame });
                continue;
            }

            match &command.kind {
                CommandKind::Macro { name } => {
                    let target = self.index(name).ok_or_else(|| MacroError::UnknownMacro(name.clone()))?;
                    let merged = merge_variables(&self.macros[target].variables, &command.params);
                    self.stack.push(StackFrame {
                        macro_index: frame.macro_index,
                        command_index: frame.command_index + 1,
                        variables: frame.variables.clone(),
                    });
                    self.current = Some(StackFrame { macro_index: target, command_index: 0, variables: merged });
                }
                other => {
                    let variables = &frame.variables;
                    let executed = match other {
                        CommandKind::Repro { name } => ExecutedCommand::RunRepro {
                            name: name.clone(),
                            params: substitute_params(&command.params, variables),
                        },
                        CommandKind::Shell { command: cmd } => {
                            ExecutedCommand::Shell { command: substitute(cmd, variables) }
                        }
                        CommandKind::Message { text, timeout } => {
                            ExecutedCommand::Message { text: substitute(text, variables), timeout: *timeout }
                        }
                        CommandKind::Browse { path } => ExecutedCommand::Browse { path: substitute(path, variables) },
                        CommandKind::Switch { file } => ExecutedCommand::Switch { file: substitute(file, variables) },
                        CommandKind::StartSession => ExecutedCommand::StartSession,
                        CommandKind::SaveData => ExecutedCommand::SaveData,
                        CommandKind::Filter { name, action } => {
                            ExecutedCommand::Filter { name: name.clone(), action: action.clone() }
                        }
                        CommandKind::Detector { name, action } => {
                            ExecutedCommand::Detector { name: name.clone(), action: action.clone() }
                        }
                        CommandKind::Macro { .. } => unreachable!("handled above"),
                    };
                    self.current = Some(StackFrame { command_index: frame.command_index + 1, ..frame });
                    return Ok(Some(executed));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_macro_file;

    fn load(text: &str) -> MacroEngine {
        let (macros, _) = parse_macro_file(text).unwrap();
        MacroEngine::load(macros).unwrap()
    }

    #[test]
    fn advance_yields_commands_in_order() {
        let mut engine = load(
            "macro M\n  repro A duration=1\n  message text=hi\n",
        );
        let idx = engine.index("M").unwrap();
        engine.start_macro(idx, 0).unwrap();
        let first = engine.advance().unwrap().unwrap();
        assert!(matches!(first, ExecutedCommand::RunRepro { name, .. } if name == "A"));
        let second = engine.advance().unwrap().unwrap();
        assert!(matches!(second, ExecutedCommand::Message { .. }));
        assert_eq!(engine.advance().unwrap(), None);
    }

    #[test]
    fn nested_macro_call_resumes_the_caller() {
        let mut engine = load(
            "macro Outer\n  macro Inner\n  repro AfterInner\nmacro Inner\n  repro FromInner\n",
        );
        let idx = engine.index("Outer").unwrap();
        engine.start_macro(idx, 0).unwrap();
        let first = engine.advance().unwrap().unwrap();
        assert!(matches!(first, ExecutedCommand::RunRepro { name, .. } if name == "FromInner"));
        let second = engine.advance().unwrap().unwrap();
        assert!(matches!(second, ExecutedCommand::RunRepro { name, .. } if name == "AfterInner"));
    }

    #[test]
    fn variable_substitution_fills_in_repro_params() {
        let mut engine = load("macro M duration=2.5\n  repro A dur=$duration\n");
        let idx = engine.index("M").unwrap();
        engine.start_macro(idx, 0).unwrap();
        let executed = engine.advance().unwrap().unwrap();
        match executed {
            ExecutedCommand::RunRepro { params, .. } => {
                assert_eq!(params.iter().find(|(k, _)| k == "dur").unwrap().1, "2.5");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn macro_invocation_overrides_the_callees_declared_variable() {
        let mut engine = load(
            "macro Outer\n  macro Sweep duration=0.5s\nmacro Sweep duration=0.2s;repeats=3\n  repro Sweeper dur=$duration;reps=$repeats\n",
        );
        let idx = engine.index("Outer").unwrap();
        engine.start_macro(idx, 0).unwrap();
        let executed = engine.advance().unwrap().unwrap();
        match executed {
            ExecutedCommand::RunRepro { params, .. } => {
                assert_eq!(params.iter().find(|(k, _)| k == "dur").unwrap().1, "0.5s");
                assert_eq!(params.iter().find(|(k, _)| k == "reps").unwrap().1, "3");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resume_returns_to_the_stored_position() {
        let mut engine = load("macro M\n  repro A\n  repro B\n  repro C\nmacro Fallback FALLBACK\n  savedata\n");
        let idx = engine.index("M").unwrap();
        engine.start_macro(idx, 0).unwrap();
        engine.advance().unwrap(); // A
        engine.store();
        engine.hard_break();
        let fallback_cmd = engine.advance().unwrap().unwrap();
        assert_eq!(fallback_cmd, ExecutedCommand::SaveData);

        assert!(engine.resume());
        let resumed = engine.advance().unwrap().unwrap();
        assert!(matches!(resumed, ExecutedCommand::RunRepro { name, .. } if name == "A"));

        assert!(engine.resume_next());
        let after = engine.advance().unwrap().unwrap();
        assert!(matches!(after, ExecutedCommand::RunRepro { name, .. } if name == "B"));
    }

    #[test]
    fn startup_flag_selects_the_right_macro() {
        let mut engine = load("macro A\n  savedata\nmacro B STARTUP\n  startsession\n");
        assert!(engine.start_up());
        let executed = engine.advance().unwrap().unwrap();
        assert_eq!(executed, ExecutedCommand::StartSession);
    }
}
