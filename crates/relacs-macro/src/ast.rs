bitflags::bitflags! {
    /// Uppercase tokens following a macro's name in the macro file
    /// (spec.md §6 "Macro file format"), matching the bitfield
    /// `Macro::Action` in `original_source/relacs/include/relacs/macros.h`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ActionFlag: u32 {
        const STARTUP      = 1 << 0;
        const SHUTDOWN     = 1 << 1;
        const FALLBACK     = 1 << 2;
        const STARTSESSION = 1 << 3;
        const STOPSESSION  = 1 << 4;
        const NOBUTTON     = 1 << 5;
        const NOKEY        = 1 << 6;
        const NOMENU       = 1 << 7;
        const KEEP         = 1 << 8;
        const OVERWRITE    = 1 << 9;
    }
}

/// `key=value` parameters attached to a macro header or a command,
/// preserved in declaration order.
pub type ParamList = Vec<(String, String)>;

/// What kind of action a single indented line under a macro header
/// performs (spec.md §6; `MacroCommand::CommandType` in `macros.h`).
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    Repro { name: String },
    Macro { name: String },
    Shell { command: String },
    Message { text: String, timeout: Option<f64> },
    Browse { path: String },
    Switch { file: String },
    StartSession,
    SaveData,
    Filter { name: String, action: String },
    Detector { name: String, action: String },
}

/// One indented line of a macro definition.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroCommand {
    pub kind: CommandKind,
    pub params: ParamList,
    pub enabled: bool,
}

impl MacroCommand {
    pub fn new(kind: CommandKind, params: ParamList) -> Self {
        Self { kind, params, enabled: true }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// A named sequence of [`MacroCommand`]s with its action flags and
/// variables (spec.md §6; `Macro` in `macros.h`).
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDef {
    pub name: String,
    pub action: ActionFlag,
    pub variables: ParamList,
    pub commands: Vec<MacroCommand>,
}

impl MacroDef {
    pub fn new(name: impl Into<String>, action: ActionFlag, variables: ParamList) -> Self {
        Self { name: name.into(), action, variables, commands: Vec::new() }
    }

    pub fn variable(&self, key: &str) -> Option<&str> {
        self.variables.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}
