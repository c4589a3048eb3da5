//! Hook execution forms
//!
//! Every hook identifier is resolved once, when the orchestrator is built, into
//! either a direct executable or a script run through an interpreter picked by
//! file extension.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// How a hook program is launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCommand {
    /// Executed directly
    NativeExecutable {
        /// Program path
        path: PathBuf,
    },
    /// Passed as the first argument to an interpreter
    InterpretedScript {
        /// Interpreter program, looked up on `PATH`
        interpreter: &'static str,
        /// Script path
        script: PathBuf,
    },
}

impl HookCommand {
    /// Resolve `hook_name` inside `hooks_dir`
    pub fn resolve(hooks_dir: &Path, hook_name: &str) -> Self {
        Self::from_path(hooks_dir.join(hook_name))
    }

    /// Resolve a program at an explicit path
    pub fn from_path(path: PathBuf) -> Self {
        match infer_interpreter(&path) {
            Some(interpreter) => Self::InterpretedScript {
                interpreter,
                script: path,
            },
            None => Self::NativeExecutable { path },
        }
    }

    /// Path of the hook file itself
    pub fn path(&self) -> &Path {
        match self {
            Self::NativeExecutable { path } => path,
            Self::InterpretedScript { script, .. } => script,
        }
    }

    /// Whether the hook file exists
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Program and arguments for the subprocess
    pub fn program(&self) -> (OsString, Vec<OsString>) {
        match self {
            Self::NativeExecutable { path } => (path.clone().into_os_string(), Vec::new()),
            Self::InterpretedScript {
                interpreter,
                script,
            } => (
                OsString::from(*interpreter),
                vec![script.clone().into_os_string()],
            ),
        }
    }

    /// Subprocess expression, without environment or I/O configuration
    pub fn expression(&self) -> duct::Expression {
        self.expression_with(Vec::<OsString>::new())
    }

    /// Subprocess expression with `extra` arguments after the program's own
    pub fn expression_with<I>(&self, extra: I) -> duct::Expression
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        let (program, mut args) = self.program();
        args.extend(extra.into_iter().map(Into::into));
        duct::cmd(program, args)
    }
}

/// Infer an interpreter from the hook's extension
///
/// Unknown or missing extensions mean the file is executed directly.
fn infer_interpreter(path: &Path) -> Option<&'static str> {
    let extension = path.extension().and_then(|e| e.to_str())?;
    match extension {
        "sh" | "bash" => Some("bash"),
        "zsh" => Some("zsh"),
        "py" => Some("python3"),
        "rb" => Some("ruby"),
        "pl" => Some("perl"),
        "js" => Some("node"),
        _ => None,
    }
}

/// Resolved execution forms keyed by hook identifier
#[derive(Debug, Clone, Default)]
pub struct HookCatalog {
    commands: HashMap<String, HookCommand>,
}

impl HookCatalog {
    /// Resolve every identifier in `hooks`
    pub fn resolve<'a>(hooks_dir: &Path, hooks: impl IntoIterator<Item = &'a String>) -> Self {
        let mut commands = HashMap::new();
        for name in hooks {
            commands
                .entry(name.clone())
                .or_insert_with(|| HookCommand::resolve(hooks_dir, name));
        }
        Self { commands }
    }

    /// Look up a resolved hook
    pub fn get(&self, hook_name: &str) -> Option<&HookCommand> {
        self.commands.get(hook_name)
    }

    /// Number of distinct hooks
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
