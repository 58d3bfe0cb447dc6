//! Interactive operator shell.

use crate::discovery;
use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use hshare_core::config::DiscoveryConfig;
use hshare_core::{OperatorAddress, natural_sort};
use hshare_server::AppState;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::runtime::Handle;

const PROMPT: &str = ">";

/// One parsed shell line.
#[derive(Parser, Debug, PartialEq)]
#[command(multicall = true, disable_help_subcommand = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

/// Operator commands.
#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// add files matching pattern to share
    #[command(alias = "+")]
    Add {
        #[arg(allow_hyphen_values = true)]
        pattern: String,
    },
    /// remove files matching pattern from share
    #[command(aliases = ["-", "d"])]
    Del {
        #[arg(allow_hyphen_values = true)]
        pattern: String,
    },
    /// display direct links to shared files
    #[command(aliases = ["l", "lst"])]
    List,
    /// list directory contents
    #[command(alias = "ls")]
    Dir,
    /// change directory
    Cd {
        #[arg(allow_hyphen_values = true)]
        pattern: String,
    },
    /// print the current working directory
    Pwd,
    /// print log of recent requests
    #[command(alias = "log")]
    Tail,
    /// identify the server's external ip address
    Stun,
    /// manually set the server's address; a trailing '/' disables the port number
    #[command(alias = "set")]
    Setaddress { address: String },
    /// display list of commands
    Help,
    /// stop sharing and quit
    #[command(alias = "q")]
    Exit,
}

impl Command {
    /// Parse a tokenized line. `Ok(None)` for a blank line.
    pub fn parse(tokens: &[String]) -> Result<Option<Self>, clap::Error> {
        if tokens.is_empty() {
            return Ok(None);
        }
        ShellLine::try_parse_from(tokens).map(|line| Some(line.command))
    }
}

/// Whether the shell keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Split a line into words, honoring single quotes, double quotes and
/// backslash escapes.
pub fn split_line(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => bail!("no closing quotation"),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => bail!("no closing quotation"),
                        },
                        Some(c) => current.push(c),
                        None => bail!("no closing quotation"),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => bail!("no escaped character"),
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Shell state: the shared server state plus the operator-facing address.
pub struct Shell {
    state: AppState,
    address: OperatorAddress,
    discovery: DiscoveryConfig,
    runtime: Handle,
}

impl Shell {
    pub fn new(
        state: AppState,
        address: OperatorAddress,
        discovery: DiscoveryConfig,
        runtime: Handle,
    ) -> Self {
        Self {
            state,
            address,
            discovery,
            runtime,
        }
    }

    /// Link to the share root, as printed at startup.
    pub fn share_root(&self) -> String {
        self.address.share_root(&self.state.secret)
    }

    /// Tokenize, parse and run one line. Errors are printed, never returned.
    pub fn run_line(&mut self, line: &str, out: &mut impl Write) -> Flow {
        let tokens = match split_line(line) {
            Ok(tokens) => tokens,
            Err(e) => {
                let _ = writeln!(out, "{e}");
                return Flow::Continue;
            }
        };
        self.run_tokens(&tokens, out)
    }

    /// Parse and run an already split command.
    pub fn run_tokens(&mut self, tokens: &[String], out: &mut impl Write) -> Flow {
        let command = match Command::parse(tokens) {
            Ok(Some(command)) => command,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                let _ = write!(out, "{}", e.render());
                return Flow::Continue;
            }
        };

        tracing::debug!(command = ?command, "Executing shell command");
        match self.execute(command, out) {
            Ok(flow) => flow,
            Err(e) => {
                let _ = writeln!(out, "{e:#}");
                Flow::Continue
            }
        }
    }

    /// Run a parsed command, writing its output to `out`.
    pub fn execute(&mut self, command: Command, out: &mut impl Write) -> Result<Flow> {
        match command {
            Command::Add { pattern } => {
                let added = self.state.registry.add_glob(&pattern)?;
                let mut shown: Vec<String> =
                    added.iter().map(|p| p.display().to_string()).collect();
                natural_sort(&mut shown);
                writeln!(out, "added {} files:", shown.len())?;
                for path in shown {
                    writeln!(out, "{path}")?;
                }
            }
            Command::Del { pattern } => {
                let mut removed = self.state.registry.remove_glob(&pattern)?;
                natural_sort(&mut removed);
                writeln!(out, "removed {} files:", removed.len())?;
                for name in removed {
                    writeln!(out, "{name}")?;
                }
            }
            Command::List => {
                let mut names: Vec<String> =
                    self.state.registry.list_names().into_iter().collect();
                natural_sort(&mut names);
                writeln!(out, "{} files are being shared", names.len())?;
                for name in names {
                    writeln!(out, "{}", self.address.link(&self.state.secret, &name))?;
                }
            }
            Command::Dir => {
                let (dirs, files) = list_dir(Path::new("."))?;
                for name in dirs.iter().chain(&files) {
                    writeln!(out, "{name}")?;
                }
            }
            Command::Cd { pattern } => {
                if let Err(e) = change_dir(&pattern) {
                    writeln!(out, "{e}")?;
                }
                writeln!(out, "{}", current_dir()?.display())?;
            }
            Command::Pwd => {
                writeln!(out, "{}", current_dir()?.display())?;
            }
            Command::Tail => {
                for line in self.state.log.lines() {
                    writeln!(out, "{line}")?;
                }
            }
            Command::Stun => {
                let ip = self.runtime.block_on(discovery::discover(
                    &self.discovery.stun_server,
                    self.discovery.timeout(),
                ));
                self.address.set_discovered(ip);
                writeln!(out, "server available here: {}", self.share_root())?;
            }
            Command::Setaddress { address } => {
                self.address.set(address);
                writeln!(out, "server available here: {}", self.share_root())?;
            }
            Command::Help => write_help(out)?,
            Command::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    /// Read commands from the terminal until `exit`, EOF or Ctrl-C.
    pub fn run_interactive(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
        let mut stdout = std::io::stdout();

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    let flow = self.run_line(&line, &mut stdout);
                    stdout.flush()?;
                    if flow == Flow::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
                Err(e) => return Err(e).context("failed to read command"),
            }
        }
        Ok(())
    }
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("failed to read current directory")
}

/// Directories (suffixed with the path separator) and regular files in
/// `dir`, each group naturally sorted.
fn list_dir(dir: &Path) -> Result<(Vec<String>, Vec<String>)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).context("failed to read directory")? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // Follows symlinks like the listing a user would expect.
        let Ok(metadata) = std::fs::metadata(entry.path()) else {
            continue;
        };
        if metadata.is_dir() {
            dirs.push(format!("{name}{}", std::path::MAIN_SEPARATOR));
        } else if metadata.is_file() {
            files.push(name);
        }
    }
    natural_sort(&mut dirs);
    natural_sort(&mut files);
    Ok((dirs, files))
}

/// Change into the single path matching `pattern`.
fn change_dir(pattern: &str) -> Result<()> {
    let mut matches = glob::glob(pattern)
        .context("invalid pattern")?
        .filter_map(|entry| entry.ok());
    let target = match (matches.next(), matches.next()) {
        (None, _) => bail!("no directory matched"),
        (Some(_), Some(_)) => bail!("more than one directory matched"),
        (Some(target), None) => target,
    };
    std::env::set_current_dir(&target)
        .with_context(|| format!("cannot change directory to {}", target.display()))
}

fn write_help(out: &mut impl Write) -> Result<()> {
    writeln!(out, "available commands are:")?;
    writeln!(out)?;
    let root = ShellLine::command();
    for sub in root.get_subcommands() {
        let mut names = vec![sub.get_name().to_string()];
        let mut aliases: Vec<&str> = sub.get_all_aliases().collect();
        aliases.sort_unstable();
        names.extend(aliases.into_iter().map(str::to_string));
        writeln!(out, "{}:", names.join(", "))?;

        let argc = sub.get_arguments().filter(|a| a.is_positional()).count();
        if argc > 0 {
            writeln!(out, "\targuments: {argc}")?;
        }
        if let Some(about) = sub.get_about() {
            writeln!(out, "\t{about}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
