use std::iter::Peekable;
use std::num::ParseIntError;

use snafu::prelude::*;
use tracing::{debug, info, warn};

use super::entry::{Directory, Entry, File};
use super::traversal::FileSystem;

const COMMAND_PROMPT: char = '$';

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Register `dir <name>` lines from `ls` output as empty directories.
    /// By default only `cd` creates directories.
    pub include_listed_directories: bool,
}

/// Names leading from the root to the current directory. The root is implicit
/// and can never be popped.
#[derive(Debug, Clone, Default)]
struct NavigationStack {
    path: Vec<String>,
}

impl NavigationStack {
    fn reset(&mut self) {
        self.path.clear();
    }

    fn push(&mut self, name: &str) {
        self.path.push(name.to_string());
    }

    /// Returns false if only the root is left.
    fn pop(&mut self) -> bool {
        self.path.pop().is_some()
    }

    fn display(&self) -> String {
        format!("/{}", self.path.join("/"))
    }

    /// Walks from `root` to the current directory through the mutating
    /// accessor, so every directory on the way drops its cached size.
    fn resolve_mut<'a>(&self, root: &'a mut Directory) -> Option<&'a mut Directory> {
        self.path.iter().try_fold(root, |current, name| {
            current
                .children_mut()
                .get_mut(name.as_str())
                .and_then(Entry::as_directory_mut)
        })
    }
}

/// Replays a `cd`/`ls` transcript into a directory tree.
#[derive(Debug)]
pub struct Interpreter {
    root: Directory,
    stack: NavigationStack,
    options: ScanOptions,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(ScanOptions::default())
    }
}

impl Interpreter {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            root: Directory::root(),
            stack: NavigationStack::default(),
            options,
        }
    }

    pub fn scan_str(self, transcript: &str) -> Result<FileSystem, ScanError> {
        self.scan(transcript.lines())
    }

    /// Consumes the whole transcript. Any malformed line aborts the scan.
    pub fn scan<'a>(
        mut self,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Result<FileSystem, ScanError> {
        let mut lines = lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| (index + 1, line))
            .peekable();

        while let Some((line_number, line)) = lines.next() {
            self.execute(line_number, line, &mut lines)?;
        }

        let file_system = FileSystem::new(self.root);
        info!(
            "Scanned {} directories holding {} files",
            file_system.directory_count(),
            file_system.file_count()
        );
        Ok(file_system)
    }

    fn execute<'a, I>(
        &mut self,
        line_number: usize,
        line: &'a str,
        rest: &mut Peekable<I>,
    ) -> Result<(), ScanError>
    where
        I: Iterator<Item = (usize, &'a str)>,
    {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        match tokens.as_slice() {
            ["$", "cd", "/"] => {
                debug!("Returning to the root directory");
                self.stack.reset();
            }
            ["$", "cd", ".."] => {
                ensure!(self.stack.pop(), StructuralSnafu { line_number, line });
                debug!("Moved up to {}", self.stack.display());
            }
            ["$", "cd", name] => self.enter(name)?,
            ["$", "cd", ..] => MalformedCommandSnafu { line_number, line }.fail()?,
            ["$", "ls"] => {
                let entries = read_listing(rest, self.options)?;
                self.register(entries)?;
                ensure!(
                    self.root.checked_size().is_some(),
                    SizeOverflowSnafu {
                        line_number,
                        path: self.stack.display(),
                    }
                );
            }
            ["$", command, ..] => UnknownCommandSnafu {
                line_number,
                command: *command,
                line,
            }
            .fail()?,
            _ => UnexpectedInputSnafu { line_number, line }.fail()?,
        }
        Ok(())
    }

    fn current_directory(&mut self) -> Result<&mut Directory, ScanError> {
        let Self { root, stack, .. } = self;
        stack
            .resolve_mut(root)
            .with_context(|| MissingDirectorySnafu {
                path: stack.display(),
            })
    }

    fn enter(&mut self, name: &str) -> Result<(), ScanError> {
        let current = self.current_directory()?;
        if current.subdirectory(name).is_none() {
            if current.child(name).is_some() {
                warn!("Replacing file '{name}' with a directory of the same name");
            }
            current
                .children_mut()
                .insert(name.to_string(), Directory::new(name).into());
            debug!("Created directory '{name}'");
        }

        self.stack.push(name);
        debug!("Entered {}", self.stack.display());
        Ok(())
    }

    fn register(&mut self, entries: Vec<Entry>) -> Result<(), ScanError> {
        let current = self.current_directory()?;
        debug!(
            "Registering {} listed entries in '{}'",
            entries.len(),
            current.name()
        );

        let children = current.children_mut();
        for entry in entries {
            let keeps_existing_directory = matches!(entry, Entry::Directory(_))
                && children
                    .get(entry.name())
                    .and_then(Entry::as_directory)
                    .is_some();
            if !keeps_existing_directory {
                children.insert(entry.name().to_string(), entry);
            }
        }
        Ok(())
    }
}

/// Consumes output lines up to (not including) the next command.
fn read_listing<'a, I>(
    lines: &mut Peekable<I>,
    options: ScanOptions,
) -> Result<Vec<Entry>, ParseError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut entries = Vec::new();
    while let Some((line_number, line)) =
        lines.next_if(|(_, line)| !line.trim_start().starts_with(COMMAND_PROMPT))
    {
        if let Some(entry) = parse_listing_line(line_number, line, options)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

fn parse_listing_line(
    line_number: usize,
    line: &str,
    options: ScanOptions,
) -> Result<Option<Entry>, ParseError> {
    let tokens = line.split_whitespace().collect::<Vec<_>>();
    match tokens.as_slice() {
        ["dir", name] => Ok(options
            .include_listed_directories
            .then(|| Directory::new(*name).into())),
        [size, name] if size.bytes().all(|byte| byte.is_ascii_digit()) => {
            let size = size
                .parse::<u64>()
                .context(SizeOutOfRangeSnafu { line_number, line })?;
            Ok(Some(File::new(*name, size).into()))
        }
        _ => MalformedListingSnafu { line_number, line }.fail(),
    }
}

#[derive(Debug, Snafu)]
pub enum ParseError {
    #[snafu(display("Line {line_number}: unknown command '{command}': {line}"))]
    UnknownCommand {
        line_number: usize,
        command: String,
        line: String,
    },
    #[snafu(display("Line {line_number}: expected 'cd <target>': {line}"))]
    MalformedCommand { line_number: usize, line: String },
    #[snafu(display("Line {line_number}: expected a command: {line}"))]
    UnexpectedInput { line_number: usize, line: String },
    #[snafu(display(
        "Line {line_number}: unexpected output to ls, expected 'dir <name>' or '<size> <name>': {line}"
    ))]
    MalformedListing { line_number: usize, line: String },
    #[snafu(display("Line {line_number}: file size out of range: {line}"))]
    SizeOutOfRange {
        line_number: usize,
        line: String,
        source: ParseIntError,
    },
}

#[derive(Debug, Snafu)]
pub enum ScanError {
    #[snafu(context(false), display("Malformed transcript"))]
    ParseError { source: ParseError },
    #[snafu(display("Line {line_number}: cannot move above the root directory: {line}"))]
    StructuralError { line_number: usize, line: String },
    #[snafu(display(
        "Line {line_number}: total size of {path} or one of its parents does not fit in 64 bits"
    ))]
    SizeOverflow { line_number: usize, path: String },
    #[snafu(display("Working directory {path} is no longer part of the tree"))]
    MissingDirectory { path: String },
}
