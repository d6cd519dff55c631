use std::fmt::{self, Write};

use colored::Colorize;

use super::entry::{Directory, Entry, File};

const INDENT: &str = "  ";

/// Writes a directory tree one entry per line, children indented below their
/// parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeRenderer {
    colorize: bool,
}

impl TreeRenderer {
    pub fn plain() -> Self {
        Self { colorize: false }
    }

    pub fn colored() -> Self {
        Self { colorize: true }
    }

    pub fn render(&self, directory: &Directory) -> String {
        RenderedTree {
            renderer: *self,
            directory,
        }
        .to_string()
    }

    pub fn write_directory(
        &self,
        out: &mut impl Write,
        directory: &Directory,
        level: usize,
    ) -> fmt::Result {
        let name = if self.colorize {
            directory.name().blue().bold().to_string()
        } else {
            directory.name().to_string()
        };
        write!(
            out,
            "{}📁 {name} (dir, size={})",
            INDENT.repeat(level),
            directory.size()
        )?;

        for child in directory.children() {
            writeln!(out)?;
            match child {
                Entry::File(file) => self.write_file(out, file, level + 1)?,
                Entry::Directory(subdirectory) => {
                    self.write_directory(out, subdirectory, level + 1)?
                }
            }
        }
        Ok(())
    }

    pub fn write_file(&self, out: &mut impl Write, file: &File, level: usize) -> fmt::Result {
        let size = if self.colorize {
            file.size().to_string().dimmed().to_string()
        } else {
            file.size().to_string()
        };
        write!(
            out,
            "{}📄 {} (file, size={size})",
            INDENT.repeat(level),
            file.name()
        )
    }
}

struct RenderedTree<'a> {
    renderer: TreeRenderer,
    directory: &'a Directory,
}

impl fmt::Display for RenderedTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.renderer.write_directory(f, self.directory, 0)
    }
}
