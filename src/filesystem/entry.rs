use std::cell::Cell;
use std::fmt;

use derive_more::From;
use hashlink::LinkedHashMap;
use tracing::trace;

use super::render::TreeRenderer;

/// Children of a directory, keyed by name in insertion order.
pub type Children = LinkedHashMap<String, Entry>;

/// A leaf with a fixed size, as reported by `ls`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    name: String,
    size: u64,
}

impl File {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// A directory with a lazily computed total size.
///
/// The total is memoized on first read and cleared by every accessor that can
/// mutate the children. Read-only views (`files`, `subdirectories`, `child`)
/// leave the memoized value alone.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    name: String,
    children: Children,
    cached_size: Cell<Option<u64>>,
}

impl Directory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Children::new(),
            cached_size: Cell::new(None),
        }
    }

    pub fn root() -> Self {
        Self::new("/")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total size of everything below this directory. Saturates at
    /// `u64::MAX`; trees built by the interpreter never get there.
    pub fn size(&self) -> u64 {
        self.checked_size().unwrap_or(u64::MAX)
    }

    /// Total size, or `None` if it does not fit in a `u64`. Only a total that
    /// fits is memoized.
    pub fn checked_size(&self) -> Option<u64> {
        if let Some(size) = self.cached_size.get() {
            return Some(size);
        }

        let size = self
            .children
            .values()
            .try_fold(0u64, |total, entry| total.checked_add(entry.checked_size()?))?;
        trace!("Computed size of directory '{}': {size}", self.name);
        self.cached_size.set(Some(size));
        Some(size)
    }

    pub fn invalidate_cache(&self) {
        self.cached_size.set(None);
    }

    pub fn is_cached(&self) -> bool {
        self.cached_size.get().is_some()
    }

    /// Borrows the children for mutation. Invalidates the cached size.
    pub fn children_mut(&mut self) -> &mut Children {
        self.invalidate_cache();
        &mut self.children
    }

    pub fn set_children(&mut self, children: Children) {
        self.invalidate_cache();
        self.children = children;
    }

    /// Removes every child, returning the previous mapping.
    pub fn clear_children(&mut self) -> Children {
        self.invalidate_cache();
        std::mem::take(&mut self.children)
    }

    pub fn child(&self, name: &str) -> Option<&Entry> {
        self.children.get(name)
    }

    pub fn subdirectory(&self, name: &str) -> Option<&Directory> {
        self.child(name).and_then(Entry::as_directory)
    }

    pub fn children(&self) -> impl Iterator<Item = &Entry> {
        self.children.values()
    }

    pub fn files(&self) -> impl Iterator<Item = &File> {
        self.children.values().filter_map(|entry| match entry {
            Entry::File(file) => Some(file),
            Entry::Directory(_) => None,
        })
    }

    pub fn subdirectories(&self) -> impl Iterator<Item = &Directory> {
        self.children.values().filter_map(Entry::as_directory)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        TreeRenderer::plain().write_file(f, self, 0)
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        TreeRenderer::plain().write_directory(f, self, 0)
    }
}

/// Anything that can live inside a directory.
#[derive(Debug, Clone, From)]
pub enum Entry {
    File(File),
    Directory(Directory),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::File(file) => file.name(),
            Entry::Directory(directory) => directory.name(),
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Entry::File(file) => file.size(),
            Entry::Directory(directory) => directory.size(),
        }
    }

    pub fn checked_size(&self) -> Option<u64> {
        match self {
            Entry::File(file) => Some(file.size()),
            Entry::Directory(directory) => directory.checked_size(),
        }
    }

    /// No-op for files.
    pub fn invalidate_cache(&self) {
        if let Entry::Directory(directory) = self {
            directory.invalidate_cache();
        }
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Entry::Directory(directory) => Some(directory),
            Entry::File(_) => None,
        }
    }

    pub fn as_directory_mut(&mut self) -> Option<&mut Directory> {
        match self {
            Entry::Directory(directory) => Some(directory),
            Entry::File(_) => None,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::File(file) => file.fmt(f),
            Entry::Directory(directory) => directory.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_directory() -> Directory {
        let mut inner = Directory::new("e");
        inner
            .children_mut()
            .insert("i".into(), File::new("i", 584).into());

        let mut outer = Directory::new("a");
        let children = outer.children_mut();
        children.insert("e".into(), inner.into());
        children.insert("f".into(), File::new("f", 29116).into());
        children.insert("g".into(), File::new("g", 2557).into());
        outer
    }

    #[test]
    fn file_size_is_its_stored_value() {
        let file = File::new("b.txt", 14848514);
        assert_eq!(file.size(), 14848514);
        assert_eq!(Entry::from(file).size(), 14848514);
    }

    #[test]
    fn empty_directory_has_zero_size() {
        let directory = Directory::new("empty");
        assert_eq!(directory.size(), 0);
        assert!(directory.is_empty());
    }

    #[test]
    fn directory_size_sums_nested_children() {
        let directory = sample_directory();
        assert_eq!(directory.size(), 584 + 29116 + 2557);
    }

    #[test]
    fn size_is_memoized_after_first_read() {
        let directory = sample_directory();
        assert!(!directory.is_cached());

        directory.size();

        assert!(directory.is_cached());
        assert!(directory.subdirectory("e").unwrap().is_cached());
    }

    #[test]
    fn children_mut_invalidates_cache() {
        let mut directory = sample_directory();
        assert_eq!(directory.size(), 32257);

        directory
            .children_mut()
            .insert("h.lst".into(), File::new("h.lst", 62596).into());

        assert!(!directory.is_cached());
        assert_eq!(directory.size(), 32257 + 62596);
    }

    #[test]
    fn set_children_invalidates_cache() {
        let mut directory = sample_directory();
        directory.size();

        let mut replacement = Children::new();
        replacement.insert("only".into(), File::new("only", 7).into());
        directory.set_children(replacement);

        assert!(!directory.is_cached());
        assert_eq!(directory.size(), 7);
    }

    #[test]
    fn clear_children_invalidates_cache_and_returns_previous() {
        let mut directory = sample_directory();
        directory.size();

        let previous = directory.clear_children();

        assert_eq!(previous.len(), 3);
        assert!(!directory.is_cached());
        assert_eq!(directory.size(), 0);
    }

    #[test]
    fn read_only_views_keep_cache() {
        let directory = sample_directory();
        directory.size();

        assert_eq!(directory.files().count(), 2);
        assert_eq!(directory.subdirectories().count(), 1);
        assert!(directory.child("f").is_some());
        assert!(directory.subdirectory("f").is_none());

        assert!(directory.is_cached());
    }

    #[test]
    fn recomputation_after_invalidation_is_stable() {
        let directory = sample_directory();
        let before = directory.size();

        directory.invalidate_cache();
        Entry::from(File::new("x", 1)).invalidate_cache();

        assert_eq!(directory.size(), before);
    }

    #[test]
    fn overflowing_total_is_not_cached() {
        let mut directory = Directory::new("big");
        let children = directory.children_mut();
        children.insert("a".into(), File::new("a", u64::MAX).into());
        children.insert("b".into(), File::new("b", 1).into());

        assert_eq!(directory.checked_size(), None);
        assert!(!directory.is_cached());
        assert_eq!(directory.size(), u64::MAX);
    }

    #[test]
    fn total_at_the_limit_fits() {
        let mut directory = Directory::new("full");
        let children = directory.children_mut();
        children.insert("a".into(), File::new("a", u64::MAX - 1).into());
        children.insert("b".into(), File::new("b", 1).into());

        assert_eq!(directory.checked_size(), Some(u64::MAX));
        assert!(directory.is_cached());
    }

    #[test]
    fn renders_indented_tree() {
        let directory = sample_directory();
        let rendered = directory.to_string();
        let expected = [
            "📁 a (dir, size=32257)",
            "  📁 e (dir, size=584)",
            "    📄 i (file, size=584)",
            "  📄 f (file, size=29116)",
            "  📄 g (file, size=2557)",
        ]
        .join("\n");
        assert_eq!(rendered, expected);
    }
}
