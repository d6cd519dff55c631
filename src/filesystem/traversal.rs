use super::entry::Directory;

/// Pre-order walk over every directory below (and including) a starting
/// directory. Siblings are visited in insertion order.
#[derive(Debug, Clone)]
pub struct AllDirectories<'a> {
    pending: Vec<&'a Directory>,
}

impl<'a> AllDirectories<'a> {
    pub fn new(start: &'a Directory) -> Self {
        Self {
            pending: vec![start],
        }
    }
}

impl<'a> Iterator for AllDirectories<'a> {
    type Item = &'a Directory;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.pending.pop()?;

        // Reversed so the first child is popped next
        let first_child = self.pending.len();
        self.pending.extend(current.subdirectories());
        self.pending[first_child..].reverse();

        Some(current)
    }
}

/// A fully reconstructed tree, ready to be queried.
#[derive(Debug, Clone)]
pub struct FileSystem {
    root: Directory,
}

impl FileSystem {
    pub fn new(root: Directory) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Directory {
        &self.root
    }

    pub fn used_space(&self) -> u64 {
        self.root.size()
    }

    pub fn all_directories(&self) -> AllDirectories<'_> {
        AllDirectories::new(&self.root)
    }

    pub fn directory_count(&self) -> usize {
        self.all_directories().count()
    }

    pub fn file_count(&self) -> usize {
        self.all_directories()
            .map(|directory| directory.files().count())
            .sum()
    }

    /// Sum of the sizes of every directory no larger than `limit`. Nested
    /// directories are counted once on their own and again inside each
    /// qualifying ancestor, so the sum is widened past `u64`.
    pub fn total_size_at_most(&self, limit: u64) -> u128 {
        self.all_directories()
            .map(Directory::size)
            .filter(|size| *size <= limit)
            .map(u128::from)
            .sum()
    }

    /// The smallest directory at least `threshold` in size. Ties go to the
    /// directory visited first.
    pub fn smallest_at_least(&self, threshold: u64) -> Option<&Directory> {
        self.all_directories()
            .filter(|directory| directory.size() >= threshold)
            .min_by_key(|directory| directory.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::Interpreter;
    use crate::filesystem::entry::File;
    use rstest::*;

    const SAMPLE: &str = "\
$ cd /
$ ls
dir a
14848514 b.txt
8504156 c.dat
dir d
$ cd a
$ ls
dir e
29116 f
2557 g
62596 h.lst
$ cd e
$ ls
584 i
$ cd ..
$ cd ..
$ cd d
$ ls
4060174 j
8033020 d.log
5626152 d.ext
7214296 k
";

    #[fixture]
    fn sample() -> FileSystem {
        Interpreter::default().scan_str(SAMPLE).unwrap()
    }

    fn directory(name: &str, files: &[(&str, u64)], subdirectories: Vec<Directory>) -> Directory {
        let mut directory = Directory::new(name);
        let children = directory.children_mut();
        for subdirectory in subdirectories {
            children.insert(subdirectory.name().to_string(), subdirectory.into());
        }
        for (file_name, size) in files {
            children.insert(file_name.to_string(), File::new(*file_name, *size).into());
        }
        directory
    }

    #[rstest]
    fn visits_every_directory_once_in_pre_order(sample: FileSystem) {
        let names = sample
            .all_directories()
            .map(Directory::name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["/", "a", "e", "d"]);
    }

    #[rstest]
    fn traversal_is_restartable(sample: FileSystem) {
        assert_eq!(sample.all_directories().count(), 4);
        assert_eq!(sample.all_directories().count(), 4);
        assert_eq!(sample.directory_count(), 4);
    }

    #[rstest]
    fn traversal_does_not_invalidate_caches(sample: FileSystem) {
        sample.used_space();
        for directory in sample.all_directories() {
            assert!(directory.is_cached());
        }
    }

    #[rstest]
    fn counts_files(sample: FileSystem) {
        assert_eq!(sample.file_count(), 10);
    }

    #[rstest]
    fn sums_small_directories(sample: FileSystem) {
        assert_eq!(sample.total_size_at_most(100_000), 95437);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(584, 584)]
    #[case(u64::MAX, 48381165 + 94853 + 584 + 24933642)]
    fn small_directory_limit_is_inclusive(
        sample: FileSystem,
        #[case] limit: u64,
        #[case] expected: u128,
    ) {
        assert_eq!(sample.total_size_at_most(limit), expected);
    }

    #[rstest]
    fn finds_smallest_sufficient_directory(sample: FileSystem) {
        let used = sample.used_space();
        assert_eq!(used, 48381165);

        let needed = 30_000_000 - (70_000_000 - used);
        let found = sample.smallest_at_least(needed).unwrap();

        assert_eq!(found.name(), "d");
        assert_eq!(found.size(), 24933642);
    }

    #[rstest]
    fn threshold_is_inclusive(sample: FileSystem) {
        let found = sample.smallest_at_least(94853).unwrap();
        assert_eq!(found.name(), "a");
    }

    #[rstest]
    fn no_directory_large_enough(sample: FileSystem) {
        assert!(sample.smallest_at_least(48381166).is_none());
    }

    #[test]
    fn ties_go_to_first_visited() {
        let root = directory(
            "/",
            &[],
            vec![
                directory("first", &[("x", 10)], vec![]),
                directory("second", &[("y", 10)], vec![]),
            ],
        );
        let file_system = FileSystem::new(root);

        let found = file_system.smallest_at_least(5).unwrap();
        assert_eq!(found.name(), "first");
    }

    #[test]
    fn deep_nesting_visits_parent_before_children() {
        let root = directory(
            "/",
            &[("top", 1)],
            vec![
                directory(
                    "a",
                    &[],
                    vec![directory(
                        "b",
                        &[],
                        vec![directory("c", &[("z", 3)], vec![])],
                    )],
                ),
                directory("x", &[("w", 2)], vec![]),
            ],
        );
        let file_system = FileSystem::new(root);

        let names = file_system
            .all_directories()
            .map(Directory::name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["/", "a", "b", "c", "x"]);
        assert_eq!(file_system.used_space(), 6);
        assert_eq!(file_system.total_size_at_most(3), 3 * 3 + 2);
    }

    #[test]
    fn nested_totals_are_summed_without_overflow() {
        let root = directory("/", &[], vec![directory("a", &[("huge", u64::MAX)], vec![])]);
        let file_system = FileSystem::new(root);

        assert_eq!(
            file_system.total_size_at_most(u64::MAX),
            2 * u128::from(u64::MAX)
        );
    }

    #[test]
    fn empty_tree_has_only_root() {
        let file_system = Interpreter::default().scan_str("").unwrap();
        assert_eq!(file_system.directory_count(), 1);
        assert_eq!(file_system.used_space(), 0);
        assert_eq!(file_system.total_size_at_most(0), 0);
        assert_eq!(file_system.smallest_at_least(0).unwrap().name(), "/");
    }
}
