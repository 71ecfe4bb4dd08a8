//! In-memory paging over a directory's mirrored children.
//!
//! Children are ordered directories first, then files, each group sorted by
//! the requested field, and the combined sequence is sliced by offset/limit.
//! The whole mirror array is sorted on every call, so cost is O(children).

use std::cmp::Ordering;

use stratum_core::types::{ChildPage, SortDirection, SortField};

use super::model::Directory;
use crate::file::File;

impl Directory {
    /// Return this directory with `directories`/`files` narrowed to one page.
    /// Counts still describe the full set of children.
    pub fn into_page(mut self, page: &ChildPage) -> Directory {
        let mut dirs = std::mem::take(&mut self.directories);
        let mut files = std::mem::take(&mut self.files);
        sort_directories(&mut dirs, page.sort_by, page.direction);
        sort_files(&mut files, page.sort_by, page.direction);

        let range = page.window.bounds(dirs.len() + files.len());
        let dir_count = dirs.len();

        self.directories = dirs
            .into_iter()
            .enumerate()
            .filter(|(i, _)| range.contains(i))
            .map(|(_, d)| d)
            .collect();
        self.files = files
            .into_iter()
            .enumerate()
            .filter(|(i, _)| range.contains(&(i + dir_count)))
            .map(|(_, f)| f)
            .collect();
        self
    }
}

/// Sort directories by `field`, ties broken by id.
pub fn sort_directories(dirs: &mut [Directory], field: SortField, direction: SortDirection) {
    dirs.sort_by(|a, b| {
        let ord = match field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Size => a.size.cmp(&b.size),
        };
        direction.apply(ord.then_with(|| a.id.cmp(&b.id)))
    });
}

/// Sort files by `field`, ties broken by id.
pub fn sort_files(files: &mut [File], field: SortField, direction: SortDirection) {
    files.sort_by(|a, b| {
        let ord: Ordering = match field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Size => a.size.cmp(&b.size),
        };
        direction.apply(ord.then_with(|| a.id.cmp(&b.id)))
    });
}

#[cfg(test)]
mod tests {
    use stratum_core::types::Pagination;

    use super::*;
    use crate::directory::DirectoryUpdate;

    fn populated() -> Directory {
        let mut root = Directory::new_root("u1");
        for name in ["c", "a", "b"] {
            let child = Directory::new_child(&root, "u1", name);
            DirectoryUpdate::AttachDirectory(Box::new(child)).apply(&mut root);
        }
        for (name, size) in [("z", 3), ("y", 1)] {
            let file = File::new(root.id, "u1", name, "bin", size);
            DirectoryUpdate::AttachFile(Box::new(file)).apply(&mut root);
        }
        root
    }

    fn names(dir: &Directory) -> Vec<String> {
        dir.directories
            .iter()
            .map(|d| d.name.clone())
            .chain(dir.files.iter().map(|f| f.name.clone()))
            .collect()
    }

    #[test]
    fn directories_come_before_files() {
        let page = populated().into_page(&ChildPage::default());
        assert_eq!(names(&page), vec!["a", "b", "c", "y", "z"]);
        assert_eq!(page.directories_count, 3);
        assert_eq!(page.files_count, 2);
    }

    #[test]
    fn window_spans_both_groups() {
        let page = populated().into_page(&ChildPage {
            window: Pagination::new(2, 2),
            ..Default::default()
        });
        assert_eq!(names(&page), vec!["c", "y"]);
    }

    #[test]
    fn descending_size() {
        let page = populated().into_page(&ChildPage {
            window: Pagination::new(3, 10),
            sort_by: SortField::Size,
            direction: SortDirection::Desc,
        });
        assert_eq!(names(&page), vec!["z", "y"]);
    }

    #[test]
    fn offset_past_end_is_empty() {
        let page = populated().into_page(&ChildPage {
            window: Pagination::new(50, 10),
            ..Default::default()
        });
        assert!(names(&page).is_empty());
    }
}
