//! In-memory pagination over small result sets.

/// One page of a larger list, along with the numbers the UI needs to draw
/// pager controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slice out page `page` (1-indexed). `total_pages` is at least 1 even for
/// an empty list. Out-of-range pages, including anything below 1, come
/// back with an empty item slice rather than being clamped or rejected.
pub fn paginate<T>(items: Vec<T>, page: i64, per_page: i64) -> Page<T> {
    let total = items.len() as i64;
    let per_page = per_page.max(1);
    let total_pages = ((total + per_page - 1) / per_page).max(1);
    let items = if page < 1 || page > total_pages {
        Vec::new()
    } else {
        items
            .into_iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .collect()
    };
    Page {
        items,
        page,
        per_page,
        total,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_partition_the_input() {
        let items: Vec<i32> = (0..23).collect();
        let first = paginate(items.clone(), 1, 10);
        assert_eq!(first.total_pages, 3);

        let mut collected = Vec::new();
        for page in 1..=first.total_pages {
            let p = paginate(items.clone(), page, 10);
            assert!(p.items.len() <= 10);
            collected.extend(p.items);
        }
        assert_eq!(collected, items);
    }

    #[test]
    fn empty_input_still_has_one_page() {
        let page = paginate(Vec::<i32>::new(), 1, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_prev());
        assert!(!page.has_next());
    }

    #[test]
    fn out_of_range_pages_are_empty_not_clamped() {
        let items: Vec<i32> = (0..5).collect();
        assert!(paginate(items.clone(), 0, 2).items.is_empty());
        assert!(paginate(items.clone(), -3, 2).items.is_empty());
        assert!(paginate(items.clone(), 4, 2).items.is_empty());
        // last valid page is partial, not empty
        assert_eq!(paginate(items, 3, 2).items, vec![4]);
    }

    #[test]
    fn prev_next_flags() {
        let items: Vec<i32> = (0..30).collect();
        let first = paginate(items.clone(), 1, 10);
        assert!(!first.has_prev());
        assert!(first.has_next());

        let middle = paginate(items.clone(), 2, 10);
        assert!(middle.has_prev());
        assert!(middle.has_next());

        let last = paginate(items, 3, 10);
        assert!(last.has_prev());
        assert!(!last.has_next());
    }

    #[test]
    fn exact_multiple_has_no_phantom_page() {
        let items: Vec<i32> = (0..20).collect();
        let page = paginate(items, 2, 10);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 10);
        assert!(!page.has_next());
    }
}
