use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl PageMeta {
    pub fn new(current_page: u32, per_page: u32, total: u64, returned: usize) -> Self {
        let per_page = per_page.max(1);
        let last_page = total.div_ceil(u64::from(per_page)).max(1);
        let offset = u64::from(current_page.saturating_sub(1)) * u64::from(per_page);

        let (from, to) = if returned == 0 {
            (None, None)
        } else {
            (Some(offset + 1), Some(offset + returned as u64))
        };

        Self {
            current_page,
            per_page,
            total,
            last_page,
            from,
            to,
        }
    }
}

/// A page of a list endpoint, `{"data": [...], "meta": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, current_page: u32, per_page: u32, total: u64) -> Self {
        let meta = PageMeta::new(current_page, per_page, total, data.len());
        Self { data, meta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_for_middle_page() {
        let meta = PageMeta::new(2, 15, 40, 15);
        assert_eq!(meta.last_page, 3);
        assert_eq!(meta.from, Some(16));
        assert_eq!(meta.to, Some(30));
    }

    #[test]
    fn meta_for_empty_result() {
        let meta = PageMeta::new(1, 15, 0, 0);
        assert_eq!(meta.last_page, 1);
        assert_eq!(meta.from, None);
        assert_eq!(meta.to, None);
    }

    #[test]
    fn meta_for_huge_totals() {
        let meta = PageMeta::new(u32::MAX, 1, u64::from(u32::MAX) + 10, 1);
        assert_eq!(meta.last_page, u64::from(u32::MAX) + 10);
        assert_eq!(meta.from, Some(u64::from(u32::MAX)));
    }
}
