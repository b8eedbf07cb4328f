use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 0;
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 1000;

/// ページング指定（サービス層に渡す記述子）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    size: u64,
}

impl PageRequest {
    /// 不正な値は拒否せず既定値（page=0, size=20）に正規化する
    pub fn of(page: i64, size: i64) -> Self {
        if page < 0 || size < 1 {
            return Self::default();
        }
        Self {
            page: page as u64,
            size: (size as u64).min(MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// ページング結果のエンベロープ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            page: request.page(),
            size: request.size(),
            total_elements,
            total_pages: total_elements.div_ceil(request.size()),
        }
    }

    /// 要素を変換する（メタデータはそのまま）
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(-1, 0, 0, 20 ; "negative page and zero size")]
    #[test_case(-5, 10, 0, 20 ; "negative page")]
    #[test_case(3, -2, 0, 20 ; "negative size")]
    #[test_case(0, 1, 0, 1 ; "smallest valid")]
    #[test_case(2, 50, 2, 50 ; "regular")]
    #[test_case(1, 5000, 1, 1000 ; "size capped")]
    fn page_request_normalization(page: i64, size: i64, want_page: u64, want_size: u64) {
        let request = PageRequest::of(page, size);
        assert_eq!(request.page(), want_page);
        assert_eq!(request.size(), want_size);
    }

    #[test]
    fn envelope_counts_pages() {
        let request = PageRequest::of(1, 10);
        let page = Page::new((11..=20).collect::<Vec<_>>(), &request, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.content.len(), 10);
        assert_eq!(request.offset(), 10);
    }

    #[test]
    fn empty_page_keeps_envelope() {
        let page: Page<i32> = Page::new(Vec::new(), &PageRequest::default(), 0);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "content": [],
                "page": 0,
                "size": 20,
                "totalElements": 0,
                "totalPages": 0
            })
        );
    }
}
