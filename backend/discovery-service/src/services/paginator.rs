/// Page-number pagination over a ranked sequence
///
/// Pages are 1-based. A page past the end is empty rather than an error;
/// zero or negative page numbers and sizes are rejected. Navigation links
/// are opaque base64 page tokens.
use base64::{engine::general_purpose, Engine as _};

use crate::error::{AppError, Result};
use crate::models::PageLinks;

/// Validated paging parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// `page_size` above `max_page_size` is clamped down to it.
    pub fn new(page: i64, page_size: i64, max_page_size: i64) -> Result<Self> {
        if page <= 0 {
            return Err(AppError::InvalidPagingParameter(format!(
                "page must be >= 1, got {}",
                page
            )));
        }
        if page_size <= 0 {
            return Err(AppError::InvalidPagingParameter(format!(
                "page_size must be >= 1, got {}",
                page_size
            )));
        }

        let page = usize::try_from(page)
            .map_err(|_| AppError::InvalidPagingParameter(format!("page too large: {}", page)))?;
        let page_size = usize::try_from(page_size.min(max_page_size.max(1))).map_err(|_| {
            AppError::InvalidPagingParameter(format!("page_size too large: {}", page_size))
        })?;

        Ok(Self { page, page_size })
    }

    fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// Opaque navigation token carrying a page number
pub struct PageToken;

impl PageToken {
    pub fn encode(page: usize) -> String {
        general_purpose::STANDARD.encode(page.to_string())
    }

    pub fn decode(token: &str) -> Result<usize> {
        let decoded = general_purpose::STANDARD
            .decode(token)
            .map_err(|_| AppError::InvalidPagingParameter("Invalid page token format".into()))?;

        let page_str = String::from_utf8(decoded)
            .map_err(|_| AppError::InvalidPagingParameter("Invalid page token encoding".into()))?;

        match page_str.parse::<usize>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(AppError::InvalidPagingParameter(
                "Invalid page token value".into(),
            )),
        }
    }
}

/// One page of `T`
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub links: PageLinks,
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size)
}

/// Slice `items` according to `request`.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let count = items.len();
    let total_pages = total_pages(count, request.page_size);

    let page_items: Vec<T> = items
        .into_iter()
        .skip(request.offset())
        .take(request.page_size)
        .collect();

    let next = (request.page < total_pages).then(|| PageToken::encode(request.page + 1));
    let previous = if request.page <= 1 || total_pages == 0 {
        None
    } else {
        // past the end, "previous" points at the last real page
        Some(PageToken::encode((request.page - 1).min(total_pages)))
    };

    Page {
        items: page_items,
        count,
        total_pages,
        current_page: request.page,
        links: PageLinks { next, previous },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_parameters() {
        assert!(matches!(
            PageRequest::new(0, 10, 100),
            Err(AppError::InvalidPagingParameter(_))
        ));
        assert!(matches!(
            PageRequest::new(1, 0, 100),
            Err(AppError::InvalidPagingParameter(_))
        ));
        assert!(matches!(
            PageRequest::new(-3, -3, 100),
            Err(AppError::InvalidPagingParameter(_))
        ));
    }

    #[test]
    fn test_page_size_is_clamped_to_max() {
        let req = PageRequest::new(1, 5000, 100).unwrap();
        assert_eq!(req.page_size, 100);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn test_middle_page_links() {
        let items: Vec<u32> = (1..=25).collect();
        let page = paginate(items, PageRequest::new(2, 10, 100).unwrap());

        assert_eq!(page.items, (11..=20).collect::<Vec<u32>>());
        assert_eq!(page.count, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.links.next.as_deref().map(PageToken::decode).unwrap().unwrap(), 3);
        assert_eq!(
            page.links.previous.as_deref().map(PageToken::decode).unwrap().unwrap(),
            1
        );
    }

    #[test]
    fn test_boundaries_have_null_links() {
        let first = paginate((1..=5).collect::<Vec<u32>>(), PageRequest::new(1, 5, 100).unwrap());
        assert_eq!(first.links, PageLinks::default());
    }

    #[test]
    fn test_page_beyond_end_is_empty() {
        let page = paginate((1..=25).collect::<Vec<u32>>(), PageRequest::new(7, 10, 100).unwrap());

        assert!(page.items.is_empty());
        assert_eq!(page.links.next, None);
        assert_eq!(
            page.links.previous.as_deref().map(PageToken::decode).unwrap().unwrap(),
            3
        );
    }

    #[test]
    fn test_pages_cover_sequence_exactly_once() {
        let items: Vec<u32> = (0..47).collect();
        let first = paginate(items.clone(), PageRequest::new(1, 6, 100).unwrap());

        let mut collected = Vec::new();
        for page in 1..=first.total_pages {
            let req = PageRequest::new(page as i64, 6, 100).unwrap();
            collected.extend(paginate(items.clone(), req).items);
        }
        assert_eq!(collected, items);
    }

    #[test]
    fn test_invalid_tokens() {
        assert!(PageToken::decode("not base64!").is_err());
        assert!(PageToken::decode(&general_purpose::STANDARD.encode("zero")).is_err());
        assert!(PageToken::decode(&general_purpose::STANDARD.encode("0")).is_err());
        assert_eq!(PageToken::decode(&PageToken::encode(4)).unwrap(), 4);
    }
}
