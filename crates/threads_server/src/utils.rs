use mongodb::bson::oid::ObjectId;
use threads_common::errors::ThreadsServerError;
use threads_common::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use tracing::error;

/**
 * Parse a hex object id taken from a path or request body
 *
 * @param id - the 24 character hex string
 * @returns - the object id, or InvalidObjectId
 */
pub fn parse_oid(id: &str) -> Result<ObjectId, ThreadsServerError> {
    ObjectId::parse_str(id).map_err(|_| ThreadsServerError::InvalidObjectId(id.to_string()))
}

/// Log a failed action and wrap the error with what was being attempted
pub trait Context<T> {
    fn context(self, action: &str) -> Result<T, ThreadsServerError>;
}

impl<T> Context<T> for Result<T, ThreadsServerError> {
    fn context(self, action: &str) -> Result<T, ThreadsServerError> {
        self.map_err(|e| {
            error!("{}: {}", action, e);
            ThreadsServerError::failed(action, e)
        })
    }
}

/// Offset pagination with 1-based page numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
}

impl Page {
    pub fn new(number: Option<u64>, size: Option<u64>) -> Self {
        Self {
            number: number.unwrap_or(1).max(1),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Capped at `i64::MAX`, the largest skip the server accepts
    pub fn skip(&self) -> u64 {
        (self.number - 1)
            .saturating_mul(self.size)
            .min(i64::MAX as u64)
    }

    /// Whether matches remain past the items returned for this page
    pub fn is_next(&self, total: u64, returned: usize) -> bool {
        total > self.skip().saturating_add(returned as u64)
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_oid() {
        let id = ObjectId::new();
        assert_eq!(parse_oid(&id.to_hex()).unwrap(), id);
        assert_eq!(
            parse_oid("not-an-id").unwrap_err(),
            ThreadsServerError::InvalidObjectId(String::from("not-an-id"))
        );
    }

    #[test]
    fn test_page_bounds() {
        let page = Page::new(Some(0), Some(0));
        assert_eq!(page, Page { number: 1, size: 1 });
        let page = Page::new(None, Some(10_000));
        assert_eq!(page.size, MAX_PAGE_SIZE);
        assert_eq!(Page::default().size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_is_next() {
        let page = Page::new(Some(2), Some(10));
        assert_eq!(page.skip(), 10);
        assert!(page.is_next(21, 10));
        assert!(!page.is_next(20, 10));
        assert!(!page.is_next(15, 5));
    }

    #[test]
    fn test_huge_page_number() {
        let page = Page::new(Some(u64::MAX), Some(MAX_PAGE_SIZE));
        assert_eq!(page.skip(), i64::MAX as u64);
        assert!(!page.is_next(0, 0));
        assert!(!page.is_next(1_000_000, 0));
    }

    #[test]
    fn test_context_wraps_error() {
        let res: Result<(), ThreadsServerError> =
            Err(ThreadsServerError::UserNotFound(String::from("u1")));
        let err = res.context("Failed to fetch user").unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch user: User u1 not found");
    }
}
