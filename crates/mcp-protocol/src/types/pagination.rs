//! Cursor-based pagination envelope shared by the `*/list` methods.

#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> PaginatedResult<T> {
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}
