use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Pagination<T> {
    pub fn new(items: Vec<T>, total: i64) -> Self {
        Self { items, total }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Pagination<U> {
        Pagination {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
