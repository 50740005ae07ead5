use crate::error::StoreError;
use crate::reviews::ReviewRepository;

pub trait Store {
    type Reviews<'a>: ReviewRepository
    where
        Self: 'a;

    fn reviews(&self) -> Self::Reviews<'_>;

    fn with_tx<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Self) -> Result<T, StoreError>;
}
