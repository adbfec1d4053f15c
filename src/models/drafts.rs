use chrono::NaiveDate;
use rand::Rng;
use std::marker::PhantomData;

use crate::forms::FormDefinition;
use crate::local_store::{LocalStore, StoreError};

const NAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Named form snapshots for one owner and one form kind.
///
/// Drafts live in the local store under `<draft scope>.user_<id>`, so every
/// engineer has a separate set per form kind. Last writer wins.
#[derive(Debug, Clone)]
pub struct DraftStore<F> {
    store: LocalStore,
    scope: String,
    _form: PhantomData<F>,
}

impl<F: FormDefinition> DraftStore<F> {
    pub fn new(store: LocalStore, owner_id: i64) -> Self {
        Self {
            store,
            scope: format!("{}.user_{owner_id}", F::KIND.draft_scope()),
            _form: PhantomData,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn get(&self, name: &str) -> Result<Option<F>, StoreError> {
        self.store.get(&self.scope, name)
    }

    pub fn set(&self, name: &str, form: &F) -> Result<(), StoreError> {
        self.store.set(&self.scope, name, form)
    }

    /// Returns whether a draft by that name existed.
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        self.store.remove(&self.scope, name)
    }

    /// All draft names, sorted.
    pub fn names(&self) -> Result<Vec<String>, StoreError> {
        let mut names = self.store.keys(&self.scope)?;
        names.sort();
        Ok(names)
    }
}

/// `Draft_<YYYY-MM-DD>_<6 random lowercase alphanumerics>`.
pub fn generate_name(today: NaiveDate) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| NAME_ALPHABET[rng.random_range(0..NAME_ALPHABET.len())] as char)
        .collect();
    format!("Draft_{}_{suffix}", today.format("%Y-%m-%d"))
}
