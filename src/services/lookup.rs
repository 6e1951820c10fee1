use std::collections::HashSet;
use std::sync::RwLock;

use crate::db::queries::LookupTable;

/// Lookup names known to be committed in the current store.
///
/// Only populated after a transaction that materialized the names commits,
/// so a rolled-back insert is never remembered. A fresh instance is created
/// whenever the store connection is replaced.
#[derive(Debug, Default)]
pub struct LookupNames {
    known: RwLock<HashSet<(LookupTable, String)>>,
}

impl LookupNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, table: LookupTable, name: &str) -> bool {
        self.known
            .read()
            .map(|known| known.contains(&(table, name.to_string())))
            .unwrap_or(false)
    }

    pub fn remember<'a, I>(&self, names: I)
    where
        I: IntoIterator<Item = (LookupTable, &'a str)>,
    {
        if let Ok(mut known) = self.known.write() {
            for (table, name) in names {
                known.insert((table, name.to_string()));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.known.read().map(|known| known.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
