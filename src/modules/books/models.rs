use serde::{Deserialize, Serialize};

/// One catalog entry as stored in the `books` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Identifier assigned by the store
    pub id: i64,
    /// Title of the book
    pub title: String,
    /// Price in minor currency units (cents)
    pub price: i64,
    /// Genre, matched exactly when filtering
    pub genre: String,
}

/// Raw, unvalidated listing parameters as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBooksParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub genre: Option<String>,
    pub sort: Option<String>,
}

impl ListBooksParams {
    /// Collect parameters from decoded query pairs. The first occurrence of a
    /// repeated key wins; unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "limit" => &mut params.limit,
                "offset" => &mut params.offset,
                "genre" => &mut params.genre,
                "sort" => &mut params.sort,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        params
    }
}
