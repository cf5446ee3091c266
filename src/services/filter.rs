use crate::db::{Database, DbError, FilterRecord};
use async_trait::async_trait;
use tracing::debug;

pub const MAX_KEYWORD_CHARS: usize = 50;
pub const MAX_RESPONSE_CHARS: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("filter keyword cannot be empty")]
    InvalidKeyword,
    #[error("filter keyword is longer than {max} characters")]
    KeywordTooLong { max: usize },
    #[error("filter response cannot be empty")]
    EmptyResponse,
    #[error("filter response is longer than {max} characters")]
    ResponseTooLong { max: usize },
    #[error("failed to persist filter: {0}")]
    Persistence(#[from] DbError),
}

impl FilterError {
    /// True for errors caused by user input rather than storage.
    pub fn is_validation(&self) -> bool {
        !matches!(self, FilterError::Persistence(_))
    }
}

/// Unicode full case folding, used for storage and comparison.
pub fn fold_case(text: &str) -> String {
    caseless::default_case_fold_str(text)
}

/// Validates a keyword as typed and returns its folded form.
///
/// The length limit applies to the typed keyword, the same value Discord
/// checks; folding may lengthen it (`"ß"` becomes `"ss"`).
pub fn normalize_keyword(keyword: &str) -> Result<String, FilterError> {
    if keyword.trim().is_empty() {
        return Err(FilterError::InvalidKeyword);
    }
    if keyword.chars().count() > MAX_KEYWORD_CHARS {
        return Err(FilterError::KeywordTooLong {
            max: MAX_KEYWORD_CHARS,
        });
    }
    Ok(fold_case(keyword))
}

fn validate_response(response: &str) -> Result<(), FilterError> {
    if response.trim().is_empty() {
        return Err(FilterError::EmptyResponse);
    }
    if response.chars().count() > MAX_RESPONSE_CHARS {
        return Err(FilterError::ResponseTooLong {
            max: MAX_RESPONSE_CHARS,
        });
    }
    Ok(())
}

/// Anything that can hand out the filters of a guild.
#[async_trait]
pub trait FilterSource: Send + Sync {
    async fn filters_for_guild(&self, guild_id: &str) -> Result<Vec<FilterRecord>, FilterError>;
}

/// Guild-scoped keyword filters backed by the `filters` table.
#[derive(Clone)]
pub struct FilterStore {
    db: Database,
}

impl FilterStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a filter, or updates the response of the guild's filter with
    /// the same case-folded keyword. Returns the filter id.
    pub async fn create(
        &self,
        guild_id: &str,
        keyword: &str,
        response: &str,
    ) -> Result<i64, FilterError> {
        let keyword = normalize_keyword(keyword)?;
        validate_response(response)?;

        let guild_id = guild_id.to_string();
        let response = response.to_string();
        let id = self
            .db
            .run_blocking(move |db| db.upsert_filter(&guild_id, &keyword, &response))
            .await?;
        Ok(id)
    }

    pub async fn get(&self, guild_id: &str, id: i64) -> Result<Option<FilterRecord>, FilterError> {
        let guild_id = guild_id.to_string();
        let record = self
            .db
            .run_blocking(move |db| db.get_filter(&guild_id, id))
            .await?;
        Ok(record)
    }

    pub async fn get_all(&self, guild_id: &str) -> Result<Vec<FilterRecord>, FilterError> {
        let guild_id = guild_id.to_string();
        let records = self
            .db
            .run_blocking(move |db| db.list_filters(&guild_id))
            .await?;
        Ok(records)
    }

    /// Removes the guild's filter for `keyword`. Returns how many rows went away;
    /// a missing keyword is not an error.
    pub async fn delete(&self, guild_id: &str, keyword: &str) -> Result<usize, FilterError> {
        let keyword = match normalize_keyword(keyword) {
            Ok(keyword) => keyword,
            Err(_) => {
                debug!("Ignoring delete of invalid keyword in guild {}", guild_id);
                return Ok(0);
            }
        };

        let guild_id = guild_id.to_string();
        let count = self
            .db
            .run_blocking(move |db| db.delete_filter(&guild_id, &keyword))
            .await?;
        Ok(count)
    }

    pub async fn delete_all(&self, guild_id: &str) -> Result<usize, FilterError> {
        let guild_id = guild_id.to_string();
        let count = self
            .db
            .run_blocking(move |db| db.delete_guild_filters(&guild_id))
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl FilterSource for FilterStore {
    async fn filters_for_guild(&self, guild_id: &str) -> Result<Vec<FilterRecord>, FilterError> {
        self.get_all(guild_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> FilterStore {
        let db = Database::open(":memory:", 1).unwrap();
        db.execute_init().unwrap();
        FilterStore::new(db)
    }

    #[tokio::test]
    async fn test_create_folds_keyword() {
        let store = test_store();
        let id = store.create("g1", "HeLLo", "world").await.unwrap();

        let record = store.get("g1", id).await.unwrap().unwrap();
        assert_eq!(record.keyword, "hello");
        assert_eq!(record.response, "world");
        assert_eq!(record.guild_id, "g1");

        let all = store.get_all("g1").await.unwrap();
        assert_eq!(all, vec![record]);
    }

    #[tokio::test]
    async fn test_create_is_upsert() {
        let store = test_store();
        let first = store.create("g", "Hello", "r1").await.unwrap();
        let second = store.create("g", "hello", "r2").await.unwrap();
        assert_eq!(first, second);

        let all = store.get_all("g").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].keyword, "hello");
        assert_eq!(all[0].response, "r2");
    }

    #[tokio::test]
    async fn test_guild_isolation() {
        let store = test_store();
        let id = store.create("a", "secret", "only in a").await.unwrap();

        assert!(store.get_all("b").await.unwrap().is_empty());
        assert!(store.get("b", id).await.unwrap().is_none());

        assert_eq!(store.delete("b", "secret").await.unwrap(), 0);
        assert_eq!(store.delete_all("b").await.unwrap(), 0);
        assert_eq!(store.get_all("a").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_case_insensitive_and_repeatable() {
        let store = test_store();
        store.create("g", "Hello", "r1").await.unwrap();

        assert_eq!(store.delete("g", "HELLO").await.unwrap(), 1);
        assert!(store.get_all("g").await.unwrap().is_empty());

        assert_eq!(store.delete("g", "hello").await.unwrap(), 0);
        assert_eq!(store.delete("g", "   ").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_all_leaves_other_guilds() {
        let store = test_store();
        store.create("g1", "a", "1").await.unwrap();
        store.create("g1", "b", "2").await.unwrap();
        store.create("g2", "a", "3").await.unwrap();

        assert_eq!(store.delete_all("g1").await.unwrap(), 2);
        assert!(store.get_all("g1").await.unwrap().is_empty());
        assert_eq!(store.get_all("g2").await.unwrap().len(), 1);

        // No-op the second time
        assert_eq!(store.delete_all("g1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ping_pong_scenario() {
        let store = test_store();
        let id = store.create("g1", "ping", "pong").await.unwrap();
        let again = store.create("g1", "ping", "PONG2").await.unwrap();
        assert_eq!(id, again);

        let all = store.get_all("g1").await.unwrap();
        assert_eq!(
            all,
            vec![FilterRecord {
                id,
                guild_id: "g1".to_string(),
                keyword: "ping".to_string(),
                response: "PONG2".to_string(),
            }]
        );

        store.delete("g1", "ping").await.unwrap();
        assert!(store.get_all("g1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation() {
        let store = test_store();

        assert!(matches!(
            store.create("g", "", "r").await,
            Err(FilterError::InvalidKeyword)
        ));
        assert!(matches!(
            store.create("g", " \t ", "r").await,
            Err(FilterError::InvalidKeyword)
        ));
        assert!(matches!(
            store.create("g", &"k".repeat(51), "r").await,
            Err(FilterError::KeywordTooLong { max: 50 })
        ));
        assert!(matches!(
            store.create("g", "k", "  ").await,
            Err(FilterError::EmptyResponse)
        ));
        assert!(matches!(
            store.create("g", "k", &"r".repeat(501)).await,
            Err(FilterError::ResponseTooLong { max: 500 })
        ));

        // Limits are inclusive and counted in characters, not bytes
        store.create("g", &"é".repeat(50), &"ü".repeat(500)).await.unwrap();
        assert!(store.get_all("g").await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn test_keyword_limit_applies_before_folding() {
        let store = test_store();

        // 50 typed characters fold to 100 stored ones
        let id = store.create("g", &"ß".repeat(50), "r").await.unwrap();
        let record = store.get("g", id).await.unwrap().unwrap();
        assert_eq!(record.keyword, "ss".repeat(50));

        assert!(matches!(
            store.create("g", &"ß".repeat(51), "r").await,
            Err(FilterError::KeywordTooLong { max: 50 })
        ));
    }

    #[tokio::test]
    async fn test_full_case_folding_on_write() {
        let store = test_store();
        let id = store.create("g", "Straße", "r1").await.unwrap();
        assert_eq!(store.get("g", id).await.unwrap().unwrap().keyword, "strasse");

        // Same keyword after folding, so it updates in place
        assert_eq!(store.create("g", "STRASSE", "r2").await.unwrap(), id);
        assert_eq!(store.get_all("g").await.unwrap().len(), 1);

        assert_eq!(store.delete("g", "straße").await.unwrap(), 1);
    }

    #[test]
    fn test_error_classification() {
        assert!(FilterError::InvalidKeyword.is_validation());
        assert!(FilterError::ResponseTooLong { max: 500 }.is_validation());
        let persistence = FilterError::Persistence(DbError::Sqlite(
            rusqlite::Error::QueryReturnedNoRows,
        ));
        assert!(!persistence.is_validation());
    }
}
