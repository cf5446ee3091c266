use crate::db::FilterRecord;
use crate::services::filter::{fold_case, FilterError, FilterSource};
use tracing::debug;

/// Returns every filter whose keyword occurs in `text`, in the given order.
///
/// Keywords are stored case-folded, so only the message needs folding.
pub fn matching<'a>(filters: &'a [FilterRecord], text: &str) -> Vec<&'a FilterRecord> {
    if text.is_empty() {
        return Vec::new();
    }
    let folded = fold_case(text);
    filters
        .iter()
        .filter(|filter| !filter.keyword.is_empty() && folded.contains(&filter.keyword))
        .collect()
}

pub struct FilterMatcher<S> {
    source: S,
}

impl<S: FilterSource> FilterMatcher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Looks up the guild's filters and keeps the ones triggered by `text`.
    pub async fn match_message(
        &self,
        guild_id: &str,
        text: &str,
    ) -> Result<Vec<FilterRecord>, FilterError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let filters = self.source.filters_for_guild(guild_id).await?;
        let matched: Vec<FilterRecord> = matching(&filters, text).into_iter().cloned().collect();
        if !matched.is_empty() {
            debug!(
                "{} of {} filters matched a message in guild {}",
                matched.len(),
                filters.len(),
                guild_id
            );
        }
        Ok(matched)
    }
}
