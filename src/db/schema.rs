/// Keyword filters, one row per (guild, case-folded keyword).
///
/// Keywords are limited to 50 characters as typed; a folded character can
/// expand to at most three, hence the wider bound on the stored column.
pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS filters (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        guild_id TEXT NOT NULL,
        keyword TEXT NOT NULL CHECK (length(keyword) BETWEEN 1 AND 150),
        response TEXT NOT NULL CHECK (length(response) BETWEEN 1 AND 500),
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (guild_id, keyword)
    );
    CREATE INDEX IF NOT EXISTS idx_filters_guild ON filters (guild_id);
";
