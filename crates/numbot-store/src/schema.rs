//! Column family layout for the numbot ledger.

/// Column family names.
pub mod cf {
    /// Primary account records, keyed by user id.
    pub const ACCOUNTS: &str = "accounts";

    /// Active block records, keyed by user id.
    pub const BLOCKS: &str = "blocks";

    /// Special-user allow-list, keyed by user id.
    pub const SPECIALS: &str = "specials";

    /// Daily feature-usage counters, keyed by `user || day || feature`.
    pub const USAGE: &str = "usage";

    /// Charge records, keyed by charge id (ULID).
    pub const CHARGES: &str = "charges";

    /// Query history, keyed by `user || history id` for per-user range scans.
    pub const HISTORY: &str = "history";

    /// Admin audit log, keyed by audit id (ULID).
    pub const AUDIT: &str = "audit";
}

/// All column families, in creation order.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::BLOCKS,
        cf::SPECIALS,
        cf::USAGE,
        cf::CHARGES,
        cf::HISTORY,
        cf::AUDIT,
    ]
}
