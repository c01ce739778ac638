//! SQL schema for the forecast store.
//!
//! Executed once at connection startup. The table and column names match the
//! star schema the query API reads: one fact table keyed by location and
//! slot, plus location, date and time dimensions.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS dim_location (
    sk            INTEGER PRIMARY KEY AUTOINCREMENT,
    location_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS dim_date (
    id          INTEGER PRIMARY KEY,   -- YYYYMMDD
    full_date   TEXT NOT NULL UNIQUE,  -- ISO 8601 date
    year        INTEGER NOT NULL,
    month       INTEGER NOT NULL,
    day         INTEGER NOT NULL,
    day_of_week INTEGER NOT NULL,      -- 1 = Monday … 7 = Sunday
    is_weekend  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS dim_time (
    id        INTEGER PRIMARY KEY,     -- HHMM
    full_time TEXT NOT NULL UNIQUE,    -- HH:MM:SS
    hour      INTEGER NOT NULL,
    minute    INTEGER NOT NULL
);

-- One row per (location, slot). Rows are rewritten in place by the upsert
-- and removed only by the retention purge.
CREATE TABLE IF NOT EXISTS fact_weather_forecast (
    sk             INTEGER PRIMARY KEY AUTOINCREMENT,
    location_sk    INTEGER NOT NULL REFERENCES dim_location(sk),
    start_date_id  INTEGER NOT NULL,
    start_time_id  INTEGER NOT NULL,
    end_date_id    INTEGER NOT NULL,
    end_time_id    INTEGER NOT NULL,
    wx             TEXT,
    pop            TEXT,
    mint           TEXT,
    maxt           TEXT,
    ci             TEXT,
    data_pull_time TEXT NOT NULL,      -- RFC 3339 UTC, fixed width
    UNIQUE (location_sk, start_date_id, start_time_id, end_date_id, end_time_id)
);

CREATE INDEX IF NOT EXISTS fact_pull_time_idx ON fact_weather_forecast(data_pull_time);
CREATE INDEX IF NOT EXISTS fact_location_idx  ON fact_weather_forecast(location_sk);

PRAGMA user_version = 1;
";
