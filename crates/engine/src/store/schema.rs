//! Table layout of the debug store.

/// Bumped whenever the layout below changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Drops every table, children first.
pub(crate) const DROP_TABLES: &str = "
DROP TABLE IF EXISTS breakpoint_target;
DROP TABLE IF EXISTS breakpoint_source;
DROP TABLE IF EXISTS breakpoint;
DROP TABLE IF EXISTS variable;
DROP TABLE IF EXISTS hierarchy;
DROP TABLE IF EXISTS build_info;
";

pub(crate) const CREATE_TABLES: &str = "
CREATE TABLE build_info (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);

CREATE TABLE hierarchy (
    path          TEXT PRIMARY KEY NOT NULL,
    name          TEXT NOT NULL,
    instance_name TEXT NOT NULL,
    parent_path   TEXT,
    debug         INTEGER NOT NULL
);

CREATE TABLE variable (
    generator_path TEXT NOT NULL REFERENCES hierarchy(path),
    name           TEXT NOT NULL,
    width          INTEGER NOT NULL,
    is_signed      INTEGER NOT NULL,
    kind           TEXT NOT NULL,
    instrumented   INTEGER NOT NULL,
    PRIMARY KEY (generator_path, name)
);

CREATE TABLE breakpoint (
    id             TEXT PRIMARY KEY NOT NULL,
    ordinal        INTEGER NOT NULL,
    generator_path TEXT NOT NULL,
    block_index    INTEGER NOT NULL,
    block_kind     TEXT NOT NULL,
    clock_signal   TEXT,
    edge           TEXT,
    condition_path TEXT NOT NULL,
    condition      TEXT NOT NULL,
    output_file    TEXT,
    output_line    INTEGER,
    output_column  INTEGER
);

CREATE TABLE breakpoint_target (
    breakpoint_id TEXT NOT NULL REFERENCES breakpoint(id),
    ordinal       INTEGER NOT NULL,
    statement_id  TEXT NOT NULL,
    variable_name TEXT NOT NULL,
    value         TEXT NOT NULL,
    output_line   INTEGER,
    PRIMARY KEY (breakpoint_id, ordinal)
);

CREATE TABLE breakpoint_source (
    breakpoint_id TEXT NOT NULL REFERENCES breakpoint(id),
    ordinal       INTEGER NOT NULL,
    filename      TEXT NOT NULL,
    line_num      INTEGER NOT NULL,
    PRIMARY KEY (breakpoint_id, ordinal)
);

CREATE INDEX breakpoint_output_line ON breakpoint(output_line);
CREATE INDEX breakpoint_generator_path ON breakpoint(generator_path);
CREATE INDEX breakpoint_target_output_line ON breakpoint_target(output_line);
";

/// Keys of the `build_info` table.
pub mod build_info {
    /// Layout version, see [`super::SCHEMA_VERSION`]
    pub const SCHEMA_VERSION: &str = "schema_version";
    /// RFC 3339 timestamp of the build
    pub const CREATED_AT: &str = "created_at";
    /// Version of the crate that wrote the store
    pub const TOOL_VERSION: &str = "tool_version";
    /// Number of breakpoint records
    pub const BREAKPOINT_COUNT: &str = "breakpoint_count";
}
