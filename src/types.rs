//! Core types shared across the settings and coordination layer.

/// Key under which a setting is persisted in the durable store.
pub type SettingKey = &'static str;

/// Stable identifier of a project inside the test hierarchy: its path relative
/// to the solution root, or `.` for a project at the root.
pub type ProjectId = String;

/// Persisted setting keys.
pub mod keys {
    use super::SettingKey;

    pub const EXCLUDE_ATTRIBUTES: SettingKey = "exclude_attributes";
    pub const EXCLUDE_FILES: SettingKey = "exclude_files";
    pub const EXCLUDE_DIRECTORIES: SettingKey = "exclude_directories";
    pub const FILTERS: SettingKey = "filters";
    pub const SELECTED_TEST_SETTINGS: SettingKey = "selected_test_settings";
    pub const TEST_RUNNER: SettingKey = "test_runner";
    pub const SHOW_LINE_COVERAGE: SettingKey = "show_line_coverage";
    pub const SHOW_BRANCH_COVERAGE: SettingKey = "show_branch_coverage";
    pub const SHOW_EXCEPTIONS: SettingKey = "show_exceptions";
    pub const SHOW_PARTIAL_COVERAGE: SettingKey = "show_partial_coverage";

    /// Keys that hold free-form text and can be edited from the command line.
    pub const TEXT_KEYS: [SettingKey; 4] =
        [EXCLUDE_ATTRIBUTES, EXCLUDE_FILES, EXCLUDE_DIRECTORIES, FILTERS];

    /// Keys that hold display toggles.
    pub const TOGGLE_KEYS: [SettingKey; 4] = [
        SHOW_LINE_COVERAGE,
        SHOW_BRANCH_COVERAGE,
        SHOW_EXCEPTIONS,
        SHOW_PARTIAL_COVERAGE,
    ];
}
