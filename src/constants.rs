//! Common constants used throughout filegen.

/// Suffix marking a file whose content is template source.
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

/// Placeholder tokens in file and directory names: `+name+`.
pub const TOKEN_PATTERN: &str = r"\+([^+]+)\+";

/// Supported configuration file names
pub const CONFIG_FILES: [&str; 3] = ["filegen.json", "filegen.yml", "filegen.yaml"];

/// filegen's ignore file name
pub const IGNORE_FILE: &str = ".filegenignore";

/// Patterns that are always ignored while scanning.
pub const DEFAULT_IGNORE_PATTERNS: [&str; 7] = [
    "**/.git",
    "**/.git/**",
    "**/.DS_Store",
    IGNORE_FILE,
    CONFIG_FILES[0],
    CONFIG_FILES[1],
    CONFIG_FILES[2],
];

/// Expression that hands control back to the block calling a definition.
pub const CALLER_BODY: &str = "caller.body()";

/// Name of the file handle inside synthesized `with open(...)` blocks.
pub const WRITER_NAME: &str = "wf";

/// Name of the prompt helper defined by synthesized programs.
pub const ASK_FUNCTION: &str = "ask";

/// Marker file written into every directory by the package writer.
pub const PACKAGE_MARKER: &str = "__init__.py";
