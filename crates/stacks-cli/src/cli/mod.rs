//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums. No business logic lives here.

use clap::{Args, Parser, Subcommand, ValueEnum};

use stacks_adapters::Dialect;
use stacks_core::domain::Sort;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "buddy",
    bin_name = "buddy",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Query and edit Stacks models from the command line",
    long_about = "buddy reads and writes records of Stacks models through the \
                  same gateway the application uses, so hidden attributes \
                  never reach the terminal.",
    after_help = "EXAMPLES:\n\
        \x20 buddy create --set email=ada@example.com --set password=secret\n\
        \x20 buddy query --where email=ada@example.com\n\
        \x20 buddy query --null name --sort created_at:desc --limit 5\n\
        \x20 buddy all --page 2 --output-format json\n\
        \x20 buddy explain --where name=Ada --dialect postgres",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch one record by identity.
    #[command(
        about = "Fetch a record by id",
        after_help = "EXAMPLES:\n\
            \x20 buddy find 1\n\
            \x20 buddy find 1 --fields email,name"
    )]
    Find(FindArgs),

    /// Records matching column filters.
    #[command(
        visible_alias = "q",
        about = "Query records by column values",
        after_help = "EXAMPLES:\n\
            \x20 buddy query --where email=ada@example.com\n\
            \x20 buddy query --null name\n\
            \x20 buddy query --sort email:desc --page 2 --limit 20"
    )]
    Query(QueryArgs),

    /// One page of the whole table.
    #[command(
        visible_alias = "ls",
        about = "List records page by page",
        after_help = "EXAMPLES:\n\
            \x20 buddy all\n\
            \x20 buddy all --page 3 --limit 25"
    )]
    All(AllArgs),

    /// Insert a new record.
    #[command(
        about = "Create a record",
        after_help = "EXAMPLES:\n\
            \x20 buddy create --set email=ada@example.com --set password=secret"
    )]
    Create(CreateArgs),

    /// Patch an existing record.
    #[command(
        about = "Update a record by id",
        after_help = "EXAMPLES:\n\
            \x20 buddy update 1 --set name=Ada"
    )]
    Update(UpdateArgs),

    /// Delete a record.
    #[command(visible_alias = "rm", about = "Remove a record by id")]
    Remove(RemoveArgs),

    /// Print the SQL a query would run.
    #[command(
        about = "Show the SQL for a query",
        after_help = "EXAMPLES:\n\
            \x20 buddy explain --null name\n\
            \x20 buddy explain --where email=ada@example.com --dialect mysql"
    )]
    Explain(ExplainArgs),

    /// List the models buddy knows about.
    #[command(about = "List registered models")]
    Models,

    /// Initialise a buddy configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 buddy init\n\
            \x20 buddy init --force"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 buddy completions bash > ~/.local/share/bash-completion/completions/buddy\n\
            \x20 buddy completions zsh  > ~/.zfunc/_buddy\n\
            \x20 buddy completions fish > ~/.config/fish/completions/buddy.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the buddy configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 buddy config get database.path\n\
            \x20 buddy config list\n\
            \x20 buddy config path"
    )]
    Config(ConfigCommands),
}

// ── find ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FindArgs {
    /// Record identity.
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Only return these columns (the identity is always included).
    #[arg(long, value_name = "COLUMNS", value_delimiter = ',')]
    pub fields: Option<Vec<String>>,
}

// ── query / explain ───────────────────────────────────────────────────────────

/// Column filters, sorting and pagination shared by `query` and `explain`.
#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    /// `COLUMN=VALUE` equality filter; repeatable.
    #[arg(
        short = 'w',
        long = "where",
        value_name = "COLUMN=VALUE",
        value_parser = parse_assignment
    )]
    pub conditions: Vec<(String, String)>,

    /// Match rows where COLUMN is NULL; repeatable.
    #[arg(long = "null", value_name = "COLUMN")]
    pub null: Vec<String>,

    /// Sort by `COLUMN` or `COLUMN:asc|desc`.
    #[arg(short = 's', long, value_name = "COLUMN[:DIR]")]
    pub sort: Option<Sort>,

    /// Maximum number of rows.
    #[arg(short = 'l', long, value_name = "N")]
    pub limit: Option<u64>,

    /// 1-indexed page (uses --limit, default 10).
    #[arg(short = 'p', long, value_name = "N", conflicts_with = "offset")]
    pub page: Option<u64>,

    /// Rows to skip.
    #[arg(long, value_name = "N")]
    pub offset: Option<u64>,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Print only the number of matching rows.
    #[arg(long)]
    pub count: bool,
}

#[derive(Debug, Args)]
pub struct ExplainArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// SQL dialect (defaults to `database.dialect`).
    #[arg(short = 'd', long, value_name = "DIALECT")]
    pub dialect: Option<Dialect>,
}

// ── all ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AllArgs {
    /// Page size (defaults to `pagination.default_limit`).
    #[arg(short = 'l', long, value_name = "N")]
    pub limit: Option<u64>,

    /// 1-indexed page.
    #[arg(short = 'p', long, value_name = "N", default_value_t = 1)]
    pub page: u64,
}

// ── writes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// `COLUMN=VALUE` to write; repeatable.
    #[arg(
        long = "set",
        value_name = "COLUMN=VALUE",
        value_parser = parse_assignment,
        required = true
    )]
    pub set: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Record identity.
    #[arg(value_name = "ID")]
    pub id: i64,

    /// `COLUMN=VALUE` to write; repeatable.
    #[arg(
        long = "set",
        value_name = "COLUMN=VALUE",
        value_parser = parse_assignment,
        required_unless_present = "unset"
    )]
    pub set: Vec<(String, String)>,

    /// Columns to set to NULL; repeatable.
    #[arg(long = "unset", value_name = "COLUMN")]
    pub unset: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Record identity.
    #[arg(value_name = "ID")]
    pub id: i64,
}

// ── init ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(short = 'f', long)]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
    Elvish,
}

// ── config ────────────────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one resolved configuration value.
    Get {
        /// Dotted key, e.g. `database.path`.
        key: String,
    },
    /// Print the resolved configuration as TOML.
    List,
    /// Print the default configuration file path.
    Path,
}

// ── helpers ───────────────────────────────────────────────────────────────────

/// Split `COLUMN=VALUE` at the first `=`. The value may be empty.
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got '{raw}'"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column name in '{raw}'"));
    }
    Ok((column.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stacks_core::domain::SortDirection;

    #[test]
    fn parse_assignment_splits_on_first_equals() {
        assert_eq!(
            parse_assignment("token=a=b").unwrap(),
            ("token".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment("name=").unwrap(),
            ("name".to_string(), String::new())
        );
    }

    #[test]
    fn parse_assignment_rejects_missing_parts() {
        assert!(parse_assignment("name").is_err());
        assert!(parse_assignment("=Ada").is_err());
    }

    #[test]
    fn query_collects_filters() {
        let cli = Cli::parse_from([
            "buddy", "query", "--where", "email=a@b.c", "--null", "name", "--sort",
            "created_at:desc", "--page", "2",
        ]);
        let Commands::Query(args) = cli.command else {
            panic!("expected query");
        };
        assert_eq!(
            args.filter.conditions,
            vec![("email".to_string(), "a@b.c".to_string())]
        );
        assert_eq!(args.filter.null, vec!["name".to_string()]);
        assert_eq!(
            args.filter.sort,
            Some(Sort::new("created_at", SortDirection::Desc))
        );
        assert_eq!(args.filter.page, Some(2));
        assert_eq!(cli.global.model, "User");
    }

    #[test]
    fn page_conflicts_with_offset() {
        let result = Cli::try_parse_from(["buddy", "query", "--page", "1", "--offset", "3"]);
        assert!(result.is_err());
    }

    #[test]
    fn find_splits_fields() {
        let cli = Cli::parse_from(["buddy", "--model", "AccessToken", "find", "7", "--fields", "name,token"]);
        let Commands::Find(args) = cli.command else {
            panic!("expected find");
        };
        assert_eq!(args.id, 7);
        assert_eq!(
            args.fields,
            Some(vec!["name".to_string(), "token".to_string()])
        );
        assert_eq!(cli.global.model, "AccessToken");
    }

    #[test]
    fn create_requires_set() {
        assert!(Cli::try_parse_from(["buddy", "create"]).is_err());
    }

    #[test]
    fn explain_parses_dialect() {
        let cli = Cli::parse_from(["buddy", "explain", "--dialect", "pg"]);
        let Commands::Explain(args) = cli.command else {
            panic!("expected explain");
        };
        assert_eq!(args.dialect, Some(Dialect::Postgres));
    }
}
