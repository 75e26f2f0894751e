use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stk", about = concat!("stickies v", env!("CARGO_PKG_VERSION"), " - sticky notes shared between every open instance"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different notes directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub project_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create .stickies/ in the current directory
    Init(InitArgs),
    /// Create a note at the next free spot
    New(NewArgs),
    /// List notes (default when no command is given)
    List,
    /// Show one note in full
    Show(IdArgs),
    /// Replace a note's text
    Edit(EditArgs),
    /// Move a note to a page offset
    Move(MoveArgs),
    /// Resize a note (minimum 150x100)
    Resize(ResizeArgs),
    /// Set a note's background color
    Color(ColorArgs),
    /// Toggle a note between minimized and expanded
    Minimize(IdArgs),
    /// Bring a note to the front
    Raise(IdArgs),
    /// Delete a note
    Rm(IdArgs),
    /// Print the note count shown on the badge
    Count,
    /// Write all notes to a backup file
    Export(ExportArgs),
    /// Replace all notes with the contents of a backup file
    Import(ImportArgs),
    /// Delete every note
    Clear(ClearArgs),
    /// Run an instance that follows changes from other instances
    Watch(WatchArgs),
    /// Read or change .stickies/config.toml
    Config(ConfigCmd),
    /// View or clear the recovery log
    Recovery(RecoveryArgs),
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Repair an existing .stickies/ (notes are kept)
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Note commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdArgs {
    /// Note ID
    pub id: String,
}

#[derive(Args)]
pub struct NewArgs {
    /// Initial text
    #[arg(long)]
    pub content: Option<String>,
    /// Background color (yellow, green, blue, red, gray)
    #[arg(long)]
    pub color: Option<String>,
    /// Viewport width used for placement (default: display.viewport_width)
    #[arg(long)]
    pub viewport_width: Option<i64>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Note ID
    pub id: String,
    /// New text (markdown)
    pub text: String,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Note ID
    pub id: String,
    /// Left offset in pixels
    #[arg(allow_negative_numbers = true)]
    pub left: i64,
    /// Top offset in pixels
    #[arg(allow_negative_numbers = true)]
    pub top: i64,
    /// Viewport width used to pick the anchoring edge (default: display.viewport_width)
    #[arg(long)]
    pub viewport_width: Option<i64>,
}

#[derive(Args)]
pub struct ResizeArgs {
    /// Note ID
    pub id: String,
    /// Width in pixels
    pub width: i64,
    /// Height in pixels
    pub height: i64,
}

#[derive(Args)]
pub struct ColorArgs {
    /// Note ID
    pub id: String,
    /// yellow, green, blue, red or gray
    pub color: String,
}

// ---------------------------------------------------------------------------
// Backup commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ExportArgs {
    /// Output file or directory (default: a timestamped file in the current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Backup file to import
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Confirm deleting every note
    #[arg(long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Watch
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct WatchArgs {
    /// Viewport as WIDTHxHEIGHT (default: from config)
    #[arg(long)]
    pub viewport: Option<String>,
    /// Milliseconds between sync steps
    #[arg(long, default_value_t = 100)]
    pub interval: u64,
}

// ---------------------------------------------------------------------------
// Config and recovery
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a setting, e.g. `sync.editing_timeout_ms`
    Get {
        key: String,
    },
    /// Change a setting in place, keeping comments
    Set {
        key: String,
        value: String,
    },
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
    /// Delete the log
    #[arg(long)]
    pub clear: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_negative_move_offsets() {
        let cli = Cli::try_parse_from(["stk", "move", "17", "-20", "40"]).unwrap();
        match cli.command {
            Some(Commands::Move(args)) => {
                assert_eq!(args.id, "17");
                assert_eq!(args.left, -20);
                assert_eq!(args.top, 40);
            }
            _ => panic!("expected move"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["stk", "list", "--json", "-C", "/tmp/x"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.project_dir.as_deref(), Some("/tmp/x"));
    }

    #[test]
    fn no_command_is_allowed() {
        let cli = Cli::try_parse_from(["stk"]).unwrap();
        assert!(cli.command.is_none());
    }
}
