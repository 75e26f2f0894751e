mod init;
mod watch;
pub use init::cmd_init;
pub use watch::cmd_watch;

use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::file_store::{self, FileStore};
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::io::store::NoteStore;
use crate::model::config::StickiesConfig;
use crate::model::note::{NoteColor, Notes};
use crate::ops::{badge, transfer};
use crate::sync::{SyncInstance, SystemClock};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let workspace = Workspace::open(cli.project_dir.as_deref())?;

    match cli.command {
        None | Some(Commands::List) => cmd_list(&workspace, json),
        Some(cmd) => match cmd {
            // Init is handled in main.rs before store discovery
            Commands::Init(args) => cmd_init(args, cli.project_dir.as_deref()),

            // Read commands
            Commands::List => cmd_list(&workspace, json),
            Commands::Show(args) => cmd_show(&workspace, args, json),
            Commands::Count => cmd_count(&workspace, json),
            Commands::Export(args) => cmd_export(&workspace, args),
            Commands::Recovery(args) => cmd_recovery(&workspace, args, json),
            Commands::Config(args) => cmd_config(&workspace, args),

            // Write commands
            Commands::New(args) => cmd_new(&workspace, args, json),
            Commands::Edit(args) => cmd_edit(&workspace, args),
            Commands::Move(args) => cmd_move(&workspace, args),
            Commands::Resize(args) => cmd_resize(&workspace, args),
            Commands::Color(args) => cmd_color(&workspace, args),
            Commands::Minimize(args) => cmd_minimize(&workspace, args),
            Commands::Raise(args) => cmd_raise(&workspace, args),
            Commands::Rm(args) => cmd_rm(&workspace, args),
            Commands::Import(args) => cmd_import(&workspace, args),
            Commands::Clear(args) => cmd_clear(&workspace, args),

            Commands::Watch(args) => cmd_watch(&workspace, args, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The notes directory this invocation works against
pub struct Workspace {
    pub store: FileStore,
    pub config: StickiesConfig,
}

impl Workspace {
    fn open(project_dir: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let start = match project_dir {
            Some(dir) => std::fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
            None => std::env::current_dir()?,
        };
        let root = file_store::discover_root(&start)?;
        let store = FileStore::open(&root)?;
        let config = config_io::read_config(store.dir())?;
        let store = store.with_quota(config.store.quota_bytes);
        Ok(Workspace { store, config })
    }

    fn dir(&self) -> &Path {
        self.store.dir()
    }

    /// An instance over this store that has not read it yet
    fn unloaded_instance(&self) -> SyncInstance<FileStore, SystemClock> {
        let display = &self.config.display;
        SyncInstance::new(self.store.clone(), SystemClock, &self.config.sync)
            .with_viewport(display.viewport_width, display.viewport_height)
    }

    /// A loaded, short-lived instance for one local mutation
    fn instance(&self) -> Result<SyncInstance<FileStore, SystemClock>, Box<dyn std::error::Error>> {
        let mut instance = self.unloaded_instance();
        instance.load()?;
        Ok(instance)
    }

    fn viewport_width(&self, arg: Option<i64>) -> i64 {
        arg.unwrap_or(self.config.display.viewport_width)
    }
}

fn parse_color(s: &str) -> Result<NoteColor, Box<dyn std::error::Error>> {
    s.parse::<NoteColor>().map_err(Into::into)
}

fn snapshot_body(notes: &Notes) -> String {
    serde_json::to_string_pretty(notes).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_list(ws: &Workspace, json: bool) -> CmdResult {
    let notes = ws.store.get_all()?;
    if json {
        let items: Vec<NoteJson> = notes
            .iter()
            .map(|(id, note)| NoteJson { id, note })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    if notes.is_empty() {
        println!("No notes. Create one with `stk new`.");
        return Ok(());
    }
    for (id, note) in &notes {
        println!("{}", format_note_line(id, note));
    }
    Ok(())
}

fn cmd_show(ws: &Workspace, args: IdArgs, json: bool) -> CmdResult {
    let notes = ws.store.get_all()?;
    let note = notes
        .get(&args.id)
        .ok_or_else(|| format!("note not found: {}", args.id))?;
    if json {
        let item = NoteJson { id: &args.id, note };
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        for line in format_note_detail(&args.id, note) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_count(ws: &Workspace, json: bool) -> CmdResult {
    let count = ws.store.get_all()?.len();
    if json {
        let badge = badge::badge_text(count, ws.config.display.show_badge_count);
        let count_json = CountJson {
            count,
            badge,
            badge_color: badge::BADGE_COLOR,
        };
        println!("{}", serde_json::to_string(&count_json)?);
    } else {
        println!("{}", count);
    }
    Ok(())
}

fn cmd_export(ws: &Workspace, args: ExportArgs) -> CmdResult {
    let notes = ws.store.get_all()?;
    let text = transfer::export_notes(&notes)?;
    let filename = transfer::backup_filename(chrono::Utc::now());
    let path: PathBuf = match args.path {
        Some(p) if p.is_dir() => p.join(filename),
        Some(p) => p,
        None => std::env::current_dir()?.join(filename),
    };
    std::fs::write(&path, text + "\n")?;
    println!("Exported {} notes to {}", notes.len(), path.display());
    Ok(())
}

fn cmd_recovery(ws: &Workspace, args: RecoveryArgs, json: bool) -> CmdResult {
    if args.clear {
        let removed = recovery::clear_recovery(ws.dir())?;
        println!("Cleared {} recovery entries", removed);
        return Ok(());
    }
    let entries = recovery::read_recovery_entries(ws.dir(), Some(args.limit));
    if json {
        let items: Vec<RecoveryEntryJson> = entries.iter().map(recovery_entry_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("Recovery log is empty");
        return Ok(());
    }
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            println!();
        }
        for line in format_recovery_entry(entry) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_config(ws: &Workspace, args: ConfigCmd) -> CmdResult {
    match args.action {
        ConfigAction::Get { key } => {
            println!("{}", config_io::get_value(&ws.config, &key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut doc = config_io::read_config_doc(ws.dir())?;
            config_io::set_value(&mut doc, &key, &value)?;
            config_io::write_config(ws.dir(), &doc)?;
            tracing::info!(key = %key, value = %value, "config updated");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_new(ws: &Workspace, args: NewArgs, json: bool) -> CmdResult {
    let color = args.color.as_deref().map(parse_color).transpose()?;
    let mut instance = ws.instance()?;
    let id = instance.create_note(ws.viewport_width(args.viewport_width))?;

    if let Some(content) = &args.content {
        instance.update_content(&id, content)?;
    }
    if let Some(color) = color {
        instance.set_color(&id, color)?;
    }
    instance.flush()?;

    if json {
        let note = instance.note(&id).ok_or("created note vanished")?;
        let created = CreatedJson {
            left: note.left_px(instance.viewport().0),
            top: note.top_px(),
            id,
        };
        println!("{}", serde_json::to_string(&created)?);
    } else {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_edit(ws: &Workspace, args: EditArgs) -> CmdResult {
    let mut instance = ws.instance()?;
    instance.update_content(&args.id, &args.text)?;
    instance.flush()?;
    Ok(())
}

fn cmd_move(ws: &Workspace, args: MoveArgs) -> CmdResult {
    let mut instance = ws.instance()?;
    let vw = ws.viewport_width(args.viewport_width);
    instance.update_position(&args.id, args.left, args.top, vw)?;
    instance.flush()?;
    Ok(())
}

fn cmd_resize(ws: &Workspace, args: ResizeArgs) -> CmdResult {
    let mut instance = ws.instance()?;
    instance.resize(&args.id, args.width, args.height)?;
    instance.flush()?;
    Ok(())
}

fn cmd_color(ws: &Workspace, args: ColorArgs) -> CmdResult {
    let color = parse_color(&args.color)?;
    let mut instance = ws.instance()?;
    instance.set_color(&args.id, color)?;
    instance.flush()?;
    Ok(())
}

fn cmd_minimize(ws: &Workspace, args: IdArgs) -> CmdResult {
    let mut instance = ws.instance()?;
    let minimized = instance.toggle_minimize(&args.id)?;
    instance.flush()?;
    println!("{}", if minimized { "minimized" } else { "expanded" });
    Ok(())
}

fn cmd_raise(ws: &Workspace, args: IdArgs) -> CmdResult {
    let mut instance = ws.instance()?;
    let z = instance.bring_to_front(&args.id)?;
    instance.flush()?;
    println!("{}", z);
    Ok(())
}

fn cmd_rm(ws: &Workspace, args: IdArgs) -> CmdResult {
    let mut instance = ws.instance()?;
    instance.delete_note(&args.id)?;
    Ok(())
}

fn cmd_import(ws: &Workspace, args: ImportArgs) -> CmdResult {
    let text = std::fs::read_to_string(&args.path)
        .map_err(|e| format!("could not read {}: {}", args.path.display(), e))?;
    let (notes, dropped) = transfer::import_notes(&text)?;
    if !dropped.is_empty() {
        eprintln!("Skipped {} malformed notes: {}", dropped.len(), dropped.join(", "));
    }

    let mut instance = ws.instance()?;
    if !instance.notes().is_empty() {
        recovery::log_recovery(
            ws.dir(),
            RecoveryEntry::now(
                RecoveryCategory::Import,
                format!("replaced {} notes", instance.notes().len()),
                snapshot_body(instance.notes()),
            ),
        );
    }
    let count = notes.len();
    instance.replace_all(notes)?;
    println!("Imported {} notes", count);
    Ok(())
}

fn cmd_clear(ws: &Workspace, args: ClearArgs) -> CmdResult {
    if !args.yes {
        return Err("refusing to delete every note without --yes".into());
    }
    let mut instance = ws.instance()?;
    if instance.notes().is_empty() {
        return Err(transfer::TransferError::Empty("delete").into());
    }
    let count = instance.notes().len();
    recovery::log_recovery(
        ws.dir(),
        RecoveryEntry::now(
            RecoveryCategory::Clear,
            format!("deleted {} notes", count),
            snapshot_body(instance.notes()),
        ),
    );
    instance.replace_all(Notes::new())?;
    println!("Deleted {} notes", count);
    Ok(())
}
