use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::file_store::{self, FileStore, STORE_DIR};

pub fn cmd_init(args: InitArgs, dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match dir {
        Some(d) => std::fs::canonicalize(d)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", d, e))?,
        None => std::env::current_dir()?,
    };

    // Nested inside another notes directory
    if !args.force
        && let Some(parent) = root.parent()
        && let Ok(parent_root) = file_store::discover_root(parent)
    {
        eprintln!(
            "Note: notes already exist at {}/",
            parent_root.join(STORE_DIR).display()
        );
        eprintln!("Creating a separate store in ./{}/", STORE_DIR);
    }

    let store = FileStore::init(&root, args.force)?;
    println!("Initialized {}", display_relative(store.dir(), &root));
    Ok(())
}

fn display_relative(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => format!("./{}/", rel.display()),
        Err(_) => format!("{}/", path.display()),
    }
}
