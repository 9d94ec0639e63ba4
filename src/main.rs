use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::fs;
use std::path::PathBuf;
use todotree::{Persister, SqliteBlobStore, StoreError, Task, TaskId, TaskStore, export, import};

#[derive(Parser)]
#[command(name = "todotree")]
#[command(about = "Hierarchical todo list with soft delete and JSON backup")]
#[command(version)]
struct Cli {
    /// Directory holding the task database (default: platform data dir)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new top-level task
    Add { title: String },

    /// Add a child task under an existing task
    AddChild { parent_id: TaskId },

    /// Rename a task
    Rename { id: TaskId, title: String },

    /// Toggle a task's completion flag
    Done { id: TaskId },

    /// Soft-delete a task (children are kept)
    Delete { id: TaskId },

    /// Restore a soft-deleted task
    Restore { id: TaskId },

    /// Move a root task to another root task's position
    Move { moved_id: TaskId, target_id: TaskId },

    /// Print the task tree
    List {
        /// Include soft-deleted tasks
        #[arg(long)]
        all: bool,
    },

    /// List soft-deleted tasks across the whole tree
    Trash,

    /// Write a JSON backup file (default name: todos-YYYY-MM-DD.json)
    Export { path: Option<PathBuf> },

    /// Replace the whole collection from a JSON backup file
    Import { path: PathBuf },
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .ok_or_else(|| eyre!("No platform data directory available"))?
            .join("todotree"),
    };

    let mut persister = Persister::new(SqliteBlobStore::open(&data_dir)?);
    let mut store = TaskStore::new(persister.load()?);

    match cli.command {
        Commands::Add { title } => match store.add_root(&title) {
            Ok(id) => {
                persister.save(store.tasks())?;
                println!("Added task {id}");
            }
            Err(e) => report_noop(e),
        },
        Commands::AddChild { parent_id } => match store.add_child(parent_id) {
            Ok(id) => {
                persister.save(store.tasks())?;
                println!("Added task {id} under {parent_id}");
            }
            Err(e) => report_noop(e),
        },
        Commands::Rename { id, title } => match store.rename(id, &title) {
            Ok(()) => {
                persister.save(store.tasks())?;
                println!("Renamed task {id}");
            }
            Err(e) => report_noop(e),
        },
        Commands::Done { id } => match store.toggle_done(id) {
            Ok(()) => {
                persister.save(store.tasks())?;
                let task = store.get(id).ok_or_else(|| eyre!("task {id} vanished"))?;
                let state = if task.is_done { "done" } else { "not done" };
                println!("Task {id} is now {state}");
            }
            Err(e) => report_noop(e),
        },
        Commands::Delete { id } => match store.soft_delete(id) {
            Ok(()) => {
                persister.save(store.tasks())?;
                println!("Deleted task {id} (restore with `todotree restore {id}`)");
            }
            Err(e) => report_noop(e),
        },
        Commands::Restore { id } => match store.restore(id) {
            Ok(()) => {
                persister.save(store.tasks())?;
                println!("Restored task {id}");
            }
            Err(e) => report_noop(e),
        },
        Commands::Move {
            moved_id,
            target_id,
        } => match store.reorder_roots(moved_id, target_id) {
            Ok(()) => {
                persister.save(store.tasks())?;
                println!("Moved task {moved_id}");
            }
            Err(e) => report_noop(e),
        },
        Commands::List { all } => {
            for root in store.roots() {
                if root.is_deleted && !all {
                    continue;
                }
                print_subtree(&store, root, 0, all);
            }
        }
        Commands::Trash => {
            let deleted = store.deleted_tasks();
            if deleted.is_empty() {
                println!("Trash is empty");
            }
            for task in deleted {
                println!("{:>4}  {}", task.id, task.title.dimmed());
            }
        }
        Commands::Export { path } => {
            let payload = export(store.tasks())?;
            let path = path.unwrap_or_else(|| PathBuf::from(&payload.file_name));
            fs::write(&path, payload.json)?;
            println!("Exported {} tasks to {}", store.len(), path.display());
        }
        Commands::Import { path } => {
            let contents = fs::read_to_string(&path)?;
            match import(&contents) {
                Ok(tasks) => {
                    store.replace_all(tasks);
                    persister.save(store.tasks())?;
                    println!("Imported {} tasks from {}", store.len(), path.display());
                }
                // The prior collection stays in place on any import failure.
                Err(e) => eprintln!("{} {e}", "Import failed:".red()),
            }
        }
    }

    Ok(())
}

/// Store errors are recoverable no-ops; tell the user and leave state alone.
fn report_noop(e: StoreError) {
    eprintln!("{} {e}", "Nothing changed:".yellow());
}

fn print_subtree(store: &TaskStore, task: &Task, depth: usize, include_deleted: bool) {
    let indent = "  ".repeat(depth);
    let check = if task.is_done {
        "[x]".green().to_string()
    } else {
        "[ ]".to_string()
    };
    let title = if task.is_deleted {
        task.title.dimmed().strikethrough().to_string()
    } else {
        task.title.clone()
    };
    println!("{indent}{check} {:>4}  {title}", task.id);

    for child in store.children(task.id) {
        if child.is_deleted && !include_deleted {
            continue;
        }
        print_subtree(store, child, depth + 1, include_deleted);
    }
}
