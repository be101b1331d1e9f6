use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use notestore::{Config, FileAdapter, Note, NotesStore, PersistenceHealth, SortOrder};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "notestore")]
#[command(about = "NoteStore CLI - Create, edit, search and sort short text notes")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the store directory (default: from config, else the user data directory)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a note
    Create {
        #[arg(short, long, default_value = "")]
        title: String,
        #[arg(short = 'b', long, default_value = "")]
        content: String,
    },

    /// Edit a note; fields left out keep their current value
    Update {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short = 'b', long)]
        content: Option<String>,
    },

    /// Delete a note
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show one note
    Show { id: String },

    /// List notes, optionally filtered by title
    List {
        #[arg(short = 'q', long, default_value = "")]
        search: String,
        #[arg(long)]
        sort: Option<SortOrder>,
    },

    /// Print the number of notes
    Count,
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.store_path.is_some() {
        config.store_path = cli.store_path;
    }

    // Open store
    let adapter = FileAdapter::open(config.resolve_store_path())?;
    let mut store = NotesStore::open(adapter);

    match cli.command {
        Commands::Create { title, content } => {
            let (title, content) = prepare_input(&title, &content)?;
            let note = store.create(title, content);
            println!("{} {}", "Created".green(), note.id());
        }
        Commands::Update { id, title, content } => {
            let current = store.get(&id).ok_or_else(|| eyre!("Note not found: {}", id))?;
            let (title, content) = merge_edit(current, title.as_deref(), content.as_deref())?;
            let note = store
                .update(&id, title, content)
                .ok_or_else(|| eyre!("Note not found: {}", id))?;
            println!("{} {}", "Updated".green(), note.id());
        }
        Commands::Delete { id, yes } => {
            let title = store.get(&id).map(|n| n.title().to_string());
            if title.is_none() {
                return Err(eyre!("Note not found: {}", id));
            }

            let stdin = io::stdin();
            if yes || confirm_delete(title.as_deref(), &mut stdin.lock(), &mut io::stdout())? {
                store.delete(&id);
                println!("{} {}", "Deleted".green(), id);
            } else {
                println!("Cancelled");
            }
        }
        Commands::Show { id } => {
            let note = store.get(&id).ok_or_else(|| eyre!("Note not found: {}", id))?;
            print_note(note);
        }
        Commands::List { search, sort } => {
            store.set_search_term(search);
            store.set_sort_order(sort.unwrap_or(config.default_sort));

            let notes = store.filtered_and_sorted();
            if notes.is_empty() {
                println!("No notes");
            }
            for note in notes {
                print_summary(note);
            }
        }
        Commands::Count => {
            println!("{}", store.count());
        }
    }

    if let PersistenceHealth::Degraded { operation, message } = store.health() {
        eprintln!("{} {} failed: {}", "warning:".yellow().bold(), operation, message);
    }

    Ok(())
}

/// Trim both fields; at least one must have content
fn prepare_input(title: &str, content: &str) -> Result<(String, String)> {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() && content.is_empty() {
        return Err(eyre!("A note needs a title or some content"));
    }
    Ok((title.to_string(), content.to_string()))
}

/// Start from the note's current fields and replace only the ones given
fn merge_edit(current: &Note, title: Option<&str>, content: Option<&str>) -> Result<(String, String)> {
    prepare_input(title.unwrap_or(current.title()), content.unwrap_or(current.content()))
}

/// Ask before deleting; only `y` or `yes` confirms
fn confirm_delete<R: BufRead, W: Write>(title: Option<&str>, input: &mut R, output: &mut W) -> Result<bool> {
    let name = match title {
        Some(t) if !t.trim().is_empty() => t,
        _ => "this item",
    };
    write!(output, "Are you sure you want to delete {}? [y/N] ", name)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_summary(note: &Note) {
    let title = if note.title().is_empty() { "(untitled)" } else { note.title() };
    let preview: String = note.content().chars().take(60).collect();
    println!(
        "{}  {}  {}",
        note.id().dimmed(),
        note.created_at().format("%Y-%m-%d %H:%M"),
        title.bold()
    );
    if !preview.is_empty() {
        println!("    {}", preview);
    }
}

fn print_note(note: &Note) {
    println!("{}", note.title().bold());
    println!("{} {}", "id:".dimmed(), note.id());
    println!("{} {}", "created:".dimmed(), note.created_at().to_rfc3339());
    println!("{} {}", "updated:".dimmed(), note.updated_at().to_rfc3339());
    println!();
    println!("{}", note.content());
}

#[cfg(test)]
mod tests {
    use super::*;
    use notestore::MemoryAdapter;

    #[test]
    fn test_prepare_input_trims() {
        let (title, content) = prepare_input("  Title  ", "\n body \n").unwrap();
        assert_eq!(title, "Title");
        assert_eq!(content, "body");

        let (title, content) = prepare_input("", " only content ").unwrap();
        assert_eq!(title, "");
        assert_eq!(content, "only content");
    }

    #[test]
    fn test_prepare_input_rejects_blank() {
        assert!(prepare_input("   ", "\t").is_err());
    }

    fn stored_note(title: &str, content: &str) -> Note {
        let mut store = NotesStore::open(MemoryAdapter::new());
        store.create(title, content)
    }

    #[test]
    fn test_merge_edit_title_only_keeps_content() {
        let note = stored_note("Groceries", "milk, eggs");

        let (title, content) = merge_edit(&note, Some("Shopping"), None).unwrap();
        assert_eq!(title, "Shopping");
        assert_eq!(content, "milk, eggs");
    }

    #[test]
    fn test_merge_edit_content_only_keeps_title() {
        let note = stored_note("Groceries", "milk, eggs");

        let (title, content) = merge_edit(&note, None, Some("  bread  ")).unwrap();
        assert_eq!(title, "Groceries");
        assert_eq!(content, "bread");
    }

    #[test]
    fn test_merge_edit_can_clear_a_field_explicitly() {
        let note = stored_note("Groceries", "milk, eggs");

        let (title, content) = merge_edit(&note, None, Some("")).unwrap();
        assert_eq!(title, "Groceries");
        assert_eq!(content, "");

        assert!(merge_edit(&note, Some(" "), Some("")).is_err());
    }

    #[test]
    fn test_update_through_store_keeps_unedited_field() {
        let mut store = NotesStore::open(MemoryAdapter::new());
        let note = store.create("Groceries", "milk, eggs");

        let (title, content) = merge_edit(store.get(note.id()).unwrap(), Some("Shopping"), None).unwrap();
        let updated = store.update(note.id(), title, content).unwrap();

        assert_eq!(updated.title(), "Shopping");
        assert_eq!(updated.content(), "milk, eggs");
    }

    #[test]
    fn test_confirm_delete() {
        let mut out = Vec::new();
        assert!(confirm_delete(Some("Groceries"), &mut "yes\n".as_bytes(), &mut out).unwrap());
        let prompt = String::from_utf8(out).unwrap();
        assert!(prompt.contains("Are you sure you want to delete Groceries?"));

        let mut out = Vec::new();
        assert!(!confirm_delete(None, &mut "\n".as_bytes(), &mut out).unwrap());
        assert!(String::from_utf8(out).unwrap().contains("delete this item?"));

        let mut out = Vec::new();
        assert!(confirm_delete(Some(""), &mut "Y\n".as_bytes(), &mut out).unwrap());
    }
}
