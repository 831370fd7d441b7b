//! Interactive numbered menu over a [`VectorStore`].
//!
//! Store failures are printed and the menu carries on. End of input exits.

use std::io::{self, BufRead, Write};
use std::path::Path;

use super::{commands, VectorStore, DEFAULT_RESULTS};

const MENU: &str = "\n=== Vector Collection Manager ===
1. View Collections
2. Add a Collection
3. Delete a Collection
4. Insert Files into Collection
5. User Query
6. Exit";

pub async fn run_menu<R: BufRead, W: Write>(
    store: &dyn VectorStore,
    input: &mut R,
    out: &mut W,
) -> io::Result<()> {
    loop {
        writeln!(out, "{MENU}")?;
        let Some(choice) = prompt(input, out, "Enter your choice: ")? else {
            writeln!(out, "\nExiting...")?;
            return Ok(());
        };

        match choice.trim() {
            "1" => {
                if let Err(e) = commands::list(store, out).await {
                    writeln!(out, "Error listing collections: {e}")?;
                }
            }
            "2" => add_collection(store, input, out).await?,
            "3" => delete_collection(store, input, out).await?,
            "4" => insert_files(store, input, out).await?,
            "5" => user_query(store, input, out).await?,
            "6" => {
                writeln!(out, "Exiting...")?;
                return Ok(());
            }
            _ => writeln!(out, "Invalid choice. Please try again.")?,
        }
    }
}

async fn add_collection<R: BufRead, W: Write>(
    store: &dyn VectorStore,
    input: &mut R,
    out: &mut W,
) -> io::Result<()> {
    let Some(name) = prompt(input, out, "Enter collection name: ")? else {
        return Ok(());
    };
    if let Err(e) = commands::create(store, out, &name).await {
        writeln!(out, "Error creating collection: {e}")?;
    }
    Ok(())
}

async fn delete_collection<R: BufRead, W: Write>(
    store: &dyn VectorStore,
    input: &mut R,
    out: &mut W,
) -> io::Result<()> {
    let Some(name) = choose_collection(
        store,
        input,
        out,
        "No collections to delete.",
        "Enter the number of the collection to delete: ",
    )
    .await?
    else {
        return Ok(());
    };
    if let Err(e) = commands::delete(store, out, &name).await {
        writeln!(out, "Error deleting collection: {e}")?;
    }
    Ok(())
}

async fn insert_files<R: BufRead, W: Write>(
    store: &dyn VectorStore,
    input: &mut R,
    out: &mut W,
) -> io::Result<()> {
    let Some(name) = choose_collection(
        store,
        input,
        out,
        "No collections available. Please create a collection first.",
        "Enter the number of the collection to insert files into: ",
    )
    .await?
    else {
        return Ok(());
    };
    let Some(folder) = prompt(input, out, "Enter the path to the folder containing PDF files: ")? else {
        return Ok(());
    };
    if let Err(e) = commands::ingest(store, out, &name, Path::new(folder.trim())).await {
        writeln!(out, "Error inserting files: {e}")?;
    }
    Ok(())
}

async fn user_query<R: BufRead, W: Write>(
    store: &dyn VectorStore,
    input: &mut R,
    out: &mut W,
) -> io::Result<()> {
    let Some(name) = choose_collection(
        store,
        input,
        out,
        "No collections available. Please create a collection first.",
        "Enter the number of the collection to query: ",
    )
    .await?
    else {
        return Ok(());
    };
    let Some(query) = prompt(input, out, "Enter your query: ")? else {
        return Ok(());
    };
    if query.trim().is_empty() {
        writeln!(out, "Query cannot be empty.")?;
        return Ok(());
    }

    let count_prompt = format!("Enter number of results to return (default: {DEFAULT_RESULTS}): ");
    let n_results = prompt(input, out, &count_prompt)?
        .and_then(|n| n.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_RESULTS);

    if let Err(e) = commands::query(store, out, &name, &query, n_results).await {
        writeln!(out, "Error during query: {e}")?;
    }
    Ok(())
}

/// Lists collections and reads a 1-based selection. `None` when there is
/// nothing to choose or the input was not a valid choice.
async fn choose_collection<R: BufRead, W: Write>(
    store: &dyn VectorStore,
    input: &mut R,
    out: &mut W,
    empty_message: &str,
    question: &str,
) -> io::Result<Option<String>> {
    let mut names = match store.list_collections().await {
        Ok(names) => names,
        Err(e) => {
            writeln!(out, "Error listing collections: {e}")?;
            return Ok(None);
        }
    };
    if names.is_empty() {
        writeln!(out, "{empty_message}")?;
        return Ok(None);
    }

    writeln!(out, "Available Collections:")?;
    commands::write_numbered(out, &names)?;

    let Some(answer) = prompt(input, out, question)? else {
        return Ok(None);
    };
    let Ok(choice) = answer.trim().parse::<usize>() else {
        writeln!(out, "Please enter a valid number.")?;
        return Ok(None);
    };
    if !(1..=names.len()).contains(&choice) {
        writeln!(out, "Invalid choice.")?;
        return Ok(None);
    }
    Ok(Some(names.swap_remove(choice - 1)))
}

/// Prints `question` and reads one line without its newline. `None` at end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> io::Result<Option<String>> {
    write!(out, "{question}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
