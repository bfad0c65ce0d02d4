// src/main.rs

use docshelf::*;
use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: docshelf <command> [args]

Commands:
  tree                          Show the folder tree
  add <path> [folder]           Add a file (default folder: unfiled)
  open <path>                   Record that a file was opened
  recent [limit]                Recently opened files
  mkdir <name> [parent]         Create a folder (default parent: root)
  rename-folder <id> <name>     Rename a folder
  mv-folder <id> <parent>       Move a folder
  rm-folder <id>                Delete a folder, its files go to unfiled
  mv <path> <folder>            Move a file
  rm <path>                     Forget a file
  trash <path>                  Move a file to the trash
  empty-trash                   Drop everything in the trash
  tag <path> <tag> [color]      Tag a file
  untag <path> <tag>            Remove a tag from a file
  tags                          List every tag name
  search <query>                Search file names and tags
  import <dir> [parent]         Import a directory tree

Environment:
  DOCSHELF_DB                   Library database (default: data dir)
  RUST_LOG                      Log filter (default: info)";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        return Ok(());
    };
    if matches!(command, "-h" | "--help" | "help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = LibraryConfig::from_env()?;
    tracing::debug!("Library database: {}", config.db_path.display());
    let mut librarian = Librarian::from_config(&config)
        .with_context(|| format!("opening library at {}", config.db_path.display()))?;

    let argv: &[String] = &args;
    let arg = move |i: usize, what: &str| required(argv, i, what);
    let opt = move |i: usize| argv.get(i).map(String::as_str);

    match command {
        "tree" => print_tree(librarian.library(), ROOT_ID, 0),
        "add" => {
            let path = arg(1, "path")?;
            let entry = librarian.add_file(path, "", opt(2))?;
            println!("{} -> {}", entry.path, entry.folder);
        }
        "open" => librarian.update_last_opened(arg(1, "path")?),
        "recent" => {
            let limit = opt(1).map(str::parse::<usize>).transpose().context("limit must be a number")?.unwrap_or(10);
            for entry in librarian.recent_files(limit) {
                println!("{}\t{}", entry.last_opened.unwrap_or(0), entry.path);
            }
        }
        "mkdir" => {
            let folder = librarian.create_folder(arg(1, "name")?, opt(2).unwrap_or(ROOT_ID), DEFAULT_FOLDER_ICON)?;
            println!("{}", folder.id);
        }
        "rename-folder" => report(librarian.rename_folder(arg(1, "id")?, arg(2, "name")?), "no such folder")?,
        "mv-folder" => report(librarian.move_folder(arg(1, "id")?, arg(2, "parent")?), "move rejected")?,
        "rm-folder" => report(librarian.delete_folder(arg(1, "id")?), "folder cannot be deleted")?,
        "mv" => report(librarian.move_file_to_folder(arg(1, "path")?, arg(2, "folder")?), "unknown file or folder")?,
        "rm" => report(librarian.remove_file(arg(1, "path")?), "unknown file")?,
        "trash" => report(librarian.move_to_trash(arg(1, "path")?), "unknown file")?,
        "empty-trash" => {
            let result = librarian.empty_trash();
            println!("deleted {}", result.deleted);
            for error in &result.errors {
                eprintln!("  {}: {}", error.path, error.reason);
            }
        }
        "tag" => {
            let color = match opt(3) {
                Some(name) => TagColor::parse(name).with_context(|| format!("unknown color '{}'", name))?,
                None => TagColor::default(),
            };
            report(librarian.add_tag(TagOwner::File(arg(1, "path")?), arg(2, "tag")?, color), "tag not added")?
        }
        "untag" => report(librarian.remove_tag(TagOwner::File(arg(1, "path")?), arg(2, "tag")?), "tag not found")?,
        "tags" => {
            for name in librarian.vocabulary(VocabularyScope::All) {
                println!("{}", name);
            }
        }
        "search" => {
            for entry in librarian.search_files(arg(1, "query")?) {
                println!("{}\t{}", entry.name, entry.path);
            }
        }
        "import" => {
            let dir = Path::new(arg(1, "dir")?);
            let descriptors = Importer::descriptors_from_dir(dir)?;
            let root_name = dir.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("Import");
            let result = librarian.import_folder(root_name, &descriptors, opt(2).unwrap_or(ROOT_ID))?;
            println!(
                "imported {} file(s) into {} ({} folder(s) created, {} skipped)",
                result.files_imported, result.root_folder_id, result.folders_created, result.files_skipped
            );
            for skipped in &result.skipped {
                eprintln!("  {}: {}", skipped.file_path, skipped.reason);
            }
        }
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }

    Ok(())
}

fn required<'a>(args: &'a [String], i: usize, what: &str) -> Result<&'a str> {
    match args.get(i) {
        Some(value) => Ok(value.as_str()),
        None => bail!("missing <{}>\n\n{}", what, USAGE),
    }
}

fn report(ok: bool, failure: &str) -> Result<()> {
    if !ok {
        bail!("{}", failure);
    }
    Ok(())
}

fn print_tree(library: &Library, id: &str, depth: usize) {
    let Some(folder) = library.folder(id) else {
        return;
    };
    let marker = if folder.tags.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = folder.tags.iter().map(|t| t.name.as_str()).collect();
        format!(" [{}]", names.join(", "))
    };
    println!("{}{} {} ({}, {} file(s)){}", "  ".repeat(depth), folder.icon, folder.name, folder.id, folder.files.len(), marker);
    for child in &folder.children {
        print_tree(library, child, depth + 1);
    }
}
