use flix::app::store::SqliteStore;
use flix::config::load_config;
use std::env;
use std::fs::File;
use std::io::Write;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: cargo run --bin store_explorer [movie|tv] [--out file]");
        std::process::exit(1);
    }

    let scope: Option<&str> = args
        .get(1)
        .map(String::as_str)
        .filter(|a| !a.starts_with("--"));

    let out_file: Option<String> = args
        .iter()
        .position(|a| a == "--out")
        .and_then(|i| args.get(i + 1).cloned());

    let cfg = load_config();
    println!("Opening store: {}", cfg.store_path.display());
    let store = SqliteStore::open(&cfg.store_path)?;

    let mut output = String::new();
    output.push_str(&format!("--- Scope: {} ---\n", scope.unwrap_or("all")));
    for entry in store.entries(scope)? {
        let stamp = chrono::DateTime::from_timestamp(entry.updated_at, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| entry.updated_at.to_string());
        output.push_str(&format!(
            "{}/{} [{}]\n  {}\n",
            entry.scope, entry.key, stamp, entry.value
        ));
    }

    if let Some(path) = out_file {
        File::create(&path)?.write_all(output.as_bytes())?;
        println!("Exported results to {}", path);
    } else {
        print!("{}", output);
    }

    Ok(())
}
