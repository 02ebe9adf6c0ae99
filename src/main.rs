use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::process;

use stardict::StarDict;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage: {} <path-to-ifo-file> [--lookup WORD] [--pattern REGEX] [--syns WORD] \
             [--ignore-case] [--ignore-diacritics] [--export-json FILE]",
            args[0]
        );
        process::exit(1);
    }

    let ifo_path = &args[1];
    let flag_value = |name: &str| {
        args.iter()
            .position(|arg| arg == name)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };
    let ignore_case = args.iter().any(|arg| arg == "--ignore-case");
    let ignore_diacritics = args.iter().any(|arg| arg == "--ignore-diacritics");

    println!("Reading StarDict dictionary: {}", ifo_path);
    println!("{}", "=".repeat(60));

    let mut dict = match StarDict::open(ifo_path) {
        Ok(dict) => dict,
        Err(e) => {
            eprintln!("\nERROR: Failed to open dictionary");
            eprintln!("  {}", e);
            process::exit(1);
        }
    };

    println!("\nDictionary Information:");
    if let Some(name) = &dict.metadata.book_name {
        println!("  Book name: {}", name);
    }
    println!("  Word count: {}", dict.metadata.word_count);
    if let Some(syn_count) = dict.metadata.syn_word_count {
        println!("  Synonym count: {}", syn_count);
    }
    if let Some(author) = &dict.metadata.author {
        println!("  Author: {}", author);
    }
    if let Some(description) = &dict.metadata.description {
        println!("  Description: {}", description);
    }

    println!("\nSample headwords (first 10):");
    for (i, word) in dict.all_words().take(10).enumerate() {
        println!("  {}. {}", i + 1, word);
    }
    if dict.entry_count() > 10 {
        println!("  ... and {} more", dict.entry_count() - 10);
    }

    if let Some(word) = flag_value("--lookup") {
        println!("\nLookup {:?}:", word);
        match dict.lookup(&word, ignore_case, ignore_diacritics) {
            Ok(results) if results.is_empty() => println!("  (no matches)"),
            Ok(results) => {
                for (word, definition) in results {
                    println!("  {}: {}", word, definition);
                }
            }
            Err(e) => eprintln!("  ERROR: {}", e),
        }
    }

    if let Some(pattern) = flag_value("--pattern") {
        println!("\nPattern search {:?}:", pattern);
        match dict.lookup_pattern(&pattern, ignore_case, ignore_diacritics, true) {
            Ok(results) if results.is_empty() => println!("  (no matches)"),
            Ok(results) => {
                for (word, definition) in results {
                    println!("  {}: {}", word, definition);
                }
            }
            Err(e) => eprintln!("  ERROR: {}", e),
        }
    }

    if let Some(word) = flag_value("--syns") {
        println!("\nSynonyms of {:?}:", word);
        let synonyms = dict.synonyms_of(&word);
        if synonyms.is_empty() {
            println!("  (none)");
        }
        for synonym in synonyms {
            println!("  {}", synonym);
        }
    }

    if let Some(path) = flag_value("--export-json") {
        println!("\nExporting to {}", path);
        let result = File::create(&path)
            .map_err(stardict::StarDictError::from)
            .and_then(|file| dict.export_json(BufWriter::new(file)));
        match result {
            Ok(()) => println!("Export complete."),
            Err(e) => {
                eprintln!("ERROR: Export failed: {}", e);
                process::exit(1);
            }
        }
    }
}
