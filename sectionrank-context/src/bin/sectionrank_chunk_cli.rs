use clap::Parser;
use sectionrank_context::{ChunkingConfig, SectionChunker, split_pages};
use std::fs;
use std::io::{self, Read};

/// A CLI tool to chunk extracted page text into JSON sections.
///
/// Pages are separated by form feed characters, as written by `pdftotext`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input text file. If not provided, reads from stdin.
    #[arg(short, long)]
    input: Option<String>,

    /// Document id used as the prefix of every section id.
    #[arg(short, long, default_value = "document")]
    doc_id: String,

    /// Words per window.
    #[arg(short, long, default_value_t = 300)]
    target_words: usize,

    /// Words shared by consecutive windows.
    #[arg(short, long, default_value_t = 120)]
    overlap_words: usize,

    /// Windows shorter than this many characters are dropped.
    #[arg(short, long, default_value_t = 160)]
    min_chunk_chars: usize,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let text = if let Some(input_path) = args.input {
        fs::read_to_string(input_path)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let config = ChunkingConfig::default()
        .with_target_words(args.target_words)
        .with_overlap_words(args.overlap_words)
        .with_min_chunk_chars(args.min_chunk_chars);
    let chunker = SectionChunker::new(config);

    let sections = chunker.chunk(&args.doc_id, &split_pages(&text));

    let json_output = serde_json::to_string_pretty(&sections)?;
    println!("{}", json_output);

    Ok(())
}
