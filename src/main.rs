//! `xmf-extract`: pull the MIDI sequence and DLS bank out of XMF containers.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use serde::Serialize;

use xmf_container::{
    collect, load_xmf_with, ContainerHeader, DeflateDecompressor, MetadataValue, Node, ParserConfig,
    SongInfo,
};

#[derive(Parser)]
#[command(name = "xmf-extract")]
#[command(about = "Extract embedded MIDI and DLS resources from XMF files")]
struct Args {
    /// XMF or Mobile XMF file to read
    input: PathBuf,

    /// Directory to write `<name>.mid` and `<name>.dls` into
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Print the node tree
    #[arg(long)]
    tree: bool,

    /// Print header and song info as JSON
    #[arg(long)]
    json: bool,

    /// Classify file nodes without a resource format by content signature
    #[arg(long)]
    sniff: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Report<'a> {
    file: String,
    header: &'a ContainerHeader,
    info: &'a SongInfo,
    sequence_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    instrument_bank_bytes: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let data =
        fs::read(&args.input).with_context(|| format!("failed to read {}", args.input.display()))?;

    let config = ParserConfig::default().with_sniffing(args.sniff);
    let decompressor = DeflateDecompressor::new(config.max_decoded_size);
    let file = load_xmf_with(&data, &config, &decompressor)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;

    if args.tree {
        print_tree(&file.root);
    }

    let song = collect(&file, &config)
        .with_context(|| format!("nothing to extract from {}", args.input.display()))?;

    if args.json {
        let report = Report {
            file: args.input.display().to_string(),
            header: &song.header,
            info: &song.info,
            sequence_bytes: song.sequence.len(),
            instrument_bank_bytes: song.instrument_bank.as_ref().map(Vec::len),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("XMF version: {}", song.header.version);
        if let Some(name) = &song.info.name {
            println!("Name:        {name}");
        }
        if let Some(copyright) = &song.info.copyright {
            println!("Copyright:   {copyright}");
        }
        if let Some(comment) = &song.info.comment {
            println!("Comment:     {comment}");
        }
        println!("MIDI:        {} bytes", song.sequence.len());
        match &song.instrument_bank {
            Some(bank) => println!("DLS:         {} bytes", bank.len()),
            None => println!("DLS:         none"),
        }
    }

    if let Some(dir) = &args.out_dir {
        let stem = args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "xmf".to_string());
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        write_output(dir, &format!("{stem}.mid"), &song.sequence)?;
        if let Some(bank) = &song.instrument_bank {
            write_output(dir, &format!("{stem}.dls"), bank)?;
        }
    }

    Ok(())
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn write_output(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn print_tree(root: &Node) {
    let mut walk = root.walk();
    while let Some((depth, node)) = walk.next_with_depth() {
        let indent = "  ".repeat(depth);
        let name = node.name().unwrap_or("-");
        let packed = if node.is_packed() { " packed" } else { "" };
        if node.is_file() {
            println!(
                "{indent}{name} @0x{:x} {:?} {} bytes{packed}",
                node.offset,
                node.resource_kind,
                node.content.len()
            );
        } else {
            println!(
                "{indent}{name}/ @0x{:x} {} items{packed}",
                node.offset,
                node.children.len()
            );
        }
        for (key, value) in node.metadata.iter() {
            match value {
                MetadataValue::Text(text) => println!("{indent}  {key}: {text:?}"),
                MetadataValue::Bytes(bytes) => println!("{indent}  {key}: {bytes:02x?}"),
            }
        }
    }
}
