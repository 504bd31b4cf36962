use clap::{ArgAction, Parser};
use m14box::{
    Mp4File, ParseOptions, PrintOptions, default_registry,
    describe::print_tree,
    json_api::{box_to_json, tree_to_json},
    util::hex_dump,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "MPEG-4 Part 14 box tree dumper")]
struct Args {
    /// MP4/M4A/MOV file path
    path: String,

    /// Only print subtree(s) at a slash-delimited path (e.g. moov/trak/mdia)
    #[arg(long = "find")]
    find: Option<String>,

    /// Hex-dump the payload of every box at this path
    #[arg(long = "raw")]
    raw: Option<String>,

    /// Line width for descriptions
    #[arg(long, env = "COLUMNS", default_value_t = 80)]
    width: usize,

    /// Fail on the first malformed box instead of keeping it opaque
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,

    /// Emit JSON instead of the human-readable tree
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Re-serialize the parsed tree to this path
    #[arg(long = "rewrite")]
    rewrite: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let reg = default_registry();
    let opts = ParseOptions { strict: args.strict };
    let mut file = Mp4File::open_with(&args.path, &opts, &reg)?;

    let root = file.root();
    let targets = match &args.find {
        Some(path) => file.find(path, root),
        None => vec![root],
    };

    if args.json {
        let json = if args.find.is_some() {
            let boxes: Vec<_> = targets.iter().map(|&t| box_to_json(&file, t, &reg, args.width)).collect();
            serde_json::to_string_pretty(&boxes)?
        } else {
            serde_json::to_string_pretty(&tree_to_json(&file, &reg, args.width))?
        };
        println!("{json}");
    } else {
        let popts = PrintOptions { width: args.width };
        for &t in &targets {
            print!("{}", print_tree(&file, t, &reg, &popts));
        }
    }

    if let Some(sel) = &args.raw {
        for (i, id) in file.find(sel, root).into_iter().enumerate() {
            let b = file.get(id);
            let Some(payload) = file.payload(id) else { continue };
            let start = b.source_offset().map_or(0, |o| o + b.header_len());
            println!("\n== Dump {} ({}) payload: offset={:#x}, len={} ==", i, b.typ, start, payload.len());
            print!("{}", hex_dump(payload, start as u64));
        }
    }

    if let Some(out) = &args.rewrite {
        m14box::writer::write_to(&mut file, &reg, std::path::Path::new(out))?;
    }

    file.close();
    Ok(())
}
