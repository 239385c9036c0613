use clap::{ArgAction, Parser};
use fragbox::{
    BoxKey, BoxNode, FourCC, Property, PropertyValue, analyze_tree, hex_range,
};
use std::fs::File;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "ISOBMFF box explorer with structural diagnostics")]
struct Args {
    /// File path
    path: String,

    /// Dump raw payload of this 4CC (e.g. --raw mvhd) or uuid:xxxxxxxx...
    #[arg(long = "raw")]
    raw: Option<String>,

    /// Limit recursion depth (for text/tree output)
    #[arg(long, default_value_t = 64)]
    max_depth: usize,

    /// Print decoded payload fields
    #[arg(long, action = ArgAction::SetTrue)]
    decode: bool,

    /// Byte count when dumping raw (0 means entire box payload)
    #[arg(long, default_value_t = 0)]
    bytes: usize,

    /// Emit JSON instead of human-readable tree
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut f = File::open(&args.path)?;
    let file_len = f.metadata()?.len();

    // JSON mode: output JSON and exit (no tree or raw to keep output clean)
    if args.json {
        let export = fragbox::analyze(&mut f, file_len)?;
        println!("{}", serde_json::to_string_pretty(&export)?);
        return Ok(());
    }

    let tree = analyze_tree(&mut f, file_len)?;

    // Text tree
    for b in &tree {
        print_box(b, 0, args.max_depth, args.decode);
    }

    // Optional raw dump (still walks the whole tree)
    if let Some(sel) = args.raw.as_ref() {
        dump_raw(&mut f, file_len, &tree, sel, args.bytes)?;
    }

    Ok(())
}

// ---------- Human-readable tree ----------

fn print_box(b: &BoxNode, depth: usize, max_depth: usize, decode: bool) {
    let indent = "  ".repeat(depth);
    let mut notes = Vec::new();
    if b.size_health != fragbox::SizeHealth::Ok {
        notes.push(format!("{:?}", b.size_health).to_lowercase());
    }
    notes.extend(b.consistency.names().iter().map(|s| s.to_string()));
    if b.is_synthetic() {
        notes.push("missing".to_string());
    }
    let note_str = if notes.is_empty() {
        String::new()
    } else {
        format!(" [{}]", notes.join(", "))
    };

    println!(
        "{indent}{:>6} {:>10} {} ({}){}",
        format!("{:#x}", b.header.offset),
        b.header.total_size(),
        display_type(b),
        b.name,
        note_str
    );

    if decode {
        for p in b.properties() {
            print_property(&p, depth + 1);
        }
    }

    if depth + 1 <= max_depth {
        for c in &b.children {
            print_box(c, depth + 1, max_depth, decode);
        }
    }
}

fn print_property(p: &Property, depth: usize) {
    let indent = "  ".repeat(depth);
    match &p.value {
        PropertyValue::Text(s) => println!("{indent}      -> {} = {}", p.name, s),
        PropertyValue::List(items) => {
            println!("{indent}      -> {} ({} records)", p.name, items.len());
            for item in items {
                print_property(item, depth + 1);
            }
        }
    }
}

fn display_type(b: &BoxNode) -> String {
    match b.header.key {
        BoxKey::FourCC(cc) => cc.to_string(),
        BoxKey::Uuid(u) => format!("uuid:{}", u),
    }
}

// ---------- Raw dump ----------

fn dump_raw(
    f: &mut File,
    file_len: u64,
    boxes: &[BoxNode],
    sel: &str,
    limit: usize,
) -> anyhow::Result<()> {
    let mut matches = Vec::new();
    select_boxes(boxes, sel, &mut matches);
    for (i, b) in matches.into_iter().enumerate() {
        let off = b.header.offset + b.header.header_size;
        let len = b.header.total_size().saturating_sub(b.header.header_size);
        if len == 0 {
            continue;
        }
        let to_read = if limit == 0 || limit as u64 > len {
            len
        } else {
            limit as u64
        };
        let dump = hex_range(f, file_len, off, to_read)?;
        println!(
            "\n== Dump {} ({}) payload: offset={:#x}, len={} ==",
            i,
            display_type(b),
            off,
            dump.length
        );
        print!("{}", dump.hex);
    }
    Ok(())
}

fn select_boxes<'a>(list: &'a [BoxNode], sel: &str, out: &mut Vec<&'a BoxNode>) {
    for b in list {
        let matches_sel = match b.header.key {
            BoxKey::Uuid(u) => {
                if let Some(hex_sel) = sel.strip_prefix("uuid:") {
                    hex::encode(u.as_bytes()).starts_with(&hex_sel.to_ascii_lowercase())
                } else {
                    false
                }
            }
            BoxKey::FourCC(cc) => {
                sel.len() == 4 && Some(cc) == FourCC::from_str(sel)
            }
        };

        if matches_sel && !b.is_synthetic() {
            out.push(b);
        }

        select_boxes(&b.children, sel, out);
    }
}
