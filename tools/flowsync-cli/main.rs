use clap::{Args, Parser, Subcommand};
use flowsync::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Keeps statement-level source code and its flow diagram in sync
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the flow model of a function
    Analyze {
        /// Source file to read
        file: PathBuf,
        #[arg(short, long)]
        function: String,
        #[command(flatten)]
        index: IndexArgs,
        /// Print an indented tree instead of JSON
        #[arg(long)]
        tree: bool,
        #[arg(long)]
        pretty: bool,
    },
    /// Render a flow node (JSON) as text edits
    Generate {
        /// Source file the node belongs to
        file: PathBuf,
        /// Path to the node JSON
        #[arg(short, long)]
        node: PathBuf,
        #[command(flatten)]
        position: PositionArgs,
        #[arg(long)]
        pretty: bool,
    },
    /// Apply a flow node to a function and print the updated flow model
    Sync {
        file: PathBuf,
        #[arg(short, long)]
        function: String,
        #[arg(short, long)]
        node: PathBuf,
        #[command(flatten)]
        position: PositionArgs,
        #[command(flatten)]
        index: IndexArgs,
        /// Write the edited source back to the file
        #[arg(long)]
        write: bool,
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// Symbol table JSON with library functions, variables and classes
    #[arg(long)]
    symbols: Option<PathBuf>,
    /// Connector index JSON; defaults to the built-in HTTP client
    #[arg(long)]
    connectors: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PositionArgs {
    /// Zero-based line to insert a new node at
    #[arg(long, requires = "col")]
    line: Option<usize>,
    /// Zero-based UTF-16 column to insert a new node at
    #[arg(long, requires = "line")]
    col: Option<usize>,
}

impl PositionArgs {
    fn position(&self) -> Option<LinePosition> {
        self.line.zip(self.col).map(|(line, col)| LinePosition::new(line, col))
    }
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command) {
        exit_with_error(&e.to_string());
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Analyze {
            file,
            function,
            index,
            tree,
            pretty,
        } => {
            let session = session_for(&file, &index)?;
            let model = session.diagram(&function)?;
            if tree {
                print!("{}", DisplayFlow { nodes: &model.nodes });
                Ok(())
            } else {
                print_json(&model, pretty)
            }
        }
        Command::Generate {
            file,
            node,
            position,
            pretty,
        } => {
            let source = read(&file)?;
            let node = read_node(&node)?;
            let imports = parse_module(&source, &file.to_string_lossy())
                .map(|m| m.import_ids())
                .unwrap_or_default();

            let mut ctx = GeneratorContext::new(&file).with_existing_imports(imports);
            if let Some(at) = position.position() {
                ctx = ctx.insert_at(at).with_sibling_at_position(true);
            }
            let edits = Generator::new().generate(&node, &ctx)?;
            print_json(&edits, pretty)
        }
        Command::Sync {
            file,
            function,
            node,
            position,
            index,
            write,
            pretty,
        } => {
            let mut session = session_for(&file, &index)?;
            let node = read_node(&node)?;
            let outcome = session.apply_node(&function, &node, position.position())?;
            if write {
                fs::write(&file, session.document().text())
                    .map_err(|e| format!("Failed to write '{}': {}", file.display(), e))?;
            }
            print_json(&outcome, pretty)
        }
    }
}

fn session_for(file: &Path, index: &IndexArgs) -> Result<SyncSession> {
    let source = read(file)?;
    let mut builder = SyncSession::builder(TextDocument::new(file, source));
    if let Some(path) = &index.symbols {
        builder = builder.with_symbols(SymbolTable::from_json(&read(path)?)?);
    }
    if let Some(path) = &index.connectors {
        builder = builder.with_connector_index(ConnectorIndex::from_json(&read(path)?)?);
    }
    Ok(builder.build())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e).into())
}

fn read_node(path: &Path) -> Result<FlowNode> {
    let json = read(path)?;
    serde_json::from_str(&json)
        .map_err(|e| format!("Failed to parse node JSON '{}': {}", path.display(), e).into())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
