use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf_toolkit::text::decode_text_string;
use pdf_toolkit::{
    Document, ExtractImagesOptions, Object, ParseOptions, PdfError, ProtectOptions, TableOptions,
    TableRow,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Exit status for a password that opens neither lock
const EXIT_WRONG_PASSWORD: i32 = 2;

#[derive(Parser)]
#[command(
    name = "pdftoolkit",
    about = "Extract tables and images from PDFs, split, merge and protect them",
    version,
    author
)]
struct Cli {
    /// Increase log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the tables of a PDF as CSV
    ExtractTables {
        /// Input PDF file
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Password of an encrypted input
        #[arg(short, long)]
        password: Option<String>,

        /// Maximum baseline difference within a row, in points
        #[arg(long, default_value_t = 3.0)]
        row_tolerance: f64,

        /// Minimum horizontal gap between cells, in points
        #[arg(long, default_value_t = 10.0)]
        column_gap: f64,
    },

    /// Save the images of a PDF as image_{n}.{jpg,jp2,png}
    ExtractImages {
        /// Input PDF file
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Password of an encrypted input
        #[arg(short, long)]
        password: Option<String>,

        /// Skip images narrower or shorter than this many pixels
        #[arg(long)]
        min_size: Option<u32>,
    },

    /// Split PDFs into one file per page
    Split {
        /// Input PDF files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Password of encrypted inputs
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Merge PDFs into one, pages in argument order
    Merge {
        /// Input PDF files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Encrypt a PDF with a password
    Protect {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// User password
        #[arg(short, long)]
        password: String,

        /// Separate owner password
        #[arg(long)]
        owner_password: Option<String>,
    },

    /// Remove the password protection of a PDF
    Unprotect {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// User or owner password
        #[arg(short, long)]
        password: String,
    },

    /// Get information about a PDF file
    Info {
        /// Input PDF file
        input: PathBuf,

        /// Password of an encrypted input
        #[arg(short, long)]
        password: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::ExtractTables {
            input,
            output,
            password,
            row_tolerance,
            column_gap,
        } => cmd_extract_tables(
            &input,
            &output,
            password.as_deref(),
            TableOptions::default()
                .with_row_tolerance(row_tolerance)
                .with_column_gap(column_gap),
        ),
        Commands::ExtractImages {
            input,
            output,
            password,
            min_size,
        } => cmd_extract_images(&input, &output, password.as_deref(), min_size),
        Commands::Split {
            inputs,
            output,
            password,
        } => cmd_split(&inputs, &output, password.as_deref()),
        Commands::Merge { inputs, output } => cmd_merge(&inputs, &output),
        Commands::Protect {
            input,
            output,
            password,
            owner_password,
        } => cmd_protect(&input, &output, &password, owner_password),
        Commands::Unprotect {
            input,
            output,
            password,
        } => cmd_unprotect(&input, &output, &password),
        Commands::Info { input, password } => cmd_info(&input, password.as_deref()),
    };

    if let Err(e) = result {
        if is_wrong_password(&e) {
            eprintln!("Error: Wrong password");
            std::process::exit(EXIT_WRONG_PASSWORD);
        }
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn is_wrong_password(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<PdfError>()
            .is_some_and(PdfError::is_wrong_password)
    })
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

fn parse_options(password: Option<&str>) -> ParseOptions {
    match password {
        Some(password) => ParseOptions::default().with_password(password),
        None => ParseOptions::default(),
    }
}

fn cmd_extract_tables(
    input: &Path,
    output: &Path,
    password: Option<&str>,
    options: TableOptions,
) -> Result<()> {
    let bytes = read_input(input)?;
    let rows = pdf_toolkit::extract_tables_with_options(&bytes, parse_options(password), options)
        .with_context(|| format!("Failed to extract tables from {}", input.display()))?;

    write_output(output, to_csv(&rows).as_bytes())?;

    let data_rows = rows.iter().filter(|row| !row.is_separator()).count();
    println!("✓ {} table rows written to {}", data_rows, output.display());
    Ok(())
}

fn cmd_extract_images(
    input: &Path,
    output: &Path,
    password: Option<&str>,
    min_size: Option<u32>,
) -> Result<()> {
    let bytes = read_input(input)?;
    let mut options = ExtractImagesOptions::default();
    if let Some(min_size) = min_size {
        options = options.with_min_size(min_size);
    }

    let images = pdf_toolkit::extract_images_with_options(&bytes, parse_options(password), options)
        .with_context(|| format!("Failed to extract images from {}", input.display()))?;

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    for image in &images {
        write_output(&output.join(image.file_name()), &image.data)?;
    }

    println!("✓ {} images saved to {}", images.len(), output.display());
    Ok(())
}

fn cmd_split(inputs: &[PathBuf], output: &Path, password: Option<&str>) -> Result<()> {
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    for input in inputs {
        let bytes = read_input(input)?;
        let pages = pdf_toolkit::split_pages_with_options(&bytes, parse_options(password))
            .with_context(|| format!("Failed to split {}", input.display()))?;

        // Several inputs get their file stem as a prefix
        let prefix = if inputs.len() > 1 {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            format!("{stem}_")
        } else {
            String::new()
        };

        for (index, page) in pages.iter().enumerate() {
            let path = output.join(format!("{}page_{}.pdf", prefix, index + 1));
            write_output(&path, page)?;
        }
        println!(
            "✓ Split {} into {} pages in {}",
            input.display(),
            pages.len(),
            output.display()
        );
    }

    Ok(())
}

fn cmd_merge(inputs: &[PathBuf], output: &Path) -> Result<()> {
    let documents = inputs
        .iter()
        .map(|path| read_input(path))
        .collect::<Result<Vec<_>>>()?;

    let merged = pdf_toolkit::merge_pdfs(&documents).context("Failed to merge PDFs")?;
    write_output(output, &merged)?;

    println!("✓ Merged {} files into {}", inputs.len(), output.display());
    Ok(())
}

fn cmd_protect(
    input: &Path,
    output: &Path,
    password: &str,
    owner_password: Option<String>,
) -> Result<()> {
    let bytes = read_input(input)?;
    let mut options = ProtectOptions::default();
    if let Some(owner) = owner_password {
        options = options.with_owner_password(owner);
    }

    let protected = pdf_toolkit::protect_with_options(&bytes, password, &options)
        .with_context(|| format!("Failed to protect {}", input.display()))?;
    write_output(output, &protected)?;

    println!("✓ Protected PDF written to {}", output.display());
    Ok(())
}

fn cmd_unprotect(input: &Path, output: &Path, password: &str) -> Result<()> {
    let bytes = read_input(input)?;
    let plain = pdf_toolkit::unprotect(&bytes, password)
        .with_context(|| format!("Failed to unprotect {}", input.display()))?;
    write_output(output, &plain)?;

    println!("✓ Unprotected PDF written to {}", output.display());
    Ok(())
}

fn cmd_info(input: &Path, password: Option<&str>) -> Result<()> {
    let bytes = read_input(input)?;
    let document = Document::load_with_options(&bytes, parse_options(password))
        .map_err(PdfError::from)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    println!("PDF Information for: {}", input.display());
    println!("==========================================");
    println!("PDF Version: {}", document.version());
    println!("Pages: {}", document.page_count());

    if let Some(info) = document.info() {
        for key in ["Title", "Author", "Subject", "Creator", "Producer"] {
            if let Some(Object::String(value)) = info.get(key).map(|v| document.resolve(v)) {
                println!("{}: {}", key, decode_text_string(value));
            }
        }
    }

    match document.encryption() {
        Some(encryption) => {
            let state = &encryption.state;
            println!(
                "Encryption: revision {}, {}-bit key, {:?}",
                state.revision.number(),
                state.key_length * 8,
                state.stream_method
            );
            println!("Permissions: {:?}", state.permissions());
        }
        None => println!("Encryption: none"),
    }

    Ok(())
}

/// Comma-separated rows with RFC 4180 quoting. Separator rows become empty
/// lines.
fn to_csv(rows: &[TableRow]) -> String {
    let mut csv = String::new();
    for row in rows {
        let fields: Vec<String> = row.cells.iter().map(|cell| csv_field(cell)).collect();
        csv.push_str(&fields.join(","));
        csv.push_str("\r\n");
    }
    csv
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
