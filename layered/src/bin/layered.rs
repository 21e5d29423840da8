use clap::{Parser, Subcommand};
use env_logger::Env;
use layered::{
    read_layered_sparse_from_matrix_market_file, LayeredConfig, LayeredMatrix, Matrix,
    MatrixOperations, OffsetWidth,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(about = "Layered CLI - Inspect Matrix Market files as layered sparse matrices")]
struct Cli {
    /// Columns per chunk
    #[arg(long, global = true, default_value_t = layered::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Bits per column offset (8, 16 or 32)
    #[arg(long, global = true, default_value_t = 16)]
    offset_bits: u32,

    /// Worker threads
    #[arg(long, global = true, default_value_t = 1)]
    threads: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how the matrix is laid out across chunks and width classes
    Inspect {
        /// Matrix Market coordinate file
        file: PathBuf,

        /// Print the layout as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the nonzeros of one row
    Row {
        /// Matrix Market coordinate file
        file: PathBuf,

        /// 0-based row index
        index: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let offset_width = OffsetWidth::from_bits(cli.offset_bits)
        .ok_or_else(|| format!("unsupported offset width: {} bits", cli.offset_bits))?;
    let config = LayeredConfig::default()
        .with_chunk_size(cli.chunk_size)
        .with_offset_width(offset_width)
        .with_num_threads(cli.threads);
    let start_time = std::time::Instant::now();

    match &cli.command {
        Commands::Inspect { file, json } => {
            let matrix: LayeredMatrix<u32> =
                read_layered_sparse_from_matrix_market_file(file, &config)?;
            let summary = matrix.summary();
            if *json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{summary}");
            }
        }
        Commands::Row { file, index } => {
            let matrix: LayeredMatrix<u32> =
                read_layered_sparse_from_matrix_market_file(file, &config)?;
            if *index >= matrix.nrow() {
                return Err(format!(
                    "row {index} is out of bounds for a matrix with {} rows",
                    matrix.nrow()
                )
                .into());
            }
            let (columns, values) = matrix.sparse_row(*index);
            for (column, value) in columns.iter().zip(&values) {
                println!("{column}\t{value}");
            }
        }
    }

    log::info!("completed in {:.2?}", start_time.elapsed());
    Ok(())
}
