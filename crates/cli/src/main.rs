use clap::{Parser, Subcommand};
use scroll_uuid::{
    find_next_index_with, index_to_uuid, random_index, uuid_page, uuid_to_index, Direction,
    SearchConfig, UuidIndex,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "uuid-scroll")]
#[command(about = "Browse and search the enumeration of every version 4 UUID")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the UUID at an index
    Uuid {
        /// Index in [0, 2^122)
        index: UuidIndex,
    },
    /// Print the index of a UUID
    Index {
        /// UUID in 8-4-4-4-12 form
        uuid: String,
    },
    /// Find the next UUID containing a fragment
    Search {
        /// Hex digits and hyphens to look for
        query: String,
        /// Index to search from (exclusive)
        #[arg(long, default_value = "0")]
        from: UuidIndex,
        /// Search towards lower indexes
        #[arg(long)]
        backward: bool,
        /// Give up after scanning this many indexes (one and two character queries only)
        #[arg(long)]
        max_scan: Option<u64>,
    },
    /// Print consecutive UUIDs starting at an index
    Page {
        /// First index to print
        start: UuidIndex,
        /// Number of UUIDs to print
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Jump to a random index
    Lucky,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("scroll_uuid=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    scroll_uuid::init();

    match cli.command {
        Commands::Uuid { index } => {
            println!("{}", index_to_uuid(index));
        }
        Commands::Index { uuid } => match uuid_to_index(&uuid) {
            Ok(index) => println!("{}", index),
            Err(e) => eprintln!("Error decoding UUID: {}", e),
        },
        Commands::Search {
            query,
            from,
            backward,
            max_scan,
        } => {
            let direction = if backward {
                Direction::Backward
            } else {
                Direction::Forward
            };
            let config = SearchConfig { max_scan };
            match find_next_index_with(&query, from, direction, &config) {
                Ok(Some(index)) => println!("{} {}", index, index_to_uuid(index)),
                Ok(None) => println!("No UUID can contain '{}'.", query),
                Err(e) => eprintln!("Error searching: {}", e),
            }
        }
        Commands::Page { start, count } => {
            for (index, uuid) in uuid_page(start, count) {
                println!("{} {}", index, uuid);
            }
        }
        Commands::Lucky => {
            let index = random_index(&mut rand::thread_rng());
            println!("{} {}", index, index_to_uuid(index));
        }
    }

    Ok(())
}
