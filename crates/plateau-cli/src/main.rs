//! Road-network storage tool.
//!
//! Provides the `plateau` binary for working with serialized road networks:
//! inspecting and validating storage JSON files, checking that a storage
//! survives deserialization, and keeping named snapshots in a SQLite
//! database.
//!
//! Configuration:
//! - `PLATEAU_DB_PATH`: snapshot database used when `--db` is not given
//!   (default: "plateau.db")
//! - `RUST_LOG`: log filter (default: "warn")

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plateau_core::{
    RnRef, RoadNetworkLane, RoadNetworkLineString, RoadNetworkModel, RoadNetworkNode,
    RoadNetworkWay, Vector3,
};
use plateau_storage::{
    hash_storage, RecordCounts, RoadNetworkSerializer, RoadNetworkStorage, RoadNetworkStore,
    SerializeError, SqliteStore, StorageError,
};

/// PLATEAU road-network storage tools.
#[derive(Parser)]
#[command(name = "plateau", about = "PLATEAU road-network storage tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print record counts and the content hash of a storage file.
    Inspect {
        /// Storage JSON file.
        file: PathBuf,
    },

    /// Check that every identifier in a storage file resolves.
    Validate {
        /// Storage JSON file.
        file: PathBuf,
    },

    /// Deserialize a storage file and serialize it again, comparing the result.
    Roundtrip {
        /// Storage JSON file.
        file: PathBuf,
    },

    /// Write a small generated road network as storage JSON.
    Sample {
        /// Number of nodes along the road.
        #[arg(short, long, default_value_t = 3)]
        nodes: usize,

        /// Output file (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Save a storage file as a named snapshot.
    Save {
        /// Storage JSON file.
        file: PathBuf,

        /// Snapshot name.
        #[arg(short, long)]
        name: String,

        /// Snapshot database (default: $PLATEAU_DB_PATH or plateau.db).
        #[arg(long)]
        db: Option<String>,
    },

    /// Load a named snapshot as storage JSON.
    Load {
        /// Snapshot name.
        #[arg(short, long)]
        name: String,

        /// Output file (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        db: Option<String>,
    },

    /// List stored snapshots.
    List {
        #[arg(long)]
        db: Option<String>,
    },

    /// Delete a named snapshot.
    Delete {
        #[arg(short, long)]
        name: String,

        #[arg(long)]
        db: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Inspect { file } => run_inspect(&file),
        Commands::Validate { file } => run_validate(&file),
        Commands::Roundtrip { file } => run_roundtrip(&file),
        Commands::Sample { nodes, output } => run_sample(nodes, output.as_deref()),
        Commands::Save { file, name, db } => run_save(&file, &name, &db_path(db)),
        Commands::Load { name, output, db } => run_load(&name, output.as_deref(), &db_path(db)),
        Commands::List { db } => run_list(&db_path(db)),
        Commands::Delete { name, db } => run_delete(&name, &db_path(db)),
    };
    process::exit(exit_code);
}

fn db_path(flag: Option<String>) -> String {
    flag.unwrap_or_else(|| {
        std::env::var("PLATEAU_DB_PATH").unwrap_or_else(|_| "plateau.db".to_string())
    })
}

/// Exit code for a failure: 1 = conversion error, 2 = invalid storage,
/// 3 = I/O or database error.
fn exit_code(err: &StorageError) -> i32 {
    match err {
        StorageError::Serialization(_)
        | StorageError::DanglingId { .. }
        | StorageError::NonFiniteValue { .. }
        | StorageError::HashMismatch { .. } => 2,
        StorageError::Serialize(SerializeError::UnknownId { .. })
        | StorageError::Serialize(SerializeError::Field(_)) => 2,
        StorageError::Serialize(_) => 1,
        StorageError::Sqlite(_)
        | StorageError::Migration(_)
        | StorageError::SnapshotNotFound(_) => 3,
    }
}

fn fail(context: &str, err: StorageError) -> i32 {
    eprintln!("Error: {}: {}", context, err);
    exit_code(&err)
}

fn print_json(value: &serde_json::Value) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", json);
}

fn read_storage(file: &Path) -> Result<RoadNetworkStorage, i32> {
    let json = fs::read_to_string(file).map_err(|e| {
        eprintln!("Error: failed to read '{}': {}", file.display(), e);
        3
    })?;
    RoadNetworkStorage::from_json(&json)
        .map_err(|e| fail(&format!("failed to parse '{}'", file.display()), e))
}

fn write_output(output: Option<&Path>, json: &str) -> i32 {
    match output {
        Some(path) => match fs::write(path, json) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: failed to write '{}': {}", path.display(), e);
                3
            }
        },
        None => {
            println!("{}", json);
            0
        }
    }
}

fn serializer() -> Result<RoadNetworkSerializer, i32> {
    RoadNetworkSerializer::new().map_err(|e| fail("failed to build serializer", e.into()))
}

fn open_store(db_path: &str) -> Result<SqliteStore, i32> {
    SqliteStore::new(db_path).map_err(|e| fail(&format!("failed to open database '{}'", db_path), e))
}

fn run_inspect(file: &Path) -> i32 {
    let storage = match read_storage(file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let hash = match hash_storage(&storage) {
        Ok(h) => h,
        Err(e) => return fail("failed to hash storage", e),
    };
    let counts = RecordCounts::of(&storage);
    print_json(&serde_json::json!({
        "file": file.display().to_string(),
        "hash": hash.to_hex().to_string(),
        "total": counts.total(),
        "record_counts": counts,
    }));
    0
}

fn run_validate(file: &Path) -> i32 {
    let storage = match read_storage(file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match storage.validate() {
        Ok(()) => {
            println!("{}: ok ({})", file.display(), RecordCounts::of(&storage));
            0
        }
        Err(e) => fail(&format!("'{}' is invalid", file.display()), e),
    }
}

fn run_roundtrip(file: &Path) -> i32 {
    let (storage, serializer) = match (read_storage(file), serializer()) {
        (Ok(s), Ok(z)) => (s, z),
        (Err(code), _) | (_, Err(code)) => return code,
    };
    let model = match serializer.deserialize(&storage) {
        Ok(m) => m,
        Err(e) => return fail("deserialization failed", e.into()),
    };
    let again = match serializer.serialize(&model) {
        Ok(s) => s,
        Err(e) => return fail("serialization failed", e.into()),
    };

    let before = RecordCounts::of(&storage);
    let after = RecordCounts::of(&again);
    if again == storage {
        println!("{}: round trip is lossless ({})", file.display(), after);
        0
    } else {
        // Unreferenced records are dropped, so the counts may shrink.
        eprintln!(
            "{}: round trip changed the storage\n  before: {}\n  after:  {}",
            file.display(),
            before,
            after
        );
        1
    }
}

fn run_sample(nodes: usize, output: Option<&Path>) -> i32 {
    let serializer = match serializer() {
        Ok(s) => s,
        Err(code) => return code,
    };
    let storage = match serializer.serialize(&sample_network(nodes)) {
        Ok(s) => s,
        Err(e) => return fail("serialization failed", e.into()),
    };
    match storage.to_json_pretty() {
        Ok(json) => write_output(output, &json),
        Err(e) => fail("failed to encode storage", e),
    }
}

fn run_save(file: &Path, name: &str, db_path: &str) -> i32 {
    let (storage, mut store) = match (read_storage(file), open_store(db_path)) {
        (Ok(s), Ok(st)) => (s, st),
        (Err(code), _) | (_, Err(code)) => return code,
    };
    match store.save(name, &storage) {
        Ok(summary) => {
            print_json(&serde_json::json!(summary));
            0
        }
        Err(e) => fail(&format!("failed to save snapshot '{}'", name), e),
    }
}

fn run_load(name: &str, output: Option<&Path>, db_path: &str) -> i32 {
    let store = match open_store(db_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let storage = match store.load(name) {
        Ok(s) => s,
        Err(e) => return fail(&format!("failed to load snapshot '{}'", name), e),
    };
    match storage.to_json_pretty() {
        Ok(json) => write_output(output, &json),
        Err(e) => fail("failed to encode storage", e),
    }
}

fn run_list(db_path: &str) -> i32 {
    let store = match open_store(db_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match store.list() {
        Ok(snapshots) => {
            print_json(&serde_json::json!(snapshots));
            0
        }
        Err(e) => fail("failed to list snapshots", e),
    }
}

fn run_delete(name: &str, db_path: &str) -> i32 {
    let mut store = match open_store(db_path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match store.delete(name) {
        Ok(()) => {
            println!("deleted snapshot '{}'", name);
            0
        }
        Err(e) => fail(&format!("failed to delete snapshot '{}'", name), e),
    }
}

/// A straight road through `nodes` intersections 100 m apart. Each link has
/// two lanes sharing a centre line, and every inner node has a track from
/// the incoming to the outgoing lane.
fn sample_network(nodes: usize) -> RoadNetworkModel {
    let mut model = RoadNetworkModel::new();
    let nodes: Vec<RnRef<RoadNetworkNode>> = (0..nodes)
        .map(|i| model.add_node(Vector3::new(i as f32 * 100.0, 0.0, 0.0)))
        .collect();

    let mut incoming: Option<RnRef<RoadNetworkLane>> = None;
    for (i, pair) in nodes.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        let link = model.add_link(&format!("road {}", i));
        model.connect(&link, prev, next);

        let from = prev.borrow().center;
        let to = next.borrow().center;
        let centre = RnRef::new(RoadNetworkWay::new(RnRef::new(
            RoadNetworkLineString::from_vertices([from, to]),
        )));
        let forward = link.add_lane(RoadNetworkLane {
            left_way: Some(centre.clone()),
            ..RoadNetworkLane::default()
        });
        link.add_lane(RoadNetworkLane {
            right_way: Some(centre.clone()),
            ..RoadNetworkLane::default()
        });
        link.add_block(0);

        if let Some(incoming) = incoming.take() {
            prev.add_track(&incoming, &forward, None);
        }
        incoming = Some(forward);
    }
    model
}
