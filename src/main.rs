use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use fieldshield::{
    classify, config, init_config, init_telemetry, CaptureConfig, CaptureCoordinator,
    CapturePhase, ComplianceRecord, ComplianceStore, FileSystemQueue, FileSystemStore,
    FleetReport, GpsFix, OfflineQueue, SimulatedCatalog, SimulatedLocationService, StaticIdentity,
    StoreError, SubmitOutcome, SyncProcessor, TechnicianId, Weight, WeightStep,
};

#[derive(Parser)]
#[command(name = "fieldshield")]
#[command(about = "Refrigerant compliance capture for field technicians")]
#[command(long_about = "FieldShield logs refrigerant transfers against physical cylinders: \
                       scan the tag, weigh before and after, attach evidence, and submit. \
                       Records that cannot reach the durable store are queued locally and \
                       replayed with 'fieldshield sync'.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive compliance capture (scan → weigh → weigh → submit)
    Capture {
        /// Simulate a failing store write to exercise the offline queue
        #[arg(long, help = "Force the direct write to fail so the record is queued")]
        offline: bool,
    },
    /// Review persisted compliance records with audit classification
    Logs {
        /// Number of records to show
        #[arg(long, default_value = "50", help = "Maximum number of records to list")]
        limit: usize,
    },
    /// Show pending offline-queue entries awaiting sync
    Queue,
    /// Replay queued records against the durable store
    Sync,
    /// Display store totals and queue depth
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_telemetry()?;
    init_config()?;

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        // Default behavior: explain how to log a transfer and show status
        None => runtime.block_on(show_field_guide()),
        Some(Commands::Capture { offline }) => runtime.block_on(capture_command(offline)),
        Some(Commands::Logs { limit }) => runtime.block_on(logs_command(limit)),
        Some(Commands::Queue) => runtime.block_on(queue_command()),
        Some(Commands::Sync) => runtime.block_on(sync_command()),
        Some(Commands::Status) => runtime.block_on(status_command()),
    }
}

/// Store that refuses every write, used by `capture --offline` to exercise
/// the queue fallback end to end.
struct RejectingStore;

#[async_trait::async_trait]
impl ComplianceStore for RejectingStore {
    async fn write_record(&self, _record: &ComplianceRecord) -> Result<(), StoreError> {
        Err(StoreError::WriteRejected {
            reason: "offline mode".to_string(),
        })
    }

    async fn list_records(&self) -> Result<Vec<ComplianceRecord>, StoreError> {
        Ok(Vec::new())
    }
}

async fn show_field_guide() -> Result<()> {
    let cfg = config()?;
    let store = FileSystemStore::new(&cfg.store.data_dir);
    let queue = FileSystemQueue::new(&cfg.store.data_dir);
    let records = store.list_records().await?;
    let pending = queue.pending().await?;

    println!("🛡️  FIELDSHIELD - Refrigerant Compliance Capture");
    println!();
    println!("📊 SYSTEM STATUS");
    println!("  Compliance records: {}", records.len());
    println!("  Pending sync: {}", pending.len());
    println!();
    println!("📋 QUICK START:");
    println!("  fieldshield capture        Log a refrigerant transfer");
    println!("  fieldshield logs           Review recent compliance records");
    println!("  fieldshield queue          Inspect records awaiting sync");
    println!("  fieldshield sync           Replay queued records to the store");
    println!();
    println!("EXAMPLE WORKFLOW: scan → start weight → end weight → evidence → submit");

    Ok(())
}

async fn capture_command(offline: bool) -> Result<()> {
    let cfg = config()?;

    let Some(tech_id) = cfg.technician.id.clone() else {
        println!("No technician identity configured.");
        println!("Set FIELD_TECH_ID (for example: export FIELD_TECH_ID=TECH-001) and retry.");
        return Ok(());
    };

    let store: Arc<dyn ComplianceStore> = if offline {
        Arc::new(RejectingStore)
    } else {
        Arc::new(FileSystemStore::new(&cfg.store.data_dir))
    };
    let queue = Arc::new(FileSystemQueue::new(&cfg.store.data_dir));
    let catalog = Arc::new(SimulatedCatalog::new(cfg.capture.scan_delay()));
    let location = Arc::new(SimulatedLocationService::new(
        Duration::from_millis(300),
        Some(GpsFix {
            latitude: 37.7749,
            longitude: -122.4194,
        }),
    ));
    let identity = Arc::new(StaticIdentity::new(Some(TechnicianId(tech_id.clone()))));

    let mut coordinator = CaptureCoordinator::new(
        catalog,
        location,
        store,
        queue,
        identity,
        CaptureConfig {
            location_timeout: cfg.capture.location_timeout(),
        },
    );

    println!("🛡️  FIELDSHIELD CAPTURE - operator {tech_id}");

    loop {
        let phase = coordinator.session().phase().clone();
        match phase {
            CapturePhase::Identify => {
                println!();
                println!("[SCAN] Press Enter to scan the cylinder tag ('q' to quit).");
                if read_line("> ")? == "q" {
                    return Ok(());
                }
                println!("Scanning...");
                let asset = coordinator.scan().await?;
                println!(
                    "Cylinder {} ({}) bound, last known weight {} lbs.",
                    asset.code, asset.refrigerant_type, asset.last_known_weight
                );
            }
            CapturePhase::StartWeight { .. } | CapturePhase::EndWeight { .. } => {
                let label = match phase {
                    CapturePhase::StartWeight { .. } => "starting",
                    _ => "ending",
                };
                let current = coordinator.session().active_weight().unwrap_or(Weight::ZERO);
                println!();
                println!("[{}] Current {label} weight: {current} lbs", phase.name());
                println!("Commands: +10 +1 +0.1 -10 -1 -0.1 clear confirm quit");
                let input = read_line("> ")?;
                match input.as_str() {
                    "q" | "quit" => return Ok(()),
                    "clear" => coordinator.clear_weight()?,
                    "confirm" => {
                        if let Err(e) = coordinator.confirm_weight() {
                            println!("{e}");
                        }
                    }
                    other => match parse_step(other) {
                        Some(step) => coordinator.adjust(step)?,
                        None => println!("Unrecognized command: {other}"),
                    },
                }
            }
            CapturePhase::Evidence {
                delta, has_photo, ..
            } => {
                println!();
                println!(
                    "[EVIDENCE] Refrigerant delta: {delta} lbs (photo: {})",
                    if has_photo { "attached" } else { "none" }
                );
                println!("Commands: photo submit quit");
                let input = read_line("> ")?;
                match input.as_str() {
                    "q" | "quit" => return Ok(()),
                    "photo" => {
                        coordinator.attach_photo()?;
                        println!("Scale photo attached.");
                    }
                    "submit" => match coordinator.submit().await {
                        Ok(SubmitOutcome::Persisted) => {
                            println!(
                                "FEDERAL LOG CERTIFIED - GPS coordinates and timestamp captured."
                            );
                        }
                        Ok(SubmitOutcome::Queued) => {
                            println!("QUEUED FOR SYNC - log saved locally, will sync when online.");
                        }
                        Err(e) => {
                            println!("Submission failed: {e}");
                            return Err(e.into());
                        }
                    },
                    other => println!("Unrecognized command: {other}"),
                }
            }
            CapturePhase::Complete { .. } => {
                println!();
                println!("[COMPLETE] Entry recorded. Type 'new' for another capture, Enter to exit.");
                if read_line("> ")? == "new" {
                    coordinator.reset()?;
                } else {
                    return Ok(());
                }
            }
        }
    }
}

async fn logs_command(limit: usize) -> Result<()> {
    let cfg = config()?;
    let store = FileSystemStore::new(&cfg.store.data_dir);
    let records = store.list_records().await?;

    if records.is_empty() {
        println!("No compliance records yet. Run 'fieldshield capture' to log one.");
        return Ok(());
    }

    println!("📋 COMPLIANCE LOG ({} most recent)", records.len().min(limit));
    for record in records.iter().take(limit) {
        let status = classify(record);
        println!(
            "  {}  {}  start {:>6.1}  end {:>6.1}  delta {:>5.1}  [{}]{}",
            record.logged_at.format("%Y-%m-%d %H:%M"),
            record.tech_id,
            record.start_weight_lbs,
            record.end_weight_lbs,
            record.delta(),
            status.label(),
            if record.synced { "" } else { "  (pending sync)" },
        );
    }

    let report = FleetReport::from_records(&records);
    println!();
    println!(
        "  audit-ready: {}  risk: {}  total delta: {:.1} lbs",
        report.audit_ready, report.at_risk, report.total_delta_lbs
    );

    Ok(())
}

async fn queue_command() -> Result<()> {
    let cfg = config()?;
    let queue = FileSystemQueue::new(&cfg.store.data_dir);
    let pending = queue.pending().await?;

    if pending.is_empty() {
        println!("Offline queue is empty.");
        return Ok(());
    }

    println!("📦 PENDING SYNC ({} entries)", pending.len());
    for entry in &pending {
        println!(
            "  {}  {}  delta {:>5.1} lbs  queued from {} (pid {})",
            entry.queued_at.format("%Y-%m-%d %H:%M"),
            entry.tech_id,
            entry.payload.delta(),
            entry.origin.hostname,
            entry.origin.pid,
        );
    }

    Ok(())
}

async fn sync_command() -> Result<()> {
    let cfg = config()?;
    let store = Arc::new(FileSystemStore::new(&cfg.store.data_dir));
    let queue = Arc::new(FileSystemQueue::new(&cfg.store.data_dir));

    let report = SyncProcessor::new(store, queue).drain().await?;
    println!(
        "Sync complete: {} replayed, {} failed, {} remaining.",
        report.replayed, report.failed, report.remaining
    );

    Ok(())
}

async fn status_command() -> Result<()> {
    let cfg = config()?;
    let store = FileSystemStore::new(&cfg.store.data_dir);
    let queue = FileSystemQueue::new(&cfg.store.data_dir);

    let records = store.list_records().await?;
    let pending = queue.pending().await?;
    let report = FleetReport::from_records(&records);

    println!("📊 SYSTEM STATUS");
    println!("  Compliance records: {}", report.total_records);
    println!("  Audit-ready: {}", report.audit_ready);
    println!("  At risk: {}", report.at_risk);
    println!("  Total delta: {:.1} lbs", report.total_delta_lbs);
    println!("  Pending sync: {}", pending.len());

    Ok(())
}

fn parse_step(input: &str) -> Option<WeightStep> {
    match input {
        "+10" | "+10.0" => Some(WeightStep::PlusTen),
        "+1" | "+1.0" => Some(WeightStep::PlusOne),
        "+0.1" | "+.1" => Some(WeightStep::PlusTenth),
        "-10" | "-10.0" => Some(WeightStep::MinusTen),
        "-1" | "-1.0" => Some(WeightStep::MinusOne),
        "-0.1" | "-.1" => Some(WeightStep::MinusTenth),
        _ => None,
    }
}

fn read_line(prompt: &str) -> Result<String> {
    use std::io::Write;

    print!("{prompt}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    let bytes = std::io::stdin().read_line(&mut line)?;
    if bytes == 0 {
        // EOF behaves like quitting.
        return Ok("q".to_string());
    }
    Ok(line.trim().to_lowercase())
}
