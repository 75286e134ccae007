use serde_json::{json, Value};
use std::env;
use std::fs;
use std::process;
use thinview_client::{ClientConfig, ClientError, RecordedTransport, Request, Session};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: thinview-replay <reply.json>...");
        eprintln!();
        eprintln!("Applies recorded server replies in order to a fresh content store.");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  thinview-replay startup.json open-orders.json");
        eprintln!("  RUST_LOG=debug thinview-replay session/*.json");
        process::exit(1);
    }

    let mut session = Session::new(RecordedTransport::default(), ClientConfig::from_env());
    let mut exit_code = 0;

    for file_path in &args[1..] {
        match replay_file(&mut session, file_path).await {
            Ok(applied) => {
                println!("✓ {} applied {} responses", file_path, applied);
            }
            Err(e) => {
                eprintln!("✗ {} failed:", file_path);
                eprintln!("    {}", e);
                exit_code = 1;
            }
        }
    }

    print_summary(&session);
    process::exit(exit_code);
}

async fn replay_file(
    session: &mut Session<RecordedTransport>,
    path: &str,
) -> Result<usize, ClientError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ClientError::Transport(format!("Failed to read file: {}", e)))?;
    let reply: Value = serde_json::from_str(&content)?;
    session.transport().push_reply(reply);

    let report = session
        .request(Request::new("replay", json!({ "file": path })))
        .await?;
    if report.failed > 0 {
        return Err(ClientError::MalformedEnvelope {
            name: path.to_string(),
            reason: format!("{} responses could not be applied", report.failed),
        });
    }
    Ok(report.applied)
}

fn print_summary(session: &Session<RecordedTransport>) {
    let store = session.store();
    let registry = store.registry();

    println!();
    println!("Active screens:");
    let screens = store.screens().active_screens();
    if screens.is_empty() {
        println!("  (none)");
    }
    for screen in screens {
        let marker = if screen.popup { " [popup]" } else { "" };
        println!("  {} (id {}){}", screen.name, screen.id, marker);
    }

    println!();
    println!("Components:");
    println!("  active:   {}", registry.active_count());
    println!("  removed:  {}", registry.removed_count());
    println!("  replaced: {}", registry.replaced_count());
    println!("  desktop:  {}", registry.desktop_count());

    let pending = store.data().pending_fetches().count();
    if pending > 0 {
        println!();
        println!("Pending fetch requests: {}", pending);
    }
}
