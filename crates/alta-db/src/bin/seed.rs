//! # Seed Data Generator
//!
//! Populates a buffer with demo submissions for local development.
//!
//! ## Usage
//! ```bash
//! # Generate 50 submissions (default)
//! cargo run -p alta-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p alta-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p alta-db --bin seed -- --db ./data/alta.db
//! ```
//!
//! Every generated submission is left PENDING, so a freshly seeded buffer
//! exercises the pending list and the retry worker.

use std::env;

use alta_core::{AddressLine, NewSubmission, SubmissionHeader};
use alta_db::{Database, DbConfig};
use tracing::{info, warn};

const CLIENTS: &[(&str, &str)] = &[
    ("76.086.428-5", "Comercial Andes SpA"),
    ("96.511.460-2", "Transportes del Sur Ltda"),
    ("77.261.280-K", "Agrícola Los Robles SpA"),
    ("89.862.200-2", "Clínica Santa Elena SA"),
    ("99.520.000-7", "Constructora Pacífico SA"),
];

const SERVICES: &[(&str, &str)] = &[
    ("MPLS", "100 Mbps"),
    ("Internet Dedicado", "300 Mbps"),
    ("Fibra Oscura", "1 Gbps"),
    ("SD-WAN", "50 Mbps"),
];

const STREETS: &[&str] = &[
    "Av. Providencia",
    "Av. Apoquindo",
    "Calle Huérfanos",
    "Av. Libertador Bernardo O'Higgins",
    "Av. Vitacura",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 50;
    let mut db_path = String::from("./alta_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(50);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Alta Intake Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of submissions to generate (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: ./alta_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, count, "Seeding buffer");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.submissions().count().await?;
    if existing > 0 {
        warn!(existing, "Buffer already has submissions, adding more");
    }

    let start = std::time::Instant::now();
    let mut generated = 0;

    for seed in 0..count {
        let submission = generate_submission(seed);

        match db.submissions().accept(&submission).await {
            Ok(_) => generated += 1,
            Err(e) => warn!(seed, error = %e, "Failed to insert submission"),
        }
    }

    let pending = db.sync_state().count_pending().await?;

    info!(
        generated,
        pending,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

/// Generates one demo submission with 1-4 address lines.
fn generate_submission(seed: usize) -> NewSubmission {
    let (client_id, business_name) = CLIENTS[seed % CLIENTS.len()];
    let line_count = 1 + seed % 4;

    let address_lines = (0..line_count)
        .map(|n| {
            let (service, capacity) = SERVICES[(seed + n) % SERVICES.len()];
            AddressLine {
                ordinal: n as i64 + 1,
                address: format!(
                    "{} {}",
                    STREETS[(seed * 3 + n) % STREETS.len()],
                    100 + (seed * 37 + n * 11) % 9000
                ),
                service: service.to_string(),
                capacity: capacity.to_string(),
            }
        })
        .collect();

    NewSubmission {
        header: SubmissionHeader {
            intake_date: format!("{:02}-{:02}-2024", 1 + seed % 28, 1 + seed % 12),
            client_id: client_id.to_string(),
            client_name: business_name.split_whitespace().take(2).collect::<Vec<_>>().join(" "),
            sam_number: format!("SAM-{:05}", 10000 + seed),
            business_name: business_name.to_string(),
            account_executive: "Paula Rojas".to_string(),
            account_executive_phone: "+56911112222".to_string(),
            client_contact: String::new(),
            client_contact_phone: String::new(),
            technical_contact: String::new(),
            technical_contact_phone: String::new(),
            project_manager: String::new(),
            project_manager_phone: String::new(),
            project: format!("Proyecto {}", seed + 1),
            expense_code: format!("PEP-{:04}", seed % 1000),
            provider: "Proveedor Norte".to_string(),
            activity: "Alta".to_string(),
            address_type: if seed % 2 == 0 { "Sucursal" } else { "Casa Matriz" }.to_string(),
            other_costs_concept: String::new(),
            other_costs_currency: String::new(),
            other_costs_amount: 0.0,
            installation_currency: "UF".to_string(),
            installation_cost: ((seed * 7) % 40) as f64 + 0.5,
            rent_currency: "UF".to_string(),
            rent_amount: ((seed * 13) % 30) as f64 + 2.25,
            term_months: [12, 24, 36][seed % 3],
        },
        address_lines,
    }
}
