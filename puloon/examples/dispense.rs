//! Dispense example
//!
//! Usage: `DISPENSER_PORT=/dev/ttyUSB0 cargo run --example dispense -- 2 0 1 0`

use puloon::{DispenseRequest, Dispenser};

#[tokio::main]
async fn main() -> puloon::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let port = std::env::var("DISPENSER_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    let mut quantities = [0u8; 4];
    for (quantity, arg) in quantities.iter_mut().zip(std::env::args().skip(1)) {
        *quantity = arg.parse().unwrap_or(0);
    }

    let mut dispenser = Dispenser::serial(port);
    dispenser.open().await?;

    match dispenser.dispense(DispenseRequest::new(quantities)?).await {
        Ok(response) => {
            for (number, count) in response.counts.iter().enumerate() {
                println!(
                    "Cassette {}: {} dispensed, {} rejected",
                    number + 1,
                    count.exit,
                    count.rejected
                );
            }
        }
        Err(e) if e.is_device_error() => {
            println!("Dispenser reported {}", e.code());

            // Notes may have moved before the error
            let last = dispenser.last_status().await?;
            println!("Last operation: {:?}", last);
        }
        Err(e) => return Err(e),
    }

    dispenser.close().await?;

    Ok(())
}
