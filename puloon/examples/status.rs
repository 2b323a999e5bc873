//! Status example

use puloon::{CassetteSlot, Dispenser};

#[tokio::main]
async fn main() -> puloon::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let port = std::env::var("DISPENSER_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    let mut dispenser = Dispenser::serial(port);
    dispenser.open().await?;

    let status = dispenser.status().await?;
    println!("Path clear: {}", status.sensors.path_clear());

    for (number, cassette) in status.cassettes.iter().enumerate() {
        match cassette.slot {
            CassetteSlot::Present(_) => println!(
                "Cassette {}: opacity {}, length {}",
                number + 1,
                cassette.opacity,
                cassette.length
            ),
            CassetteSlot::Removed => println!("Cassette {}: removed", number + 1),
        }
    }

    dispenser.close().await?;

    Ok(())
}
