// Servo diagnostic: READ-ONLY scan of the twelve leg servos
//
// Pings every channel and reads back its present position. Nothing is written,
// torque is left as it is.
//
// Usage: cargo run --example servo_diagnostic -- [port]

use std::io::{self, Write};

use quadruped_control::config::SERVO_PORT;
use quadruped_control::kinematics::{Joint, LegId};
use quadruped_control::servo::{FeetechBus, channel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("debug".parse().unwrap()),
        )
        .init();

    let port = std::env::args().nth(1).unwrap_or_else(|| SERVO_PORT.to_string());

    println!("Leg servo diagnostic (read-only)");
    println!("Serial port: {}", port);
    println!();

    println!("Step 1: Opening serial port...");
    let mut bus = match FeetechBus::open(&port) {
        Ok(bus) => bus,
        Err(e) => {
            println!("  Failed to open serial port: {}", e);
            println!("  Check the port path and that the servo board is powered");
            return Err(e.into());
        }
    };
    println!();

    println!("Step 2: Scanning servos...");
    let mut missing = 0;
    for leg in LegId::ALL {
        for joint in Joint::ALL {
            let id = channel(leg, joint);
            print!("  {} {:<5} (ch {:>2}): ", leg, format!("{:?}", joint), id);
            io::stdout().flush()?;

            match bus.ping(id) {
                Ok(true) => match bus.get_angle(id) {
                    Ok(angle) => println!("at {:6.1} deg", angle),
                    Err(e) => println!("responding, position read failed: {}", e),
                },
                Ok(false) => {
                    println!("NO RESPONSE");
                    missing += 1;
                }
                Err(e) => {
                    println!("ERROR: {}", e);
                    missing += 1;
                }
            }
        }
    }
    println!();

    if missing == 0 {
        println!("All 12 servos responding");
    } else {
        println!("{} of 12 servos missing", missing);
    }
    Ok(())
}
