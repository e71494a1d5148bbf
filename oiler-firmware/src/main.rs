//! Oiler - Machine Lubrication Controller Firmware
//!
//! Main firmware binary for RP2040-based oilers. The wiring, motors and
//! schedule come from `machine.toml`, which the build script validates and
//! embeds; this binary only decodes it, builds the scheduler and spawns
//! the tasks that drive it.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use oiler_core::config::OilerConfig;
use oiler_core::machine::{SharedMachine, TargetMachine};
use oiler_core::oiler::{Oiler, SharedOiler};
use oiler_hal_rp2040::{pin_bank, Rp2040Board};

mod tasks;

/// Configuration embedded by build.rs from machine.toml
static CONFIG_BIN: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/config.bin"));

/// The scheduler as shared between tasks
pub type BoardOiler = SharedOiler<'static, Rp2040Board>;

static MACHINE: StaticCell<SharedMachine> = StaticCell::new();
static OILER: StaticCell<BoardOiler> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Oiler firmware starting...");

    let p = embassy_rp::init(Default::default());
    let board = Rp2040Board::new(pin_bank!(p));
    info!("Peripherals initialized");

    let Ok(config) = postcard::from_bytes::<OilerConfig>(CONFIG_BIN) else {
        defmt::panic!("Embedded configuration is corrupt");
    };
    info!(
        "Configuration loaded: {} motors, mode {}, target {}",
        config.motors.len(),
        config.mode,
        config.target
    );

    let machine: Option<&'static SharedMachine> = match config.machine.as_ref() {
        Some(machine_config) => match TargetMachine::from_config(machine_config) {
            Ok(machine) => Some(&*MACHINE.init(machine.into_shared())),
            Err(e) => defmt::panic!("Machine setup failed: {}", e),
        },
        None => None,
    };

    let mut oiler = match Oiler::from_config(&config, board, machine) {
        Ok(oiler) => oiler,
        Err(e) => defmt::panic!("Oiler setup failed: {}", e),
    };
    let watchers = oiler.platform_mut().take_watchers();

    if let Err(e) = oiler.on(tasks::now_ms()) {
        defmt::panic!("Oiler failed to start: {}", e);
    }
    let oiler: &'static BoardOiler = OILER.init(oiler.into_shared());
    info!("Oiler running");

    spawner.spawn(tasks::tick_task(oiler)).unwrap();
    spawner.spawn(tasks::stepper_task(oiler)).unwrap();
    for watcher in watchers {
        spawner.spawn(tasks::edge_task(oiler, watcher)).unwrap();
    }
}
