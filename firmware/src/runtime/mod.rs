use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use static_cell::StaticCell;

use handheld_scanner::{BleControl, BleScanWorker, ScanChannels, ScanOrchestrator, ScanStatus, UiBridge};
use scan_core::config::ScanConfig;

mod board;
mod ble_task;
mod orchestrator_task;
mod ui_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

static CHANNELS: StaticCell<ScanChannels> = StaticCell::new();
static CONTROL: StaticCell<BleControl> = StaticCell::new();
static STATUS: StaticCell<ScanStatus> = StaticCell::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let _peripherals = hal::init(hal::Config::default());
    let config = ScanConfig::new();

    let channels: &'static ScanChannels = CHANNELS.init(ScanChannels::new());
    let control: &'static BleControl = CONTROL.init(BleControl::new());
    let status: &'static ScanStatus = STATUS.init(ScanStatus::new());

    let worker = BleScanWorker::new(
        board::BoardBle::new(),
        &config,
        control,
        channels.event_port(),
        status,
    );
    let orchestrator = ScanOrchestrator::new(
        &config,
        channels.command_receiver(),
        channels.event_port(),
        control,
        status,
        board::BoardWifi::new(),
        board::heap_probe(),
    );
    let ui = UiBridge::new(channels, status);

    spawner
        .spawn(ble_task::run(worker))
        .expect("failed to spawn BLE worker task");
    spawner
        .spawn(orchestrator_task::run(orchestrator))
        .expect("failed to spawn scan orchestrator task");
    spawner
        .spawn(ui_task::run(ui))
        .expect("failed to spawn UI task");

    core::future::pending::<()>().await;
}
